pub mod configuration;
pub mod domain;
pub mod payment_gateway;
pub mod pipeline;
pub mod profile_source;
pub mod routes;
pub mod run_executor;
pub mod scheduler;
pub mod startup;
pub mod synthetic_data;
pub mod telemetry;
pub mod utils;
