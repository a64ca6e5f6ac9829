mod health_check;
mod helpers;
mod openapi;
mod run;
