use std::net::TcpListener;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::configuration::Settings;
use crate::pipeline::PaymentPipeline;
use crate::profile_source::CustomerProfileSource;
use crate::routes::{health_check, home, openapi_json, run};
use crate::run_executor::{RunExecutor, SimulationRunner};
use crate::scheduler::{Scheduler, stop_channel};

#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<dyn SimulationRunner>,
    pub default_iterations: u32,
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    settings: Settings,
    runner: Arc<dyn SimulationRunner>,
}

/// Wire the data sources, gateway client and pipeline into a runner.
pub fn build_runner(settings: &Settings) -> Result<Arc<dyn SimulationRunner>, anyhow::Error> {
    let synthetic = Arc::new(settings.data_sources.synthetic_data());
    let profiles = Arc::new(CustomerProfileSource::new(
        &settings.data_sources,
        synthetic.clone(),
    ));
    let pipeline = PaymentPipeline::new(
        settings.gateway.client()?,
        profiles.clone(),
        synthetic,
        settings.gateway.amount_range(),
    );
    Ok(Arc::new(RunExecutor::new(
        pipeline,
        profiles,
        settings.data_sources.card_selection,
        settings.scheduler.pacing(),
    )))
}

impl Application {
    pub async fn build(settings: Settings) -> Result<Self, anyhow::Error> {
        let runner = build_runner(&settings)?;
        Self::build_with_runner(settings, runner).await
    }

    /// Like [`Self::build`], with the runner supplied by the caller.
    pub async fn build_with_runner(
        settings: Settings,
        runner: Arc<dyn SimulationRunner>,
    ) -> Result<Self, anyhow::Error> {
        let address = format!("{}:{}", settings.application.host, settings.application.port);
        let listener = TcpListener::bind(address)?;
        listener.set_nonblocking(true)?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            settings,
            runner,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), anyhow::Error> {
        log_startup_diagnostics(&self.settings);

        let (stop_handle, stop_signal) = stop_channel();
        let scheduler = if self.settings.scheduler.enable_loop {
            let schedule = self.settings.scheduler.schedule();
            let scheduler = Scheduler::new(self.runner.clone(), schedule);
            Some(tokio::spawn(scheduler.run_until_stopped(stop_signal)))
        } else {
            tracing::info!("Background loop disabled, runs only happen through POST /run");
            None
        };

        let app = router(AppState {
            runner: self.runner,
            default_iterations: self.settings.scheduler.iterations_per_run,
        });
        let listener = tokio::net::TcpListener::from_std(self.listener)?;
        tracing::info!(port = self.port, "Listening for requests");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        stop_handle.stop();
        if let Some(scheduler) = scheduler {
            match scheduler.await {
                Ok(state) => tracing::info!(?state, "Background loop shut down"),
                Err(e) => tracing::error!(error.message = %e, "Background loop ended abnormally"),
            }
        }
        Ok(())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(home))
        .route("/run", post(run))
        .route("/api-docs/openapi.json", get(openapi_json))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Log the resolved settings and whether the data files exist. Nothing in
/// here may keep the service from starting.
fn log_startup_diagnostics(settings: &Settings) {
    let scheduler = &settings.scheduler;
    let data_sources = &settings.data_sources;
    let gateway = &settings.gateway;
    tracing::info!(
        enable_loop = scheduler.enable_loop,
        run_interval_seconds = scheduler.run_interval_seconds,
        run_jitter_seconds = scheduler.run_jitter_seconds,
        iterations_per_run = scheduler.iterations_per_run,
        loop_start_delay_seconds = scheduler.loop_start_delay_seconds,
        pacing_seconds = scheduler.pacing_seconds,
        card_selection = %data_sources.card_selection,
        "Scheduler settings"
    );
    tracing::info!(
        client_id = %gateway.client_id,
        merchant_id = %gateway.merchant_id,
        tokenization_url = %gateway.tokenization_url,
        checkout_url = %gateway.checkout_url,
        payment_url = %gateway.payment_url,
        "Gateway settings"
    );
    log_file_presence("cards_path", &data_sources.cards_path);
    match &data_sources.csv_path {
        Some(path) => log_file_presence("csv_path", path),
        None => tracing::info!("No profile dataset configured, customers will be fully synthetic"),
    }
}

fn log_file_presence(key: &str, path: &Path) {
    match path.try_exists() {
        Ok(exists) => tracing::info!(key, path = %path.display(), exists, "Data file"),
        Err(e) => tracing::warn!(
            error.cause_chain = ?e,
            error.message = %e,
            key,
            path = %path.display(),
            "Could not check whether the data file exists"
        ),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error.message = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error.message = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
