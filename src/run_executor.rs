//! src/run_executor.rs
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{Instrument, field::display};
use uuid::Uuid;

use crate::domain::{CardRecord, CardSelection};
use crate::payment_gateway::Stage;
use crate::pipeline::{PaymentPipeline, PipelineError};
use crate::profile_source::CustomerProfileSource;

/// Something that can execute a batch of simulated transactions.
///
/// Both the background scheduler and the `/run` endpoint drive runs
/// through this trait, which lets either be exercised against a fake.
#[async_trait::async_trait]
pub trait SimulationRunner: Send + Sync {
    async fn run_once(&self, iterations: u32) -> Result<RunReport, anyhow::Error>;
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct IterationFailure {
    /// 1-based index of the failed iteration within its run
    pub iteration: u32,
    /// Remote call that failed, absent for local failures
    pub stage: Option<Stage>,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub attempted: u32,
    pub succeeded: u32,
    pub failures: Vec<IterationFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    fn new(run_id: Uuid, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            attempted: 0,
            succeeded: 0,
            failures: Vec::new(),
            started_at,
            finished_at: started_at,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs the payment pipeline a number of times, one card per iteration.
pub struct RunExecutor {
    pipeline: PaymentPipeline,
    profiles: Arc<CustomerProfileSource>,
    selection: CardSelection,
    pacing: Duration,
    next_card: AtomicUsize,
}

impl RunExecutor {
    pub fn new(
        pipeline: PaymentPipeline,
        profiles: Arc<CustomerProfileSource>,
        selection: CardSelection,
        pacing: Duration,
    ) -> Self {
        Self {
            pipeline,
            profiles,
            selection,
            pacing,
            next_card: AtomicUsize::new(0),
        }
    }

    fn pick_card<'a>(&self, cards: &'a [CardRecord]) -> &'a CardRecord {
        let index = match self.selection {
            CardSelection::Random => rand::thread_rng().gen_range(0..cards.len()),
            // Sequential selection cycles through the list and wraps around.
            CardSelection::Sequential => {
                self.next_card.fetch_add(1, Ordering::Relaxed) % cards.len()
            }
        };
        &cards[index]
    }

    #[tracing::instrument(skip(self), fields(card = tracing::field::Empty))]
    async fn run_iteration(&self, iteration: u32) -> Result<(), PipelineError> {
        let cards = self.profiles.cards()?;
        let card = self.pick_card(cards);
        tracing::Span::current().record("card", display(card.masked_number()));
        let result = self.pipeline.execute(card).await?;
        tracing::info!(
            checkout_id = %result.checkout_id,
            amount = result.transaction.amount,
            currency = %result.transaction.currency,
            "Iteration succeeded"
        );
        Ok(())
    }
}

/// The error and its causes on a single line.
fn describe(e: &dyn std::error::Error) -> String {
    let mut message = e.to_string();
    let mut current = e.source();
    while let Some(cause) = current {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        current = cause.source();
    }
    message
}

#[async_trait::async_trait]
impl SimulationRunner for RunExecutor {
    async fn run_once(&self, iterations: u32) -> Result<RunReport, anyhow::Error> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("Simulation run", %run_id, iterations);
        async move {
            let mut report = RunReport::new(run_id, Utc::now());
            tracing::info!("Starting run");
            for iteration in 1..=iterations {
                report.attempted += 1;
                match self.run_iteration(iteration).await {
                    Ok(()) => report.succeeded += 1,
                    Err(e) => {
                        tracing::error!(
                            error.cause_chain = ?e,
                            error.message = %e,
                            iteration,
                            "Iteration failed. Moving on to the next one"
                        );
                        report.failures.push(IterationFailure {
                            iteration,
                            stage: e.stage(),
                            message: describe(&e),
                        });
                    }
                }
                if iteration < iterations && !self.pacing.is_zero() {
                    tokio::time::sleep(self.pacing).await;
                }
            }
            report.finished_at = Utc::now();
            tracing::info!(
                attempted = report.attempted,
                succeeded = report.succeeded,
                failed = report.failures.len(),
                "Run finished"
            );
            Ok(report)
        }
        .instrument(span)
        .await
    }
}
