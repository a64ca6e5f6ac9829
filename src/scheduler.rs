//! src/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use tokio::sync::watch;

use crate::run_executor::SimulationRunner;

/// Timing of the background loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Schedule {
    pub interval: Duration,
    /// Upper bound of the random delay added on top of `interval`
    pub jitter: Duration,
    pub iterations: u32,
    pub start_delay: Duration,
}

impl Schedule {
    /// Pause before the next run: the interval plus a whole number of
    /// seconds drawn uniformly from `0..=jitter`.
    pub fn next_sleep<R: Rng>(&self, rng: &mut R) -> Duration {
        let extra = rng.gen_range(0..=self.jitter.as_secs());
        self.interval.saturating_add(Duration::from_secs(extra))
    }
}

/// When a pause of `sleep` starting at `now` ends, or `None` if that lies
/// beyond what a timestamp can represent.
fn wake_time(now: DateTime<Utc>, sleep: Duration) -> Option<DateTime<Utc>> {
    let sleep = chrono::Duration::from_std(sleep).ok()?;
    now.checked_add_signed(sleep)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Sleeping,
    Stopped,
}

/// Sender half of the stop signal, held by whoever owns the scheduler.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<watch::Sender<bool>>);

/// Receiver half of the stop signal, handed to the scheduler.
#[derive(Debug, Clone)]
pub struct StopSignal(watch::Receiver<bool>);

pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (sender, receiver) = watch::channel(false);
    (StopHandle(Arc::new(sender)), StopSignal(receiver))
}

impl StopHandle {
    pub fn stop(&self) {
        self.0.send_replace(true);
    }
}

impl StopSignal {
    pub fn is_stopped(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once a stop has been requested, or once every handle has
    /// been dropped.
    pub async fn stopped(&mut self) {
        let _ = self.0.wait_for(|stopped| *stopped).await;
    }
}

/// Repeatedly triggers simulation runs until told to stop.
pub struct Scheduler {
    runner: Arc<dyn SimulationRunner>,
    schedule: Schedule,
    state: SchedulerState,
}

impl Scheduler {
    pub fn new(runner: Arc<dyn SimulationRunner>, schedule: Schedule) -> Self {
        Self {
            runner,
            schedule,
            state: SchedulerState::Idle,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    fn transition(&mut self, state: SchedulerState) {
        tracing::debug!(from = ?self.state, to = ?state, "Scheduler state change");
        self.state = state;
    }

    /// Drive the loop until `stop` fires. Sleeps are interrupted
    /// immediately; a run in progress is allowed to finish first.
    pub async fn run_until_stopped(mut self, mut stop: StopSignal) -> SchedulerState {
        tracing::info!(
            start_delay_seconds = self.schedule.start_delay.as_secs(),
            interval_seconds = self.schedule.interval.as_secs(),
            jitter_seconds = self.schedule.jitter.as_secs(),
            iterations = self.schedule.iterations,
            "Scheduler starting"
        );
        if !self.pause(self.schedule.start_delay, &mut stop).await {
            return self.stop();
        }
        loop {
            if stop.is_stopped() {
                return self.stop();
            }
            self.transition(SchedulerState::Running);
            self.run_contained().await;

            let sleep = self.schedule.next_sleep(&mut rand::thread_rng());
            match wake_time(Utc::now(), sleep) {
                Some(wake_at) => tracing::info!(
                    sleep_seconds = sleep.as_secs(),
                    next_run_at = %wake_at.to_rfc3339(),
                    "Sleeping until the next run"
                ),
                None => tracing::warn!(
                    sleep_seconds = sleep.as_secs(),
                    "Sleeping until the next run, which is too far away to timestamp"
                ),
            }
            self.transition(SchedulerState::Sleeping);
            if !self.pause(sleep, &mut stop).await {
                return self.stop();
            }
        }
    }

    /// Returns `false` if a stop was requested during the pause.
    async fn pause(&self, duration: Duration, stop: &mut StopSignal) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = stop.stopped() => false,
        }
    }

    fn stop(&mut self) -> SchedulerState {
        self.transition(SchedulerState::Stopped);
        tracing::info!("Scheduler stopped");
        self.state
    }

    /// A failing or panicking run is logged and never ends the loop.
    async fn run_contained(&self) {
        let runner = self.runner.clone();
        let iterations = self.schedule.iterations;
        let started_at = Utc::now();
        tracing::info!(started_at = %started_at.to_rfc3339(), "Scheduled run starting");
        let outcome = tokio::spawn(async move { runner.run_once(iterations).await }).await;
        match outcome {
            Ok(Ok(report)) => tracing::info!(
                run_id = %report.run_id,
                succeeded = report.succeeded,
                failed = report.failures.len(),
                finished_at = %report.finished_at.to_rfc3339(),
                "Scheduled run finished"
            ),
            Ok(Err(e)) => tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                failed_at = %Utc::now().to_rfc3339(),
                "Scheduled run failed. The scheduler keeps going"
            ),
            Err(e) => tracing::error!(
                error.message = %e,
                failed_at = %Utc::now().to_rfc3339(),
                "Scheduled run panicked. The scheduler keeps going"
            ),
        }
    }
}
