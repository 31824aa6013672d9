//! Poll scheduler.
//!
//! Runs one repeating loop per registered engine. Every iteration spawns a
//! sweep and then sleeps; a slow sweep never delays the next tick, so two
//! sweeps of the same source may overlap.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, Instrument};

use super::clock::Clock;
use super::engine::SyncEngine;

struct Job {
    engine: Arc<SyncEngine>,
    delay: Duration,
}

/// Owns the poll loops until started.
pub struct PollScheduler {
    clock: Arc<dyn Clock>,
    jobs: Vec<Job>,
}

impl PollScheduler {
    /// Create a scheduler that sleeps on `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            jobs: Vec::new(),
        }
    }

    /// Register an engine to be swept every `delay`.
    pub fn register(&mut self, engine: Arc<SyncEngine>, delay: Duration) -> &mut Self {
        self.jobs.push(Job { engine, delay });
        self
    }

    /// Number of registered engines.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether no engine is registered.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Spawn one loop per registered engine.
    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handles = self
            .jobs
            .into_iter()
            .map(|job| {
                tokio::spawn(run_loop(
                    job.engine,
                    job.delay,
                    Arc::clone(&self.clock),
                    shutdown_rx.clone(),
                ))
            })
            .collect();

        SchedulerHandle {
            shutdown_tx,
            handles,
        }
    }
}

/// Handle to running poll loops.
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Ask every loop to stop before its next sweep.
    ///
    /// Returns immediately. Sweeps already in flight run to completion.
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Wait for every loop to exit.
    pub async fn wait(self) {
        for result in join_all(self.handles).await {
            if let Err(e) = result {
                error!("poll loop terminated abnormally: {}", e);
            }
        }
    }
}

async fn run_loop(
    engine: Arc<SyncEngine>,
    delay: Duration,
    clock: Arc<dyn Clock>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let source = engine.source_name().to_string();
    info!(source = %source, delay_secs = delay.as_secs(), "poll loop started");

    while !*shutdown_rx.borrow_and_update() {
        let sweep_engine = Arc::clone(&engine);
        let span = info_span!("sweep", source = %source);
        tokio::spawn(
            async move {
                if let Err(e) = sweep_engine.sweep().await {
                    error!(error = %e, "sweep failed");
                }
            }
            .instrument(span),
        );

        tokio::select! {
            _ = clock.sleep(delay) => {}
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    info!(source = %source, "poll loop stopped");
}
