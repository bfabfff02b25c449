//! Worker pool for parallel trial execution.
//!
//! Epistemic foundation:
//! - K_i: Trials are independent; trial `i` is fully determined by `(seed, i)`
//! - K_i: Workers pull batches from a shared cursor and never share state
//! - B_i: A worker may fail or panic → the whole run aborts
//! - I^R: Worker count and batch size are configurable

use crate::models::{ExperimentPlan, Result, SimError, Tally, TrialResult};
use crate::pipeline::TrialEvaluator;
use crate::report::ReportSink;
use crate::room::SearchStrategy;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Workers allowed per logical CPU.
const WORKERS_PER_CPU: usize = 4;

/// Upper bound on pool workers for this machine.
pub fn max_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .saturating_mul(WORKERS_PER_CPU)
}

/// A contiguous run of finished trials from one worker.
#[derive(Debug)]
struct TrialBatch {
    start: u64,
    results: Vec<TrialResult>,
    tally: Tally,
}

/// Pool of blocking workers that evaluate trials in parallel.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    /// Number of blocking workers
    workers: usize,
    /// Trials claimed per cursor step
    batch_size: usize,
}

impl WorkerPool {
    /// Create a new worker pool. Zero values are raised to 1 and the worker
    /// count is capped at [`max_workers`].
    pub fn new(workers: usize, batch_size: usize) -> Self {
        Self {
            workers: workers.clamp(1, max_workers()),
            batch_size: batch_size.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run every trial of `plan` and return the reduced counters.
    ///
    /// `sink.on_trial` sees trials in index order regardless of which worker
    /// finished first.
    pub async fn run<S>(
        &self,
        plan: &ExperimentPlan,
        evaluator: Arc<TrialEvaluator<S>>,
        sink: &mut dyn ReportSink,
    ) -> Result<Tally>
    where
        S: SearchStrategy + 'static,
    {
        debug!(
            workers = self.workers,
            batch_size = self.batch_size,
            runs = plan.runs(),
            "Starting worker pool"
        );

        let cursor = Arc::new(AtomicU64::new(0));
        let cancelled = Arc::new(AtomicBool::new(false));
        let (tx, mut rx) = mpsc::channel::<Result<TrialBatch>>(self.workers.saturating_mul(2));

        let handles: Vec<JoinHandle<()>> = (0..self.workers)
            .map(|worker_id| {
                let evaluator = Arc::clone(&evaluator);
                let cursor = Arc::clone(&cursor);
                let cancelled = Arc::clone(&cancelled);
                let tx = tx.clone();
                let (runs, seed) = (plan.runs(), plan.seed());
                let batch_size = self.batch_size as u64;

                tokio::task::spawn_blocking(move || {
                    while !cancelled.load(Ordering::Relaxed) {
                        let start = cursor.fetch_add(batch_size, Ordering::Relaxed);
                        if start >= runs {
                            break;
                        }
                        let end = start.saturating_add(batch_size).min(runs);
                        let batch = evaluate_range(&evaluator, seed, start, end);
                        let failed = batch.is_err();
                        if failed {
                            cancelled.store(true, Ordering::Relaxed);
                        }
                        if tx.blocking_send(batch).is_err() || failed {
                            break;
                        }
                    }
                    debug!(worker_id, "Worker finished");
                })
            })
            .collect();
        drop(tx);

        let mut pending: BTreeMap<u64, TrialBatch> = BTreeMap::new();
        let mut next = 0u64;
        let mut running = Tally::default();
        let mut reduced = Tally::default();
        let mut failure = None;

        while let Some(message) = rx.recv().await {
            let batch = match message {
                Ok(batch) => batch,
                Err(e) => {
                    cancelled.store(true, Ordering::Relaxed);
                    failure = Some(e);
                    break;
                }
            };
            pending.insert(batch.start, batch);

            while let Some(batch) = pending.remove(&next) {
                for trial in &batch.results {
                    running.record(trial);
                    sink.on_trial(trial, &running);
                }
                next += batch.results.len() as u64;
                reduced.merge(&batch.tally);
            }
        }
        drop(rx);

        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Worker panicked");
                if failure.is_none() {
                    failure = Some(SimError::WorkerPanicked(e.to_string()));
                }
            }
        }

        if let Some(e) = failure {
            return Err(e);
        }
        if next != plan.runs() {
            warn!(delivered = next, runs = plan.runs(), "Trial channel closed early");
            return Err(SimError::ChannelClosed);
        }
        if reduced != running {
            return Err(SimError::Internal(format!(
                "worker tallies {:?} disagree with delivered trials {:?}",
                reduced, running
            )));
        }

        Ok(reduced)
    }
}

fn evaluate_range<S: SearchStrategy>(
    evaluator: &TrialEvaluator<S>,
    seed: u64,
    start: u64,
    end: u64,
) -> Result<TrialBatch> {
    let mut results = Vec::with_capacity((end - start) as usize);
    let mut tally = Tally::default();
    for index in start..end {
        let trial = evaluator.evaluate_seeded(seed, index)?;
        tally.record(&trial);
        results.push(trial);
    }
    Ok(TrialBatch {
        start,
        results,
        tally,
    })
}
