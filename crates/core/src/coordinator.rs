// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fan-out coordinator
//!
//! Launches every worker at once and waits on the completion group. Under
//! [`FailurePolicy::Abort`] the first worker error aborts the remaining
//! workers and fails the run; under [`FailurePolicy::Isolate`] every outcome
//! is collected.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::{JoinError, JoinSet};
use tracing::{error, info, warn};

use crate::completion::{CompletionGroup, CompletionSummary};
use crate::config::{FailurePolicy, HarnessConfig};
use crate::error::{HarnessError, WorkerError};
use crate::progress::Progress;
use crate::worker::{Worker, WorkerReport};

type Joined = Result<(usize, Result<WorkerReport, WorkerError>), JoinError>;

/// Outcome of a single worker
#[derive(Debug)]
pub struct WorkerOutcome {
    pub worker: usize,
    pub result: Result<WorkerReport, WorkerError>,
}

/// Outcome of a whole run
#[derive(Debug)]
pub struct RunReport {
    /// Every worker's outcome, ordered by worker id
    pub outcomes: Vec<WorkerOutcome>,
    pub completion: CompletionSummary,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn reports(&self) -> impl Iterator<Item = &WorkerReport> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (usize, &WorkerError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.worker, e)))
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Launches the configured workers and waits for all of them
pub struct Coordinator<P> {
    config: HarnessConfig,
    progress: Arc<P>,
}

impl<P: Progress> Coordinator<P> {
    pub fn new(config: HarnessConfig, progress: P) -> Self {
        Self {
            config,
            progress: Arc::new(progress),
        }
    }

    pub async fn run(&self) -> Result<RunReport, HarnessError> {
        let started = Instant::now();
        let group = CompletionGroup::new();
        let mut workers = JoinSet::new();

        info!(
            endpoint = %self.config.endpoint,
            workers = self.config.worker_count,
            policy = ?self.config.failure_policy,
            "launching workers"
        );

        for id in 0..self.config.worker_count {
            let token = group.register();
            let worker = Worker::new(id, &self.config, Arc::clone(&self.progress));
            workers.spawn(async move { (id, worker.run(token).await) });
        }

        let mut outcomes = Vec::with_capacity(self.config.worker_count);

        let completion = loop {
            tokio::select! {
                completion = group.wait() => break completion,
                Some(joined) = workers.join_next() => {
                    self.collect(joined, &mut outcomes, &mut workers)?;
                }
            }
        };

        // Workers signal completion before closing; collect their reports.
        while let Some(joined) = workers.join_next().await {
            self.collect(joined, &mut outcomes, &mut workers)?;
        }

        outcomes.sort_by_key(|o| o.worker);
        let report = RunReport {
            outcomes,
            completion,
            elapsed: started.elapsed(),
        };

        info!(
            completed = report.completion.completed,
            failed = report.completion.abandoned,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "all workers finished"
        );
        Ok(report)
    }

    fn collect(
        &self,
        joined: Joined,
        outcomes: &mut Vec<WorkerOutcome>,
        workers: &mut JoinSet<(usize, Result<WorkerReport, WorkerError>)>,
    ) -> Result<(), HarnessError> {
        let (worker, result) = match joined {
            Ok(joined) => joined,
            Err(e) => {
                workers.abort_all();
                return Err(HarnessError::Join(e));
            }
        };

        match result {
            Err(source) if self.config.failure_policy == FailurePolicy::Abort => {
                error!(worker, error = %source, "worker failed, aborting run");
                workers.abort_all();
                Err(HarnessError::Worker { worker, source })
            }
            result => {
                if let Err(e) = &result {
                    warn!(worker, error = %e, "worker failed");
                }
                outcomes.push(WorkerOutcome { worker, result });
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
