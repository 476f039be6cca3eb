//! Batch execution.

use tracing::{info, warn};

use super::reconcile::{ReconcileStatus, Reconciler};
use super::report::{BatchAborted, BatchReport, BatchState};
use crate::catalog::StepCatalog;
use crate::steps::{StepOutcome, StepResult, StepRunner};

/// Progress events emitted while a batch runs.
#[derive(Debug)]
pub enum BatchProgress<'a> {
    /// A step is about to be attempted.
    StepStarting {
        id: &'a str,
        index: usize,
        total: usize,
    },
    /// A step produced its result.
    StepFinished {
        result: &'a StepResult,
        index: usize,
        total: usize,
    },
    /// Every step is done and pending restarts are being reconciled.
    Reconciling,
}

/// Runs selected steps in order and aggregates their results.
pub struct BatchExecutor<'a> {
    catalog: &'a StepCatalog,
    runner: StepRunner<'a>,
    reconciler: &'a mut dyn Reconciler,
    state: BatchState,
}

impl<'a> BatchExecutor<'a> {
    pub fn new(
        catalog: &'a StepCatalog,
        runner: StepRunner<'a>,
        reconciler: &'a mut dyn Reconciler,
    ) -> Self {
        Self {
            catalog,
            runner,
            reconciler,
            state: BatchState::Pending,
        }
    }

    /// State of the most recent batch.
    pub fn state(&self) -> BatchState {
        self.state
    }

    /// Run `ids` in order.
    ///
    /// See [`execute_with_progress`](Self::execute_with_progress).
    pub fn execute<S: AsRef<str>>(&mut self, ids: &[S]) -> Result<BatchReport, BatchAborted> {
        self.execute_with_progress(ids, |_| {})
    }

    /// Run `ids` in order, reporting progress to `on_progress`.
    ///
    /// Unknown ids and failing steps are recorded and the batch moves on.
    /// Pending restarts are reconciled once, after the last step, if any
    /// restart-sensitive step succeeded. A fatal environment error stops
    /// the batch immediately and is returned with the partial report.
    pub fn execute_with_progress<S: AsRef<str>>(
        &mut self,
        ids: &[S],
        mut on_progress: impl FnMut(BatchProgress<'_>),
    ) -> Result<BatchReport, BatchAborted> {
        self.state = BatchState::Running;
        let total = ids.len();
        let mut report = BatchReport::new();
        let mut restart_pending = false;

        for (index, id) in ids.iter().enumerate() {
            let id = id.as_ref();
            on_progress(BatchProgress::StepStarting { id, index, total });

            let result = match self.catalog.get(id) {
                Err(_) => {
                    warn!("Unknown step '{}' requested", id);
                    StepResult::unknown_step(id)
                }
                Ok(step) => match self.runner.run(step) {
                    Ok(result) => {
                        if step.restart_sensitive && result.outcome == StepOutcome::Succeeded {
                            restart_pending = true;
                        }
                        result
                    }
                    Err(error) => {
                        warn!("Aborting batch at '{}': {}", id, error);
                        self.state = BatchState::Aborted;
                        report.needs_restart = restart_pending;
                        return Err(BatchAborted { report, error });
                    }
                },
            };

            report.push(result);
            if let Some(result) = report.results.last() {
                on_progress(BatchProgress::StepFinished {
                    result,
                    index,
                    total,
                });
            }
        }

        if restart_pending {
            on_progress(BatchProgress::Reconciling);
            let status = match self.reconciler.reconcile_restarts() {
                Ok(status) => status,
                Err(e) => {
                    warn!("Restart reconciliation failed: {}", e);
                    ReconcileStatus::pending(format!("reconciliation failed: {}", e))
                }
            };
            report.needs_restart = !status.all_clear;
            report.reconciliation = Some(status);
        }

        info!(
            "Batch completed: {}{}",
            report.counts_line(),
            if report.needs_restart {
                ", restart pending"
            } else {
                ""
            }
        );
        self.state = BatchState::Completed;
        Ok(report)
    }
}
