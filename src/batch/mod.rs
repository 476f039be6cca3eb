//! Batches: many steps, one report.
//!
//! - [`BatchExecutor`] - runs selected steps in order, tolerating failures
//! - [`BatchReport`] - ordered results plus aggregate flags
//! - [`Reconciler`] - end-of-batch handling of pending restarts
//!
//! A batch runs one step at a time, strictly in the requested order; no
//! step starts before the previous step's action has exited.

pub mod executor;
pub mod reconcile;
pub mod report;

pub use executor::{BatchExecutor, BatchProgress};
pub use reconcile::{
    from_settings as reconciler_from_settings, CommandReconciler, PendingReconciler,
    ReconcileStatus, Reconciler,
};
pub use report::{BatchAborted, BatchReport, BatchState};
