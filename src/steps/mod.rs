//! Steps and single-step execution.
//!
//! - [`Step`] - a catalog entry: precondition probe plus action
//! - [`StepRunner`] - probe, act at most once, classify
//! - [`StepResult`] / [`StepOutcome`] - what happened
//!
//! # Example
//!
//! ```
//! use armory::action::{Action, ActionInvoker, Invocation, InvocationOutput};
//! use armory::error::Result;
//! use armory::probe::{Probe, SystemChecker};
//! use armory::steps::{RunnerConfig, Step, StepOutcome, StepRunner};
//!
//! struct Noop;
//! impl ActionInvoker for Noop {
//!     fn invoke(&mut self, _: &Invocation) -> Result<InvocationOutput> {
//!         Ok(InvocationOutput::exited(0, ""))
//!     }
//! }
//!
//! let step = Step::new(
//!     "root-dir",
//!     "Root directory",
//!     Probe::DirectoryExists("/".into()),
//!     Action::Shell { run: "mkdir /".into() },
//! );
//! let checker = SystemChecker::new();
//! let mut invoker = Noop;
//! let mut runner = StepRunner::new(&checker, &mut invoker, RunnerConfig::default());
//!
//! assert_eq!(runner.run(&step).unwrap().outcome, StepOutcome::Skipped);
//! ```

pub mod result;
pub mod runner;
pub mod step;

pub use result::{format_duration, StepOutcome, StepResult};
pub use runner::{RunnerConfig, StepRunner};
pub use step::Step;
