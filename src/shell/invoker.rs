//! The process-spawning [`ActionInvoker`].

use super::command::{execute_streaming, OutputLine};
use crate::action::{ActionInvoker, Invocation, InvocationOutput};
use crate::error::Result;
use tracing::debug;

/// Runs invocations as child processes of armory.
///
/// Output is captured for the step report and, when a sink is attached,
/// forwarded line by line as it arrives.
#[derive(Default)]
pub struct ShellInvoker<'a> {
    sink: Option<Box<dyn FnMut(&OutputLine) + 'a>>,
}

impl<'a> ShellInvoker<'a> {
    pub fn new() -> Self {
        Self { sink: None }
    }

    /// Forward each output line to `sink` while the child runs.
    pub fn with_output(mut self, sink: impl FnMut(&OutputLine) + 'a) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }
}

impl ActionInvoker for ShellInvoker<'_> {
    fn invoke(&mut self, invocation: &Invocation) -> Result<InvocationOutput> {
        debug!("Invoking {}", invocation);
        let result = match self.sink.as_mut() {
            Some(sink) => execute_streaming(invocation, Some(sink.as_mut())),
            None => execute_streaming(invocation, None),
        }?;
        debug!(
            "{} finished: exit={:?} signal={:?} in {:?}",
            invocation.program, result.exit_code, result.signal, result.duration
        );
        Ok(result)
    }
}
