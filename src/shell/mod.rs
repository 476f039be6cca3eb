//! Process execution and environment detection.

pub mod command;
pub mod invoker;
pub mod platform;

pub use command::{
    execute_quiet, execute_streaming, OutputCallback, OutputLine, EXIT_NOT_EXECUTABLE,
    EXIT_NOT_FOUND, OUTPUT_TAIL_LINES,
};
pub use invoker::ShellInvoker;
pub use platform::{is_ci, is_elevated, shell_flag, system_shell};
