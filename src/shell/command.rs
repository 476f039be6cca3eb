//! Child process execution.

use crate::action::{Invocation, InvocationOutput};
use crate::error::{ArmoryError, Result};
use std::collections::VecDeque;
use std::io::{BufRead, BufReader, ErrorKind};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Instant;

/// Lines of combined output kept for the step report.
pub const OUTPUT_TAIL_LINES: usize = 40;

/// Exit code reported when the program does not exist.
pub const EXIT_NOT_FOUND: i32 = 127;

/// Exit code reported when the program cannot be executed.
pub const EXIT_NOT_EXECUTABLE: i32 = 126;

/// Output line from a running child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLine {
    Stdout(String),
    Stderr(String),
}

impl OutputLine {
    pub fn text(&self) -> &str {
        match self {
            OutputLine::Stdout(s) | OutputLine::Stderr(s) => s,
        }
    }
}

/// Callback for streamed output.
pub type OutputCallback<'a> = &'a mut dyn FnMut(&OutputLine);

/// Run `invocation` to completion, streaming its output to `callback`.
///
/// A missing or non-executable program is reported like a shell would
/// (exit 127 / 126). Any other spawn or wait failure means the machine
/// cannot run actions at all and is returned as `FatalEnvironment`.
pub fn execute_streaming(
    invocation: &Invocation,
    mut callback: Option<OutputCallback<'_>>,
) -> Result<InvocationOutput> {
    let start = Instant::now();

    let mut cmd = Command::new(&invocation.program);
    cmd.args(&invocation.args)
        .envs(invocation.env.iter().map(|(k, v)| (k, v)))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::NotFound => EXIT_NOT_FOUND,
                ErrorKind::PermissionDenied => EXIT_NOT_EXECUTABLE,
                _ => {
                    return Err(ArmoryError::FatalEnvironment {
                        message: format!("cannot start {}: {}", invocation.program, e),
                    })
                }
            };
            let mut out =
                InvocationOutput::exited(code, format!("{}: {}", invocation.program, e));
            out.duration = start.elapsed();
            return Ok(out);
        }
    };

    let (tx, rx) = mpsc::channel();
    let mut readers = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        let tx = tx.clone();
        readers.push(thread::spawn(move || {
            for line in BufReader::new(stdout).lines().map_while(std::result::Result::ok) {
                let _ = tx.send(OutputLine::Stdout(line));
            }
        }));
    }
    if let Some(stderr) = child.stderr.take() {
        let tx = tx.clone();
        readers.push(thread::spawn(move || {
            for line in BufReader::new(stderr).lines().map_while(std::result::Result::ok) {
                let _ = tx.send(OutputLine::Stderr(line));
            }
        }));
    }
    drop(tx);

    let mut tail = VecDeque::with_capacity(OUTPUT_TAIL_LINES);
    for line in rx {
        if let Some(cb) = callback.as_deref_mut() {
            cb(&line);
        }
        if tail.len() == OUTPUT_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line.text().to_string());
    }
    for handle in readers {
        let _ = handle.join();
    }

    let status = child.wait().map_err(|e| ArmoryError::FatalEnvironment {
        message: format!("lost track of {}: {}", invocation.program, e),
    })?;

    let mut output = Vec::from(tail).join("\n");
    if !output.is_empty() {
        output.push('\n');
    }
    Ok(InvocationOutput {
        exit_code: status.code(),
        signal: terminating_signal(&status),
        output,
        duration: start.elapsed(),
    })
}

/// Run `invocation` without streaming.
pub fn execute_quiet(invocation: &Invocation) -> Result<InvocationOutput> {
    execute_streaming(invocation, None)
}

#[cfg(unix)]
fn terminating_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn terminating_signal(_status: &ExitStatus) -> Option<i32> {
    None
}
