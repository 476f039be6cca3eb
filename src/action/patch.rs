//! In-process file patching.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::Instant;

use super::InvocationOutput;

/// Append `line` to `path` unless the file already has an identical line.
///
/// Missing parent directories and the file itself are created. IO problems
/// are reported as exit code 1 with the error text as output, like any
/// other failed action.
pub fn append_line(path: &str, line: &str) -> InvocationOutput {
    let start = Instant::now();
    let mut out = match try_append(Path::new(path), line) {
        Ok(true) => InvocationOutput::exited(0, format!("appended to {}", path)),
        Ok(false) => InvocationOutput::exited(0, format!("{} already contains the line", path)),
        Err(e) => InvocationOutput::exited(1, format!("cannot patch {}: {}", path, e)),
    };
    out.duration = start.elapsed();
    out
}

fn try_append(path: &Path, line: &str) -> std::io::Result<bool> {
    let existing = match fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(e),
    };

    if let Some(content) = &existing {
        if content.lines().any(|l| l.trim_end() == line.trim_end()) {
            return Ok(false);
        }
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let needs_newline = existing
        .as_deref()
        .is_some_and(|c| !c.is_empty() && !c.ends_with('\n'));
    if needs_newline {
        writeln!(file)?;
    }
    writeln!(file, "{}", line)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_missing_file_and_parents() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("etc/profile.d/armory.sh");

        let out = append_line(path.to_str().unwrap(), "export GOPATH=/opt/go");

        assert!(out.success());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "export GOPATH=/opt/go\n"
        );
    }

    #[test]
    fn second_append_is_noop() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("rc");
        let p = path.to_str().unwrap();

        append_line(p, "alias k=kubectl");
        let out = append_line(p, "alias k=kubectl");

        assert!(out.success());
        assert!(out.output.contains("already contains"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "alias k=kubectl\n");
    }

    #[test]
    fn adds_newline_before_appending_to_unterminated_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("rc");
        fs::write(&path, "first").unwrap();

        append_line(path.to_str().unwrap(), "second");

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn directory_target_fails_with_exit_one() {
        let temp = TempDir::new().unwrap();

        let out = append_line(temp.path().to_str().unwrap(), "x");

        assert_eq!(out.exit_code, Some(1));
        assert!(out.output.contains("cannot patch"));
    }
}
