//! Process environment detection.

/// Check if running in a CI environment.
///
/// CI runs are never interactive: no menu, no reboot prompt.
pub fn is_ci() -> bool {
    ["CI", "GITHUB_ACTIONS", "GITLAB_CI", "CIRCLECI", "JENKINS_URL"]
        .iter()
        .any(|var| std::env::var_os(var).is_some())
}

/// Check if the effective user is root.
pub fn is_elevated() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: geteuid() is a simple syscall that returns the effective user ID
        unsafe { libc::geteuid() == 0 }
    }

    #[cfg(not(unix))]
    {
        false
    }
}

/// Shell used to run `reconcile_command` and `reboot_command`.
pub fn system_shell() -> &'static str {
    if cfg!(target_os = "windows") {
        "cmd.exe"
    } else {
        "/bin/sh"
    }
}

/// Flag that passes a command string to [`system_shell`].
pub fn shell_flag() -> &'static str {
    if cfg!(target_os = "windows") {
        "/C"
    } else {
        "-c"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_ci_does_not_panic() {
        let _ = is_ci();
    }

    #[cfg(unix)]
    #[test]
    fn is_elevated_matches_euid() {
        let euid = unsafe { libc::geteuid() };
        assert_eq!(is_elevated(), euid == 0);
    }

    #[cfg(unix)]
    #[test]
    fn unix_shell_is_posix_sh() {
        assert_eq!(system_shell(), "/bin/sh");
        assert_eq!(shell_flag(), "-c");
    }
}
