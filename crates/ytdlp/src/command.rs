//! Subprocess construction helpers for the external tool.

use std::ffi::OsStr;
use std::process::ExitStatus;

use tokio::process::Command;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Create a `tokio::process::Command` for the tool binary.
///
/// On Windows the `CREATE_NO_WINDOW` flag keeps the child from popping a
/// console window; elsewhere this is a plain command.
pub fn tool_command(program: impl AsRef<OsStr>) -> Command {
    let mut cmd = Command::new(program);
    #[cfg(windows)]
    {
        cmd.creation_flags(CREATE_NO_WINDOW);
    }
    cmd
}

/// Distill the tool's stderr into a single human-readable reason.
///
/// Prefers the last `ERROR:`-tagged line the tool printed, then the last
/// non-empty line, then the raw exit status.
pub(crate) fn failure_reason(stderr: &str, status: ExitStatus) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    lines
        .iter()
        .rev()
        .find(|line| line.starts_with("ERROR:"))
        .map(|line| line.trim_start_matches("ERROR:").trim().to_string())
        .or_else(|| lines.last().map(|line| line.to_string()))
        .unwrap_or_else(|| format!("tool exited with {status}"))
}
