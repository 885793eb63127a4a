use anyhow::{Context, Result};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

/// Run a command in `dir`, streaming stdout while capturing stderr
///
/// On a non-zero exit the error message is the command's stderr, unchanged.
/// On success, anything written to stderr is passed through.
pub fn run_streaming_in(dir: &Path, cmd: &str, args: &[&str]) -> Result<()> {
    log::debug!("running in {}: {} {}", dir.display(), cmd, args.join(" "));
    let output = Command::new(cmd)
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::piped())
        .output()
        .with_context(|| format!("Failed to execute: {} {}", cmd, args.join(" ")))?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    if output.status.success() {
        eprint!("{stderr}");
        Ok(())
    } else {
        Err(failure(cmd, output.status, &stderr))
    }
}

/// Run a command in `dir` and capture stdout
///
/// On a non-zero exit the error message is the command's stderr, unchanged.
pub fn run_capture_in(dir: &Path, cmd: &str, args: &[&str]) -> Result<String> {
    log::debug!("capturing in {}: {} {}", dir.display(), cmd, args.join(" "));
    let output = Command::new(cmd)
        .args(args)
        .current_dir(dir)
        .output()
        .with_context(|| format!("Failed to execute: {} {}", cmd, args.join(" ")))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        Err(failure(cmd, output.status, &String::from_utf8_lossy(&output.stderr)))
    }
}

/// Error for a failed command: its stderr verbatim, or the exit status if it said nothing
fn failure(cmd: &str, status: ExitStatus, stderr: &str) -> anyhow::Error {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        anyhow::anyhow!("{cmd} exited with {status}")
    } else {
        anyhow::anyhow!("{stderr}")
    }
}

/// Check if a command exists
pub fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
