//! Runner for the external ffmpeg/ffprobe tools.

use lecture_core::{Error, Result};
use std::ffi::OsString;
use std::process::{Command, Stdio};

/// Number of stderr lines kept in a failure message.
const STDERR_TAIL_LINES: usize = 20;

/// Captured output of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs a program to completion, turning a non-zero exit into an error.
#[derive(Debug, Clone, Default)]
pub struct ToolRunner;

impl ToolRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run `program` with `args` and return its output. Arguments are passed
    /// through as-is, so paths need not be valid UTF-8.
    pub fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput> {
        log::debug!(
            "Running {} {}",
            program,
            args.iter().map(|a| a.to_string_lossy()).collect::<Vec<_>>().join(" ")
        );

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| Error::ToolFailed {
                program: program.to_string(),
                status: "not started".to_string(),
                stderr: e.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            return Err(Error::ToolFailed {
                program: program.to_string(),
                status: output.status.to_string(),
                stderr: stderr_tail(&stderr),
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }
}

/// Last lines of a tool's stderr, which is where ffmpeg reports the cause.
fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
