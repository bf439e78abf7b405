//! Audio duration probing.

use crate::runner::ToolRunner;
use lecture_core::{Error, Result};
use std::ffi::OsString;
use std::path::Path;

/// Shortest duration ffmpeg can be given at millisecond precision.
pub const MIN_DURATION_SECS: f64 = 0.001;

/// Measures the playing time of an audio file.
pub trait MediaProbe {
    /// Duration in seconds. Fails when the file cannot be decoded.
    fn duration(&self, path: &Path) -> Result<f64>;
}

/// Probe backed by the `ffprobe` command line tool.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    program: String,
    runner: ToolRunner,
}

impl FfprobeProbe {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            runner: ToolRunner::new(),
        }
    }
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl MediaProbe for FfprobeProbe {
    fn duration(&self, path: &Path) -> Result<f64> {
        let args = probe_args(path);
        let output = self.runner.run(&self.program, &args).map_err(|e| Error::ProbeError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        parse_duration(&output.stdout).ok_or_else(|| Error::ProbeError {
            path: path.to_path_buf(),
            message: format!("no usable duration in ffprobe output {:?}", output.stdout.trim()),
        })
    }
}

/// ffprobe arguments printing only the container duration. The path is
/// passed as-is.
fn probe_args(path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-v",
        "error",
        "-show_entries",
        "format=duration",
        "-of",
        "default=noprint_wrappers=1:nokey=1",
    ]
    .iter()
    .map(OsString::from)
    .collect();
    args.push(path.as_os_str().to_os_string());
    args
}

/// Parse ffprobe's bare duration output; rejects `N/A`, negatives and
/// anything below [`MIN_DURATION_SECS`].
pub fn parse_duration(stdout: &str) -> Option<f64> {
    stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .and_then(|l| l.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= MIN_DURATION_SECS)
}
