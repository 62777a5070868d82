//! # Vendor run conversion
//!
//! Vendor acquisition files are turned into mzML by an external tool before
//! they can be read. [`RunConverter`] is the seam; [`MsConvert`] drives
//! ProteoWizard's `msconvert`.
//!
//! Conversion is the only blocking step of an analysis. Each invocation has a
//! timeout, can be cancelled, and transient failures are retried a bounded
//! number of times by [`convert_with_retry`].

mod msconvert;

pub use msconvert::{MsConvert, MSCONVERT_ENV_VAR};

use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

/// Default per-file timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;
/// Default number of attempts for transient failures.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Default pause between attempts.
pub const DEFAULT_BACKOFF_MS: u64 = 2_000;

/// Errors raised while converting a vendor run.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// The converter executable could not be found
    #[error("converter executable not found: {program}")]
    ExecutableNotFound {
        /// Program that was looked up
        program: PathBuf,
    },

    /// The input is not a vendor format the converter handles
    #[error("unsupported input: {}", path.display())]
    UnsupportedInput {
        /// Offending input
        path: PathBuf,
    },

    /// The converter process could not be started
    #[error("failed to start converter: {0}")]
    Spawn(#[source] io::Error),

    /// The converter exited with a non-zero status
    #[error("converter failed on {} ({status}): {stderr}", path.display())]
    Failed {
        /// Input being converted
        path: PathBuf,
        /// Exit status description
        status: String,
        /// Captured standard error
        stderr: String,
    },

    /// The converter succeeded but the expected mzML is missing
    #[error("converter produced no output at {}", path.display())]
    MissingOutput {
        /// Expected output path
        path: PathBuf,
    },

    /// The converter ran longer than allowed and was killed
    #[error("conversion of {} timed out after {seconds}s", path.display())]
    Timeout {
        /// Input being converted
        path: PathBuf,
        /// Timeout in seconds
        seconds: u64,
    },

    /// The conversion was cancelled and the converter was killed
    #[error("conversion of {} was cancelled", path.display())]
    Cancelled {
        /// Input being converted
        path: PathBuf,
    },

    /// I/O error while waiting on the converter
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ConversionError {
    /// True for failures worth another attempt: timeouts and spawn errors
    /// caused by resource contention.
    pub fn is_transient(&self) -> bool {
        match self {
            ConversionError::Timeout { .. } => true,
            ConversionError::Spawn(e) | ConversionError::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}

/// Turns a vendor run into an mzML file.
pub trait RunConverter: Send + Sync {
    /// Convert `input` into an mzML file inside `output_dir` and return its path.
    fn convert(&self, input: &Path, output_dir: &Path) -> Result<PathBuf, ConversionError>;
}

/// Converter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Path to `msconvert`; looked up on `PATH` when unset
    pub executable: Option<PathBuf>,
    /// Per-file timeout in seconds
    pub timeout_secs: u64,
    /// Attempts for transient failures (at least one)
    pub max_attempts: u32,
    /// Pause between attempts in milliseconds
    pub backoff_ms: u64,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            executable: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_ms: DEFAULT_BACKOFF_MS,
        }
    }
}

impl ConverterConfig {
    /// Per-file timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Pause between attempts.
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// True if `path` is already an mzML file.
pub fn is_mzml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mzml"))
}

/// Run `converter`, retrying transient failures up to `max_attempts` times
/// with a fixed `backoff` between attempts.
pub fn convert_with_retry(
    converter: &dyn RunConverter,
    input: &Path,
    output_dir: &Path,
    max_attempts: u32,
    backoff: Duration,
) -> Result<PathBuf, ConversionError> {
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match converter.convert(input, output_dir) {
            Ok(path) => return Ok(path),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                warn!(
                    "Conversion attempt {}/{} for {} failed: {}; retrying",
                    attempt,
                    max_attempts,
                    input.display(),
                    e
                );
                attempt += 1;
                thread::sleep(backoff);
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails with the given errors in order, then succeeds.
    struct Flaky {
        calls: AtomicU32,
        failures: Vec<fn() -> ConversionError>,
    }

    impl RunConverter for Flaky {
        fn convert(&self, input: &Path, output_dir: &Path) -> Result<PathBuf, ConversionError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            match self.failures.get(call) {
                Some(make) => Err(make()),
                None => Ok(output_dir.join(input.with_extension("mzML"))),
            }
        }
    }

    fn timeout() -> ConversionError {
        ConversionError::Timeout {
            path: PathBuf::from("a.raw"),
            seconds: 1,
        }
    }

    fn failed() -> ConversionError {
        ConversionError::Failed {
            path: PathBuf::from("a.raw"),
            status: "exit status: 1".into(),
            stderr: "bad file".into(),
        }
    }

    #[test]
    fn test_transient_errors_are_retried() {
        let flaky = Flaky {
            calls: AtomicU32::new(0),
            failures: vec![timeout, timeout],
        };
        let out = convert_with_retry(
            &flaky,
            Path::new("a.raw"),
            Path::new("/tmp"),
            3,
            Duration::ZERO,
        );
        assert!(out.is_ok());
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_retries_are_bounded() {
        let flaky = Flaky {
            calls: AtomicU32::new(0),
            failures: vec![timeout, timeout, timeout],
        };
        let err = convert_with_retry(&flaky, Path::new("a.raw"), Path::new("/tmp"), 2, Duration::ZERO)
            .unwrap_err();
        assert!(matches!(err, ConversionError::Timeout { .. }));
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_permanent_errors_fail_fast() {
        let flaky = Flaky {
            calls: AtomicU32::new(0),
            failures: vec![failed],
        };
        let err = convert_with_retry(&flaky, Path::new("a.raw"), Path::new("/tmp"), 5, Duration::ZERO)
            .unwrap_err();
        assert!(err.to_string().contains("bad file"));
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_transient_classification() {
        assert!(timeout().is_transient());
        assert!(!failed().is_transient());
        assert!(ConversionError::Spawn(io::Error::from(io::ErrorKind::Interrupted)).is_transient());
        assert!(!ConversionError::Spawn(io::Error::from(io::ErrorKind::PermissionDenied)).is_transient());
    }

    #[test]
    fn test_is_mzml() {
        assert!(is_mzml(Path::new("run.mzML")));
        assert!(is_mzml(Path::new("RUN.MZML")));
        assert!(!is_mzml(Path::new("run.raw")));
        assert!(!is_mzml(Path::new("run")));
    }
}
