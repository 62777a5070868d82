use std::ffi::OsString;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver};
use log::{debug, info};

use super::{ConversionError, ConverterConfig, RunConverter};

/// Environment variable that overrides the `msconvert` executable.
pub const MSCONVERT_ENV_VAR: &str = "LCMS_QC_MSCONVERT";

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Vendor formats handed to `msconvert`. Directory formats (Waters `.raw`,
/// Agilent/Bruker `.d`) are matched by extension like files.
const SUPPORTED_EXTENSIONS: &[&str] = &["raw", "d", "wiff", "wiff2", "lcd", "mzxml"];

/// Runs ProteoWizard `msconvert` as a child process.
///
/// ```no_run
/// use lcms_qc::converter::{MsConvert, RunConverter};
/// use std::path::Path;
///
/// let converter = MsConvert::new("msconvert");
/// let mzml = converter.convert(Path::new("plate1/A1.raw"), Path::new("/tmp/mzml"))?;
/// # Ok::<(), lcms_qc::converter::ConversionError>(())
/// ```
#[derive(Debug, Clone)]
pub struct MsConvert {
    executable: PathBuf,
    timeout: Duration,
    cancelled: Arc<AtomicBool>,
}

impl MsConvert {
    /// Converter using `executable` and the default timeout.
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            timeout: ConverterConfig::default().timeout(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Converter from settings. Without a configured executable, the
    /// `LCMS_QC_MSCONVERT` environment variable is consulted, then `msconvert`
    /// on `PATH`.
    pub fn from_config(config: &ConverterConfig) -> Self {
        let executable = config
            .executable
            .clone()
            .or_else(|| std::env::var_os(MSCONVERT_ENV_VAR).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("msconvert"));
        Self::new(executable).with_timeout(config.timeout())
    }

    /// Set the per-file timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Shared flag; setting it kills any running conversion.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Executable in use.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// True if `path` has a vendor extension `msconvert` handles.
    pub fn is_supported(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                SUPPORTED_EXTENSIONS
                    .iter()
                    .any(|supported| ext.eq_ignore_ascii_case(supported))
            })
    }

    fn arguments(input: &Path, output_dir: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![input.into()];
        args.extend(
            [
                "--mzML",
                "--zlib",
                "--filter",
                "peakPicking",
                "--filter",
                "msLevel 1-",
                "--ignoreUnknownInstrumentError",
                "-o",
            ]
            .into_iter()
            .map(OsString::from),
        );
        args.push(output_dir.into());
        args
    }

    fn spawn(&self, input: &Path, output_dir: &Path) -> Result<Child, ConversionError> {
        Command::new(&self.executable)
            .args(Self::arguments(input, output_dir))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => ConversionError::ExecutableNotFound {
                    program: self.executable.clone(),
                },
                _ => ConversionError::Spawn(e),
            })
    }

    /// Poll the child until it exits, the timeout expires or the conversion
    /// is cancelled. The child is killed in the latter two cases.
    fn wait(&self, child: &mut Child, input: &Path) -> Result<std::process::ExitStatus, ConversionError> {
        let started = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if self.cancelled.load(Ordering::SeqCst) {
                kill(child);
                return Err(ConversionError::Cancelled {
                    path: input.to_path_buf(),
                });
            }
            if started.elapsed() >= self.timeout {
                kill(child);
                return Err(ConversionError::Timeout {
                    path: input.to_path_buf(),
                    seconds: self.timeout.as_secs(),
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Default for MsConvert {
    fn default() -> Self {
        Self::from_config(&ConverterConfig::default())
    }
}

impl RunConverter for MsConvert {
    fn convert(&self, input: &Path, output_dir: &Path) -> Result<PathBuf, ConversionError> {
        if !Self::is_supported(input) {
            return Err(ConversionError::UnsupportedInput {
                path: input.to_path_buf(),
            });
        }
        if !input.exists() {
            return Err(ConversionError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("input not found: {}", input.display()),
            )));
        }
        std::fs::create_dir_all(output_dir)?;

        let mut file_name = input.file_stem().unwrap_or_default().to_os_string();
        file_name.push(".mzML");
        let output = output_dir.join(file_name);
        // an existing file must not pass for this run's output
        match std::fs::remove_file(&output) {
            Ok(()) => debug!("Removed stale {}", output.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        info!("Converting {} with {}", input.display(), self.executable.display());
        let mut child = self.spawn(input, output_dir)?;
        let stderr = drain_stderr(&mut child);
        let status = self.wait(&mut child, input)?;
        let stderr = stderr.recv().unwrap_or_default();

        if !status.success() {
            return Err(ConversionError::Failed {
                path: input.to_path_buf(),
                status: status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }
        if !stderr.trim().is_empty() {
            debug!("msconvert: {}", stderr.trim());
        }

        if !output.is_file() {
            return Err(ConversionError::MissingOutput { path: output });
        }
        info!("Converted {} -> {}", input.display(), output.display());
        Ok(output)
    }
}

/// Read the child's stderr on a separate thread so a full pipe never blocks it.
fn drain_stderr(child: &mut Child) -> Receiver<String> {
    let (tx, rx) = bounded(1);
    if let Some(mut pipe) = child.stderr.take() {
        thread::spawn(move || {
            let mut text = String::new();
            let _ = pipe.read_to_string(&mut text);
            let _ = tx.send(text);
        });
    }
    rx
}

fn kill(child: &mut Child) {
    if let Err(e) = child.kill() {
        debug!("Failed to kill converter: {}", e);
    }
    let _ = child.wait();
}
