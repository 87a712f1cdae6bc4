//! Metadata extraction by running `ffprobe`.

use super::{MetadataExtractor, VideoMetadata, VideoStream, UNKNOWN};
use crate::error::ProbeError;
use serde::Deserialize;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Extracts metadata with one `ffprobe` process per file
#[derive(Debug, Clone)]
pub struct FfprobeExtractor {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl FfprobeExtractor {
    /// Use `ffprobe` from `PATH` with no timeout
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("ffprobe"),
            timeout: None,
        }
    }

    /// Run a specific ffprobe binary
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Kill probes that run longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn probe(&self, path: &Path) -> Result<VideoMetadata, ProbeError> {
        let stdout = self.run(path)?;
        parse_probe_output(path, &stdout)
    }

    fn run(&self, path: &Path) -> Result<Vec<u8>, ProbeError> {
        let mut child = Command::new(&self.program)
            .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ProbeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Pipes are drained on their own threads so a chatty probe can't block on a full pipe
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdout_reader = thread::spawn(move || drain(stdout));
        let stderr_reader = thread::spawn(move || drain(stderr));

        let status = match self.timeout {
            None => child.wait()?,
            Some(limit) => {
                let deadline = Instant::now() + limit;
                loop {
                    if let Some(status) = child.try_wait()? {
                        break status;
                    }
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(ProbeError::TimedOut {
                            seconds: limit.as_secs(),
                        });
                    }
                    thread::sleep(POLL_INTERVAL);
                }
            }
        };

        let stdout = stdout_reader.join().unwrap_or_default();
        let stderr = stderr_reader.join().unwrap_or_default();

        check_status(status, &stdout, &stderr)?;
        Ok(stdout)
    }
}

impl Default for FfprobeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataExtractor for FfprobeExtractor {
    fn extract(&self, path: &Path) -> VideoMetadata {
        match self.probe(path) {
            Ok(metadata) => {
                debug!(
                    path = %path.display(),
                    duration = metadata.duration_seconds,
                    resolution = %metadata.resolution_label,
                    "Probed video"
                );
                metadata
            }
            Err(e) => {
                warn!("Failed to probe {}: {}", path.display(), e);
                VideoMetadata::failed(path, e.to_string())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
    size: Option<String>,
}

/// Turn ffprobe's JSON report into metadata for `path`.
///
/// A missing or unparseable duration counts as 0. When the report carries no
/// size, the file's length on disk is used instead.
pub fn parse_probe_output(path: &Path, stdout: &[u8]) -> Result<VideoMetadata, ProbeError> {
    let output: ProbeOutput = serde_json::from_slice(stdout)?;

    let stream = output
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or(ProbeError::NoVideoStream)?;

    let format = output.format.as_ref();
    let duration = format
        .and_then(|f| f.duration.as_deref())
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite())
        .unwrap_or(0.0);

    let size_bytes = format
        .and_then(|f| f.size.as_deref())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .or_else(|| fs::metadata(path).ok().map(|m| m.len()))
        .unwrap_or(0);

    let stream = VideoStream {
        width: stream.width.unwrap_or(0),
        height: stream.height.unwrap_or(0),
        codec: stream
            .codec_name
            .clone()
            .unwrap_or_else(|| UNKNOWN.to_string()),
    };

    Ok(VideoMetadata::probed(path, size_bytes, duration, stream))
}

fn check_status(status: ExitStatus, stdout: &[u8], stderr: &[u8]) -> Result<(), ProbeError> {
    if !status.success() {
        return Err(ProbeError::Failed {
            status: status.to_string(),
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
        });
    }
    if stdout.iter().all(u8::is_ascii_whitespace) {
        return Err(ProbeError::EmptyOutput);
    }
    Ok(())
}

fn drain<R: Read>(pipe: Option<R>) -> Vec<u8> {
    let mut buffer = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buffer);
    }
    buffer
}
