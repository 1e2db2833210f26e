//! Frame sinks: where rendered frames go.
//!
//! [`FfmpegEncoder`] writes numbered PNGs into the input directory and hands
//! them to an external encoder once the match is over. [`MemorySink`] keeps
//! frames (or just their checksums) in memory for tests.

use std::collections::hash_map::DefaultHasher;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::process::Stdio;

use image::{ImageFormat, RgbaImage};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::EncoderSettings;

/// File name pattern of intermediate frames, in encoder syntax.
pub const FRAME_PATTERN: &str = "frame_%06d.png";

/// Why frames could not become a video.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Filesystem failure around the working directories.
    #[error("I/O error at '{path}': {source}")]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A frame could not be written as an image.
    #[error("Failed to write frame '{path}': {source}")]
    Image {
        /// Frame path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: image::ImageError,
    },

    /// The encoder process could not be started.
    #[error("Failed to start encoder '{binary}': {source}")]
    Spawn {
        /// Executable that was tried.
        binary: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The encoder ran and failed.
    #[error("Encoder exited with {status}: {stderr}")]
    EncoderFailed {
        /// Exit status description.
        status: String,
        /// Tail of the encoder's stderr.
        stderr: String,
    },

    /// The encoder reported success without producing a file.
    #[error("Encoder produced no output at '{0}'")]
    MissingOutput(PathBuf),

    /// `finish` was called before any frame arrived.
    #[error("No frames to encode")]
    NoFrames,

    /// The sink refused a frame (used by test sinks).
    #[error("Frame {0} rejected")]
    Rejected(u64),

    /// The blocking frame writer panicked or was cancelled.
    #[error("Frame writer task failed: {0}")]
    Writer(#[from] tokio::task::JoinError),
}

/// Consumer of rendered frames, in tick order.
pub trait FrameSink {
    /// Accept the next frame. Frames arrive strictly in tick order.
    fn push_frame(&mut self, frame: &RgbaImage) -> impl Future<Output = Result<(), EncodeError>> + Send;

    /// No more frames. Returns the finished video, if the sink makes one.
    fn finish(&mut self) -> impl Future<Output = Result<Option<PathBuf>, EncodeError>> + Send;
}

/// Writes PNG frames to disk, then runs the external encoder over them.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    input_dir: PathBuf,
    output_path: PathBuf,
    fps: u32,
    settings: EncoderSettings,
    frames_written: u64,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> EncodeError + '_ {
    move |source| EncodeError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn is_frame_file(name: &str) -> bool {
    name.strip_prefix("frame_")
        .and_then(|rest| rest.strip_suffix(".png"))
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

fn remove_if_present(path: &Path) -> Result<(), EncodeError> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Removed stale file");
            Ok(())
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(EncodeError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Drop frames left behind by an earlier run; the encoder reads the numbered
/// sequence until its first gap.
fn clear_stale_frames(input_dir: &Path) -> Result<usize, EncodeError> {
    let mut removed = 0;
    for entry in std::fs::read_dir(input_dir).map_err(io_error(input_dir))? {
        let entry = entry.map_err(io_error(input_dir))?;
        if entry.file_name().to_str().is_some_and(is_frame_file) {
            remove_if_present(&entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

impl FfmpegEncoder {
    /// Create both working directories and prepare to receive frames.
    ///
    /// Stale frames in `input_dir` and an old video at the output path are
    /// removed, so only this run's frames can end up in the result.
    pub fn create(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        fps: u32,
        settings: EncoderSettings,
    ) -> Result<Self, EncodeError> {
        let input_dir = input_dir.into();
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&input_dir).map_err(io_error(&input_dir))?;
        std::fs::create_dir_all(&output_dir).map_err(io_error(&output_dir))?;
        let output_path = output_dir.join(&settings.output_file_name);

        let stale = clear_stale_frames(&input_dir)?;
        if stale > 0 {
            warn!(count = stale, dir = %input_dir.display(), "Removed stale frames");
        }
        remove_if_present(&output_path)?;

        Ok(Self {
            input_dir,
            output_path,
            fps: fps.max(1),
            settings,
            frames_written: 0,
        })
    }

    /// Where the finished video will be written.
    #[must_use]
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Frames written so far.
    #[must_use]
    pub const fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Path of the `index`th frame (1-based, matching [`FRAME_PATTERN`]).
    #[must_use]
    pub fn frame_path(&self, index: u64) -> PathBuf {
        self.input_dir.join(format!("frame_{index:06}.png"))
    }

    async fn remove_partial_output(&self) {
        match tokio::fs::remove_file(&self.output_path).await {
            Ok(()) => warn!(path = %self.output_path.display(), "Removed partial video"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!(path = %self.output_path.display(), error = %err, "Could not remove partial video"),
        }
    }

    async fn run_encoder(&self) -> Result<PathBuf, EncodeError> {
        let mut command = tokio::process::Command::new(&self.settings.binary);
        command
            .arg("-y")
            .args(["-loglevel", "error"])
            .args(["-framerate", &self.fps.to_string()])
            .arg("-i")
            .arg(self.input_dir.join(FRAME_PATTERN))
            .args(["-c:v", &self.settings.codec])
            .args(["-pix_fmt", &self.settings.pixel_format])
            .arg(&self.output_path)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        debug!(command = ?command.as_std(), "Spawning encoder");
        let output = command.output().await.map_err(|source| EncodeError::Spawn {
            binary: self.settings.binary.clone(),
            source,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
            return Err(EncodeError::EncoderFailed {
                status: output.status.to_string(),
                stderr: tail.into_iter().rev().collect::<Vec<_>>().join("\n"),
            });
        }
        if !tokio::fs::try_exists(&self.output_path).await.unwrap_or(false) {
            return Err(EncodeError::MissingOutput(self.output_path.clone()));
        }
        Ok(self.output_path.clone())
    }
}

impl FrameSink for FfmpegEncoder {
    fn push_frame(&mut self, frame: &RgbaImage) -> impl Future<Output = Result<(), EncodeError>> + Send {
        let path = self.frame_path(self.frames_written + 1);
        let frame = frame.clone();
        async move {
            // PNG encoding and the file write block; keep them off the runtime.
            tokio::task::spawn_blocking(move || {
                frame
                    .save_with_format(&path, ImageFormat::Png)
                    .map_err(|source| EncodeError::Image { path, source })
            })
            .await??;
            self.frames_written += 1;
            Ok(())
        }
    }

    fn finish(&mut self) -> impl Future<Output = Result<Option<PathBuf>, EncodeError>> + Send {
        async move {
            if self.frames_written == 0 {
                return Err(EncodeError::NoFrames);
            }
            info!(
                frames = self.frames_written,
                fps = self.fps,
                output = %self.output_path.display(),
                "Encoding video"
            );
            match self.run_encoder().await {
                Ok(path) => Ok(Some(path)),
                Err(err) => {
                    self.remove_partial_output().await;
                    Err(err)
                }
            }
        }
    }
}

/// In-memory sink for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    retain: bool,
    frames: Vec<RgbaImage>,
    checksums: Vec<u64>,
    reject_from: Option<u64>,
    finished: bool,
}

impl MemorySink {
    /// Sink that records only frame checksums.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that keeps every frame.
    #[must_use]
    pub fn retaining() -> Self {
        Self {
            retain: true,
            ..Self::default()
        }
    }

    /// Reject the frame with this 1-based index and all later ones.
    #[must_use]
    pub fn failing_at(mut self, index: u64) -> Self {
        self.reject_from = Some(index);
        self
    }

    /// Checksum of a frame's pixels.
    #[must_use]
    pub fn checksum(frame: &RgbaImage) -> u64 {
        let mut hasher = DefaultHasher::new();
        frame.dimensions().hash(&mut hasher);
        frame.as_raw().hash(&mut hasher);
        hasher.finish()
    }

    /// Frames received.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.checksums.len() as u64
    }

    /// Retained frames (empty unless built with [`MemorySink::retaining`]).
    #[must_use]
    pub fn frames(&self) -> &[RgbaImage] {
        &self.frames
    }

    /// Checksums in arrival order.
    #[must_use]
    pub fn checksums(&self) -> &[u64] {
        &self.checksums
    }

    /// Whether `finish` has been called.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }
}

impl MemorySink {
    fn accept(&mut self, frame: &RgbaImage) -> Result<(), EncodeError> {
        let index = self.frame_count() + 1;
        if self.reject_from.is_some_and(|from| index >= from) {
            return Err(EncodeError::Rejected(index));
        }
        self.checksums.push(Self::checksum(frame));
        if self.retain {
            self.frames.push(frame.clone());
        }
        Ok(())
    }
}

impl FrameSink for MemorySink {
    fn push_frame(&mut self, frame: &RgbaImage) -> impl Future<Output = Result<(), EncodeError>> + Send {
        std::future::ready(self.accept(frame))
    }

    fn finish(&mut self) -> impl Future<Output = Result<Option<PathBuf>, EncodeError>> + Send {
        self.finished = true;
        std::future::ready(Ok(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[tokio::test]
    async fn test_memory_sink_counts_and_rejects() {
        let mut sink = MemorySink::new().failing_at(3);
        let frame = RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255]));
        sink.push_frame(&frame).await.unwrap();
        sink.push_frame(&frame).await.unwrap();
        assert!(matches!(sink.push_frame(&frame).await, Err(EncodeError::Rejected(3))));
        assert_eq!(sink.frame_count(), 2);
        assert!(sink.frames().is_empty());
    }

    #[test]
    fn test_frame_paths_are_one_based_and_padded() {
        let dir = tempfile::tempdir().unwrap();
        let encoder = FfmpegEncoder::create(
            dir.path().join("in"),
            dir.path().join("out"),
            60,
            EncoderSettings::default(),
        )
        .unwrap();
        assert_eq!(encoder.frame_path(1), dir.path().join("in/frame_000001.png"));
        assert_eq!(encoder.output_path(), dir.path().join("out/render.mp4"));
        assert!(dir.path().join("out").is_dir());
    }

    #[test]
    fn test_frame_file_names() {
        assert!(is_frame_file("frame_000001.png"));
        assert!(is_frame_file("frame_1234567.png"));
        assert!(!is_frame_file("frame_.png"));
        assert!(!is_frame_file("frame_00a001.png"));
        assert!(!is_frame_file("frame_000001.jpg"));
        assert!(!is_frame_file("render.mp4"));
    }
}
