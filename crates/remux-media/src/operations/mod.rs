//! The built-in operations and their shared plumbing.
//!
//! Each operation validates its input shape, computes a collision-resistant
//! output filename inside the output root, reports its operation-specific
//! progress checkpoint, and runs a single FFmpeg invocation.

mod audio_to_image;
mod convert_format;
mod loop_audio;
mod merge_audio_tracks;
mod merge_audio_video;

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use remux_models::{InputFile, MediaKind, Operation, ProcessingOptions};

use crate::error::MediaResult;
use crate::progress::FfmpegProgress;

/// Progress band reserved for the encode itself; checkpoints below 50 and
/// the 100 mark belong to the orchestrator.
const ENCODE_BAND_START: f64 = 50.0;
const ENCODE_BAND_END: f64 = 95.0;

/// The pair of filesystem roots an operation works against.
///
/// Inputs are read from the upload root and never modified; outputs are
/// written to the output root under unique names, so concurrent tasks never
/// contend on files.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Workspace {
    pub fn new(upload_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Absolute path of an input file under the upload root.
    pub fn input_path(&self, file: &InputFile) -> PathBuf {
        self.upload_dir.join(&file.stored_name)
    }

    /// Absolute path of an output artifact under the output root.
    pub fn output_path(&self, name: impl AsRef<Path>) -> PathBuf {
        self.output_dir.join(name.as_ref())
    }

    /// Create the output root if it does not exist yet.
    pub async fn ensure_output_dir(&self) -> MediaResult<()> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        Ok(())
    }
}

/// Callback by which a running operation advances its task's progress and
/// step message.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, progress: u8, message: &str);
}

impl<F> ProgressReporter for F
where
    F: Fn(u8, &str) + Send + Sync,
{
    fn report(&self, progress: u8, message: &str) {
        self(progress, message)
    }
}

/// Reporter that discards all updates.
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn report(&self, _progress: u8, _message: &str) {}
}

/// Resolve and run an operation, returning the output artifact filename.
///
/// The input shape is validated up front; shape errors surface before any
/// probe or tool invocation.
pub async fn run_operation(
    operation: Operation,
    files: &[InputFile],
    options: &ProcessingOptions,
    workspace: &Workspace,
    reporter: Arc<dyn ProgressReporter>,
) -> MediaResult<String> {
    operation.validate_inputs(files)?;
    workspace.ensure_output_dir().await?;

    match operation {
        Operation::MergeAudioVideo => {
            merge_audio_video::run(files, options, workspace, reporter).await
        }
        Operation::MergeAudioTracks => {
            merge_audio_tracks::run(files, options, workspace, reporter).await
        }
        Operation::AudioToImage => audio_to_image::run(files, options, workspace, reporter).await,
        Operation::ConvertFormat => convert_format::run(files, options, workspace, reporter).await,
        Operation::LoopAudio => loop_audio::run(files, options, workspace, reporter).await,
    }
}

/// Number of times a source of `source_secs` must play to cover
/// `target_secs`: `ceil(target / source)`, never under-covering.
pub fn loop_count(source_secs: f64, target_secs: f64) -> u32 {
    if source_secs <= 0.0 || target_secs <= 0.0 {
        return 1;
    }
    ((target_secs / source_secs).ceil() as u32).max(1)
}

/// Unique output filename: `<prefix>_<UTC timestamp>_<short uuid>.<ext>`.
///
/// The uuid suffix keeps names collision-free for submissions landing in
/// the same second.
pub(crate) fn output_name(prefix: &str, ext: &str) -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{prefix}_{timestamp}_{}.{ext}", &suffix[..8])
}

/// First input of the given kind, if any.
pub(crate) fn find_kind(files: &[InputFile], kind: MediaKind) -> Option<&InputFile> {
    files.iter().find(|f| f.kind == kind)
}

/// Adapt FFmpeg progress reports into task progress within the encode band,
/// scaled against the intended output duration.
pub(crate) fn encode_reporter(
    reporter: Arc<dyn ProgressReporter>,
    total_secs: f64,
    message: &str,
) -> impl Fn(FfmpegProgress) + Send + 'static {
    let message = message.to_string();
    let total_ms = (total_secs * 1000.0) as i64;
    move |progress: FfmpegProgress| {
        let pct = progress.percentage(total_ms);
        let scaled =
            ENCODE_BAND_START + pct / 100.0 * (ENCODE_BAND_END - ENCODE_BAND_START);
        reporter.report(scaled as u8, &message);
    }
}
