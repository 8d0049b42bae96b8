#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper and the built-in Remux operations.
//!
//! This crate provides:
//! - Type-safe multi-input FFmpeg command building
//! - Progress parsing from `-progress pipe:2`
//! - FFprobe metadata probing for any media kind
//! - The closed target-format -> codec lookup table
//! - The five built-in operations (merge, convert, loop, composite)

pub mod codec;
pub mod command;
pub mod error;
pub mod operations;
pub mod probe;
pub mod progress;

pub use codec::{codecs_for_format, CodecSpec};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use operations::{loop_count, run_operation, NullReporter, ProgressReporter, Workspace};
pub use probe::{get_duration, probe_media, MediaInfo};
pub use progress::FfmpegProgress;
