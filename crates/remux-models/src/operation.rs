//! The closed set of processing operations and their input-shape rules.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::file::{InputFile, MediaKind};

/// A registered transformation. The set is fixed at compile time; there is
/// no runtime registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Merge one audio track into one video, optionally looping the audio.
    MergeAudioVideo,
    /// Merge two or more audio tracks by overlay or concatenation.
    MergeAudioTracks,
    /// Render a static image plus an audio track into a video.
    AudioToImage,
    /// Transcode a single file to a target container format.
    ConvertFormat,
    /// Loop a single audio file out to a target duration.
    LoopAudio,
}

/// The operation name was not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown operation: {0}")]
pub struct OperationParseError(pub String);

/// The supplied files do not match the operation's required shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputSetError {
    #[error("merging requires one audio file and one video file")]
    MissingAudioOrVideo,
    #[error("at least 2 audio files are required for merging, got {0}")]
    TooFewAudioTracks(usize),
    #[error("audio-to-image requires one audio file and one image file")]
    MissingAudioOrImage,
    #[error("format conversion requires exactly one file, got {0}")]
    NotExactlyOneFile(usize),
    #[error("audio looping requires exactly one audio file")]
    NotExactlyOneAudioFile,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::MergeAudioVideo,
        Operation::MergeAudioTracks,
        Operation::AudioToImage,
        Operation::ConvertFormat,
        Operation::LoopAudio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::MergeAudioVideo => "merge_audio_video",
            Operation::MergeAudioTracks => "merge_audio_tracks",
            Operation::AudioToImage => "audio_to_image",
            Operation::ConvertFormat => "convert_format",
            Operation::LoopAudio => "loop_audio",
        }
    }

    /// Check the supplied files against this operation's required shape.
    ///
    /// Extra files of other kinds are tolerated where the original shape is
    /// still satisfiable (merge operations pick the files they need); the
    /// single-input operations require exactly one file.
    pub fn validate_inputs(&self, files: &[InputFile]) -> Result<(), InputSetError> {
        let count_kind = |kind: MediaKind| files.iter().filter(|f| f.kind == kind).count();

        match self {
            Operation::MergeAudioVideo => {
                if count_kind(MediaKind::Audio) >= 1 && count_kind(MediaKind::Video) >= 1 {
                    Ok(())
                } else {
                    Err(InputSetError::MissingAudioOrVideo)
                }
            }
            Operation::MergeAudioTracks => {
                let audio = count_kind(MediaKind::Audio);
                if audio >= 2 {
                    Ok(())
                } else {
                    Err(InputSetError::TooFewAudioTracks(audio))
                }
            }
            Operation::AudioToImage => {
                if count_kind(MediaKind::Audio) >= 1 && count_kind(MediaKind::Image) >= 1 {
                    Ok(())
                } else {
                    Err(InputSetError::MissingAudioOrImage)
                }
            }
            Operation::ConvertFormat => {
                if files.len() == 1 {
                    Ok(())
                } else {
                    Err(InputSetError::NotExactlyOneFile(files.len()))
                }
            }
            Operation::LoopAudio => {
                if files.len() == 1 && files[0].kind == MediaKind::Audio {
                    Ok(())
                } else {
                    Err(InputSetError::NotExactlyOneAudioFile)
                }
            }
        }
    }
}

impl FromStr for Operation {
    type Err = OperationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "merge_audio_video" => Ok(Operation::MergeAudioVideo),
            "merge_audio_tracks" => Ok(Operation::MergeAudioTracks),
            "audio_to_image" => Ok(Operation::AudioToImage),
            "convert_format" => Ok(Operation::ConvertFormat),
            "loop_audio" => Ok(Operation::LoopAudio),
            other => Err(OperationParseError(other.to_string())),
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
