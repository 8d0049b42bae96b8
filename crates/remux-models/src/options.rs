//! Per-operation options supplied with a submission.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How multiple audio tracks are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum MixMode {
    /// Overlay all tracks simultaneously; output duration is the longest
    /// input.
    #[default]
    Mix,
    /// Play tracks back to back; output duration is the sum of inputs.
    Concatenate,
}

/// Option bag accepted by every operation. Fields an operation does not use
/// are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ProcessingOptions {
    /// MergeAudioVideo: loop the audio track to cover the video duration
    /// when it is shorter.
    pub loop_audio: bool,
    /// MergeAudioTracks: overlay vs. sequential combination.
    pub mix_mode: MixMode,
    /// ConvertFormat: target container format.
    pub target_format: String,
    /// LoopAudio: duration the looped output should cover, in seconds.
    pub duration_secs: f64,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            loop_audio: false,
            mix_mode: MixMode::default(),
            target_format: "mp4".to_string(),
            duration_secs: 60.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = ProcessingOptions::default();
        assert!(!opts.loop_audio);
        assert_eq!(opts.mix_mode, MixMode::Mix);
        assert_eq!(opts.target_format, "mp4");
        assert!((opts.duration_secs - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_deserialization() {
        let opts: ProcessingOptions =
            serde_json::from_str(r#"{"mix_mode": "concatenate"}"#).unwrap();
        assert_eq!(opts.mix_mode, MixMode::Concatenate);
        assert_eq!(opts.target_format, "mp4");
    }
}
