//! Target-format to codec selection.

use crate::command::FfmpegCommand;

/// Encoder selection for a target container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodecSpec {
    pub video: Option<&'static str>,
    pub audio: Option<&'static str>,
}

impl CodecSpec {
    /// Apply the selection to a command. `None` fields emit no codec flag,
    /// leaving FFmpeg's container-native default in charge.
    pub fn apply(&self, mut cmd: FfmpegCommand) -> FfmpegCommand {
        if let Some(video) = self.video {
            cmd = cmd.video_codec(video);
        }
        if let Some(audio) = self.audio {
            cmd = cmd.audio_codec(audio);
        }
        cmd
    }
}

/// Closed lookup table from target format to encoders. Formats outside the
/// table fall through to container-native codecs.
pub fn codecs_for_format(format: &str) -> CodecSpec {
    match format {
        "mp4" => CodecSpec {
            video: Some("libx264"),
            audio: Some("aac"),
        },
        "mp3" => CodecSpec {
            video: None,
            audio: Some("libmp3lame"),
        },
        "wav" => CodecSpec {
            video: None,
            audio: Some("pcm_s16le"),
        },
        "avi" => CodecSpec {
            video: Some("libx264"),
            audio: Some("libmp3lame"),
        },
        _ => CodecSpec::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_table() {
        assert_eq!(
            codecs_for_format("mp4"),
            CodecSpec {
                video: Some("libx264"),
                audio: Some("aac")
            }
        );
        assert_eq!(codecs_for_format("wav").audio, Some("pcm_s16le"));
        assert_eq!(codecs_for_format("wav").video, None);
        assert_eq!(codecs_for_format("mp3").audio, Some("libmp3lame"));
        assert_eq!(codecs_for_format("avi").video, Some("libx264"));
    }

    #[test]
    fn test_unknown_format_uses_container_defaults() {
        assert_eq!(codecs_for_format("webm"), CodecSpec::default());
        assert_eq!(codecs_for_format(""), CodecSpec::default());
    }

    #[test]
    fn test_apply_emits_only_selected_codecs() {
        let cmd = codecs_for_format("wav").apply(FfmpegCommand::new("out.wav").input("in.mp3"));
        let joined = cmd.build_args().join(" ");
        assert!(joined.contains("-c:a pcm_s16le"));
        assert!(!joined.contains("-c:v"));

        let cmd = codecs_for_format("flac").apply(FfmpegCommand::new("out.flac").input("in.wav"));
        let joined = cmd.build_args().join(" ");
        assert!(!joined.contains("-c:a"));
        assert!(!joined.contains("-c:v"));
    }
}
