//! FFprobe media information.

use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{MediaError, MediaResult};

/// Metadata for a probed media file.
#[derive(Debug, Clone)]
pub struct MediaInfo {
    /// Duration in seconds
    pub duration: f64,
    /// Container format name
    pub format_name: String,
    /// File size in bytes
    pub size: u64,
    /// Bitrate in bits/second
    pub bitrate: u64,
    /// Whether the file carries a video stream
    pub has_video: bool,
    /// Whether the file carries an audio stream
    pub has_audio: bool,
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    format_name: Option<String>,
    size: Option<String>,
    bit_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    duration: Option<String>,
}

/// Probe a media file for information.
pub async fn probe_media(path: impl AsRef<Path>) -> MediaResult<MediaInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::ffprobe_failed(
            format!("FFprobe failed for {}", path.display()),
            Some(String::from_utf8_lossy(&output.stderr).to_string()),
        ));
    }

    let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)?;
    Ok(parse_probe(probe))
}

/// Get media duration in seconds.
///
/// Fails with `InvalidMedia` when the file reports no usable duration, so
/// loop arithmetic never divides by zero.
pub async fn get_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    let path = path.as_ref();
    let info = probe_media(path).await?;
    if info.duration <= 0.0 {
        return Err(MediaError::invalid_media(format!(
            "{} reports no usable duration",
            path.display()
        )));
    }
    Ok(info.duration)
}

fn parse_probe(probe: FfprobeOutput) -> MediaInfo {
    // Container-level duration is authoritative; still-image and some audio
    // containers only report it on the first stream.
    let duration = probe
        .format
        .duration
        .as_deref()
        .and_then(parse_secs)
        .or_else(|| {
            probe
                .streams
                .iter()
                .find_map(|s| s.duration.as_deref().and_then(parse_secs))
        })
        .unwrap_or(0.0);

    let size = probe
        .format
        .size
        .as_ref()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);

    let bitrate = probe
        .format
        .bit_rate
        .as_ref()
        .and_then(|b| b.parse::<u64>().ok())
        .unwrap_or(0);

    let has_stream = |kind: &str| {
        probe
            .streams
            .iter()
            .any(|s| s.codec_type.as_deref() == Some(kind))
    };

    MediaInfo {
        duration,
        format_name: probe.format.format_name.unwrap_or_default(),
        size,
        bitrate,
        has_video: has_stream("video"),
        has_audio: has_stream("audio"),
    }
}

fn parse_secs(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|d| d.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe_from_json(json: &str) -> MediaInfo {
        parse_probe(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_duration_from_format() {
        let info = probe_from_json(
            r#"{
                "format": {"duration": "42.5", "format_name": "mp3", "size": "1000", "bit_rate": "128000"},
                "streams": [{"codec_type": "audio", "duration": "41.0"}]
            }"#,
        );
        assert!((info.duration - 42.5).abs() < 0.001);
        assert_eq!(info.format_name, "mp3");
        assert_eq!(info.size, 1000);
        assert_eq!(info.bitrate, 128000);
        assert!(info.has_audio);
        assert!(!info.has_video);
    }

    #[test]
    fn test_duration_falls_back_to_stream() {
        let info = probe_from_json(
            r#"{
                "format": {},
                "streams": [{"codec_type": "video", "duration": "7.25"}]
            }"#,
        );
        assert!((info.duration - 7.25).abs() < 0.001);
        assert!(info.has_video);
    }

    #[test]
    fn test_missing_duration_is_zero() {
        let info = probe_from_json(r#"{"format": {}, "streams": []}"#);
        assert_eq!(info.duration, 0.0);
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let err = probe_media("/nonexistent/media.mp4").await.unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
