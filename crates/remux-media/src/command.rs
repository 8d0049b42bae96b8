//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};
use crate::progress::FfmpegProgress;

/// How many trailing non-progress stderr lines to keep for diagnostics.
const STDERR_TAIL_LINES: usize = 40;

/// One input stream with its pre-`-i` arguments.
#[derive(Debug, Clone)]
struct FfmpegInput {
    path: PathBuf,
    /// Arguments placed before this input's `-i` (e.g. `-stream_loop`)
    args: Vec<String>,
}

/// Builder for FFmpeg commands over one or more inputs.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input files in `-i` order
    inputs: Vec<FfmpegInput>,
    /// Output file path
    output: PathBuf,
    /// Output arguments (after the inputs)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command writing to `output`.
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add a plain input file.
    pub fn input(mut self, path: impl AsRef<Path>) -> Self {
        self.inputs.push(FfmpegInput {
            path: path.as_ref().to_path_buf(),
            args: Vec::new(),
        });
        self
    }

    /// Add an input that plays `plays` times in total.
    ///
    /// FFmpeg's `-stream_loop N` counts additional plays on top of the
    /// first, so `plays` is translated to `N = plays - 1`.
    pub fn looped_input(mut self, path: impl AsRef<Path>, plays: u32) -> Self {
        self.inputs.push(FfmpegInput {
            path: path.as_ref().to_path_buf(),
            args: vec![
                "-stream_loop".to_string(),
                plays.saturating_sub(1).to_string(),
            ],
        });
        self
    }

    /// Add a still image input looped indefinitely (`-loop 1`); pair with a
    /// `-t` limit on the output.
    pub fn still_image_input(mut self, path: impl AsRef<Path>) -> Self {
        self.inputs.push(FfmpegInput {
            path: path.as_ref().to_path_buf(),
            args: vec!["-loop".to_string(), "1".to_string()],
        });
        self
    }

    /// Add an output argument.
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Limit the output duration (`-t`).
    pub fn duration(self, seconds: f64) -> Self {
        self.output_arg("-t").output_arg(format!("{seconds:.3}"))
    }

    /// Set filter complex.
    pub fn filter_complex(self, filter: impl Into<String>) -> Self {
        self.output_arg("-filter_complex").output_arg(filter)
    }

    /// Map a stream specifier or filter label into the output.
    pub fn map(self, spec: impl Into<String>) -> Self {
        self.output_arg("-map").output_arg(spec)
    }

    /// Set video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Set pixel format.
    pub fn pixel_format(self, format: impl Into<String>) -> Self {
        self.output_arg("-pix_fmt").output_arg(format)
    }

    /// Set output frame rate.
    pub fn frame_rate(self, fps: u32) -> Self {
        self.output_arg("-r").output_arg(fps.to_string())
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        // Progress output to stderr
        args.push("-progress".to_string());
        args.push("pipe:2".to_string());

        for input in &self.inputs {
            args.extend(input.args.clone());
            args.push("-i".to_string());
            args.push(input.path.to_string_lossy().to_string());
        }

        args.extend(self.output_args.clone());
        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands with progress tracking.
///
/// There is no timeout and no cancellation: a submitted task runs the tool
/// to completion or failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegRunner;

impl FfmpegRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        Self
    }

    /// Run an FFmpeg command.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        self.run_with_progress(cmd, |_| {}).await
    }

    /// Run an FFmpeg command, invoking `progress_callback` for each parsed
    /// progress report.
    pub async fn run_with_progress<F>(
        &self,
        cmd: &FfmpegCommand,
        progress_callback: F,
    ) -> MediaResult<()>
    where
        F: Fn(FfmpegProgress) + Send + 'static,
    {
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("stderr not captured"))?;
        let mut reader = BufReader::new(stderr).lines();

        // Parse progress lines as they arrive; keep everything else as the
        // diagnostic tail.
        let stderr_task = tokio::spawn(async move {
            let mut current = FfmpegProgress::default();
            let mut tail: Vec<String> = Vec::new();

            while let Ok(Some(line)) = reader.next_line().await {
                match parse_progress_line(&line, &mut current) {
                    Some(progress) => progress_callback(progress),
                    None if !line.trim().is_empty() && !line.contains('=') => {
                        if tail.len() == STDERR_TAIL_LINES {
                            tail.remove(0);
                        }
                        tail.push(line);
                    }
                    None => {}
                }
            }

            tail
        });

        let status = child.wait().await;
        let tail = stderr_task.await.unwrap_or_default();
        let status = status?;

        if status.success() {
            Ok(())
        } else {
            let stderr = if tail.is_empty() {
                None
            } else {
                Some(tail.join("\n"))
            };
            Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                stderr,
                status.code(),
            ))
        }
    }
}

/// Parse one line of FFmpeg's `-progress` output, returning a snapshot at
/// each `progress=` marker.
fn parse_progress_line(line: &str, current: &mut FfmpegProgress) -> Option<FfmpegProgress> {
    let line = line.trim();

    if let Some((key, value)) = line.split_once('=') {
        match key {
            "out_time_ms" | "out_time_us" => {
                // Both keys report microseconds in practice
                if let Ok(us) = value.parse::<i64>() {
                    current.out_time_ms = us / 1000;
                }
            }
            "frame" => {
                if let Ok(frame) = value.parse() {
                    current.frame = frame;
                }
            }
            "speed" => {
                if let Some(speed_str) = value.strip_suffix('x') {
                    if let Ok(speed) = speed_str.parse() {
                        current.speed = speed;
                    }
                }
            }
            "progress" => {
                if value == "end" {
                    current.is_complete = true;
                }
                return Some(current.clone());
            }
            _ => {}
        }
    }

    None
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_input_order() {
        let cmd = FfmpegCommand::new("out.mp4")
            .input("video.mp4")
            .input("audio.mp3")
            .video_codec("libx264")
            .audio_codec("aac")
            .duration(12.5);

        let args = cmd.build_args();
        let joined = args.join(" ");

        assert!(joined.contains("-i video.mp4 -i audio.mp3"));
        assert!(joined.contains("-c:v libx264"));
        assert!(joined.contains("-c:a aac"));
        assert!(joined.contains("-t 12.500"));
        assert_eq!(args.last().unwrap(), "out.mp4");
        assert_eq!(args.first().unwrap(), "-y");
    }

    #[test]
    fn test_looped_input_counts_additional_plays() {
        let cmd = FfmpegCommand::new("out.mp3").looped_input("a.mp3", 9);
        let joined = cmd.build_args().join(" ");
        assert!(joined.contains("-stream_loop 8 -i a.mp3"));

        // A single play needs no extra loops
        let cmd = FfmpegCommand::new("out.mp3").looped_input("a.mp3", 1);
        let joined = cmd.build_args().join(" ");
        assert!(joined.contains("-stream_loop 0 -i a.mp3"));
    }

    #[test]
    fn test_still_image_input() {
        let cmd = FfmpegCommand::new("out.mp4")
            .still_image_input("cover.png")
            .input("a.mp3")
            .pixel_format("yuv420p")
            .frame_rate(1);

        let joined = cmd.build_args().join(" ");
        assert!(joined.contains("-loop 1 -i cover.png -i a.mp3"));
        assert!(joined.contains("-pix_fmt yuv420p"));
        assert!(joined.contains("-r 1"));
    }

    #[test]
    fn test_filter_complex_and_map() {
        let cmd = FfmpegCommand::new("out.mp3")
            .input("a.mp3")
            .input("b.mp3")
            .filter_complex("[0:a][1:a]amix=inputs=2:duration=longest[out]")
            .map("[out]");

        let args = cmd.build_args();
        let pos = args.iter().position(|a| a == "-filter_complex").unwrap();
        assert_eq!(args[pos + 1], "[0:a][1:a]amix=inputs=2:duration=longest[out]");
        assert!(args.contains(&"-map".to_string()));
    }

    #[test]
    fn test_progress_parsing() {
        let mut progress = FfmpegProgress::default();

        assert!(parse_progress_line("out_time_ms=5000000", &mut progress).is_none());
        assert_eq!(progress.out_time_ms, 5000);

        parse_progress_line("speed=1.5x", &mut progress);
        assert!((progress.speed - 1.5).abs() < 0.01);

        parse_progress_line("speed=N/A", &mut progress);
        assert!((progress.speed - 1.5).abs() < 0.01);

        let snapshot = parse_progress_line("progress=continue", &mut progress);
        assert!(snapshot.is_some());
        assert!(!progress.is_complete);

        let snapshot = parse_progress_line("progress=end", &mut progress);
        assert!(snapshot.is_some());
        assert!(progress.is_complete);
    }
}
