//! Render a static image plus an audio track into a video.

use std::sync::Arc;

use remux_models::{InputFile, InputSetError, MediaKind, ProcessingOptions};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::probe;

use super::{encode_reporter, find_kind, output_name, ProgressReporter, Workspace};

pub(crate) async fn run(
    files: &[InputFile],
    _options: &ProcessingOptions,
    workspace: &Workspace,
    reporter: Arc<dyn ProgressReporter>,
) -> MediaResult<String> {
    let audio = find_kind(files, MediaKind::Audio).ok_or(InputSetError::MissingAudioOrImage)?;
    let image = find_kind(files, MediaKind::Image).ok_or(InputSetError::MissingAudioOrImage)?;
    let audio_path = workspace.input_path(audio);
    let image_path = workspace.input_path(image);

    reporter.report(50, "Creating video from audio and image");

    let audio_duration = probe::get_duration(&audio_path).await?;
    let name = output_name("audio_image", "mp4");

    // The image is looped indefinitely; the -t limit ends the video with
    // the audio. 1 fps is plenty for a static frame.
    let cmd = FfmpegCommand::new(workspace.output_path(&name))
        .still_image_input(&image_path)
        .input(&audio_path)
        .video_codec("libx264")
        .audio_codec("aac")
        .duration(audio_duration)
        .pixel_format("yuv420p")
        .frame_rate(1);

    let on_progress = encode_reporter(reporter, audio_duration, "Creating video from audio and image");
    FfmpegRunner::new().run_with_progress(&cmd, on_progress).await?;

    Ok(name)
}
