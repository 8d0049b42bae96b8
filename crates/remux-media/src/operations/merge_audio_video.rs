//! Merge one audio track into one video, optionally looping the audio.

use std::sync::Arc;

use remux_models::{InputFile, InputSetError, MediaKind, ProcessingOptions};
use tracing::debug;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::probe;

use super::{encode_reporter, find_kind, loop_count, output_name, ProgressReporter, Workspace};

pub(crate) async fn run(
    files: &[InputFile],
    options: &ProcessingOptions,
    workspace: &Workspace,
    reporter: Arc<dyn ProgressReporter>,
) -> MediaResult<String> {
    let audio = find_kind(files, MediaKind::Audio).ok_or(InputSetError::MissingAudioOrVideo)?;
    let video = find_kind(files, MediaKind::Video).ok_or(InputSetError::MissingAudioOrVideo)?;
    let audio_path = workspace.input_path(audio);
    let video_path = workspace.input_path(video);

    reporter.report(50, "Merging audio and video");

    let video_duration = probe::get_duration(&video_path).await?;
    let name = output_name("merged_video", "mp4");

    let mut cmd = FfmpegCommand::new(workspace.output_path(&name)).input(&video_path);

    // Loop the audio out to the video length when asked to and it is the
    // shorter stream; the -t limit below cuts the overrun.
    cmd = if options.loop_audio {
        let audio_duration = probe::get_duration(&audio_path).await?;
        if audio_duration < video_duration {
            let plays = loop_count(audio_duration, video_duration);
            debug!(
                audio_secs = audio_duration,
                video_secs = video_duration,
                plays, "Looping audio to cover video"
            );
            cmd.looped_input(&audio_path, plays)
        } else {
            cmd.input(&audio_path)
        }
    } else {
        cmd.input(&audio_path)
    };

    let cmd = cmd
        .map("0:v:0")
        .map("1:a:0")
        .video_codec("libx264")
        .audio_codec("aac")
        .duration(video_duration);

    let on_progress = encode_reporter(reporter, video_duration, "Merging audio and video");
    FfmpegRunner::new().run_with_progress(&cmd, on_progress).await?;

    Ok(name)
}
