//! Merge two or more audio tracks by overlay or concatenation.

use std::sync::Arc;

use remux_models::{InputFile, InputSetError, MediaKind, MixMode, ProcessingOptions};

use crate::codec::codecs_for_format;
use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

use super::{output_name, ProgressReporter, Workspace};

pub(crate) async fn run(
    files: &[InputFile],
    options: &ProcessingOptions,
    workspace: &Workspace,
    reporter: Arc<dyn ProgressReporter>,
) -> MediaResult<String> {
    let tracks: Vec<&InputFile> = files.iter().filter(|f| f.kind == MediaKind::Audio).collect();
    if tracks.len() < 2 {
        return Err(InputSetError::TooFewAudioTracks(tracks.len()).into());
    }

    reporter.report(50, "Merging audio tracks");

    let name = output_name("merged_audio", "mp3");
    let mut cmd = FfmpegCommand::new(workspace.output_path(&name));
    for track in &tracks {
        cmd = cmd.input(workspace.input_path(track));
    }

    let cmd = codecs_for_format("mp3").apply(
        cmd.filter_complex(merge_filter(tracks.len(), options.mix_mode))
            .map("[out]"),
    );

    FfmpegRunner::new().run(&cmd).await?;

    Ok(name)
}

/// Filtergraph combining `n` audio inputs.
///
/// Overlay keeps the longest input's duration; concatenation plays the
/// inputs back to back.
fn merge_filter(n: usize, mode: MixMode) -> String {
    let labels: String = (0..n).map(|i| format!("[{i}:a]")).collect();
    match mode {
        MixMode::Mix => format!("{labels}amix=inputs={n}:duration=longest[out]"),
        MixMode::Concatenate => format!("{labels}concat=n={n}:v=0:a=1[out]"),
    }
}
