//! Loop a single audio file out to a target duration.

use std::sync::Arc;

use remux_models::{InputFile, InputSetError, MediaKind, ProcessingOptions};
use tracing::debug;

use crate::codec::codecs_for_format;
use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe;

use super::{encode_reporter, loop_count, output_name, ProgressReporter, Workspace};

pub(crate) async fn run(
    files: &[InputFile],
    options: &ProcessingOptions,
    workspace: &Workspace,
    reporter: Arc<dyn ProgressReporter>,
) -> MediaResult<String> {
    let [file] = files else {
        return Err(InputSetError::NotExactlyOneAudioFile.into());
    };
    if file.kind != MediaKind::Audio {
        return Err(InputSetError::NotExactlyOneAudioFile.into());
    }

    let target_secs = options.duration_secs;
    if target_secs <= 0.0 {
        return Err(MediaError::invalid_media(
            "loop duration must be positive",
        ));
    }

    reporter.report(50, &format!("Looping audio for {target_secs} seconds"));

    let input_path = workspace.input_path(file);
    let source_secs = probe::get_duration(&input_path).await?;
    let plays = loop_count(source_secs, target_secs);
    debug!(source_secs, target_secs, plays, "Looping audio");

    let name = output_name(&format!("{}_looped", file.stem()), "mp3");

    // ceil-count plays over-cover by at most one source length; -t cuts the
    // output at exactly the requested duration.
    let cmd = codecs_for_format("mp3").apply(
        FfmpegCommand::new(workspace.output_path(&name))
            .looped_input(&input_path, plays)
            .duration(target_secs),
    );

    let on_progress = encode_reporter(reporter, target_secs, "Looping audio");
    FfmpegRunner::new().run_with_progress(&cmd, on_progress).await?;

    Ok(name)
}
