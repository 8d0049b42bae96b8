//! Transcode a single file to a target container format.

use std::sync::Arc;

use remux_models::{InputFile, InputSetError, ProcessingOptions};

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
    let [file] = files else {
        return Err(InputSetError::NotExactlyOneFile(files.len()).into());
    };

    let target = options.target_format.as_str();
    reporter.report(50, &format!("Converting to {target}"));

    let name = output_name(&format!("{}_converted", file.stem()), target);
    let cmd = codecs_for_format(target)
        .apply(FfmpegCommand::new(workspace.output_path(&name)).input(workspace.input_path(file)));

    FfmpegRunner::new().run(&cmd).await?;

    Ok(name)
}
