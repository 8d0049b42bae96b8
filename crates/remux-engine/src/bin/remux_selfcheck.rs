//! Environment self-check for the Remux engine.

use std::path::Path;

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use remux_engine::EngineConfig;
use remux_media::{check_ffmpeg, check_ffprobe};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("remux=info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_ansi(true)
                .with_target(true)
                .with_thread_ids(false),
        )
        .with(env_filter)
        .init();

    let config = EngineConfig::from_env();
    info!(
        "remux-selfcheck: starting with upload_dir={} output_dir={}",
        config.upload_dir.display(),
        config.output_dir.display()
    );

    ensure_dir(&config.upload_dir).await?;
    ensure_dir(&config.output_dir).await?;

    check_ffmpeg().map_err(|e| anyhow::anyhow!("ffmpeg not available: {}", e))?;
    check_ffprobe().map_err(|e| anyhow::anyhow!("ffprobe not available: {}", e))?;

    info!("remux-selfcheck: ok");
    Ok(())
}

async fn ensure_dir<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path).await?;
    Ok(())
}
