//! Engine configuration.

use std::path::PathBuf;

use remux_media::Workspace;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Root the upload collaborator stores input files under (read-only for
    /// the engine)
    pub upload_dir: PathBuf,
    /// Root output artifacts are written to
    pub output_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            output_dir: PathBuf::from("outputs"),
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            upload_dir: std::env::var("REMUX_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
            output_dir: std::env::var("REMUX_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("outputs")),
        }
    }

    /// The workspace roots handed to operations.
    pub fn workspace(&self) -> Workspace {
        Workspace::new(&self.upload_dir, &self.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.output_dir, PathBuf::from("outputs"));
    }

    #[test]
    fn test_workspace_conversion() {
        let config = EngineConfig {
            upload_dir: PathBuf::from("/srv/uploads"),
            output_dir: PathBuf::from("/srv/outputs"),
        };
        let ws = config.workspace();
        assert_eq!(ws.upload_dir, PathBuf::from("/srv/uploads"));
        assert_eq!(ws.output_dir, PathBuf::from("/srv/outputs"));
    }
}
