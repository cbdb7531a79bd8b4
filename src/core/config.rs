use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::AiTestGenError;
use crate::models::{Config, ConfigOverrides, CONFIG_FILE_NAME};

/// Load configuration from project directory with CLI overrides
pub fn load_config(
    project_root: &PathBuf,
    overrides: ConfigOverrides,
) -> Result<Config, AiTestGenError> {
    let config = Config::load_from_dir(project_root)?;
    let config = config.with_overrides(overrides);

    info!(
        "Configuration loaded: provider={}, model={}, timeout={}s",
        config.provider.kind,
        config.provider.active_model(),
        config.provider.timeout_seconds
    );

    Ok(config)
}

/// Walk up from `start` to the first directory holding aitestgen.toml
///
/// Falls back to `start` itself so a project without a config file still
/// runs on defaults.
pub fn find_project_root(start: &Path) -> PathBuf {
    start
        .ancestors()
        .find(|dir| dir.join(CONFIG_FILE_NAME).is_file())
        .unwrap_or(start)
        .to_path_buf()
}
