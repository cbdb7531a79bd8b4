pub mod init;
pub mod instrumentation;
pub mod merge;
pub mod preview;
pub mod refine;
pub mod unit;

pub use init::*;
pub use instrumentation::*;
pub use merge::*;
pub use preview::*;
pub use refine::*;
pub use unit::*;

use dialoguer::{theme::ColorfulTheme, Confirm};
use std::path::Path;
use std::sync::Arc;

use crate::core::{create_provider, load_config, FsFileStore, ModelProvider};
use crate::error::AiTestGenError;
use crate::models::{Config, ConfigOverrides, ProviderKind};

/// Provider and write options shared by the generating commands
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub provider: Option<ProviderKind>,
    pub model: Option<String>,
    pub url: Option<String>,
    pub timeout: Option<u64>,
    pub no_stream: bool,
    /// Write without asking
    pub yes: bool,
}

impl GenerateOptions {
    pub fn overrides(&self, bdd: bool) -> ConfigOverrides {
        ConfigOverrides {
            provider: self.provider,
            model: self.model.clone(),
            url: self.url.clone(),
            timeout: self.timeout,
            no_stream: self.no_stream,
            bdd,
        }
    }
}

/// Config, provider and file store for one command invocation
pub(crate) fn open_project(
    project_root: &Path,
    overrides: ConfigOverrides,
) -> Result<(Config, Arc<dyn ModelProvider>, Arc<FsFileStore>), AiTestGenError> {
    let config = load_config(&project_root.to_path_buf(), overrides)?;
    let provider: Arc<dyn ModelProvider> = Arc::from(create_provider(&config)?);
    let store = Arc::new(FsFileStore::new(project_root));
    Ok((config, provider, store))
}

/// Ask before writing, unless the user or the config opted out
pub(crate) fn confirm_write(
    config: &Config,
    assume_yes: bool,
    prompt: &str,
) -> Result<bool, AiTestGenError> {
    if assume_yes || !config.behavior.confirm_writes {
        return Ok(true);
    }

    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(true)
        .interact()
        .map_err(|e| AiTestGenError::Input(format!("Failed to get user input: {}", e)))
}

/// Print a file body between rulers
pub(crate) fn print_code(title: &Path, code: &str) {
    println!("\n=== {} ===", title.display());
    println!("{}", code);
    println!("=== END ===\n");
}
