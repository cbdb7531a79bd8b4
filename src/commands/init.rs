use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::error::AiTestGenError;
use crate::models::CONFIG_FILE_NAME;
use crate::templates::get_templates;

/// Write the default aitestgen.toml into a project
///
/// An existing config file is never overwritten. Returns whether a file was
/// created.
pub fn init_project(project_root: &PathBuf) -> Result<bool, AiTestGenError> {
    if !project_root.is_dir() {
        fs::create_dir_all(project_root)?;
        info!("Created project directory: {}", project_root.display());
    }

    let config_path = project_root.join(CONFIG_FILE_NAME);
    let created = create_file_if_not_exists(&config_path, get_templates().config)?;

    print_next_steps(project_root, created);
    Ok(created)
}

fn create_file_if_not_exists(path: &PathBuf, content: &str) -> Result<bool, AiTestGenError> {
    if !path.exists() {
        fs::write(path, content)?;
        info!("Created file: {}", path.display());
        Ok(true)
    } else {
        info!("File already exists: {}", path.display());
        Ok(false)
    }
}

fn print_next_steps(project_root: &PathBuf, created: bool) {
    if created {
        println!("aitestgen initialized at {}", project_root.display());
    } else {
        println!(
            "{} already exists in {}; left unchanged",
            CONFIG_FILE_NAME,
            project_root.display()
        );
    }
    println!("\nNext steps:");
    println!("1. Pick a provider in {} (gemini, openai or ollama)", CONFIG_FILE_NAME);
    println!("2. Export GEMINI_API_KEY or OPENAI_API_KEY for hosted providers");
    println!("3. Run 'aitestgen unit <path/to/Source.kt>' to generate unit tests");
    println!("4. Run 'aitestgen instrumentation --context <files>' for Compose tests (add --bdd for Cucumber)");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Config;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();
        assert!(init_project(&root).unwrap());

        let config = Config::load_from_dir(&root).unwrap();
        assert_eq!(config.generation.max_context_files, 10);
    }

    #[test]
    fn test_init_never_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();
        let config_path = root.join(CONFIG_FILE_NAME);
        fs::write(&config_path, "[provider]\nkind = \"ollama\"\n").unwrap();

        assert!(!init_project(&root).unwrap());
        assert_eq!(
            fs::read_to_string(&config_path).unwrap(),
            "[provider]\nkind = \"ollama\"\n"
        );
    }
}
