//! Init command - write the default configuration file.

use std::path::Path;

use preloader::config::{config_file_path, ControllerConfig};

use crate::error::CliError;

/// Run the init command.
pub fn run(game_dir: &Path, force: bool) -> Result<(), CliError> {
    let path = config_file_path(game_dir);

    if path.exists() && !force {
        println!("Configuration file already exists: {}", path.display());
        println!("Use --force to replace it with the default configuration.");
        return Ok(());
    }

    let config = ControllerConfig::with_examples();
    config.save(game_dir)?;

    println!("Configuration file: {}", path.display());
    println!();
    println!(
        "It contains {} disabled example entries.",
        config.downloads.len()
    );
    println!("Set \"enabled\": true on the entries you want downloaded.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_default_config() {
        let temp = TempDir::new().unwrap();

        run(temp.path(), false).unwrap();

        let config = ControllerConfig::load(temp.path()).unwrap();
        assert!(!config.downloads.is_empty());
        assert_eq!(config.enabled_downloads().count(), 0);
    }

    #[test]
    fn test_init_keeps_existing_config_without_force() {
        let temp = TempDir::new().unwrap();
        ControllerConfig::default()
            .with_require_consent(true)
            .save(temp.path())
            .unwrap();

        run(temp.path(), false).unwrap();
        assert!(ControllerConfig::load(temp.path()).unwrap().require_consent);

        run(temp.path(), true).unwrap();
        assert!(!ControllerConfig::load(temp.path()).unwrap().require_consent);
    }
}
