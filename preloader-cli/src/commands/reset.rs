//! Reset command - forget that the first run happened.

use std::path::Path;

use preloader::orchestrator::Marker;

use crate::error::CliError;

/// Run the reset command.
pub fn run(game_dir: &Path) -> Result<(), CliError> {
    let marker = Marker::in_game_dir(game_dir);

    if marker.remove()? {
        println!("Removed {}", marker.path().display());
        println!("The next launch will run all downloads again.");
    } else {
        println!("No marker at {}; nothing to reset.", marker.path().display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reset_removes_marker() {
        let temp = TempDir::new().unwrap();
        let marker = Marker::in_game_dir(temp.path());
        marker.write().unwrap();

        run(temp.path()).unwrap();
        assert!(!marker.exists());

        // Second reset is a no-op.
        run(temp.path()).unwrap();
    }
}
