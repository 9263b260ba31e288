//! First-run marker.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;

/// Marker location relative to the game directory.
pub const MARKER_FILE: &str = "config/preloader.marker";

/// Existence-only sentinel recording that a run has completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    path: PathBuf,
}

impl Marker {
    pub fn in_game_dir(game_dir: &Path) -> Self {
        Self::at(game_dir.join(MARKER_FILE))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Create or refresh the marker.
    pub fn write(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = format!(
            "This marker records that the preloader has run at least once.\n\
             Delete it to download everything again on the next launch.\n\
             Last run: {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        fs::write(&self.path, content)
    }

    /// Delete the marker. Returns whether it existed.
    pub fn remove(&self) -> io::Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_and_remove() {
        let temp = TempDir::new().unwrap();
        let marker = Marker::in_game_dir(temp.path());

        assert!(!marker.exists());
        marker.write().unwrap();
        assert!(marker.exists());
        assert!(marker.remove().unwrap());
        assert!(!marker.remove().unwrap());
    }
}
