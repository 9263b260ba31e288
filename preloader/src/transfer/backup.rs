//! Backups of files about to be replaced.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;

use super::error::{TransferError, TransferResult};

/// Backup directory name, created next to the replaced file.
pub const BACKUP_DIR: &str = ".preloader-backups";

/// Copy `path` into `<parent>/.preloader-backups/<name>.<yyyyMMdd-HHmmss>.backup`.
///
/// An existing backup is never overwritten: later backups within the same
/// second get a `-1`, `-2`, ... suffix on the timestamp. Returns the backup
/// path.
pub fn backup_file(path: &Path) -> TransferResult<PathBuf> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .ok_or_else(|| TransferError::InvalidDestination(path.to_path_buf()))?
        .to_string_lossy()
        .to_string();

    let dir = parent.join(BACKUP_DIR);
    fs::create_dir_all(&dir).map_err(|e| TransferError::BackupFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    let stamp = Local::now().format("%Y%m%d-%H%M%S").to_string();
    let mut attempt = 0u32;

    let backup = loop {
        let candidate = if attempt == 0 {
            dir.join(format!("{}.{}.backup", name, stamp))
        } else {
            dir.join(format!("{}.{}-{}.backup", name, stamp, attempt))
        };

        // create_new reserves the name; an existing backup is never reused.
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(_) => break candidate,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => {
                return Err(TransferError::BackupFailed {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        }
    };

    if let Err(e) = fs::copy(path, &backup) {
        let _ = fs::remove_file(&backup);
        return Err(TransferError::BackupFailed {
            path: path.to_path_buf(),
            source: e,
        });
    }

    Ok(backup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_backup_copies_content() {
        let temp = TempDir::new().unwrap();
        let original = temp.path().join("options.txt");
        fs::write(&original, b"fov:90").unwrap();

        let backup = backup_file(&original).unwrap();

        assert!(original.exists());
        assert_eq!(fs::read(&backup).unwrap(), b"fov:90");
        assert_eq!(backup.parent().unwrap(), temp.path().join(BACKUP_DIR));

        let name = backup.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("options.txt."));
        assert!(name.ends_with(".backup"));
    }

    #[test]
    fn test_backups_in_same_second_do_not_overwrite() {
        let temp = TempDir::new().unwrap();
        let original = temp.path().join("mod.jar");

        fs::write(&original, b"first").unwrap();
        let first = backup_file(&original).unwrap();
        fs::write(&original, b"second").unwrap();
        let second = backup_file(&original).unwrap();
        fs::write(&original, b"third").unwrap();
        let third = backup_file(&original).unwrap();

        assert_ne!(first, second);
        assert_ne!(second, third);
        assert_eq!(fs::read(&first).unwrap(), b"first");
        assert_eq!(fs::read(&second).unwrap(), b"second");
        assert_eq!(fs::read(&third).unwrap(), b"third");
    }

    #[test]
    fn test_backup_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        let result = backup_file(&temp.path().join("absent.jar"));
        assert!(matches!(result, Err(TransferError::BackupFailed { .. })));
    }
}
