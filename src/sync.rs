// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Dotfile backup and sync.
//!
//! Before a dotfile is synced into place, whatever currently occupies the
//! destination is moved into a backup directory under a timestamped name.
//! Backups are append-only. Nothing in asdfsync ever removes them.
//!
//! # Backup Layout
//!
//! The backup of `~/.tool-versions` taken at 2025-01-02 03:04:05 local time
//! lands at `<backup_dir>/.tool-versions-20250102030405`. Timestamps have
//! second resolution. Should two backups of the same file collide within the
//! same second, the later one gets a numeric suffix, e.g.,
//! `.tool-versions-20250102030405.1`, so no earlier backup is overwritten.

use crate::path::backup_file_name;

use chrono::{DateTime, Local};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, instrument, warn};

/// Format of timestamp suffix given to backup files.
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Result of syncing a dotfile into place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Where the previous destination file was moved to, if it existed.
    pub backup: Option<PathBuf>,

    /// Path that now holds a copy of the source.
    pub destination: PathBuf,
}

/// Back up destination, and sync source over it.
///
/// Ensures that the backup directory exists. If the destination already
/// exists, then it is moved into the backup directory under a timestamped
/// name. Afterwards source is copied to destination unconditionally.
///
/// # Errors
///
/// - Return [`SyncError::CreateBackupDir`] if backup directory cannot be
///   created.
/// - Return [`SyncError::MoveToBackup`] if destination cannot be moved into
///   the backup directory.
/// - Return [`SyncError::Copy`] if source cannot be copied to destination.
pub fn backup_and_sync(
    source: impl AsRef<Path>,
    destination: impl AsRef<Path>,
    backup_dir: impl AsRef<Path>,
) -> Result<SyncOutcome> {
    backup_and_sync_at(source, destination, backup_dir, Local::now())
}

/// Back up destination, and sync source over it at a fixed point in time.
///
/// Same as [`backup_and_sync`], but the backup timestamp is taken from `now`.
///
/// # Errors
///
/// - Return [`SyncError::CreateBackupDir`] if backup directory cannot be
///   created.
/// - Return [`SyncError::MoveToBackup`] if destination cannot be moved into
///   the backup directory.
/// - Return [`SyncError::Copy`] if source cannot be copied to destination.
#[instrument(skip_all, level = "debug")]
pub fn backup_and_sync_at(
    source: impl AsRef<Path>,
    destination: impl AsRef<Path>,
    backup_dir: impl AsRef<Path>,
    now: DateTime<Local>,
) -> Result<SyncOutcome> {
    let source = source.as_ref();
    let destination = destination.as_ref();
    let backup_dir = backup_dir.as_ref();

    mkdirp::mkdirp(backup_dir).map_err(|err| SyncError::CreateBackupDir {
        source: err,
        backup_dir: backup_dir.to_path_buf(),
    })?;

    let backup = if destination.exists() {
        let timestamp = now.format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let backup = unused_backup_path(backup_dir.join(backup_file_name(destination, timestamp)));
        info!(
            "moving existing {:?} to {:?}",
            destination.display(),
            backup.display()
        );
        move_file(destination, &backup)?;
        Some(backup)
    } else {
        None
    };

    info!("syncing {:?} with {:?}", source.display(), destination.display());
    fs::copy(source, destination).map_err(|err| SyncError::Copy {
        source: err,
        from: source.to_path_buf(),
        to: destination.to_path_buf(),
    })?;

    Ok(SyncOutcome {
        backup,
        destination: destination.to_path_buf(),
    })
}

fn unused_backup_path(candidate: PathBuf) -> PathBuf {
    if !candidate.exists() {
        return candidate;
    }

    warn!("backup {:?} already exists", candidate.display());
    let mut suffix = 1;
    loop {
        let mut name = candidate.clone().into_os_string();
        name.push(format!(".{suffix}"));
        let next = PathBuf::from(name);
        if !next.exists() {
            return next;
        }
        suffix += 1;
    }
}

fn move_file(from: &Path, to: &Path) -> Result<()> {
    let moved = match fs::rename(from, to) {
        Ok(()) => Ok(()),
        // INVARIANT: Renames cannot cross file systems, so fall back to copy and remove.
        Err(err) if is_cross_device(&err) => {
            fs::copy(from, to).and_then(|_| fs::remove_file(from))
        }
        Err(err) => Err(err),
    };

    moved.map_err(|err| SyncError::MoveToBackup {
        source: err,
        from: from.to_path_buf(),
        to: to.to_path_buf(),
    })
}

#[cfg(unix)]
fn is_cross_device(err: &std::io::Error) -> bool {
    // EXDEV
    err.raw_os_error() == Some(18)
}

#[cfg(windows)]
fn is_cross_device(err: &std::io::Error) -> bool {
    // ERROR_NOT_SAME_DEVICE
    err.raw_os_error() == Some(17)
}

/// Backup and sync error types.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Backup directory cannot be created.
    #[error("failed to create backup directory at {:?}", backup_dir.display())]
    CreateBackupDir {
        #[source]
        source: std::io::Error,
        backup_dir: PathBuf,
    },

    /// Existing destination cannot be moved into backup directory.
    #[error("failed to move {:?} to {:?}", from.display(), to.display())]
    MoveToBackup {
        #[source]
        source: std::io::Error,
        from: PathBuf,
        to: PathBuf,
    },

    /// Source cannot be copied to destination.
    #[error("failed to copy {:?} to {:?}", from.display(), to.display())]
    Copy {
        #[source]
        source: std::io::Error,
        from: PathBuf,
        to: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = SyncError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use std::fs::{read_dir, read_to_string, write};
    use tempfile::TempDir;

    fn backups(dir: &Path) -> Vec<String> {
        let mut names = read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        names.sort();
        names
    }

    fn is_timestamped_backup(name: &str) -> bool {
        name.strip_prefix(".tool-versions-")
            .is_some_and(|stamp| stamp.len() == 14 && stamp.chars().all(|c| c.is_ascii_digit()))
    }

    #[test]
    fn existing_destination_is_backed_up() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let source = temp.path().join("source");
        let destination = temp.path().join(".tool-versions");
        let backup_dir = temp.path().join("backups").join("original");
        write(&source, "nodejs 20.1.0\n")?;
        write(&destination, "nodejs 18.0.0\n")?;

        let outcome = backup_and_sync(&source, &destination, &backup_dir)?;

        let names = backups(&backup_dir);
        assert_eq!(names.len(), 1);
        assert!(is_timestamped_backup(&names[0]), "unexpected backup {}", names[0]);
        assert_eq!(outcome.backup, Some(backup_dir.join(&names[0])));
        assert_eq!(read_to_string(backup_dir.join(&names[0]))?, "nodejs 18.0.0\n");
        assert_eq!(read_to_string(&destination)?, "nodejs 20.1.0\n");

        Ok(())
    }

    #[test]
    fn missing_destination_is_not_backed_up() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let source = temp.path().join("source");
        let destination = temp.path().join(".tool-versions");
        let backup_dir = temp.path().join("backups");
        write(&source, "golang 1.22.0\n")?;

        let outcome = backup_and_sync(&source, &destination, &backup_dir)?;

        assert_eq!(outcome.backup, None);
        assert!(backup_dir.is_dir());
        assert!(backups(&backup_dir).is_empty());
        assert_eq!(read_to_string(&destination)?, "golang 1.22.0\n");

        Ok(())
    }

    #[test]
    fn backup_name_uses_timestamp() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let source = temp.path().join("source");
        let destination = temp.path().join(".tool-versions");
        let backup_dir = temp.path().join("backups");
        write(&source, "new\n")?;
        write(&destination, "old\n")?;
        let now = Local.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();

        let outcome = backup_and_sync_at(&source, &destination, &backup_dir, now)?;

        assert_eq!(
            outcome.backup,
            Some(backup_dir.join(".tool-versions-20250102030405"))
        );

        Ok(())
    }

    #[test]
    fn colliding_backup_is_not_overwritten() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let source = temp.path().join("source");
        let destination = temp.path().join(".tool-versions");
        let backup_dir = temp.path().join("backups");
        let now = Local.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        write(&source, "third\n")?;
        write(&destination, "first\n")?;
        backup_and_sync_at(&source, &destination, &backup_dir, now)?;
        write(&destination, "second\n")?;

        let outcome = backup_and_sync_at(&source, &destination, &backup_dir, now)?;

        let first = backup_dir.join(".tool-versions-20250102030405");
        let second = backup_dir.join(".tool-versions-20250102030405.1");
        assert_eq!(outcome.backup, Some(second.clone()));
        assert_eq!(read_to_string(first)?, "first\n");
        assert_eq!(read_to_string(second)?, "second\n");

        Ok(())
    }

    #[test]
    fn failed_rename_keeps_original_error() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let from = temp.path().join(".tool-versions");
        let to = temp.path().join("missing").join(".tool-versions-20250102030405");
        write(&from, "nodejs 18.0.0\n")?;

        let result = move_file(&from, &to);

        match result {
            Err(SyncError::MoveToBackup { source, .. }) => {
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected move failure, got {other:?}"),
        }
        assert_eq!(read_to_string(&from)?, "nodejs 18.0.0\n");
        assert!(!to.exists());

        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn only_cross_device_errors_fall_back() {
        assert!(is_cross_device(&std::io::Error::from_raw_os_error(18)));
        assert!(!is_cross_device(&std::io::Error::from_raw_os_error(13)));
        assert!(!is_cross_device(&std::io::Error::other("blah")));
    }

    #[test]
    fn missing_source_fails() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let result = backup_and_sync(
            temp.path().join("nope"),
            temp.path().join(".tool-versions"),
            temp.path().join("backups"),
        );

        assert!(matches!(result, Err(SyncError::Copy { .. })));

        Ok(())
    }
}
