// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine relevent path information for external files that need to be
//! interacted with, or managed in some way.

use std::path::{Path, PathBuf};

/// Determine default absolute path to asdfsync's configuration file.
///
/// Uses XDG Base Directory path `$XDG_CONFIG_HOME/asdfsync/config.toml` as
/// the default absolute path for configuration. Does not check if the path
/// returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if configuration directory cannot be determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn default_config_file() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|path| path.join("asdfsync").join("config.toml"))
        .ok_or(NoWayHome)
}

/// Build name of backup file for target path at a given timestamp.
///
/// Backups are named `<basename>-<timestamp>`, e.g., `.tool-versions` backed
/// up at 2025-01-02 03:04:05 becomes `.tool-versions-20250102030405`.
pub fn backup_file_name(path: impl AsRef<Path>, timestamp: impl AsRef<str>) -> String {
    let basename = path
        .as_ref()
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    format!("{basename}-{}", timestamp.as_ref())
}

/// No way to determine user's configuration directory.
///
/// # See Also
///
/// - [`dirs::config_dir`](https://docs.rs/dirs/latest/dirs/fn.config_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's configuration directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
