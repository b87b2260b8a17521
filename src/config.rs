// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the configuration file that asdfsync uses to locate
//! its inputs, and to decide how plugins should be installed. The
//! configuration is constructed once at startup, and handed to every step of
//! the bootstrap by reference. Nothing else in the crate reads paths or plugin
//! sets from anywhere else.
//!
//! # General Layout
//!
//! ```toml
//! [paths]
//! source = "dot-files/.tool-versions"
//! destination = "~/.tool-versions"
//! backup_dir = "~/backups/original"
//! plugins = "asdf-plugins.txt"
//!
//! [tool]
//! program = "asdf"
//! command_timeout = 600
//!
//! [custom_source]
//! url = "https://github.com/amrox/asdf-pyapp.git"
//! plugins = ["cowsay", "mypy"]
//! ```
//!
//! Every section and field is optional. Missing fields fall back to the
//! defaults shown above, except `command_timeout` which is unbounded unless
//! set. Path fields undergo shell expansion, so `~` and `$VAR` are resolved
//! when the configuration is parsed.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs::read_to_string,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};
use tracing::{debug, instrument};

/// Top-level configuration.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Locations of input and output files.
    pub paths: PathSettings,

    /// External version manager settings.
    pub tool: ToolSettings,

    /// Plugins that must be installed from a custom repository.
    #[serde(rename = "custom_source")]
    pub custom: CustomSource,
}

impl Config {
    /// Load configuration from file.
    ///
    /// An explicitly requested file must exist. Otherwise the default
    /// configuration file is used if it exists, and built-in defaults are used
    /// if it does not.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if configuration file cannot be read.
    /// - Return [`ConfigError::Deserialize`] if configuration is invalid.
    /// - Return [`ConfigError::ShellExpansion`] if path expansion fails.
    #[instrument(level = "debug")]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => crate::path::default_config_file()
                .ok()
                .filter(|path| path.exists()),
        };

        let Some(path) = path else {
            debug!("no configuration file found, using defaults");
            return "".parse();
        };

        debug!("load configuration from {:?}", path.display());
        read_to_string(&path)
            .map_err(|err| ConfigError::Read {
                source: err,
                path: path.clone(),
            })?
            .parse()
    }

    /// Bounded wait for external commands, if any.
    pub fn command_timeout(&self) -> Option<Duration> {
        self.tool.command_timeout.map(Duration::from_secs)
    }

    /// Perform shell expansion on every path field.
    ///
    /// Already expanded paths are left as they are. Call again after
    /// replacing any path field.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::ShellExpansion`] if path expansion fails.
    pub fn expand_paths(&mut self) -> Result<()> {
        // INVARIANT: Every path field is stored fully expanded.
        for path in [
            &mut self.paths.source,
            &mut self.paths.destination,
            &mut self.paths.backup_dir,
            &mut self.paths.plugins,
        ] {
            *path = expand(path)?;
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut config: Config = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;
        config.expand_paths()?;

        Ok(config)
    }
}

impl Display for Config {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// File locations.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathSettings {
    /// Dotfile to sync into place.
    pub source: PathBuf,

    /// Where the dotfile is synced to. Also the version file that gets read
    /// for pinned versions.
    pub destination: PathBuf,

    /// Directory that receives timestamped backups of the destination.
    pub backup_dir: PathBuf,

    /// Declared plugin list, one plugin name per line.
    pub plugins: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            source: PathBuf::from("dot-files/.tool-versions"),
            destination: PathBuf::from("~/.tool-versions"),
            backup_dir: PathBuf::from("~/backups/original"),
            plugins: PathBuf::from("asdf-plugins.txt"),
        }
    }
}

/// External version manager settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Program to invoke.
    pub program: String,

    /// Seconds to wait on a single command before killing it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_timeout: Option<u64>,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            program: "asdf".into(),
            command_timeout: None,
        }
    }
}

/// Custom plugin source.
///
/// Plugins listed here are added with an explicit repository URL instead of
/// being resolved through the default plugin registry.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CustomSource {
    /// Repository URL to add custom plugins from.
    pub url: String,

    /// Names of plugins to add from custom repository.
    pub plugins: Vec<String>,
}

impl CustomSource {
    /// Check if plugin must be added from custom repository.
    pub fn contains(&self, plugin: impl AsRef<str>) -> bool {
        self.plugins.iter().any(|name| name == plugin.as_ref())
    }
}

impl Default for CustomSource {
    fn default() -> Self {
        Self {
            url: "https://github.com/amrox/asdf-pyapp.git".into(),
            plugins: vec!["cowsay".into(), "mypy".into()],
        }
    }
}

fn expand(path: &Path) -> Result<PathBuf> {
    Ok(PathBuf::from(
        shellexpand::full(path.to_string_lossy().as_ref())
            .map_err(ConfigError::ShellExpansion)?
            .into_owned(),
    ))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read configuration file at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
