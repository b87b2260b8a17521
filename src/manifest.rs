// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Plugin and version manifests.
//!
//! asdfsync reads two user-maintained files:
//!
//! 1. The __declared plugin list__, one plugin name per line. Blank lines are
//!    ignored. This file is required, a bootstrap cannot proceed without it.
//! 2. The __version declaration__, better known as `.tool-versions`. Each
//!    non-blank line that does not start with `#` must contain exactly two
//!    whitespace separated tokens: a plugin name, and a version. Anything else
//!    is a malformed line that gets reported and skipped. This file is
//!    optional, a plugin without a pinned version simply gets "latest".
//!
//! Both are parsed once per run, and shared between every step that needs
//! them.

use std::{
    collections::HashMap,
    fs::read_to_string,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::{error, instrument, warn};

/// Ordered listing of plugins the user wants installed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeclaredPlugins {
    plugins: Vec<String>,
}

impl DeclaredPlugins {
    /// Load declared plugin list from file.
    ///
    /// # Errors
    ///
    /// - Return [`ManifestError::MissingDeclaration`] if file does not exist.
    /// - Return [`ManifestError::Read`] if file cannot be read.
    #[instrument(skip(path), level = "debug")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match read_to_string(path) {
            Ok(content) => Ok(Self::from(content.as_str())),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(ManifestError::MissingDeclaration {
                path: path.to_path_buf(),
            }),
            Err(err) => Err(ManifestError::Read {
                source: err,
                path: path.to_path_buf(),
            }),
        }
    }

    /// Iterate through plugin names in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.plugins.iter().map(String::as_str)
    }

    /// Number of declared plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Check if no plugins were declared.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl From<&str> for DeclaredPlugins {
    fn from(content: &str) -> Self {
        let plugins = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect();

        Self { plugins }
    }
}

impl<S> FromIterator<S> for DeclaredPlugins
where
    S: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            plugins: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Line of version declaration that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    /// One-based line number.
    pub number: usize,

    /// Raw content of line.
    pub content: String,
}

/// Pinned versions by plugin name.
///
/// # Invariant
///
/// - At most one version per plugin. Later declarations win over earlier ones.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ToolVersions {
    versions: HashMap<String, String>,
    malformed: Vec<MalformedLine>,
}

impl ToolVersions {
    /// Load version declaration from file.
    ///
    /// A missing file is not an error. It just means that nothing is pinned.
    ///
    /// # Errors
    ///
    /// - Return [`ManifestError::Read`] if existing file cannot be read.
    #[instrument(skip(path), level = "debug")]
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match read_to_string(path) {
            Ok(content) => Ok(Self::parse(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(
                    "{:?} not found, latest version will be used for every plugin",
                    path.display()
                );
                Ok(Self::default())
            }
            Err(err) => Err(ManifestError::Read {
                source: err,
                path: path.to_path_buf(),
            }),
        }
    }

    /// Parse version declaration.
    ///
    /// Malformed lines are logged, recorded, and skipped.
    pub fn parse(content: impl AsRef<str>) -> Self {
        let mut tool_versions = Self::default();
        for (index, line) in content.as_ref().lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let tokens = trimmed.split_whitespace().collect::<Vec<_>>();
            let [plugin, version] = tokens.as_slice() else {
                error!("malformed line in .tool-versions file: {line}");
                tool_versions.malformed.push(MalformedLine {
                    number: index + 1,
                    content: line.to_owned(),
                });
                continue;
            };

            if let Some(previous) = tool_versions
                .versions
                .insert((*plugin).to_owned(), (*version).to_owned())
            {
                warn!("{plugin} declared more than once, {version} overrides {previous}");
            }
        }

        tool_versions
    }

    /// Pinned version of plugin, if any.
    pub fn get(&self, plugin: impl AsRef<str>) -> Option<&str> {
        self.versions.get(plugin.as_ref()).map(String::as_str)
    }

    /// Lines that could not be parsed.
    pub fn malformed(&self) -> &[MalformedLine] {
        &self.malformed
    }

    /// Number of pinned plugins.
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Check if nothing is pinned.
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

/// Manifest error types.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// Declared plugin list does not exist.
    #[error("plugin declaration file {:?} not found", path.display())]
    MissingDeclaration { path: PathBuf },

    /// Manifest exists, but cannot be read.
    #[error("failed to read manifest at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = ManifestError> = std::result::Result<T, E>;
