// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Bootstrap workflow.
//!
//! A bootstrap runs four steps, strictly in order:
//!
//! 1. Back up the destination `.tool-versions` file, and sync the source
//!    dotfile over it.
//! 2. Plan which declared plugins still need to be added.
//! 3. Add those plugins.
//! 4. Install and activate a version of every declared plugin, pinned by the
//!    synced `.tool-versions` file, or "latest".
//!
//! Only a failed sync, or a missing plugin declaration file, stop the run.
//! Everything after that is best effort, and reported through
//! [`BootstrapReport`].

use crate::{
    config::Config,
    install::{install_plugins, install_versions, PluginOutcome, VersionOutcome},
    manifest::{DeclaredPlugins, MalformedLine, ToolVersions},
    plan::{plan_plugins, PluginPlan},
    sync::{backup_and_sync, SyncOutcome},
    tool::VersionManager,
};

use tracing::{info, instrument, warn};

/// Everything that happened during a bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    /// Backup and sync of dotfile.
    pub sync: SyncOutcome,

    /// Plugins that were missing at start of run.
    pub plan: PluginPlan,

    /// Outcome of adding each missing plugin.
    pub plugins: Vec<PluginOutcome>,

    /// Version declaration lines that were skipped.
    pub malformed: Vec<MalformedLine>,

    /// Outcome of installing a version of each declared plugin.
    pub versions: Vec<VersionOutcome>,
}

impl BootstrapReport {
    /// Count every recoverable failure that occured.
    pub fn failure_count(&self) -> usize {
        let plugins = self
            .plugins
            .iter()
            .filter(|outcome| outcome.status.is_failed())
            .count();
        let versions = self
            .versions
            .iter()
            .filter(|outcome| outcome.is_failed())
            .count();

        plugins + versions + self.malformed.len()
    }

    /// Describe every recoverable failure, one line each.
    pub fn failures(&self) -> Vec<String> {
        let plugins = self
            .plugins
            .iter()
            .filter(|outcome| outcome.status.is_failed())
            .map(|outcome| format!("plugin add {}: {}", outcome.plugin, outcome.status));
        let malformed = self
            .malformed
            .iter()
            .map(|line| format!("malformed line {}: {}", line.number, line.content));
        let versions = self
            .versions
            .iter()
            .filter(|outcome| outcome.is_failed())
            .map(|outcome| {
                format!(
                    "{} {}: install {}, global {}",
                    outcome.plugin, outcome.version, outcome.install, outcome.global
                )
            });

        plugins.chain(malformed).chain(versions).collect()
    }

    /// Check if every step went through without failure.
    pub fn is_clean(&self) -> bool {
        self.failure_count() == 0
    }
}

/// Bootstrap runner.
#[derive(Debug)]
pub struct Bootstrap<'cfg, M>
where
    M: VersionManager,
{
    config: &'cfg Config,
    manager: M,
}

impl<'cfg, M> Bootstrap<'cfg, M>
where
    M: VersionManager,
{
    /// Construct new bootstrap runner.
    pub fn new(config: &'cfg Config, manager: M) -> Self {
        Self { config, manager }
    }

    /// Version manager being driven.
    pub fn manager(&self) -> &M {
        &self.manager
    }

    /// Run every bootstrap step in order.
    ///
    /// # Errors
    ///
    /// - Return [`BootstrapError::Sync`] if backup or sync fails.
    /// - Return [`BootstrapError::Manifest`] if plugin declaration file is
    ///   missing, or if a manifest cannot be read.
    #[instrument(skip(self), level = "debug")]
    pub async fn run(&self) -> Result<BootstrapReport> {
        let paths = &self.config.paths;
        let sync = backup_and_sync(&paths.source, &paths.destination, &paths.backup_dir)?;

        let declared = DeclaredPlugins::load(&paths.plugins)?;
        let plan = plan_plugins(&declared, &self.config.custom, &self.manager).await;
        let plugins = install_plugins(&plan, &self.config.custom.url, &self.manager).await;

        let versions = ToolVersions::load_or_default(&paths.destination)?;
        let malformed = versions.malformed().to_vec();
        let versions = install_versions(&declared, &versions, &self.manager).await;

        let report = BootstrapReport {
            sync,
            plan,
            plugins,
            malformed,
            versions,
        };

        info!("setup complete");
        if !report.is_clean() {
            warn!(
                "{} step(s) failed, see errors above",
                report.failure_count()
            );
            for failure in report.failures() {
                warn!("{failure}");
            }
        }

        Ok(report)
    }
}

/// Bootstrap error types.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Backup and sync of dotfile fails.
    #[error(transparent)]
    Sync(#[from] crate::sync::SyncError),

    /// Required manifest is missing or unreadable.
    #[error(transparent)]
    Manifest(#[from] crate::manifest::ManifestError),
}

/// Friendly result alias :3
pub type Result<T, E = BootstrapError> = std::result::Result<T, E>;
