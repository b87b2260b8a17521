// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Plugin and version installation.
//!
//! Installation is best effort. Each plugin, and each version, is an
//! independent unit of work: a failure is logged, recorded as an outcome, and
//! the batch moves on to the next unit. Nothing is retried, and nothing is
//! rolled back.

use crate::{
    manifest::{DeclaredPlugins, ToolVersions},
    plan::PluginPlan,
    tool::{CommandOutput, Result as ToolResult, VersionManager, LATEST},
};

use std::fmt::{Display, Formatter, Result as FmtResult};
use tracing::{error, info, instrument};

/// Result of a single external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    /// Command exited successfully.
    Succeeded,

    /// Command failed, with reason.
    Failed(String),
}

impl StepStatus {
    /// Check if step failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl From<ToolResult<CommandOutput>> for StepStatus {
    fn from(result: ToolResult<CommandOutput>) -> Self {
        match result {
            Ok(output) if output.is_success() => Self::Succeeded,
            Ok(output) => Self::Failed(output.failure_reason()),
            Err(err) => Self::Failed(err.to_string()),
        }
    }
}

impl Display for StepStatus {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Succeeded => fmt.write_str("ok"),
            Self::Failed(reason) => write!(fmt, "failed ({reason})"),
        }
    }
}

/// Where a plugin was added from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginSource {
    /// Default plugin registry of version manager.
    Registry,

    /// Explicit repository URL.
    Custom(String),
}

/// Outcome of adding one plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginOutcome {
    /// Name of plugin that was added.
    pub plugin: String,

    /// Where plugin was added from.
    pub source: PluginSource,

    /// Result of adding plugin.
    pub status: StepStatus,
}

/// Outcome of installing and activating one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionOutcome {
    /// Name of plugin whose version was installed.
    pub plugin: String,

    /// Version requested, "latest" if nothing was pinned.
    pub version: String,

    /// Whether version came from version declaration.
    pub pinned: bool,

    /// Result of installing version.
    pub install: StepStatus,

    /// Result of setting version as global.
    pub global: StepStatus,
}

impl VersionOutcome {
    /// Check if either step failed.
    pub fn is_failed(&self) -> bool {
        self.install.is_failed() || self.global.is_failed()
    }
}

/// Add every plugin in plan.
///
/// Custom plugins are added first from `custom_url`, then default plugins
/// from the registry, each in plan order.
#[instrument(skip_all, level = "debug")]
pub async fn install_plugins(
    plan: &PluginPlan,
    custom_url: &str,
    manager: &impl VersionManager,
) -> Vec<PluginOutcome> {
    let mut outcomes = Vec::with_capacity(plan.len());

    for plugin in &plan.custom {
        info!("installing custom asdf plugin: {plugin}");
        let status = StepStatus::from(manager.add_plugin(plugin, Some(custom_url)).await);
        if let StepStatus::Failed(reason) = &status {
            error!("failed to install custom plugin {plugin}: {reason}");
        }
        outcomes.push(PluginOutcome {
            plugin: plugin.clone(),
            source: PluginSource::Custom(custom_url.to_owned()),
            status,
        });
    }

    for plugin in &plan.default {
        info!("installing asdf plugin: {plugin}");
        let status = StepStatus::from(manager.add_plugin(plugin, None).await);
        if let StepStatus::Failed(reason) = &status {
            error!("failed to install plugin {plugin}: {reason}");
        }
        outcomes.push(PluginOutcome {
            plugin: plugin.clone(),
            source: PluginSource::Registry,
            status,
        });
    }

    outcomes
}

/// Install and activate a version of every declared plugin.
///
/// Uses pinned version from `versions` when there is one, and "latest"
/// otherwise. Installing and setting the global version are attempted
/// independently of one another.
#[instrument(skip_all, level = "debug")]
pub async fn install_versions(
    declared: &DeclaredPlugins,
    versions: &ToolVersions,
    manager: &impl VersionManager,
) -> Vec<VersionOutcome> {
    let mut outcomes = Vec::with_capacity(declared.len());

    for plugin in declared.iter() {
        let (version, pinned) = match versions.get(plugin) {
            Some(version) => {
                info!("installing {plugin} version {version}");
                (version, true)
            }
            None => {
                info!("no version specified for {plugin}, installing latest version");
                (LATEST, false)
            }
        };

        let install = StepStatus::from(manager.install_version(plugin, version).await);
        if let StepStatus::Failed(reason) = &install {
            error!("failed to install {plugin} {version}: {reason}");
        }

        let global = StepStatus::from(manager.set_global(plugin, version).await);
        if let StepStatus::Failed(reason) = &global {
            error!("failed to set global version for {plugin} to {version}: {reason}");
        }

        outcomes.push(VersionOutcome {
            plugin: plugin.to_owned(),
            version: version.to_owned(),
            pinned,
            install,
            global,
        });
    }

    outcomes
}
