// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Plugin install planning.
//!
//! Reconcile the declared plugin list against what the version manager
//! already has installed. Whatever is declared but missing gets split into
//! two buckets: plugins that come from the custom repository, and plugins
//! that the version manager resolves from its default registry.
//!
//! Already installed plugins never make it into a plan, so planning again
//! after a successful install yields an empty plan.

use crate::{
    config::CustomSource,
    manifest::DeclaredPlugins,
    tool::VersionManager,
};

use std::collections::HashSet;
use tracing::{error, info, instrument};

/// Declared plugins that still need to be added.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PluginPlan {
    /// Plugins to add from the default registry, in declaration order.
    pub default: Vec<String>,

    /// Plugins to add from the custom repository, in declaration order.
    pub custom: Vec<String>,
}

impl PluginPlan {
    /// Check if nothing needs to be added.
    pub fn is_empty(&self) -> bool {
        self.default.is_empty() && self.custom.is_empty()
    }

    /// Total number of plugins to add.
    pub fn len(&self) -> usize {
        self.default.len() + self.custom.len()
    }
}

/// Partition declared but uninstalled plugins by source.
pub fn compute_plugin_plan(
    declared: &DeclaredPlugins,
    installed: &HashSet<String>,
    custom: &CustomSource,
) -> PluginPlan {
    let mut plan = PluginPlan::default();
    for plugin in declared.iter() {
        if installed.contains(plugin) {
            info!("asdf plugin {plugin} is already installed");
        } else if custom.contains(plugin) {
            plan.custom.push(plugin.to_owned());
        } else {
            plan.default.push(plugin.to_owned());
        }
    }

    plan
}

/// Query version manager for installed plugins.
///
/// A failed listing is logged, and treated as if nothing were installed, so
/// that every declared plugin still gets attempted.
#[instrument(skip(manager), level = "debug")]
pub async fn installed_plugins(manager: &impl VersionManager) -> HashSet<String> {
    match manager.list_plugins().await {
        Ok(output) if output.is_success() => output.stdout_lines().map(str::to_owned).collect(),
        Ok(output) => {
            error!("failed to list installed plugins: {}", output.failure_reason());
            HashSet::new()
        }
        Err(err) => {
            error!("failed to list installed plugins: {err}");
            HashSet::new()
        }
    }
}

/// Plan plugin installation against current state of version manager.
pub async fn plan_plugins(
    declared: &DeclaredPlugins,
    custom: &CustomSource,
    manager: &impl VersionManager,
) -> PluginPlan {
    let installed = installed_plugins(manager).await;
    compute_plugin_plan(declared, &installed, custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::fake::FakeManager;
    use pretty_assertions::assert_eq;

    fn custom(plugins: &[&str]) -> CustomSource {
        CustomSource {
            url: "https://blah.org/asdf-blah.git".into(),
            plugins: plugins.iter().map(|name| name.to_string()).collect(),
        }
    }

    fn installed(plugins: &[&str]) -> HashSet<String> {
        plugins.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn partition_missing_plugins() {
        let declared = DeclaredPlugins::from_iter(["a", "b", "c"]);

        let result = compute_plugin_plan(&declared, &installed(&["b"]), &custom(&["c"]));

        let expect = PluginPlan {
            default: vec!["a".into()],
            custom: vec!["c".into()],
        };
        assert_eq!(result, expect);
    }

    #[test]
    fn preserve_declaration_order() {
        let declared = DeclaredPlugins::from_iter(["mypy", "ruby", "cowsay", "nodejs", "golang"]);

        let result = compute_plugin_plan(
            &declared,
            &installed(&["nodejs"]),
            &custom(&["cowsay", "mypy"]),
        );

        assert_eq!(result.custom, vec!["mypy".to_string(), "cowsay".to_string()]);
        assert_eq!(result.default, vec!["ruby".to_string(), "golang".to_string()]);
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn installed_custom_plugin_is_skipped() {
        let declared = DeclaredPlugins::from_iter(["cowsay"]);

        let result = compute_plugin_plan(&declared, &installed(&["cowsay"]), &custom(&["cowsay"]));

        assert!(result.is_empty());
    }

    #[test]
    fn empty_declaration_yields_empty_plan() {
        let result = compute_plugin_plan(
            &DeclaredPlugins::default(),
            &installed(&["nodejs"]),
            &custom(&["cowsay"]),
        );

        assert_eq!(result, PluginPlan::default());
    }

    #[tokio::test]
    async fn failed_listing_attempts_everything() {
        let manager = FakeManager::with_installed(["nodejs"]).fail_on("plugin list");
        let declared = DeclaredPlugins::from_iter(["nodejs", "ruby"]);

        let result = plan_plugins(&declared, &custom(&[]), &manager).await;

        assert_eq!(result.default, vec!["nodejs".to_string(), "ruby".to_string()]);
    }

    #[tokio::test]
    async fn plan_against_version_manager() {
        let manager = FakeManager::with_installed(["b"]);
        let declared = DeclaredPlugins::from_iter(["a", "b", "c"]);

        let result = plan_plugins(&declared, &custom(&["c"]), &manager).await;

        assert_eq!(result.default, vec!["a".to_string()]);
        assert_eq!(result.custom, vec!["c".to_string()]);
        assert_eq!(manager.calls(), vec!["plugin list".to_string()]);
    }
}
