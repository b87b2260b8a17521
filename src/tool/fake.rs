// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! In-memory version manager for tests.

use crate::tool::{CommandOutput, Result, VersionManager};

use std::{
    cell::RefCell,
    collections::{BTreeMap, HashSet},
};

/// Version manager that records calls instead of running anything.
///
/// Added plugins show up in later listings, so repeated runs behave like they
/// would against a real installation.
#[derive(Debug, Default)]
pub(crate) struct FakeManager {
    installed: RefCell<Vec<String>>,
    globals: RefCell<BTreeMap<String, String>>,
    failing: HashSet<String>,
    calls: RefCell<Vec<String>>,
}

impl FakeManager {
    pub(crate) fn with_installed(plugins: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            installed: RefCell::new(plugins.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    /// Fail every command whose rendered form matches exactly.
    pub(crate) fn fail_on(mut self, call: impl Into<String>) -> Self {
        self.failing.insert(call.into());
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub(crate) fn installed(&self) -> Vec<String> {
        self.installed.borrow().clone()
    }

    pub(crate) fn global(&self, plugin: &str) -> Option<String> {
        self.globals.borrow().get(plugin).cloned()
    }

    fn record(&self, call: String) -> Option<CommandOutput> {
        let failed = self.failing.contains(&call);
        self.calls.borrow_mut().push(call.clone());
        failed.then(|| CommandOutput::failure(1, format!("{call} failed")))
    }
}

impl VersionManager for FakeManager {
    async fn list_plugins(&self) -> Result<CommandOutput> {
        if let Some(failure) = self.record("plugin list".into()) {
            return Ok(failure);
        }

        Ok(CommandOutput::success(self.installed.borrow().join("\n")))
    }

    async fn add_plugin(&self, name: &str, url: Option<&str>) -> Result<CommandOutput> {
        let call = match url {
            Some(url) => format!("plugin add {name} {url}"),
            None => format!("plugin add {name}"),
        };
        if let Some(failure) = self.record(call) {
            return Ok(failure);
        }

        self.installed.borrow_mut().push(name.to_owned());
        Ok(CommandOutput::success(""))
    }

    async fn install_version(&self, name: &str, version: &str) -> Result<CommandOutput> {
        if let Some(failure) = self.record(format!("install {name} {version}")) {
            return Ok(failure);
        }

        Ok(CommandOutput::success(format!("installed {name} {version}")))
    }

    async fn set_global(&self, name: &str, version: &str) -> Result<CommandOutput> {
        if let Some(failure) = self.record(format!("global {name} {version}")) {
            return Ok(failure);
        }

        self.globals
            .borrow_mut()
            .insert(name.to_owned(), version.to_owned());
        Ok(CommandOutput::success(""))
    }
}
