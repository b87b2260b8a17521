// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Bootstrap asdf from a synced `.tool-versions` file.
//!
//! asdfsync syncs a `.tool-versions` dotfile into place, keeping a timestamped
//! backup of whatever it replaces. It then adds every declared plugin that the
//! version manager is missing, and finally installs and activates the pinned
//! version of every declared plugin, or "latest" when nothing is pinned.
//!
//! See [`bootstrap`] for the order of operations, and [`config`] for the
//! configuration file layout.

pub mod bootstrap;
pub mod config;
pub mod install;
pub mod manifest;
pub mod path;
pub mod plan;
pub mod sync;
pub mod tool;

pub use bootstrap::{Bootstrap, BootstrapError, BootstrapReport};
pub use config::Config;
pub use tool::{AsdfCli, CommandOutput, VersionManager};
