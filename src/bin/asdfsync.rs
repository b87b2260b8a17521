// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use asdfsync::{AsdfCli, Bootstrap, Config};

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::{path::PathBuf, process::exit};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "asdfsync [options] <asdfsync-command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    async fn run(self) -> Result<()> {
        match self.command {
            Command::Run(opts) => run_bootstrap(opts).await,
            Command::Config(opts) => run_config(opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Sync .tool-versions, add missing plugins, and install versions.
    #[command(override_usage = "asdfsync run [options]")]
    Run(RunOptions),

    /// Show effective configuration.
    #[command(override_usage = "asdfsync config [options]")]
    Config(ConfigOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct RunOptions {
    /// Path to configuration file.
    #[arg(short, long, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Path to declared plugin list.
    #[arg(short, long, value_name = "path")]
    pub plugins: Option<PathBuf>,

    /// Path to .tool-versions file to sync from.
    #[arg(short, long, value_name = "path")]
    pub source: Option<PathBuf>,

    /// Path to sync .tool-versions file to.
    #[arg(short, long, value_name = "path")]
    pub destination: Option<PathBuf>,

    /// Directory to keep backups of replaced .tool-versions files.
    #[arg(short, long, value_name = "path")]
    pub backup_dir: Option<PathBuf>,

    /// Seconds to wait on a single asdf command before killing it.
    #[arg(short, long, value_name = "seconds")]
    pub timeout: Option<u64>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ConfigOptions {
    /// Path to configuration file.
    #[arg(short, long, value_name = "path")]
    pub config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let layer = fmt::layer().compact().with_target(false);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run().await {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

async fn run() -> Result<()> {
    Cli::parse().run().await
}

async fn run_bootstrap(opts: RunOptions) -> Result<()> {
    let mut config = Config::load(opts.config.as_deref())?;
    if let Some(plugins) = opts.plugins {
        config.paths.plugins = plugins;
    }
    if let Some(source) = opts.source {
        config.paths.source = source;
    }
    if let Some(destination) = opts.destination {
        config.paths.destination = destination;
    }
    if let Some(backup_dir) = opts.backup_dir {
        config.paths.backup_dir = backup_dir;
    }
    if let Some(timeout) = opts.timeout {
        config.tool.command_timeout = Some(timeout);
    }
    config.expand_paths()?;

    let manager = AsdfCli::new(&config.tool.program).with_timeout(config.command_timeout());
    Bootstrap::new(&config, manager).run().await?;

    Ok(())
}

fn run_config(opts: ConfigOptions) -> Result<()> {
    let config = Config::load(opts.config.as_deref())?;
    print!("{config}");

    Ok(())
}
