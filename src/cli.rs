use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config_file::LauncherConfig;
use crate::types::Platform;

/// Nexus Ark launcher - install, update and open the application
#[derive(Parser)]
#[command(name = "ark-launcher")]
#[command(about = "Installer and launcher for Nexus Ark")]
#[command(version)]
pub struct Cli {
    /// Launcher configuration file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Application checkout directory (overrides the configuration file)
    #[arg(short, long, global = true)]
    pub base_dir: Option<PathBuf>,

    /// Platform used for menu resolution (linux, macos, windows)
    #[arg(long, global = true)]
    pub platform: Option<Platform>,

    /// Dry-run mode: print shell steps instead of running them.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the menu for the current install state
    Menu {
        /// Emit menu items as JSON
        #[arg(long)]
        json: bool,
    },
    /// Follow a menu href (a descriptor or explorer:<path>)
    Open {
        href: String,
    },
    /// Run a bundled descriptor (install, update)
    Run {
        descriptor: String,
    },
    /// Print a descriptor
    Show {
        descriptor: String,
        /// Emit the host wire form as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        config: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }

    /// Configuration file (if any) with this command line's flags applied,
    /// validated and with an absolute base directory
    pub fn load_config(&self) -> Result<LauncherConfig> {
        let mut config = match &self.config {
            Some(path) => LauncherConfig::load_from_file(path)?,
            None => LauncherConfig::default(),
        };
        config.apply_overrides(self.base_dir.as_deref(), self.platform, self.dry_run);
        config.validate()?;
        config.base_dir = config.resolved_base_dir()?;
        Ok(config)
    }
}

/// Process exit code for a command result: 0 on success, 1 on any failure
pub fn exit_code<T>(result: &Result<T>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}
