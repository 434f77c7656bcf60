//! Glue between configuration, menu, catalog and host.
//!
//! Every call re-resolves the menu from disk; nothing about install state is
//! remembered between calls.

use crate::catalog::{self, DescriptorId};
use crate::config_file::LauncherConfig;
use crate::descriptor::{Href, MenuItem};
use crate::error::{LauncherError, Result};
use crate::executor::{self, HostPrimitives, RunReport};
use crate::menu::{self, DiskProbe, FsProbe};
use crate::shell::{self, SystemHost};
use std::path::PathBuf;
use tracing::info;

/// What following an href did
#[derive(Debug)]
pub enum OpenOutcome {
    Ran(RunReport),
    OpenedFolder(PathBuf),
}

pub struct Launcher {
    config: LauncherConfig,
    probe: Box<dyn FsProbe>,
}

impl Launcher {
    /// Launcher probing the real filesystem under the configured base dir
    pub fn new(config: LauncherConfig) -> Self {
        Self::with_probe(config, Box::new(DiskProbe))
    }

    pub fn with_probe(config: LauncherConfig, probe: Box<dyn FsProbe>) -> Self {
        Self { config, probe }
    }

    /// Root menu for the current filesystem state
    pub fn menu(&self) -> Vec<MenuItem> {
        menu::resolve_menu_with_mode(
            self.probe.as_ref(),
            &self.config.base_dir,
            self.config.platform,
            self.config.menu_mode,
        )
    }

    /// Host for the configured checkout
    pub fn system_host(&self) -> SystemHost {
        SystemHost::new(&self.config.base_dir)
            .shell(self.config.shell.clone())
            .dry_run(self.config.dry_run)
    }

    /// Run a bundled descriptor against `host`; aborted runs become errors.
    ///
    /// Menu-only descriptors such as the root have nothing to run and are
    /// rejected.
    pub fn run_with(&self, id: DescriptorId, host: &mut dyn HostPrimitives) -> Result<RunReport> {
        let descriptor = catalog::lookup(id)?;
        descriptor.validate()?;
        if descriptor.run.is_none() {
            return Err(LauncherError::validation(format!(
                "{} only provides a menu; use `menu` to list its entries",
                descriptor.name
            )));
        }
        executor::execute(&descriptor, host).into_result()
    }

    /// Follow a menu href
    pub fn open_with(&self, href: &Href, host: &mut dyn HostPrimitives) -> Result<OpenOutcome> {
        match href {
            Href::Descriptor(name) => {
                let id: DescriptorId = name.parse()?;
                info!(descriptor = %id, "Opening descriptor");
                Ok(OpenOutcome::Ran(self.run_with(id, host)?))
            }
            Href::Explorer(path) => {
                shell::open_explorer(path, self.config.dry_run)?;
                Ok(OpenOutcome::OpenedFolder(path.clone()))
            }
        }
    }
}
