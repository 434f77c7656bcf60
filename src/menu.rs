//! Menu resolution for the root descriptor.
//!
//! The menu is a pure function of filesystem state: a `venv` or `.venv`
//! directory under the base directory means the application is installed
//! (on Windows a bundled `uv` binary counts too). Nothing is cached; callers
//! resolve again on every render so a fresh install is picked up.

use crate::catalog::DescriptorId;
use crate::descriptor::{Href, MenuItem};
use crate::types::{MenuMode, Platform};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const INSTALL_LABEL: &str = r#"<i class="fa-solid fa-download"></i> Install"#;
pub const START_LABEL: &str = r#"<i class="fa-solid fa-rocket"></i> Start Application"#;
pub const UPDATE_LABEL: &str = r#"<i class="fa-solid fa-rotate"></i> Update"#;
pub const FOLDER_LABEL: &str = r#"<i class="fa-solid fa-folder"></i> Open Folder"#;

/// Paths whose presence marks an installed checkout
const VENV_MARKERS: &[&str] = &["venv", ".venv"];
/// Bundled package manager accepted on Windows
const BUNDLED_UV: &str = "uv";

/// Filesystem existence check
pub trait FsProbe {
    /// Whether `relative` exists under `base`
    fn exists(&self, base: &Path, relative: &str) -> bool;
}

/// Probe backed by the real filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskProbe;

impl FsProbe for DiskProbe {
    fn exists(&self, base: &Path, relative: &str) -> bool {
        base.join(relative).exists()
    }
}

/// In-memory probe: unknown paths do not exist
#[derive(Debug, Default, Clone)]
pub struct MapProbe {
    entries: HashMap<PathBuf, bool>,
}

impl MapProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the existence of `base/relative`
    pub fn with(mut self, base: impl AsRef<Path>, relative: &str, exists: bool) -> Self {
        self.entries.insert(base.as_ref().join(relative), exists);
        self
    }
}

impl FsProbe for MapProbe {
    fn exists(&self, base: &Path, relative: &str) -> bool {
        self.entries
            .get(&base.join(relative))
            .copied()
            .unwrap_or(false)
    }
}

/// Whether the base directory looks installed
pub fn is_installed(probe: &dyn FsProbe, base: &Path, platform: Platform) -> bool {
    let venv = VENV_MARKERS.iter().any(|marker| probe.exists(base, marker));
    venv || (platform.accepts_bundled_uv() && probe.exists(base, BUNDLED_UV))
}

/// Menu items for the current filesystem state
pub fn resolve_menu(probe: &dyn FsProbe, base: &Path, platform: Platform) -> Vec<MenuItem> {
    let installed = is_installed(probe, base, platform);
    tracing::debug!(base = %base.display(), %platform, installed, "Resolving menu");

    if installed {
        vec![
            MenuItem::new(START_LABEL, descriptor_href(DescriptorId::Start)),
            MenuItem::new(UPDATE_LABEL, descriptor_href(DescriptorId::Update)),
            MenuItem::new(FOLDER_LABEL, Href::Explorer(base.to_path_buf())),
        ]
    } else {
        install_menu()
    }
}

/// Menu according to the configured mode
pub fn resolve_menu_with_mode(
    probe: &dyn FsProbe,
    base: &Path,
    platform: Platform,
    mode: MenuMode,
) -> Vec<MenuItem> {
    match mode {
        MenuMode::Dynamic => resolve_menu(probe, base, platform),
        MenuMode::InstallOnly => install_menu(),
    }
}

fn install_menu() -> Vec<MenuItem> {
    vec![MenuItem::new(
        INSTALL_LABEL,
        descriptor_href(DescriptorId::Install),
    )]
}

fn descriptor_href(id: DescriptorId) -> Href {
    Href::Descriptor(id.file_name().to_string())
}
