//! The bundled descriptor tables.
//!
//! `pinokio.js` is the root with the dynamic menu, `install.js` and
//! `update.js` carry run lists. `start.js` is linked from the menu but ships
//! with the application itself, so the catalog only knows its name.

use crate::descriptor::{Descriptor, Step};
use crate::error::{LauncherError, Result};
use std::fmt;
use std::str::FromStr;
use strum::EnumIter;

pub const APP_TITLE: &str = "Nexus Ark";
pub const APP_DESCRIPTION: &str =
    "AI Persona Interaction System with localized memory and emotional intelligence.";
pub const APP_ICON: &str = "icon.png";

pub const UV_INSTALLER: &str = "curl -LsSF https://astral.sh/uv/install.sh | sh";
pub const UV_SYNC: &str = "uv sync";
pub const GIT_PULL: &str = "git pull";
/// May not exist in older checkouts
pub const KNOWLEDGE_UPDATE: &str = "uv run tools/update_knowledge.py";

pub const INSTALL_DONE: &str = "Installation Complete! Click 'Start Application' to begin.";
pub const UPDATE_DONE: &str = "Update Complete!";

/// Descriptors the menu can route to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum DescriptorId {
    Root,
    Install,
    Update,
    Start,
}

impl DescriptorId {
    /// File name the host uses as href
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Root => "pinokio.js",
            Self::Install => "install.js",
            Self::Update => "update.js",
            Self::Start => "start.js",
        }
    }

    /// Whether the launcher ships this descriptor's body
    pub fn is_bundled(&self) -> bool {
        !matches!(self, Self::Start)
    }
}

impl fmt::Display for DescriptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

impl FromStr for DescriptorId {
    type Err = LauncherError;

    /// Accepts `install`, `install.js` and `./install.js`
    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().trim_start_matches("./");
        let stem = name.strip_suffix(".js").unwrap_or(name);
        match stem {
            "pinokio" | "root" => Ok(Self::Root),
            "install" => Ok(Self::Install),
            "update" => Ok(Self::Update),
            "start" => Ok(Self::Start),
            _ => Err(LauncherError::UnknownDescriptor(s.to_string())),
        }
    }
}

/// Root descriptor: metadata plus the resolver-driven menu
pub fn root() -> Descriptor {
    Descriptor {
        name: DescriptorId::Root.file_name().to_string(),
        title: Some(APP_TITLE.to_string()),
        description: Some(APP_DESCRIPTION.to_string()),
        icon: Some(APP_ICON.to_string()),
        menu: true,
        run: None,
    }
}

/// Install uv, sync dependencies, announce. No step tolerates failure.
pub fn install() -> Descriptor {
    Descriptor::script(
        DescriptorId::Install.file_name(),
        vec![
            Step::shell(UV_INSTALLER),
            Step::shell(UV_SYNC),
            Step::notify(INSTALL_DONE),
        ],
    )
}

/// Pull, re-sync, refresh knowledge (allowed to fail), announce.
pub fn update() -> Descriptor {
    Descriptor::script(
        DescriptorId::Update.file_name(),
        vec![
            Step::shell(GIT_PULL),
            Step::shell(UV_SYNC),
            Step::shell(KNOWLEDGE_UPDATE).tolerate_failure(),
            Step::notify(UPDATE_DONE),
        ],
    )
}

/// Look up a bundled descriptor
pub fn lookup(id: DescriptorId) -> Result<Descriptor> {
    match id {
        DescriptorId::Root => Ok(root()),
        DescriptorId::Install => Ok(install()),
        DescriptorId::Update => Ok(update()),
        DescriptorId::Start => Err(LauncherError::ExternalDescriptor(
            id.file_name().to_string(),
        )),
    }
}

/// Look up a descriptor by href or short name
pub fn lookup_by_name(name: &str) -> Result<Descriptor> {
    lookup(name.parse()?)
}
