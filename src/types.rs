//! Small typed settings shared by the menu resolver, host and configuration.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Host platform, as far as the launcher cares about it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Platform {
    Linux,
    #[strum(to_string = "macos", serialize = "darwin")]
    Macos,
    #[strum(to_string = "windows", serialize = "win32")]
    Windows,
}

impl Platform {
    /// Platform the binary was compiled for
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::Macos
        } else {
            Self::Linux
        }
    }

    /// Windows installs may ship a bundled `uv` binary instead of a venv
    pub fn accepts_bundled_uv(&self) -> bool {
        matches!(self, Self::Windows)
    }

    /// Program used to open a folder in the native file browser
    pub fn explorer_program(&self) -> &'static str {
        match self {
            Self::Linux => "xdg-open",
            Self::Macos => "open",
            Self::Windows => "explorer",
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

/// How the root descriptor builds its menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum MenuMode {
    /// Probe the base directory for an existing install
    #[default]
    #[strum(serialize = "dynamic")]
    Dynamic,
    /// Bootstrap layout: always offer Install
    #[strum(serialize = "install_only")]
    InstallOnly,
}
