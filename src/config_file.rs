//! Launcher configuration file.
//!
//! A small JSON document saying where the application checkout lives and how
//! the host should behave. Every field is optional on disk; CLI flags
//! override whatever the file sets.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{MenuMode, Platform};

/// Launcher configuration that can be saved/loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Application checkout; the menu probes here and shell steps run here
    pub base_dir: PathBuf,
    /// Platform used for menu resolution; the shell always follows the
    /// platform the launcher runs on
    pub platform: Platform,
    pub menu_mode: MenuMode,
    /// Log shell steps instead of running them
    pub dry_run: bool,
    /// Shell program override (`sh` or `cmd` when unset)
    pub shell: Option<String>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            platform: Platform::current(),
            menu_mode: MenuMode::Dynamic,
            dry_run: false,
            shell: None,
        }
    }
}

impl LauncherConfig {
    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Apply command-line settings on top of the file's values.
    /// Flags that are absent leave the file's values alone; `dry_run` can
    /// only be switched on.
    pub fn apply_overrides(
        &mut self,
        base_dir: Option<&Path>,
        platform: Option<Platform>,
        dry_run: bool,
    ) {
        if let Some(base_dir) = base_dir {
            self.base_dir = base_dir.to_path_buf();
        }
        if let Some(platform) = platform {
            self.platform = platform;
        }
        self.dry_run |= dry_run;
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_dir.as_os_str().is_empty() {
            anyhow::bail!("base_dir must not be empty");
        }
        if !self.base_dir.is_dir() {
            anyhow::bail!("base_dir {:?} is not a directory", self.base_dir);
        }
        if let Some(shell) = &self.shell {
            if shell.trim().is_empty() {
                anyhow::bail!("shell must not be blank when set");
            }
        }
        Ok(())
    }

    /// Base directory made absolute, so `explorer:` hrefs carry a full path
    pub fn resolved_base_dir(&self) -> Result<PathBuf> {
        fs::canonicalize(&self.base_dir)
            .with_context(|| format!("Failed to resolve base_dir {:?}", self.base_dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("launcher.json");
        let config = LauncherConfig {
            base_dir: dir.path().to_path_buf(),
            platform: Platform::Windows,
            menu_mode: MenuMode::InstallOnly,
            dry_run: true,
            shell: Some("pwsh".into()),
        };

        config.save_to_file(&path).unwrap();
        let loaded = LauncherConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: LauncherConfig = serde_json::from_str(r#"{ "platform": "linux" }"#).unwrap();
        assert_eq!(config.base_dir, PathBuf::from("."));
        assert_eq!(config.menu_mode, MenuMode::Dynamic);
        assert!(!config.dry_run);
    }

    #[test]
    fn test_validate_rejects_missing_dir() {
        let config = LauncherConfig {
            base_dir: PathBuf::from("/definitely/not/here"),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_blank_shell() {
        let dir = tempfile::tempdir().unwrap();
        let config = LauncherConfig {
            base_dir: dir.path().to_path_buf(),
            shell: Some("  ".into()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_overrides_keeps_unset_fields() {
        let mut config = LauncherConfig {
            base_dir: PathBuf::from("/srv/ark"),
            platform: Platform::Macos,
            dry_run: true,
            ..Default::default()
        };
        config.apply_overrides(None, None, false);
        assert_eq!(config.base_dir, PathBuf::from("/srv/ark"));
        assert_eq!(config.platform, Platform::Macos);
        assert!(config.dry_run);

        config.apply_overrides(Some(Path::new("/opt/ark")), Some(Platform::Windows), false);
        assert_eq!(config.base_dir, PathBuf::from("/opt/ark"));
        assert_eq!(config.platform, Platform::Windows);
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        let err = LauncherConfig::load_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }
}
