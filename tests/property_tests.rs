//! Property-Based Tests for the launcher
//!
//! Uses proptest for testing invariants over arbitrary filesystem states
//! and failure patterns.

use ark_launcher::catalog;
use ark_launcher::error::Result;
use ark_launcher::executor::{execute, HostPrimitives, ShellOutput};
use ark_launcher::menu::{resolve_menu, resolve_menu_with_mode, MapProbe};
use ark_launcher::types::{MenuMode, Platform};
use ark_launcher::Href;
use proptest::prelude::*;
use std::path::Path;
use strum::IntoEnumIterator;

const BASE: &str = "/srv/nexus-ark";

fn platform_strategy() -> impl Strategy<Value = Platform> {
    proptest::sample::select(Platform::iter().collect::<Vec<_>>())
}

fn menu_mode_strategy() -> impl Strategy<Value = MenuMode> {
    proptest::sample::select(MenuMode::iter().collect::<Vec<_>>())
}

/// Host whose shell calls fail according to a mask
struct MaskHost {
    mask: Vec<bool>,
    calls: usize,
}

impl HostPrimitives for MaskHost {
    fn shell_run(&mut self, _message: &str) -> Result<ShellOutput> {
        let fail = self.mask.get(self.calls).copied().unwrap_or(false);
        self.calls += 1;
        if fail {
            Ok(ShellOutput::failed(Some(1), ""))
        } else {
            Ok(ShellOutput::ok())
        }
    }

    fn notify(&mut self, _html: &str) -> Result<()> {
        self.calls += 1;
        Ok(())
    }
}

proptest! {
    /// Menu has one item when not installed and three when installed
    #[test]
    fn menu_shape_matches_install_state(
        venv in any::<bool>(),
        dot_venv in any::<bool>(),
        uv in any::<bool>(),
        platform in platform_strategy(),
    ) {
        let probe = MapProbe::new()
            .with(BASE, "venv", venv)
            .with(BASE, ".venv", dot_venv)
            .with(BASE, "uv", uv);
        let items = resolve_menu(&probe, Path::new(BASE), platform);
        let installed = venv || dot_venv || (uv && platform == Platform::Windows);

        if installed {
            prop_assert_eq!(items.len(), 3);
            prop_assert_eq!(&items[2].href, &Href::Explorer(BASE.into()));
        } else {
            prop_assert_eq!(items.len(), 1);
            prop_assert_eq!(&items[0].href, &Href::Descriptor("install.js".into()));
        }
    }

    /// Install-only mode always offers Install; dynamic mode matches the resolver
    #[test]
    fn menu_mode_selects_resolver(
        dot_venv in any::<bool>(),
        platform in platform_strategy(),
        mode in menu_mode_strategy(),
    ) {
        let probe = MapProbe::new().with(BASE, ".venv", dot_venv);
        let items = resolve_menu_with_mode(&probe, Path::new(BASE), platform, mode);
        match mode {
            MenuMode::InstallOnly => prop_assert_eq!(items.len(), 1),
            MenuMode::Dynamic => {
                prop_assert_eq!(items, resolve_menu(&probe, Path::new(BASE), platform))
            }
        }
    }

    /// Resolving twice against the same state yields the same menu
    #[test]
    fn menu_is_pure(dot_venv in any::<bool>(), platform in platform_strategy()) {
        let probe = MapProbe::new().with(BASE, ".venv", dot_venv);
        let first = resolve_menu(&probe, Path::new(BASE), platform);
        let second = resolve_menu(&probe, Path::new(BASE), platform);
        prop_assert_eq!(first, second);
    }

    /// The update run stops at the first failing strict step, and only there
    #[test]
    fn update_halts_exactly_at_first_strict_failure(mask in proptest::collection::vec(any::<bool>(), 3)) {
        let mut host = MaskHost { mask: mask.clone(), calls: 0 };
        let report = execute(&catalog::update(), &mut host);

        // Step 2 (index) tolerates failure; steps 0 and 1 do not
        let first_strict = (0..2).find(|&i| mask[i]);
        match first_strict {
            Some(i) => {
                prop_assert_eq!(report.aborted_at, Some(i));
                prop_assert_eq!(report.executed(), i + 1);
            }
            None => {
                prop_assert!(report.is_success());
                prop_assert_eq!(report.executed(), 4);
            }
        }
    }
}
