//! Nexus Ark launcher library
//!
//! Descriptor tables, menu resolution and the step executor, plus the
//! host primitives the `ark-launcher` binary runs them with.

pub mod catalog;
pub mod cli;
pub mod config_file;
pub mod descriptor;
pub mod error;
pub mod executor;
pub mod launcher;
pub mod menu;
pub mod process_guard;
pub mod shell;
pub mod types;

// Re-export main types for convenience
pub use catalog::DescriptorId;
pub use config_file::LauncherConfig;
pub use descriptor::{Descriptor, FailurePolicy, Href, MenuItem, Step, StepCommand};
pub use error::LauncherError;
pub use executor::{execute, HostPrimitives, RunReport, ShellOutput, StepOutcome};
pub use launcher::{Launcher, OpenOutcome};
pub use menu::{resolve_menu, DiskProbe, FsProbe, MapProbe};
pub use process_guard::{ChildRegistry, CommandProcessGroup, ProcessGuard};
pub use shell::SystemHost;
pub use types::{MenuMode, Platform};
