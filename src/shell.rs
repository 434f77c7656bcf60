//! Real host primitives
//!
//! [`SystemHost`] is the [`HostPrimitives`] implementation used by the
//! binary. Shell steps run through the platform shell in the base directory,
//! each in its own process group and registered with [`ChildRegistry`] for
//! the duration of the command. Output is inherited so the user sees
//! installer progress live.
//!
//! The shell and the file browser always follow the platform the binary runs
//! on. The configurable [`Platform`] only affects menu resolution.

use crate::descriptor::strip_html;
use crate::error::{LauncherError, Result};
use crate::executor::{HostPrimitives, ShellOutput};
use crate::process_guard::{ChildRegistry, CommandProcessGroup};
use crate::types::Platform;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

/// Host backed by real processes and the terminal
pub struct SystemHost<W: Write = std::io::Stdout> {
    base_dir: PathBuf,
    /// Shell program override; `sh` / `cmd` when unset
    shell: Option<String>,
    dry_run: bool,
    out: W,
}

impl SystemHost {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self::with_writer(base_dir, std::io::stdout())
    }
}

impl<W: Write> SystemHost<W> {
    /// Host that writes notifications to `out`
    pub fn with_writer(base_dir: impl Into<PathBuf>, out: W) -> Self {
        Self {
            base_dir: base_dir.into(),
            shell: None,
            dry_run: false,
            out,
        }
    }

    pub fn shell(mut self, shell: Option<String>) -> Self {
        self.shell = shell;
        self
    }

    /// Log shell commands instead of running them
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn into_writer(self) -> W {
        self.out
    }

    /// Program and flag that make the shell execute one command line
    fn shell_invocation(&self) -> (String, &'static str) {
        let (default_shell, flag) = match Platform::current() {
            Platform::Windows => ("cmd", "/C"),
            _ => ("sh", "-c"),
        };
        let program = self.shell.clone().unwrap_or_else(|| default_shell.to_string());
        (program, flag)
    }
}

impl<W: Write> HostPrimitives for SystemHost<W> {
    fn shell_run(&mut self, message: &str) -> Result<ShellOutput> {
        let (program, flag) = self.shell_invocation();

        if self.dry_run {
            info!(command = message, "[DRY RUN] Skipped shell step");
            writeln!(self.out, "[DRY RUN] {} {} {:?}", program, flag, message)?;
            return Ok(ShellOutput::ok());
        }

        info!(command = message, cwd = %self.base_dir.display(), "Running shell step");

        let mut cmd = Command::new(&program);
        cmd.arg(flag)
            .arg(message)
            .current_dir(&self.base_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .in_new_process_group();

        // Held across spawn so a signal handler cannot run cleanup between
        // the spawn and the registration
        let registry = ChildRegistry::global();
        let child = {
            let mut guard = ChildRegistry::lock(&registry);
            if guard.cleanup_initiated() {
                warn!(command = message, "Shutdown in progress, not starting step");
                return Err(LauncherError::Io(std::io::Error::new(
                    std::io::ErrorKind::Interrupted,
                    "launcher is shutting down",
                )));
            }
            let child = cmd.spawn()?;
            guard.register(child.id());
            child
        };
        let pid = child.id();

        let waited = child.wait_with_output();
        ChildRegistry::lock(&registry).unregister(pid);
        let output = waited?;

        let exit_code = output.status.code();
        debug!(command = message, ?exit_code, "Shell step finished");
        Ok(ShellOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code,
            success: output.status.success(),
        })
    }

    fn notify(&mut self, html: &str) -> Result<()> {
        info!(html, "Notification");
        writeln!(self.out, "==> {}", strip_html(html))?;
        Ok(())
    }
}

/// Open the native file browser at `path` (the `explorer:` pseudo-action)
pub fn open_explorer(path: &Path, dry_run: bool) -> Result<()> {
    if !path.is_absolute() {
        return Err(LauncherError::href(format!(
            "explorer target must be absolute: {}",
            path.display()
        )));
    }

    let program = Platform::current().explorer_program();
    if dry_run {
        info!(program, path = %path.display(), "[DRY RUN] Skipped opening folder");
        return Ok(());
    }

    info!(program, path = %path.display(), "Opening folder");
    // explorer.exe returns 1 even on success, so only spawn errors count
    Command::new(program)
        .arg(path)
        .stdin(Stdio::null())
        .spawn()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(dir: &Path) -> SystemHost<Vec<u8>> {
        SystemHost::with_writer(dir, Vec::new())
    }

    #[test]
    fn test_shell_run_success_in_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = host(dir.path());
        let output = host.shell_run("touch marker").unwrap();
        assert!(output.success);
        assert!(dir.path().join("marker").exists());
    }

    #[test]
    fn test_shell_run_nonzero_exit() {
        let dir = tempfile::tempdir().unwrap();
        let output = host(dir.path()).shell_run("exit 3").unwrap();
        assert!(!output.success);
        assert_eq!(output.exit_code, Some(3));
    }

    #[test]
    fn test_dry_run_does_not_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = host(dir.path()).dry_run(true);
        let output = host.shell_run("touch marker").unwrap();
        assert!(output.success);
        assert!(!dir.path().join("marker").exists());
        let printed = String::from_utf8(host.into_writer()).unwrap();
        assert!(printed.starts_with("[DRY RUN]"));
    }

    #[test]
    fn test_missing_shell_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = host(dir.path()).shell(Some("/nonexistent/shell".into()));
        assert!(matches!(host.shell_run("true"), Err(LauncherError::Io(_))));
    }

    #[test]
    fn test_notify_strips_markup() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = host(dir.path());
        host.notify("<b>Update Complete!</b>").unwrap();
        assert_eq!(
            String::from_utf8(host.into_writer()).unwrap(),
            "==> Update Complete!\n"
        );
    }

    #[test]
    fn test_open_explorer_rejects_relative_path() {
        assert!(open_explorer(Path::new("relative"), true).is_err());
        assert!(open_explorer(Path::new("/tmp"), true).is_ok());
    }

    #[test]
    fn test_step_process_is_registered_while_running() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("pid");
        let mut host = host(dir.path());

        let runner = std::thread::spawn(move || host.shell_run("echo $$ > pid; sleep 1"));

        let start = std::time::Instant::now();
        let pid: u32 = loop {
            if let Some(pid) = std::fs::read_to_string(&marker)
                .ok()
                .and_then(|s| s.trim().parse().ok())
            {
                break pid;
            }
            assert!(start.elapsed() < std::time::Duration::from_secs(5));
            std::thread::sleep(std::time::Duration::from_millis(10));
        };
        assert!(ChildRegistry::lock(&ChildRegistry::global()).contains(pid));

        assert!(runner.join().unwrap().unwrap().success);
        assert!(!ChildRegistry::lock(&ChildRegistry::global()).contains(pid));
    }
}
