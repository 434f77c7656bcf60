//! Child process cleanup for shell steps
//!
//! `uv sync` or the uv installer can run for minutes. If the launcher is
//! interrupted, the shell it spawned and everything under it must go too,
//! so each step runs as the leader of its own process group and its PID is
//! tracked here while it runs. On drop of [`ProcessGuard`] or on
//! SIGINT/SIGTERM/SIGHUP every tracked group gets SIGTERM, then SIGKILL after
//! a grace period.

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::{Duration, Instant};

static CHILD_REGISTRY: OnceLock<Arc<Mutex<ChildRegistry>>> = OnceLock::new();

/// Registry tracking running step processes
#[derive(Debug, Default)]
pub struct ChildRegistry {
    pids: HashSet<u32>,
    /// Set once termination started so it never runs twice
    cleanup_initiated: bool,
}

impl ChildRegistry {
    /// Get or create the global child registry
    pub fn global() -> Arc<Mutex<ChildRegistry>> {
        CHILD_REGISTRY
            .get_or_init(|| Arc::new(Mutex::new(ChildRegistry::default())))
            .clone()
    }

    pub fn register(&mut self, pid: u32) {
        self.pids.insert(pid);
        tracing::debug!(pid, "Registered step process");
    }

    pub fn unregister(&mut self, pid: u32) {
        self.pids.remove(&pid);
        tracing::debug!(pid, "Unregistered step process");
    }

    pub fn count(&self) -> usize {
        self.pids.len()
    }

    pub fn contains(&self, pid: u32) -> bool {
        self.pids.contains(&pid)
    }

    /// Whether termination has started; no new steps may be spawned after it
    pub fn cleanup_initiated(&self) -> bool {
        self.cleanup_initiated
    }

    /// Terminate all tracked process groups.
    /// Sends SIGTERM, waits up to `grace_period`, then SIGKILL.
    pub fn terminate_all(&mut self, grace_period: Duration) {
        if self.cleanup_initiated {
            return;
        }
        self.cleanup_initiated = true;

        if self.pids.is_empty() {
            return;
        }

        tracing::info!(count = self.pids.len(), "Terminating step processes");

        let pids: Vec<u32> = self.pids.iter().copied().collect();
        for &pid in &pids {
            if let Err(e) = send_signal_to_group(pid, Signal::SIGTERM) {
                tracing::warn!(pid, error = %e, "SIGTERM to process group failed");
                let _ = send_signal(pid, Signal::SIGTERM);
            }
        }

        // The leader may exit on TERM while a member ignores it, so liveness
        // is judged per group, never by the leader alone
        let start = Instant::now();
        while start.elapsed() < grace_period {
            if pids.iter().all(|&pgid| !is_group_alive(pgid)) {
                tracing::info!("Step processes exited");
                self.pids.clear();
                return;
            }
            std::thread::sleep(Duration::from_millis(100));
        }

        for &pgid in &pids {
            if is_group_alive(pgid) {
                tracing::warn!(pgid, "Process group ignored SIGTERM, sending SIGKILL");
                if send_signal_to_group(pgid, Signal::SIGKILL).is_err() {
                    let _ = send_signal(pgid, Signal::SIGKILL);
                }
            }
        }

        self.pids.clear();
    }

    /// Lock a registry, recovering it if a panicking holder poisoned it
    pub fn lock(registry: &Mutex<ChildRegistry>) -> MutexGuard<'_, ChildRegistry> {
        registry.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Child registry mutex poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

fn send_signal(pid: u32, signal: Signal) -> Result<(), nix::Error> {
    signal::kill(Pid::from_raw(pid as i32), signal)
}

/// Negative PID addresses the whole group, so `uv` under `sh` is reached too
fn send_signal_to_group(pgid: u32, signal: Signal) -> Result<(), nix::Error> {
    signal::kill(Pid::from_raw(-(pgid as i32)), signal)
}

/// Whether any process (zombies included) is left in the group
fn is_group_alive(pgid: u32) -> bool {
    signal::kill(Pid::from_raw(-(pgid as i32)), None).is_ok()
}

/// RAII guard that terminates all tracked step processes on drop
pub struct ProcessGuard {
    registry: Arc<Mutex<ChildRegistry>>,
}

impl ProcessGuard {
    /// Guard attached to the global registry
    pub fn new() -> Self {
        Self {
            registry: ChildRegistry::global(),
        }
    }
}

impl Default for ProcessGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        ChildRegistry::lock(&self.registry).terminate_all(Duration::from_secs(5));
    }
}

/// Install handlers for SIGINT, SIGTERM and SIGHUP that clean up step
/// processes and exit with 128 + signal number. Call once at startup.
pub fn init_signal_handlers() -> Result<(), std::io::Error> {
    use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])?;

    std::thread::spawn(move || {
        if let Some(sig) = signals.forever().next() {
            tracing::info!(signal = sig, "Received signal, stopping step processes");
            ChildRegistry::lock(&ChildRegistry::global()).terminate_all(Duration::from_secs(3));
            std::process::exit(128 + sig);
        }
    });

    Ok(())
}

/// Extension trait for `std::process::Command` to set up process groups
pub trait CommandProcessGroup {
    /// Run the command as the leader of a new process group
    fn in_new_process_group(&mut self) -> &mut Self;
}

impl CommandProcessGroup for std::process::Command {
    fn in_new_process_group(&mut self) -> &mut Self {
        use std::os::unix::process::CommandExt;
        self.process_group(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    #[test]
    fn test_registry_register_unregister() {
        let mut registry = ChildRegistry::default();
        registry.register(1234);
        registry.register(5678);
        assert_eq!(registry.count(), 2);

        registry.unregister(1234);
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_terminate_all_kills_process_group() {
        let mut child = Command::new("sh")
            .args(["-c", "sleep 60"])
            .in_new_process_group()
            .spawn()
            .expect("Failed to spawn sleep");
        let pid = child.id();

        let mut registry = ChildRegistry::default();
        registry.register(pid);
        registry.terminate_all(Duration::from_millis(500));

        let status = child.wait().expect("Failed to reap child");
        assert!(!status.success());
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_cleanup_runs_once() {
        let mut registry = ChildRegistry::default();
        registry.register(999_999);
        registry.terminate_all(Duration::from_millis(10));
        assert!(registry.cleanup_initiated);

        registry.register(999_998);
        registry.terminate_all(Duration::from_millis(10));
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_is_group_alive_nonexistent() {
        assert!(!is_group_alive(999_999));
    }

    /// Running means present in /proc and neither zombie nor dead
    fn is_running(pid: u32) -> bool {
        std::fs::read_to_string(format!("/proc/{}/stat", pid))
            .ok()
            .and_then(|stat| {
                // The state letter follows the parenthesised command name
                let rest = stat.rsplit_once(')')?.1;
                rest.split_whitespace().next().map(|s| !matches!(s, "Z" | "X"))
            })
            .unwrap_or(false)
    }

    #[test]
    fn test_terminate_all_kills_term_ignoring_group_member() {
        use std::io::{BufRead, BufReader};
        use std::process::Stdio;

        // Leader dies on TERM; the background member ignores it
        let mut child = Command::new("sh")
            .args(["-c", "(trap '' TERM; exec sleep 30) & echo $!; wait"])
            .stdout(Stdio::piped())
            .in_new_process_group()
            .spawn()
            .expect("Failed to spawn sh");
        let pgid = child.id();

        let mut line = String::new();
        BufReader::new(child.stdout.take().unwrap())
            .read_line(&mut line)
            .unwrap();
        let member: u32 = line.trim().parse().unwrap();
        std::thread::sleep(Duration::from_millis(200));
        assert!(is_running(member));

        let mut registry = ChildRegistry::default();
        registry.register(pgid);
        registry.terminate_all(Duration::from_millis(500));
        let _ = child.wait();

        let start = Instant::now();
        while is_running(member) && start.elapsed() < Duration::from_secs(3) {
            std::thread::sleep(Duration::from_millis(20));
        }
        assert!(!is_running(member), "TERM-ignoring member must be killed");
    }

    #[test]
    fn test_lock_recovers_poisoned_registry() {
        let registry = Arc::new(Mutex::new(ChildRegistry::default()));
        let shared = Arc::clone(&registry);
        let _ = std::thread::spawn(move || {
            let _held = shared.lock().unwrap();
            panic!("poison the registry");
        })
        .join();

        assert!(registry.is_poisoned());
        ChildRegistry::lock(&registry).register(4242);
        assert_eq!(ChildRegistry::lock(&registry).count(), 1);
    }
}
