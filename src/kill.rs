// src/kill.rs

//! Forced termination of a child process and its descendants.
//!
//! Deadline expiry must not leave orphaned work behind: the analysis tool
//! spawns its own helpers (decompilers, CodeQL workers), so killing only
//! the direct child would let the expensive part keep running after the
//! caller has given up.
//!
//! Platform differences (signal-based vs. handle-based termination) stay
//! behind the `TreeKiller` trait; the default implementation walks the
//! `sysinfo` process table. Like all process-table inspection this is
//! best-effort: a process that exits mid-walk is simply skipped.

use sysinfo::{Pid, System};

pub trait TreeKiller: Send + Sync {
    /// Terminate the process with PID `root` and every descendant.
    fn kill_tree(&self, root: u32);
}

pub struct SysinfoTreeKiller;

impl TreeKiller for SysinfoTreeKiller {
    fn kill_tree(&self, root: u32) {
        let mut system = System::new();
        system.refresh_processes();

        let root_pid = Pid::from_u32(root);
        let mut doomed = vec![root_pid];
        let mut frontier = vec![root_pid];

        while let Some(parent) = frontier.pop() {
            for (pid, process) in system.processes() {
                if process.parent() == Some(parent) {
                    doomed.push(*pid);
                    frontier.push(*pid);
                }
            }
        }

        // Deepest descendants first, the root last.
        for pid in doomed.iter().rev() {
            if let Some(process) = system.process(*pid) {
                if !process.kill() {
                    tracing::debug!(pid = pid.as_u32(), "process already gone or not killable");
                }
            }
        }
    }
}
