//! Process-tree lifecycle: registry of spawned process groups and tree-wide
//! termination.
//!
//! Compiling and running arbitrary generated programs can leave hung or
//! runaway subprocesses behind (infinite loops in generated code, stuck
//! toolchain invocations, children of children). Every child the runtime
//! spawns is placed in its own process group and registered here;
//! [`ProcessTree::terminate_all`] kills each registered group, which reaps
//! descendants of descendants too.
//!
//! ## Rules
//! - `terminate_all` is idempotent: the second and later calls are no-ops.
//! - It runs on the interrupt path, on normal scheduler exit, and again on
//!   drop; invoking it twice must not error.
//! - A termination notice is printed once, before the teardown.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Registry of live child process groups.
#[derive(Debug, Default)]
pub struct ProcessTree {
    groups: Mutex<HashSet<u32>>,
    terminated: AtomicBool,
}

impl ProcessTree {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a spawned child's process group (its pid, as group leader).
    pub fn register(&self, pid: u32) {
        self.groups.lock().expect("process tree poisoned").insert(pid);
    }

    /// Removes a reaped child from the registry.
    pub fn release(&self, pid: u32) {
        self.groups.lock().expect("process tree poisoned").remove(&pid);
    }

    /// Number of currently registered process groups.
    pub fn live(&self) -> usize {
        self.groups.lock().expect("process tree poisoned").len()
    }

    /// Kills every registered process group. Idempotent.
    pub fn terminate_all(&self) {
        if self.terminated.swap(true, Ordering::SeqCst) {
            return;
        }
        println!("Terminating all processes...");

        let groups: Vec<u32> = self
            .groups
            .lock()
            .expect("process tree poisoned")
            .drain()
            .collect();

        #[cfg(unix)]
        for pid in groups {
            // SIGKILL to the whole group: grandchildren spawned by the
            // toolchain or by generated code die with it.
            unsafe {
                libc::killpg(pid as i32, libc::SIGKILL);
            }
        }
        #[cfg(not(unix))]
        drop(groups);
    }

    /// True once teardown has run.
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }
}

impl Drop for ProcessTree {
    fn drop(&mut self) {
        // Normal-exit teardown; a no-op if the interrupt path already ran.
        self.terminate_all();
    }
}
