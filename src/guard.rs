//! The inheritance guard.
//!
//! Creating a handle and then narrowing its inheritance is two steps on most
//! platforms. A child spawned between them gets a copy of the handle. Every
//! code path that either narrows inheritance after creation or spawns a
//! child (and so snapshots the handle table) must hold the same guard for
//! that window.

use std::io;
use std::process::{Child, Command};

use parking_lot::{Mutex, MutexGuard};
use tracing::trace;

static GLOBAL: InheritGuard = InheritGuard::new();

/// Serializes inheritance changes against child-process spawns.
#[derive(Debug)]
pub struct InheritGuard {
    lock: Mutex<()>,
}

/// Held for as long as the guarded window lasts.
#[must_use = "the guard is released as soon as this is dropped"]
pub struct InheritLock<'a> {
    _inner: MutexGuard<'a, ()>,
}

impl InheritGuard {
    pub const fn new() -> Self {
        Self { lock: parking_lot::const_mutex(()) }
    }

    /// The process-wide guard. Pipe creation uses this one unless told otherwise.
    pub fn global() -> &'static InheritGuard {
        &GLOBAL
    }

    pub fn lock(&self) -> InheritLock<'_> {
        InheritLock { _inner: self.lock.lock() }
    }

    pub fn with_lock<T>(&self, f: impl FnOnce() -> T) -> T {
        let _held = self.lock();
        f()
    }

    /// Spawns `cmd` with the guard held.
    ///
    /// The child's handle table is fixed by the time `spawn` returns, so no
    /// pipe end can be caught half-configured.
    pub fn spawn(&self, cmd: &mut Command) -> io::Result<Child> {
        let _held = self.lock();
        trace!(program = ?cmd.get_program(), "spawning under inherit guard");
        cmd.spawn()
    }
}

impl Default for InheritGuard {
    fn default() -> Self {
        Self::new()
    }
}
