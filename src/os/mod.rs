//! Platform pipe creation.
//!
//! Exactly one strategy is compiled in per target as [`Platform`]:
//! `unix::Atomic` where `pipe2` exists, `unix::Guarded` on the remaining
//! Unix targets, `windows::DuplicateReplace` on Windows.

use tracing::debug;

use crate::{InheritGuard, OsPipe, PipeFlags, PipeStrategy, SluiceError};

#[cfg(unix)]
pub mod unix;
#[cfg(unix)]
pub use unix::Platform;

#[cfg(windows)]
pub mod windows;
#[cfg(windows)]
pub use windows::Platform;

#[cfg(all(not(unix), not(windows)))]
compile_error!("sluice only supports unix and windows targets");

/// Creates a raw pipe pair against the process-wide [`InheritGuard`].
///
/// This is the form a process spawner wants when it attaches the handles to
/// a child's standard streams itself.
pub fn create_os_pipe(flags: PipeFlags) -> Result<OsPipe, SluiceError> {
    create_os_pipe_with(InheritGuard::global(), flags)
}

/// Like [`create_os_pipe`], with an explicit guard.
///
/// Only useful when every spawner in the process agrees on `guard`.
pub fn create_os_pipe_with(guard: &InheritGuard, flags: PipeFlags) -> Result<OsPipe, SluiceError> {
    debug!(strategy = Platform::NAME, ?flags, "creating os pipe");
    Platform::create(guard, flags)
}
