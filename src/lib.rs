//! # SLUICE
//! Anonymous pipes with per-endpoint inheritance control.
//!
//! A sluice lets a stream through one way and shuts tight everywhere else.
//! [`create_pipe`] returns a linked read/write pair where each end can be
//! kept out of child processes, without the window in which a concurrent
//! spawn could pick up a still-inheritable handle.
//!
//! ## How the window is closed
//! * **Atomic:** where `pipe2` exists and both ends are suppressed, one
//!   syscall creates the pair already close-on-exec.
//! * **Guarded:** otherwise the pair is created inheritable and narrowed
//!   while holding the process-wide [`InheritGuard`]. Spawners must hold the
//!   same guard, e.g. through [`InheritGuard::spawn`].
//! * **Duplicate-and-replace:** on Windows, flagged ends are duplicated as
//!   non-inheritable and the originals closed, under the same guard.
//!
//! ## Example
//! ```no_run
//! use std::io::{Read, Write};
//! use sluice::{PipeFlags, create_pipe};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pipe = create_pipe(PipeFlags::NO_INHERIT_READ)?;
//! let (mut rx, mut tx) = pipe.into_parts();
//! tx.write_all(b"ping")?;
//! drop(tx);
//!
//! let mut got = String::new();
//! rx.read_to_string(&mut got)?;
//! assert_eq!(got, "ping");
//! # Ok(())
//! # }
//! ```


pub mod endpoint;
pub mod error;
pub mod guard;
pub mod os;
pub mod traits;
pub mod types;

pub use endpoint::{Endpoint, Pipe, create_pipe, wrap};
pub use error::*;
pub use guard::{InheritGuard, InheritLock};
pub use os::{create_os_pipe, create_os_pipe_with};
pub use traits::*;
pub use types::*;
