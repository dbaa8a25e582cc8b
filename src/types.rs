use bitflags::bitflags;
use serde::{Deserialize, Serialize};

#[cfg(unix)]
use std::os::fd::{IntoRawFd, OwnedFd, RawFd};
#[cfg(windows)]
use std::os::windows::io::{IntoRawHandle, OwnedHandle, RawHandle};

/// Owned platform handle for one end of a pipe.
#[cfg(unix)]
pub type OsHandle = OwnedFd;
#[cfg(windows)]
pub type OsHandle = OwnedHandle;

/// Unowned numeric form of [`OsHandle`].
#[cfg(unix)]
pub type RawOsHandle = RawFd;
#[cfg(windows)]
pub type RawOsHandle = RawHandle;

bitflags! {
    /// Which pipe ends must stay out of child processes.
    ///
    /// An unset bit leaves that end inheritable.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct PipeFlags: u8 {
        const NO_INHERIT_READ = 1 << 0;
        const NO_INHERIT_WRITE = 1 << 1;
    }
}

impl PipeFlags {
    /// True if at least one end needs its inheritance narrowed.
    #[inline]
    pub fn suppresses_any(self) -> bool {
        self.intersects(Self::NO_INHERIT_READ | Self::NO_INHERIT_WRITE)
    }
}

bitflags! {
    /// Tags carried by an [`Endpoint`](crate::Endpoint).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpenMode: u8 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        /// Not a regular file: no seeking, no fixed size.
        const NOT_REGFILE = 1 << 2;
    }
}

/// Config-friendly view of [`PipeFlags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipeOptions {
    pub inherit_read: bool,
    pub inherit_write: bool,
}

impl Default for PipeOptions {
    fn default() -> Self {
        Self {
            inherit_read: true,
            inherit_write: true,
        }
    }
}

impl PipeOptions {
    pub fn flags(&self) -> PipeFlags {
        let mut flags = PipeFlags::empty();
        flags.set(PipeFlags::NO_INHERIT_READ, !self.inherit_read);
        flags.set(PipeFlags::NO_INHERIT_WRITE, !self.inherit_write);
        flags
    }
}

impl From<PipeOptions> for PipeFlags {
    fn from(opts: PipeOptions) -> Self {
        opts.flags()
    }
}

/// The two linked handles of a freshly created pipe.
///
/// Both fields own their handle, so a pair is either returned whole or
/// closed whole.
#[derive(Debug)]
pub struct OsPipe {
    pub read: OsHandle,
    pub write: OsHandle,
}

/// Released handle values, for callers that hand them to a child directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawPipe {
    pub read: RawOsHandle,
    pub write: RawOsHandle,
}

impl OsPipe {
    /// Gives up ownership; the caller becomes responsible for closing both.
    #[cfg(unix)]
    pub fn into_raw(self) -> RawPipe {
        RawPipe { read: self.read.into_raw_fd(), write: self.write.into_raw_fd() }
    }

    /// Gives up ownership; the caller becomes responsible for closing both.
    #[cfg(windows)]
    pub fn into_raw(self) -> RawPipe {
        RawPipe { read: self.read.into_raw_handle(), write: self.write.into_raw_handle() }
    }
}
