//! Typed pipe endpoints.
//!
//! An [`Endpoint`] is an owned OS handle tagged with its direction and with
//! [`OpenMode::NOT_REGFILE`]. Generic I/O code can consult the tags instead of
//! special-casing pipes: reads on the write end, writes on the read end,
//! seeks and truncation are all refused here.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::process::Stdio;

use tracing::trace;

use crate::{OpenMode, OsPipe, PipeFlags, SluiceError, os};

#[cfg(unix)]
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, IntoRawFd, OwnedFd, RawFd};
#[cfg(windows)]
use std::os::windows::io::{AsHandle, AsRawHandle, BorrowedHandle, IntoRawHandle, OwnedHandle, RawHandle};

/// One directional end of a pipe.
#[derive(Debug)]
pub struct Endpoint {
    file: File,
    mode: OpenMode,
}

/// Both ends of one pipe. Produced only as a pair.
#[derive(Debug)]
pub struct Pipe {
    pub read: Endpoint,
    pub write: Endpoint,
}

impl Pipe {
    pub fn into_parts(self) -> (Endpoint, Endpoint) {
        (self.read, self.write)
    }
}

/// Tags the first handle as the read end and the second as the write end.
pub fn wrap(pipe: OsPipe) -> Pipe {
    Pipe {
        read: Endpoint::from_os(pipe.read, OpenMode::READ | OpenMode::NOT_REGFILE),
        write: Endpoint::from_os(pipe.write, OpenMode::WRITE | OpenMode::NOT_REGFILE),
    }
}

/// Creates a pipe whose ends honor `flags`.
///
/// On failure no handle is left open.
pub fn create_pipe(flags: PipeFlags) -> Result<Pipe, SluiceError> {
    let pipe = wrap(os::create_os_pipe(flags)?);
    trace!(?flags, "pipe endpoints ready");
    Ok(pipe)
}

impl Endpoint {
    fn from_os(handle: crate::OsHandle, mode: OpenMode) -> Self {
        Self { file: File::from(handle), mode }
    }

    pub fn mode(&self) -> OpenMode { self.mode }
    pub fn is_readable(&self) -> bool { self.mode.contains(OpenMode::READ) }
    pub fn is_writable(&self) -> bool { self.mode.contains(OpenMode::WRITE) }

    /// Stream endpoints have no position and no fixed size.
    pub fn is_stream(&self) -> bool { self.mode.contains(OpenMode::NOT_REGFILE) }

    /// Always refused for stream endpoints.
    pub fn set_len(&self, size: u64) -> Result<(), SluiceError> {
        if self.is_stream() {
            return Err(SluiceError::unsupported("truncate"));
        }
        self.file.set_len(size)?;
        Ok(())
    }
}

impl Read for Endpoint {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.is_readable() {
            return Err(SluiceError::not_readable().into());
        }
        self.file.read(buf)
    }
}

impl Write for Endpoint {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.is_writable() {
            return Err(SluiceError::not_writable().into());
        }
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.is_writable() {
            return Err(SluiceError::not_writable().into());
        }
        self.file.flush()
    }
}

impl Seek for Endpoint {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        if self.is_stream() {
            return Err(SluiceError::unsupported("seek").into());
        }
        self.file.seek(pos)
    }
}

impl From<Endpoint> for Stdio {
    fn from(ep: Endpoint) -> Self {
        Stdio::from(ep.file)
    }
}

#[cfg(unix)]
impl AsFd for Endpoint {
    fn as_fd(&self) -> BorrowedFd<'_> { self.file.as_fd() }
}

#[cfg(unix)]
impl AsRawFd for Endpoint {
    fn as_raw_fd(&self) -> RawFd { self.file.as_raw_fd() }
}

#[cfg(unix)]
impl IntoRawFd for Endpoint {
    fn into_raw_fd(self) -> RawFd { self.file.into_raw_fd() }
}

#[cfg(unix)]
impl From<Endpoint> for OwnedFd {
    fn from(ep: Endpoint) -> Self { OwnedFd::from(ep.file) }
}

#[cfg(windows)]
impl AsHandle for Endpoint {
    fn as_handle(&self) -> BorrowedHandle<'_> { self.file.as_handle() }
}

#[cfg(windows)]
impl AsRawHandle for Endpoint {
    fn as_raw_handle(&self) -> RawHandle { self.file.as_raw_handle() }
}

#[cfg(windows)]
impl IntoRawHandle for Endpoint {
    fn into_raw_handle(self) -> RawHandle { self.file.into_raw_handle() }
}

#[cfg(windows)]
impl From<Endpoint> for OwnedHandle {
    fn from(ep: Endpoint) -> Self { OwnedHandle::from(ep.file) }
}
