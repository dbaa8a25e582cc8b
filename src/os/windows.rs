//! Pipe strategy for Windows.
//!
//! `CreatePipe` hands out handles whose inheritability is fixed by the
//! security attributes for both ends at once, so per-end suppression means
//! duplicating the end as non-inheritable and closing the original.

use std::io;
use std::mem;
use std::os::windows::io::{AsRawHandle, FromRawHandle, OwnedHandle, RawHandle};
use std::ptr;

use tracing::{trace, warn};
use winapi::shared::minwindef::{DWORD, FALSE, TRUE};
use winapi::um::handleapi::DuplicateHandle;
use winapi::um::minwinbase::SECURITY_ATTRIBUTES;
use winapi::um::namedpipeapi::CreatePipe;
use winapi::um::processthreadsapi::GetCurrentProcess;
use winapi::um::winnt::{DUPLICATE_SAME_ACCESS, HANDLE};

use crate::{InheritGuard, OsPipe, PipeFlags, PipeStrategy, SluiceError};

/// Inheritable `CreatePipe`, then duplicate-and-replace for each flagged end.
#[derive(Debug, Clone, Copy)]
pub struct DuplicateReplace;

pub type Platform = DuplicateReplace;

fn inheritable_pipe() -> Result<OsPipe, SluiceError> {
    let mut attrs = SECURITY_ATTRIBUTES {
        nLength: mem::size_of::<SECURITY_ATTRIBUTES>() as DWORD,
        lpSecurityDescriptor: ptr::null_mut(),
        bInheritHandle: TRUE,
    };
    let mut read: HANDLE = ptr::null_mut();
    let mut write: HANDLE = ptr::null_mut();

    let ok = unsafe { CreatePipe(&mut read, &mut write, &mut attrs, 0) };
    if ok == 0 {
        let err = SluiceError::resource_exhausted(io::Error::last_os_error());
        warn!(code = ?err.code, error = %err, "CreatePipe failed");
        return Err(err);
    }

    // SAFETY: CreatePipe succeeded, so both handles are open and owned by nobody else.
    let pipe = unsafe {
        OsPipe {
            read: OwnedHandle::from_raw_handle(read as RawHandle),
            write: OwnedHandle::from_raw_handle(write as RawHandle),
        }
    };
    Ok(pipe)
}

fn uninheritable_copy(handle: &OwnedHandle) -> Result<OwnedHandle, SluiceError> {
    let mut dup: HANDLE = ptr::null_mut();
    let ok = unsafe {
        let me = GetCurrentProcess();
        DuplicateHandle(
            me,
            handle.as_raw_handle() as HANDLE,
            me,
            &mut dup,
            0,
            FALSE,
            DUPLICATE_SAME_ACCESS,
        )
    };
    if ok == 0 {
        let err = SluiceError::duplication_failed(io::Error::last_os_error());
        warn!(code = ?err.code, error = %err, "DuplicateHandle failed");
        return Err(err);
    }

    // SAFETY: DuplicateHandle succeeded and `dup` is a fresh handle in this process.
    Ok(unsafe { OwnedHandle::from_raw_handle(dup as RawHandle) })
}

impl PipeStrategy for DuplicateReplace {
    const NAME: &'static str = "duplicate-replace";

    fn create(guard: &InheritGuard, flags: PipeFlags) -> Result<OsPipe, SluiceError> {
        if !flags.suppresses_any() {
            return inheritable_pipe();
        }

        let _held = guard.lock();
        let mut pipe = inheritable_pipe()?;
        // Assigning drops the inheritable original, which closes it. An error
        // drops `pipe`, closing both ends.
        if flags.contains(PipeFlags::NO_INHERIT_READ) {
            pipe.read = uninheritable_copy(&pipe.read)?;
        }
        if flags.contains(PipeFlags::NO_INHERIT_WRITE) {
            pipe.write = uninheritable_copy(&pipe.write)?;
        }
        trace!(?flags, "duplicate-replace pipe ready");
        Ok(pipe)
    }
}

#[cfg(test)]
pub(crate) fn is_inheritable(handle: &impl AsRawHandle) -> bool {
    use winapi::um::handleapi::GetHandleInformation;
    use winapi::um::winbase::HANDLE_FLAG_INHERIT;

    let mut info: DWORD = 0;
    let ok = unsafe { GetHandleInformation(handle.as_raw_handle() as HANDLE, &mut info) };
    assert_ne!(ok, 0, "GetHandleInformation: {}", io::Error::last_os_error());
    info & HANDLE_FLAG_INHERIT != 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::{Read, Write};

    #[test]
    fn test_duplicate_replace_honors_every_flag_combination() {
        let guard = InheritGuard::new();
        let combos = [
            PipeFlags::empty(),
            PipeFlags::NO_INHERIT_READ,
            PipeFlags::NO_INHERIT_WRITE,
            PipeFlags::NO_INHERIT_READ | PipeFlags::NO_INHERIT_WRITE,
        ];

        for flags in combos {
            let pipe = DuplicateReplace::create(&guard, flags).unwrap();
            assert_eq!(is_inheritable(&pipe.read), !flags.contains(PipeFlags::NO_INHERIT_READ), "{flags:?}");
            assert_eq!(is_inheritable(&pipe.write), !flags.contains(PipeFlags::NO_INHERIT_WRITE), "{flags:?}");

            let mut tx = File::from(pipe.write);
            let mut rx = File::from(pipe.read);
            tx.write_all(b"replaced").unwrap();
            drop(tx);

            let mut got = Vec::new();
            rx.read_to_end(&mut got).unwrap();
            assert_eq!(got, b"replaced");
        }
    }

    #[test]
    fn test_no_flags_skips_the_guard() {
        let guard = InheritGuard::new();
        let _held = guard.lock();
        let pipe = DuplicateReplace::create(&guard, PipeFlags::empty()).unwrap();
        assert!(is_inheritable(&pipe.read));
        assert!(is_inheritable(&pipe.write));
    }
}
