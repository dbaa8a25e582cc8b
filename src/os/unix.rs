//! Pipe strategies for Unix targets.

use std::io;
use std::os::fd::{AsRawFd, OwnedFd};

use nix::fcntl::{FcntlArg, FdFlag, fcntl};
use nix::unistd;
use tracing::{trace, warn};

use crate::{InheritGuard, OsPipe, PipeFlags, PipeStrategy, SluiceError};

/// `pipe()`, then `FD_CLOEXEC` on each flagged end with the guard held.
#[derive(Debug, Clone, Copy)]
pub struct Guarded;

/// `pipe2(O_CLOEXEC)` when both ends are suppressed, [`Guarded`] otherwise.
#[cfg(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly",
    target_os = "illumos",
))]
#[derive(Debug, Clone, Copy)]
pub struct Atomic;

#[cfg(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly",
    target_os = "illumos",
))]
pub type Platform = Atomic;

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly",
    target_os = "illumos",
)))]
pub type Platform = Guarded;

fn exhausted(errno: nix::Error) -> SluiceError {
    let err = SluiceError::resource_exhausted(io::Error::from(errno));
    warn!(code = ?err.code, %errno, "pipe creation failed");
    err
}

fn plain_pipe() -> Result<OsPipe, SluiceError> {
    let (read, write) = unistd::pipe().map_err(exhausted)?;
    Ok(OsPipe { read, write })
}

fn set_cloexec(fd: &OwnedFd) -> Result<(), SluiceError> {
    let apply = || -> nix::Result<()> {
        let bits = fcntl(fd.as_raw_fd(), FcntlArg::F_GETFD)?;
        let flags = FdFlag::from_bits_retain(bits) | FdFlag::FD_CLOEXEC;
        fcntl(fd.as_raw_fd(), FcntlArg::F_SETFD(flags))?;
        Ok(())
    };
    apply().map_err(|errno| {
        let err = SluiceError::inherit_flag(io::Error::from(errno));
        warn!(fd = fd.as_raw_fd(), %errno, "could not set close-on-exec");
        err
    })
}

impl PipeStrategy for Guarded {
    const NAME: &'static str = "guarded";

    fn create(guard: &InheritGuard, flags: PipeFlags) -> Result<OsPipe, SluiceError> {
        if !flags.suppresses_any() {
            return plain_pipe();
        }

        let _held = guard.lock();
        // Dropping `pipe` on any early return closes both ends.
        let pipe = plain_pipe()?;
        if flags.contains(PipeFlags::NO_INHERIT_READ) {
            set_cloexec(&pipe.read)?;
        }
        if flags.contains(PipeFlags::NO_INHERIT_WRITE) {
            set_cloexec(&pipe.write)?;
        }
        trace!(read = pipe.read.as_raw_fd(), write = pipe.write.as_raw_fd(), ?flags, "guarded pipe ready");
        Ok(pipe)
    }
}

#[cfg(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly",
    target_os = "illumos",
))]
impl PipeStrategy for Atomic {
    const NAME: &'static str = "pipe2";

    fn create(guard: &InheritGuard, flags: PipeFlags) -> Result<OsPipe, SluiceError> {
        if !flags.contains(PipeFlags::NO_INHERIT_READ | PipeFlags::NO_INHERIT_WRITE) {
            return Guarded::create(guard, flags);
        }

        let (read, write) = unistd::pipe2(nix::fcntl::OFlag::O_CLOEXEC).map_err(exhausted)?;
        trace!(read = read.as_raw_fd(), write = write.as_raw_fd(), "pipe2 with O_CLOEXEC");
        Ok(OsPipe { read, write })
    }
}

#[cfg(test)]
pub(crate) fn is_cloexec(fd: &impl AsRawFd) -> bool {
    let bits = fcntl(fd.as_raw_fd(), FcntlArg::F_GETFD).expect("F_GETFD");
    FdFlag::from_bits_retain(bits).contains(FdFlag::FD_CLOEXEC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::{Read, Write};

    const ALL_FLAGS: [PipeFlags; 4] = [
        PipeFlags::empty(),
        PipeFlags::NO_INHERIT_READ,
        PipeFlags::NO_INHERIT_WRITE,
        PipeFlags::NO_INHERIT_READ.union(PipeFlags::NO_INHERIT_WRITE),
    ];

    fn check_strategy<S: PipeStrategy>() {
        let guard = InheritGuard::new();
        for flags in ALL_FLAGS {
            let pipe = S::create(&guard, flags).unwrap();
            assert_eq!(is_cloexec(&pipe.read), flags.contains(PipeFlags::NO_INHERIT_READ), "{} {flags:?}", S::NAME);
            assert_eq!(is_cloexec(&pipe.write), flags.contains(PipeFlags::NO_INHERIT_WRITE), "{} {flags:?}", S::NAME);

            let mut tx = File::from(pipe.write);
            let mut rx = File::from(pipe.read);
            tx.write_all(b"through the sluice").unwrap();
            drop(tx);

            let mut got = String::new();
            rx.read_to_string(&mut got).unwrap();
            assert_eq!(got, "through the sluice");
        }
    }

    #[test]
    fn test_guarded_honors_every_flag_combination() {
        check_strategy::<Guarded>();
    }

    #[cfg(any(
        target_os = "linux",
        target_os = "android",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd",
        target_os = "dragonfly",
        target_os = "illumos",
    ))]
    #[test]
    fn test_atomic_matches_guarded() {
        check_strategy::<Atomic>();
    }

    #[test]
    fn test_no_flags_skips_the_guard() {
        let guard = InheritGuard::new();
        let _held = guard.lock();
        // Would deadlock if the plain path tried to take the guard.
        let pipe = Guarded::create(&guard, PipeFlags::empty()).unwrap();
        assert!(!is_cloexec(&pipe.read));
        assert!(!is_cloexec(&pipe.write));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_dual_suppress_skips_the_guard() {
        let guard = InheritGuard::new();
        let _held = guard.lock();
        let both = PipeFlags::NO_INHERIT_READ | PipeFlags::NO_INHERIT_WRITE;
        let pipe = Atomic::create(&guard, both).unwrap();
        assert!(is_cloexec(&pipe.read));
        assert!(is_cloexec(&pipe.write));
    }

    #[test]
    fn test_one_sided_flag_takes_the_guard() {
        let guard = std::sync::Arc::new(InheritGuard::new());
        let held = guard.lock();

        let worker = {
            let guard = std::sync::Arc::clone(&guard);
            std::thread::spawn(move || Platform::create(&guard, PipeFlags::NO_INHERIT_READ).map(|_| ()))
        };

        std::thread::sleep(std::time::Duration::from_millis(50));
        assert!(!worker.is_finished(), "one-sided suppression must wait for the guard");

        drop(held);
        worker.join().unwrap().unwrap();
    }
}
