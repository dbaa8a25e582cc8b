use crate::{InheritGuard, OsPipe, PipeFlags, SluiceError};

/// One way of producing a linked pipe pair that honors [`PipeFlags`].
///
/// Implementations must return either both handles or none, and must hold
/// `guard` across any window where a flagged handle is still inheritable.
pub trait PipeStrategy {
    const NAME: &'static str;
    fn create(guard: &InheritGuard, flags: PipeFlags) -> Result<OsPipe, SluiceError>;
}
