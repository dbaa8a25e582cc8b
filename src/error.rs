use std::{fmt, io};


use liaise::{Liaise, RegisterErrors};

#[derive(RegisterErrors, Debug, Copy, Clone, PartialEq, Eq)]
#[error_prefix = "SLUICE"] // Sets the reporting prefix
pub enum SluiceCode {
    Io = 1,
    ResourceExhausted = 2,
    DuplicationFailed = 3,
    InheritFlag = 4,
    Unsupported = 5,
    NotReadable = 6,
    NotWritable = 7,
}

impl Liaise for SluiceCode {
    fn code_id(self) -> u16 { self as u16 }

    fn message(self) -> &'static str {
        match self {
            Self::Io => "I/O error",
            Self::ResourceExhausted => "Pipe creation failed",
            Self::DuplicationFailed => "Handle duplication failed",
            Self::InheritFlag => "Could not set inheritance flag",
            Self::Unsupported => "Operation not supported on a stream endpoint",
            Self::NotReadable => "Endpoint is not open for reading",
            Self::NotWritable => "Endpoint is not open for writing",
        }
    }
}

/// Concrete runtime error type for the crate.
/// Uses `liaise` for stable IDs + formatting; no `thiserror`.
#[derive(Debug)]
pub struct SluiceError {
    pub code: SluiceCode,
    pub ctx: Option<String>,

    /// Platform-level cause, kept verbatim.
    pub source: Option<io::Error>,
}

impl SluiceError {
    #[inline]
    pub fn new(code: SluiceCode) -> Self {
        Self { code, ctx: None, source: None }
    }

    #[inline]
    pub fn ctx(mut self, ctx: impl fmt::Display) -> Self {
        self.ctx = Some(ctx.to_string());
        self
    }

    #[inline]
    fn with_os(code: SluiceCode, err: io::Error) -> Self {
        Self {
            code,
            ctx: Some(err.to_string()),
            source: Some(err),
        }
    }

    #[inline]
    pub fn io(err: io::Error) -> Self {
        Self::with_os(SluiceCode::Io, err)
    }

    /// The OS refused to create the pipe (descriptor/handle limit and friends).
    #[inline]
    pub fn resource_exhausted(err: io::Error) -> Self {
        Self::with_os(SluiceCode::ResourceExhausted, err)
    }

    #[inline]
    pub fn duplication_failed(err: io::Error) -> Self {
        Self::with_os(SluiceCode::DuplicationFailed, err)
    }

    #[inline]
    pub fn inherit_flag(err: io::Error) -> Self {
        Self::with_os(SluiceCode::InheritFlag, err)
    }

    #[inline]
    pub fn unsupported(op: &str) -> Self {
        Self::new(SluiceCode::Unsupported).ctx(format_args!("{op} on a pipe endpoint"))
    }

    #[inline]
    pub fn not_readable() -> Self {
        Self::new(SluiceCode::NotReadable)
    }

    #[inline]
    pub fn not_writable() -> Self {
        Self::new(SluiceCode::NotWritable)
    }

    /// Raw OS error number of the underlying cause, if any.
    pub fn raw_os_error(&self) -> Option<i32> {
        self.source.as_ref().and_then(io::Error::raw_os_error)
    }

    fn io_kind(&self) -> io::ErrorKind {
        match self.code {
            SluiceCode::Unsupported => io::ErrorKind::Unsupported,
            SluiceCode::NotReadable | SluiceCode::NotWritable => io::ErrorKind::PermissionDenied,
            _ => self
                .source
                .as_ref()
                .map_or(io::ErrorKind::Other, io::Error::kind),
        }
    }
}

impl fmt::Display for SluiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Canonical format: "[SLUICE0002] msg: ctx"
        let base = self.code.render();
        match &self.ctx {
            Some(ctx) => write!(f, "{base}: {ctx}"),
            None => write!(f, "{base}"),
        }
    }
}

impl std::error::Error for SluiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.source {
            Some(e) => Some(e),
            None => None,
        }
    }
}

impl From<io::Error> for SluiceError {
    #[inline]
    fn from(e: io::Error) -> Self {
        SluiceError::io(e)
    }
}

impl From<SluiceError> for io::Error {
    fn from(e: SluiceError) -> Self {
        // Pass plain I/O errors through untouched.
        if e.code == SluiceCode::Io {
            if let Some(src) = e.source {
                return src;
            }
        }
        io::Error::new(e.io_kind(), e)
    }
}

#[cfg(unix)]
impl From<nix::Error> for SluiceError {
    #[inline]
    fn from(e: nix::Error) -> Self {
        SluiceError::io(e.into())
    }
}
