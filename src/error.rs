//! Global error handling for flatfs
//!
//! Setup problems surface as `Config`, per-entry filesystem failures as
//! `Access`, and an exhausted name space in the encoder as `Conflict`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Global error type for flatfs operations
#[derive(Error, Debug)]
pub enum FlatFsError {
    /// Bad arguments or unusable paths, reported before any work begins
    #[error("Configuration error: {0}")]
    Config(String),

    /// A read or write failure tied to a specific path
    #[error("Access error: {}: {source}", path.display())]
    Access {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The encoder could not produce a unique name
    #[error("Output name conflict: {0}")]
    Conflict(String),

    /// Ignore pattern compilation errors
    #[error("Ignore pattern error: {0}")]
    Ignore(#[from] ignore::Error),

    /// File system errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl FlatFsError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            FlatFsError::Config(_) | FlatFsError::Ignore(_) => 1,
            FlatFsError::Access { .. } | FlatFsError::Io(_) => 2,
            FlatFsError::Conflict(_) => 3,
        }
    }
}

/// Specialized Result type for flatfs operations
pub type Result<T> = std::result::Result<T, FlatFsError>;

/// Creates a FlatFsError with a formatted message
#[macro_export]
macro_rules! error {
    ($error_type:ident, $($arg:tt)*) => {
        $crate::error::FlatFsError::$error_type(format!($($arg)*))
    };
}

/// Returns an error result with a formatted message
#[macro_export]
macro_rules! bail {
    ($error_type:ident, $($arg:tt)*) => {
        return Err($crate::error!($error_type, $($arg)*))
    };
}

/// Ensures a condition is true, otherwise returns an error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $error_type:ident, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($error_type, $($arg)*)
        }
    };
}

/// Extension trait for attaching a path to an I/O error
pub trait ResultExt<T> {
    /// Convert the error into `FlatFsError::Access` for `path`
    fn with_path<P: Into<PathBuf>>(self, path: P) -> Result<T>;
}

impl<T> ResultExt<T> for std::result::Result<T, io::Error> {
    fn with_path<P: Into<PathBuf>>(self, path: P) -> Result<T> {
        self.map_err(|source| FlatFsError::Access {
            path: path.into(),
            source,
        })
    }
}

// Allow `?` on flatfs results inside functions returning io::Result
impl From<FlatFsError> for io::Error {
    fn from(err: FlatFsError) -> Self {
        match err {
            FlatFsError::Io(e) | FlatFsError::Access { source: e, .. } => e,
            other => io::Error::new(io::ErrorKind::Other, other.to_string()),
        }
    }
}
