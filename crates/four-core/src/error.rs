//! Domain-specific errors for descriptor and package operations

use std::path::PathBuf;

use four_schema::{Platform, UnknownHeader};
use thiserror::Error;

/// An unmet project invariant, found by `ProjectModel::validate`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing PROJECT declaration")]
    MissingProject,

    #[error("Missing mandatory 'platform' configuration")]
    MissingPlatform,

    #[error("Missing mandatory 'run' configuration")]
    MissingRun,

    #[error("Missing mandatory DEFINE")]
    MissingDefine,

    #[error(
        "Platform '{0}' is not valid. Use: linux, windows, windows-10, windows-11, all"
    )]
    InvalidPlatform(String),
}

/// Every failure a `four` command can abort with.
#[derive(Error, Debug)]
pub enum FourError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File {} not found", .0.display())]
    FileNotFound(PathBuf),

    #[error("File {} must have .{expected} extension", .path.display())]
    Extension {
        path: PathBuf,
        expected: &'static str,
    },

    #[error("Incorrect syntax in {directive} on line {line}: {message}")]
    Syntax {
        line: usize,
        directive: String,
        message: String,
    },

    #[error("PROJECT can only be declared once (line {line})")]
    DuplicateProject { line: usize },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    InvalidHeader(#[from] UnknownHeader),

    #[error("Corrupted .app file: {0}")]
    CorruptArchive(#[from] zip::result::ZipError),

    #[error("Corrupted .app configuration: {0}")]
    CorruptMetadata(#[from] serde_json::Error),

    #[error("Asset path '{path}' {reason}")]
    UnsafePath { path: String, reason: &'static str },

    #[error("Failed to write archive: {0}")]
    ArchiveWrite(#[source] zip::result::ZipError),

    #[error("Corrupted .app file: missing entry '{0}'")]
    MissingEntry(&'static str),

    #[error("Payload checksum mismatch: expected {expected}, found {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("This application is for {package}, but you're on {host}")]
    PlatformMismatch { package: Platform, host: Platform },

    #[error("Failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' timed out after {seconds} seconds")]
    Timeout { program: String, seconds: u64 },
}

impl FourError {
    pub(crate) fn syntax(line: usize, directive: &str, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            directive: directive.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T, E = FourError> = std::result::Result<T, E>;
