//! Error types for odpack
//!
//! Uses `thiserror` for library errors; the binary wraps them in `anyhow`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for odpack operations
pub type OdpackResult<T> = Result<T, OdpackError>;

/// Main error type for odpack operations
///
/// Every variant aborts the enclosing build phase and the whole build.
/// A previously built artifact is never overwritten by a failed build.
#[derive(Error, Debug)]
pub enum OdpackError {
    /// Directive line with an unrecognized trigger token
    #[error("unknown directive '{token}' in {file}:{line}")]
    UnknownDirective {
        token: String,
        file: PathBuf,
        line: usize,
    },

    /// Directive line missing its script argument
    #[error("directive '{token}' in {file}:{line} expects a script argument")]
    DirectiveSyntax {
        token: String,
        file: PathBuf,
        line: usize,
    },

    /// Referenced script file does not exist
    #[error("missing dependency '{path}' referenced from {file}")]
    MissingDependency { path: PathBuf, file: PathBuf },

    /// Directive expansion re-entered a file that is still expanding
    #[error("cyclic directive chain: {}", display_cycle(.cycle))]
    CyclicDirective { cycle: Vec<PathBuf> },

    /// Scripts directory not found
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Archive entry filename already present in the output
    #[error("duplicate archive entry '{filename}'")]
    DuplicateEntry { filename: String },

    /// Injected script path already registered in the manifest
    #[error("manifest already registers '{path}'")]
    DuplicateManifestEntry { path: String },

    /// Existing manifest entry could not be parsed
    #[error("malformed manifest: {message}")]
    ManifestParse { message: String },

    /// Template archive could not be opened or read
    #[error("failed to read archive {path}: {source}")]
    ArchiveRead {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// Output archive could not be written
    #[error("failed to write archive {path}: {source}")]
    ArchiveWrite {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// Asset path escapes its declared assets root
    #[error("asset '{path}' escapes assets root '{root}'")]
    AssetOutsideRoot { path: PathBuf, root: PathBuf },

    /// Invalid configuration file
    #[error("invalid config {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_cycle(cycle: &[PathBuf]) -> String {
    cycle
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
