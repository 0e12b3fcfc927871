//! Custom error types for the sword-reader crate.

use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum SwordError {
    /// An error originating from I/O operations.
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// The `.conf` file declared a `ModDrv` this crate does not know about.
    #[error("Unknown Sword driver type: {0:?}")]
    UnknownDriverType(String),

    /// The `.conf` file declared an encoding other than UTF-8
    /// (absence of the field means the ISO-8859-1 default).
    #[error("Unsupported declared encoding: {0:?}")]
    UnsupportedEncoding(String),

    /// The `.conf` file declared a versification scheme we have no tables for.
    #[error("Unknown versification scheme: {0:?}")]
    UnknownVersification(String),

    /// The `.conf` file declared a compression type other than ZIP (e.g. LZSS).
    #[error("Unsupported compression type: {0:?}")]
    UnsupportedCompression(String),

    /// A binary index file ended in the middle of a fixed-width record.
    #[error("Index file truncated mid-record: {}", path.display())]
    TruncatedIndex { path: PathBuf },

    /// The `.conf` file is structurally unusable (missing `[Name]` header,
    /// missing `ModDrv`, missing `DataPath`, and so on).
    #[error("Invalid module configuration: {0}")]
    InvalidConf(String),

    /// No module with this abbreviation or name exists in the catalog.
    #[error("No such module: {0:?}")]
    UnknownModule(String),

    /// The module is encrypted and its cipher key has been withheld.
    /// No data file is touched for such a module.
    #[error("Module {0:?} is locked (cipher key withheld)")]
    Locked(String),

    /// A compressed block failed to inflate.
    #[error("Decompression failed: {0}")]
    Decompression(String),
}

/// A convenience `Result` type alias using the crate's `SwordError` type.
pub type Result<T> = std::result::Result<T, SwordError>;
