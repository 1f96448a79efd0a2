//! Error types for folio operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or assembling an export.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("export directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("invalid page filename: {0}")]
    InvalidPageName(String),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("selector for class {class:?} could not be compiled")]
    Selector { class: String },

    #[error("article group on page {page} has no title")]
    Untitled { page: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;
