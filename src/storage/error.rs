use thiserror::Error;

/// Failure taxonomy for guarded file-sharing operations.
///
/// `PathEscape` is a security rejection and always short-circuits before any
/// I/O or metadata mutation. The I/O variants carry a human-readable message;
/// the API layer maps each variant to a transport status.
#[derive(Error, Debug)]
pub enum ShareError {
    #[error("path escapes the shared root")]
    PathEscape,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("no file provided")]
    NoFile,
    #[error("folder name is required")]
    MissingName,
    #[error("could not create folder: {0}")]
    Create(String),
    #[error("could not store file: {0}")]
    Upload(String),
    #[error("could not delete: {0}")]
    Delete(String),
    #[error("could not list directory: {0}")]
    List(String),
    #[error("could not read file: {0}")]
    Read(String),
    #[error("share link expired")]
    LinkExpired,
    #[error("share link not found")]
    LinkNotFound,
    #[error(transparent)]
    Db(#[from] anyhow::Error),
}
