//! Error taxonomy for engine operations.
//!
//! "Not found" is never an error: lookups return `None`, and
//! `update`/`delete`/`count` report `false` or `0`.

use thiserror::Error;

/// Errors returned at the [`Engine`](crate::engine::Engine) call boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// A required argument was empty. Raised before any store access.
    ///
    /// `dataset` and term field names are trimmed first, so whitespace-only
    /// values count as empty. `location` is only rejected when it is `""`.
    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),

    /// `insert` was called for a natural key that already exists.
    #[error("document already exists: {dataset}/{location}")]
    Conflict { dataset: String, location: String },

    /// Engine options failed validation.
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// Failure reported by the underlying store, passed through as-is.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Fails with [`Error::MissingArgument`] when `value` is empty or whitespace.
pub(crate) fn require(name: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::MissingArgument(name));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_rejects_blank() {
        assert!(matches!(
            require("dataset", "  "),
            Err(Error::MissingArgument("dataset"))
        ));
        assert!(require("dataset", "recipe").is_ok());
    }

    #[test]
    fn test_store_error_is_transparent() {
        let err = Error::from(anyhow::anyhow!("disk I/O error"));
        assert_eq!(err.to_string(), "disk I/O error");
    }
}
