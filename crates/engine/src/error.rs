//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`InvalidArgument`] thrown when an input violates a field rule.
//! - [`NotFound`] thrown when an item does not exist or is soft-deleted.
//! - [`Unauthenticated`] thrown when no caller identity resolves to a user.
//! - [`Forbidden`] thrown when the caller may not touch the target data.
//! - [`Conflict`] thrown when a unique field is already taken.
//! - [`StoreUnavailable`] thrown when the database operation fails.
//!
//!  [`InvalidArgument`]: EngineError::InvalidArgument
//!  [`NotFound`]: EngineError::NotFound
//!  [`Unauthenticated`]: EngineError::Unauthenticated
//!  [`Forbidden`]: EngineError::Forbidden
//!  [`Conflict`]: EngineError::Conflict
//!  [`StoreUnavailable`]: EngineError::StoreUnavailable
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid {field}: {reason}")]
    InvalidArgument { field: &'static str, reason: String },
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("\"{0}\" already present!")]
    Conflict(String),
    #[error("store unavailable while trying to {context}: {source}")]
    StoreUnavailable {
        context: String,
        #[source]
        source: DbErr,
    },
}

impl EngineError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field,
            reason: reason.into(),
        }
    }
}

impl From<DbErr> for EngineError {
    fn from(source: DbErr) -> Self {
        Self::StoreUnavailable {
            context: "run database transaction".to_string(),
            source,
        }
    }
}

/// Attach the failing operation to a raw database error.
pub(crate) trait StoreContext<T> {
    fn store_ctx(self, context: &str) -> Result<T, EngineError>;
}

impl<T> StoreContext<T> for Result<T, DbErr> {
    fn store_ctx(self, context: &str) -> Result<T, EngineError> {
        self.map_err(|source| EngineError::StoreUnavailable {
            context: context.to_string(),
            source,
        })
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::InvalidArgument {
                    field: fa,
                    reason: ra,
                },
                Self::InvalidArgument {
                    field: fb,
                    reason: rb,
                },
            ) => fa == fb && ra == rb,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Unauthenticated(a), Self::Unauthenticated(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (
                Self::StoreUnavailable {
                    context: ca,
                    source: sa,
                },
                Self::StoreUnavailable {
                    context: cb,
                    source: sb,
                },
            ) => ca == cb && sa.to_string() == sb.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_argument_names_the_field() {
        let err = EngineError::invalid("amount", "must be positive");
        assert_eq!(err.to_string(), "invalid amount: must be positive");
    }

    #[test]
    fn store_context_wraps_db_errors() {
        let res: Result<(), DbErr> = Err(DbErr::Custom("disk full".to_string()));
        let err = res.store_ctx("insert expense").unwrap_err();
        assert!(matches!(
            &err,
            EngineError::StoreUnavailable { context, .. } if context == "insert expense"
        ));
        assert!(err.to_string().contains("disk full"));
    }
}
