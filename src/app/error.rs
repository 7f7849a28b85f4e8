use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure taxonomy shared by every service and store.
///
/// Only `Transient` is worth retrying; the rest are deterministic and are
/// surfaced to the caller unchanged.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Authorization(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Transient(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient(message.into())
    }
}

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        if matches!(
            err,
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
        ) {
            return Self::Transient(format!("store unavailable: {}", err));
        }

        let (code, constraint) = match err.as_database_error() {
            Some(db_err) => (
                db_err.code().map(|code| code.into_owned()),
                db_err.constraint().unwrap_or_default().to_string(),
            ),
            None => (None, String::new()),
        };

        match code.as_deref() {
            Some(UNIQUE_VIOLATION) => {
                Self::Conflict(format!("unique constraint violated: {}", constraint))
            }
            Some(FOREIGN_KEY_VIOLATION) => {
                Self::NotFound(format!("referenced record not found: {}", constraint))
            }
            Some(CHECK_VIOLATION) => {
                Self::Validation(format!("check constraint violated: {}", constraint))
            }
            _ => Self::Internal(anyhow::Error::new(err)),
        }
    }
}
