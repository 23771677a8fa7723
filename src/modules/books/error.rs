use serde_json::json;
use shelf_http::error::AppError;
use thiserror::Error;

use super::models::{UnknownStatus, ValidationErrors};

pub type BookResult<T> = Result<T, BookError>;

/// Failures of the books repository. Absence is not an error.
#[derive(Debug, Error)]
pub enum BookError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("invalid stored book {id}: {source}")]
    InvalidData { id: i64, source: UnknownStatus },

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

impl From<BookError> for AppError {
    fn from(err: BookError) -> Self {
        match err {
            BookError::Validation(errors) => {
                let details = errors
                    .0
                    .iter()
                    .map(|e| json!({ "field": e.field, "message": e.message }))
                    .collect();
                AppError::validation(details, errors.to_string())
            }
            other => AppError::Internal(other.into()),
        }
    }
}
