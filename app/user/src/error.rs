use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use thiserror::Error;

use crate::service::response::{ErrCode, Response};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(u64),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Error saving user to database: {0}")]
    SaveFailed(String),

    #[error("Error reading last inserted id")]
    LastInsertIdUnavailable,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Inconsistent stored data: {0}")]
    DataInconsistency(String),

    #[error("Token generation failed: {0}")]
    TokenGeneration(String),
}

/// 错误的粗粒度分类，决定对外的状态码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Invalid,
    Transient,
}

impl UserError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UserError::NotFound(_) => ErrorKind::NotFound,
            UserError::InvalidBody(_) | UserError::InvalidParam(_) => ErrorKind::Invalid,
            UserError::SaveFailed(_)
            | UserError::LastInsertIdUnavailable
            | UserError::Database(_)
            | UserError::DataInconsistency(_)
            | UserError::TokenGeneration(_) => ErrorKind::Transient,
        }
    }

    pub fn err_code(&self) -> ErrCode {
        match self {
            UserError::NotFound(_) => ErrCode::NotFound,
            UserError::InvalidBody(_) => ErrCode::BadRequest,
            UserError::InvalidParam(_) => ErrCode::ValidationError,
            UserError::SaveFailed(_)
            | UserError::LastInsertIdUnavailable
            | UserError::Database(_) => ErrCode::DatabaseError,
            UserError::DataInconsistency(_) => ErrCode::DataInconsistencyError,
            UserError::TokenGeneration(_) => ErrCode::InternalServerError,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Invalid => StatusCode::BAD_REQUEST,
            ErrorKind::Transient => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> axum::response::Response {
        let code = self.err_code();
        // 存储层细节不对外暴露
        let msg = match self.kind() {
            ErrorKind::Transient => code.default_message().to_string(),
            _ => self.to_string(),
        };
        let body = Response::failed(code, Some(msg));
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<sqlx::Error> for UserError {
    fn from(err: sqlx::Error) -> Self {
        UserError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(UserError::NotFound(999).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            UserError::InvalidBody("trailing comma".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            UserError::InvalidParam("age".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            UserError::SaveFailed("duplicate".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            UserError::LastInsertIdUnavailable.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            UserError::TokenGeneration("entropy".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_err_code_agrees_with_status() {
        let errors = vec![
            UserError::NotFound(7),
            UserError::InvalidBody("eof".into()),
            UserError::InvalidParam("age".into()),
            UserError::SaveFailed("io".into()),
            UserError::LastInsertIdUnavailable,
            UserError::Database("io".into()),
            UserError::DataInconsistency("id".into()),
            UserError::TokenGeneration("entropy".into()),
        ];
        for err in errors {
            assert_eq!(
                err.err_code().http_status(),
                err.status_code().as_u16(),
                "mismatch for {:?}",
                err
            );
        }
    }

    #[test]
    fn test_kind() {
        assert_eq!(UserError::NotFound(1).kind(), ErrorKind::NotFound);
        assert_eq!(UserError::InvalidParam("id".into()).kind(), ErrorKind::Invalid);
        assert_eq!(UserError::Database("io".into()).kind(), ErrorKind::Transient);
        assert_eq!(
            UserError::DataInconsistency("age".into()).kind(),
            ErrorKind::Transient
        );
    }

    #[test]
    fn test_row_not_found_is_database_error() {
        // RowNotFound 由 repository 显式转换为 NotFound，其余一律视为存储错误
        let err: UserError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, UserError::Database(_)));
    }
}
