use crate::error::{
    config_error::ConfigError, db_error::DbError, refresh_error::RefreshError,
    request_error::RequestError,
};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    ConfigError(#[from] ConfigError),
    #[error(transparent)]
    DbError(#[from] DbError),
    #[error(transparent)]
    RefreshError(#[from] RefreshError),
    #[error(transparent)]
    RequestError(#[from] RequestError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::ConfigError(error) => error.into_response(),
            ApiError::DbError(error) => error.into_response(),
            ApiError::RefreshError(error) => error.into_response(),
            ApiError::RequestError(error) => error.into_response(),
        }
    }
}
