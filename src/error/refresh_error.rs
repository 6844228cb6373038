use crate::error::{config_error::ConfigError, db_error::DbError, error_code};
use crate::response::api_response::ApiErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// 单个 guild 刷新失败的原因
#[derive(Error, Debug)]
pub enum RefreshError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("guild {0} is not visible to the host")]
    GuildUnavailable(String),
}

impl IntoResponse for RefreshError {
    fn into_response(self) -> Response {
        match self {
            RefreshError::Config(error) => error.into_response(),
            RefreshError::Db(error) => error.into_response(),
            RefreshError::GuildUnavailable(_) => ApiErrorResponse::send(
                StatusCode::NOT_FOUND.as_u16(),
                error_code::GUILD_UNAVAILABLE,
                Some(self.to_string()),
            ),
        }
    }
}
