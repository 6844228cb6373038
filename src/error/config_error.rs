use crate::error::error_code;
use crate::response::api_response::ApiErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// 配置类错误，同步返回给调用方，不重试
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),
    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),
    #[error("unknown window mode: {0}")]
    UnknownMode(String),
    #[error("since_date window requires a stored start epoch")]
    MissingSince,
    #[error("unknown queue policy: {0}")]
    UnknownQueuePolicy(String),
    #[error("invalid date `{0}`, expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("config -- env var `{0}` is not set")]
    MissingEnv(String),
    #[error("config -- env var `{key}` has invalid value `{value}`")]
    InvalidEnv { key: String, value: String },
}

impl ConfigError {
    fn get_code(&self) -> u32 {
        match self {
            ConfigError::InvalidSchedule(_) => error_code::INVALID_SCHEDULE,
            ConfigError::UnknownTimezone(_) => error_code::UNKNOWN_TIMEZONE,
            ConfigError::UnknownMode(_) => error_code::UNKNOWN_WINDOW_MODE,
            ConfigError::MissingSince => error_code::MISSING_SINCE,
            ConfigError::UnknownQueuePolicy(_) => error_code::UNKNOWN_QUEUE_POLICY,
            ConfigError::InvalidDate(_) => error_code::INVALID_DATE,
            ConfigError::MissingEnv(_) | ConfigError::InvalidEnv { .. } => error_code::ENV_ERROR,
        }
    }
}

impl IntoResponse for ConfigError {
    fn into_response(self) -> Response {
        let status_code = match self {
            ConfigError::MissingEnv(_) | ConfigError::InvalidEnv { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        };

        ApiErrorResponse::send(
            status_code.as_u16(),
            self.get_code(),
            Some(self.to_string()),
        )
    }
}
