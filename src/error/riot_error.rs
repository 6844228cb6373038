use std::time::Duration;

use thiserror::Error;

/// 比赛接口错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RiotApiError {
    #[error("riot api auth error ({status})")]
    Unauthorized { status: u16 },
    #[error("riot identity not found")]
    NotFound,
    #[error("riot api rate limited, retry_after:{retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },
    #[error("riot api request timed out")]
    Timeout,
    #[error("riot api transport error: {0}")]
    Transport(String),
    #[error("riot api error {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
    #[error("riot api payload decode error: {0}")]
    Decode(String),
    #[error("unknown platform: {0}")]
    UnknownPlatform(String),
    #[error("riot api gave up after {attempts} attempts")]
    RetryExhausted {
        attempts: u32,
        #[source]
        source: Box<RiotApiError>,
    },
}

impl RiotApiError {
    /// 限流、超时、网络错误和 5xx 可以在分页级别重试
    pub fn is_retryable(&self) -> bool {
        match self {
            RiotApiError::RateLimited { .. } | RiotApiError::Timeout | RiotApiError::Transport(_) => {
                true
            }
            RiotApiError::UnexpectedStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// 服务端给出的重试等待时间
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            RiotApiError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}
