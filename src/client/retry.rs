//! 分页请求的统一重试
//!
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::riot_error::RiotApiError;

/// 重试策略，max_attempts 包含第一次调用
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// 有服务端给出的等待时间时直接使用，否则指数退避
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(delay) = retry_after {
            return delay;
        }
        let exp = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1u32 << exp)
            .min(self.max_backoff)
    }
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

pub async fn call_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    mut op: F,
) -> Result<T, RiotApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RiotApiError>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() => {
                if attempt >= policy.max_attempts {
                    return Err(RiotApiError::RetryExhausted {
                        attempts: attempt,
                        source: Box::new(err),
                    });
                }
                let delay = policy.delay_for(attempt, err.retry_after());
                tracing::warn!(
                    "call_with_retry - attempt:{} | delay_ms:{} | error:{}",
                    attempt,
                    delay.as_millis(),
                    err
                );
                sleeper.sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// 记录等待时间，不真正睡眠
    #[derive(Default)]
    pub struct RecordingSleeper {
        pub sleeps: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        pub fn recorded(&self) -> Vec<Duration> {
            self.sleeps.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
        }
    }
}
