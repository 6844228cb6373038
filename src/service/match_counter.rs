//! 统计单个账号在窗口内的比赛场数
//!
//! 时间范围按固定宽度切片，每个切片再按队列分别分页，结果求和。
//! 每一页请求都经过统一的重试包装。
use std::sync::Arc;

use crate::client::match_api::{regional_route, MatchApi, MatchPageQuery, MATCH_PAGE_SIZE};
use crate::client::retry::{call_with_retry, RetryPolicy, Sleeper};
use crate::error::riot_error::RiotApiError;
use crate::model::guild::QueuePolicy;

const SECS_PER_DAY: i64 = 24 * 3600;

/// 一次计数请求
#[derive(Clone, Debug)]
pub struct CountRequest<'a> {
    pub puuid: &'a str,
    pub platform: Option<&'a str>,
    pub start_ts: i64,
    /// 为空时统计到 now_ts
    pub end_ts: Option<i64>,
    pub now_ts: i64,
    pub queue_policy: QueuePolicy,
}

pub struct MatchCounter {
    api: Arc<dyn MatchApi>,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    slice_secs: i64,
}

impl MatchCounter {
    pub fn new(
        api: Arc<dyn MatchApi>,
        retry: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
        slice_days: i64,
    ) -> Self {
        Self {
            api,
            retry,
            sleeper,
            slice_secs: slice_days.max(1) * SECS_PER_DAY,
        }
    }

    pub async fn count(&self, req: &CountRequest<'_>) -> Result<i64, RiotApiError> {
        let platform = req.platform.unwrap_or_default();
        let region = regional_route(platform)
            .ok_or_else(|| RiotApiError::UnknownPlatform(platform.to_string()))?;

        let end_ts = req.end_ts.unwrap_or(req.now_ts);
        let queues = req.queue_policy.queue_codes();

        let mut total = 0i64;
        for (slice_start, slice_end) in time_slices(req.start_ts, end_ts, self.slice_secs) {
            for queue in &queues {
                total += self
                    .count_pages(region, req.puuid, slice_start, slice_end, *queue)
                    .await?;
            }
        }
        tracing::debug!(
            "MatchCounter::count - puuid:{} | region:{} | policy:{} | start:{} | total:{}",
            req.puuid,
            region,
            req.queue_policy,
            req.start_ts,
            total
        );
        Ok(total)
    }

    /// 翻页直到拿到不满一页的结果
    async fn count_pages(
        &self,
        region: &str,
        puuid: &str,
        slice_start: i64,
        slice_end: i64,
        queue: Option<u16>,
    ) -> Result<i64, RiotApiError> {
        let mut total = 0i64;
        let mut offset = 0u32;
        loop {
            let query = MatchPageQuery {
                region: region.to_string(),
                puuid: puuid.to_string(),
                start_time: slice_start,
                // 接口的 endTime 是闭区间
                end_time: Some(slice_end - 1),
                offset,
                count: MATCH_PAGE_SIZE,
                queue,
            };
            let n = call_with_retry(&self.retry, self.sleeper.as_ref(), || {
                self.api.fetch_page(&query)
            })
            .await?;

            total += n as i64;
            if n < MATCH_PAGE_SIZE as usize {
                return Ok(total);
            }
            offset += MATCH_PAGE_SIZE;
        }
    }
}

/// [start, end) 切成不超过 width 秒的半开区间
pub fn time_slices(start: i64, end: i64, width: i64) -> Vec<(i64, i64)> {
    let mut slices = Vec::new();
    let mut cursor = start;
    while cursor < end {
        let next = cursor.saturating_add(width).min(end);
        slices.push((cursor, next));
        cursor = next;
    }
    slices
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// 按顺序返回预设结果，队列空了之后返回空页
    #[derive(Default)]
    pub struct ScriptedMatchApi {
        pub script: Mutex<VecDeque<Result<usize, RiotApiError>>>,
        pub calls: Mutex<Vec<MatchPageQuery>>,
    }

    impl ScriptedMatchApi {
        pub fn new(script: Vec<Result<usize, RiotApiError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<MatchPageQuery> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MatchApi for ScriptedMatchApi {
        async fn fetch_page(&self, query: &MatchPageQuery) -> Result<usize, RiotApiError> {
            self.calls.lock().unwrap().push(query.clone());
            self.script.lock().unwrap().pop_front().unwrap_or(Ok(0))
        }
    }
}
