//! 比赛 id 接口的 HTTP 实现
//!
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde::de::IgnoredAny;

use super::match_api::{MatchApi, MatchPageQuery};
use crate::error::riot_error::RiotApiError;

const TOKEN_HEADER: &str = "X-Riot-Token";

pub struct RiotHttpClient {
    http: reqwest::Client,
    api_key: String,
    /// 测试时替换，默认 https://{region}.api.riotgames.com
    base_url: Option<String>,
}

impl RiotHttpClient {
    pub fn new(api_key: &str, request_timeout: Duration) -> Result<Self, RiotApiError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| RiotApiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_key: api_key.to_string(),
            base_url: None,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.trim_end_matches('/').to_string());
        self
    }

    fn page_url(&self, query: &MatchPageQuery) -> String {
        let base = match &self.base_url {
            Some(base) => base.clone(),
            None => format!("https://{}.api.riotgames.com", query.region),
        };
        format!("{}/lol/match/v5/matches/by-puuid/{}/ids", base, query.puuid)
    }
}

/// 请求参数，按接口的字段名
pub fn page_params(query: &MatchPageQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![("startTime", query.start_time.to_string())];
    if let Some(end_time) = query.end_time {
        params.push(("endTime", end_time.to_string()));
    }
    params.push(("start", query.offset.to_string()));
    params.push(("count", query.count.to_string()));
    if let Some(queue) = query.queue {
        params.push(("queue", queue.to_string()));
    }
    params
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// 非 2xx 状态码映射成错误
pub fn map_status(status: u16, retry_after: Option<Duration>, body: String) -> RiotApiError {
    match status {
        401 | 403 => RiotApiError::Unauthorized { status },
        404 => RiotApiError::NotFound,
        429 => RiotApiError::RateLimited { retry_after },
        _ => RiotApiError::UnexpectedStatus { status, body },
    }
}

impl From<reqwest::Error> for RiotApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RiotApiError::Timeout
        } else if err.is_decode() {
            RiotApiError::Decode(err.to_string())
        } else {
            RiotApiError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl MatchApi for RiotHttpClient {
    async fn fetch_page(&self, query: &MatchPageQuery) -> Result<usize, RiotApiError> {
        let response = self
            .http
            .get(self.page_url(query))
            .header(TOKEN_HEADER, &self.api_key)
            .query(&page_params(query))
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let retry_after = parse_retry_after(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status.as_u16(), retry_after, body));
        }

        let ids: Vec<IgnoredAny> = response.json().await?;
        Ok(ids.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn status_codes_map_to_taxonomy() {
        assert_eq!(
            map_status(401, None, String::new()),
            RiotApiError::Unauthorized { status: 401 }
        );
        assert_eq!(
            map_status(403, None, String::new()),
            RiotApiError::Unauthorized { status: 403 }
        );
        assert_eq!(map_status(404, None, String::new()), RiotApiError::NotFound);
        assert_eq!(
            map_status(429, Some(Duration::from_secs(2)), String::new()),
            RiotApiError::RateLimited {
                retry_after: Some(Duration::from_secs(2))
            }
        );
        assert_eq!(
            map_status(502, None, "bad gateway".to_string()),
            RiotApiError::UnexpectedStatus {
                status: 502,
                body: "bad gateway".to_string()
            }
        );
    }

    #[test]
    fn retry_after_header_is_seconds() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);
        headers.insert(RETRY_AFTER, HeaderValue::from_static("2"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(2)));
        headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn params_skip_absent_filters() {
        let query = MatchPageQuery {
            region: "europe".to_string(),
            puuid: "p-1".to_string(),
            start_time: 1_700_000_000,
            end_time: None,
            offset: 200,
            count: 100,
            queue: None,
        };
        let params = page_params(&query);
        assert_eq!(
            params,
            vec![
                ("startTime", "1700000000".to_string()),
                ("start", "200".to_string()),
                ("count", "100".to_string()),
            ]
        );

        let filtered = MatchPageQuery {
            end_time: Some(1_700_086_399),
            queue: Some(420),
            ..query
        };
        let params = page_params(&filtered);
        assert!(params.contains(&("endTime", "1700086399".to_string())));
        assert!(params.contains(&("queue", "420".to_string())));
    }

    #[test]
    fn default_url_uses_region_host() {
        let client = RiotHttpClient::new("key", Duration::from_secs(5)).unwrap();
        let query = MatchPageQuery {
            region: "asia".to_string(),
            puuid: "abc".to_string(),
            start_time: 0,
            end_time: None,
            offset: 0,
            count: 100,
            queue: None,
        };
        assert_eq!(
            client.page_url(&query),
            "https://asia.api.riotgames.com/lol/match/v5/matches/by-puuid/abc/ids"
        );
        let client = client.with_base_url("http://127.0.0.1:9000/");
        assert_eq!(
            client.page_url(&query),
            "http://127.0.0.1:9000/lol/match/v5/matches/by-puuid/abc/ids"
        );
    }
}
