//! 统计窗口起点与缓存 key
//!
//! 同一周期内多次计算得到相同的 key，写库时走 upsert。
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::config_error::ConfigError;
use crate::model::guild::{WindowMode, WindowPolicy};
use crate::utils::schedule_clock::{localize, parse_tz};

/// 某个 guild 当前的统计窗口
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedWindow {
    pub mode: WindowMode,
    pub tz_name: String,
    pub start_ts: i64,
    pub cache_key: String,
}

/// 本地日期 00:00 对应的 UTC 秒
pub fn local_midnight_ts(date: NaiveDate, tz_name: &str) -> Result<i64, ConfigError> {
    let tz = parse_tz(tz_name).ok_or_else(|| ConfigError::UnknownTimezone(tz_name.to_string()))?;
    date.and_hms_opt(0, 0, 0)
        .and_then(|midnight| localize(&tz, midnight))
        .map(|dt| dt.timestamp())
        .ok_or_else(|| ConfigError::InvalidDate(date.to_string()))
}

/// 解析 `YYYY-MM-DD`
pub fn parse_since_date(date: &str, tz_name: &str) -> Result<i64, ConfigError> {
    let day = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| ConfigError::InvalidDate(date.to_string()))?;
    local_midnight_ts(day, tz_name)
}

pub fn window_start(
    now: DateTime<Utc>,
    mode: WindowMode,
    tz_name: &str,
    since_ts: Option<i64>,
) -> Result<i64, ConfigError> {
    let tz = parse_tz(tz_name).ok_or_else(|| ConfigError::UnknownTimezone(tz_name.to_string()))?;
    let today = now.with_timezone(&tz).date_naive();

    let start_date = match mode {
        WindowMode::SinceDate => return since_ts.ok_or(ConfigError::MissingSince),
        WindowMode::Week => {
            today - Duration::days(i64::from(today.weekday().num_days_from_monday()))
        }
        WindowMode::Month => today.with_day(1).unwrap_or(today),
        WindowMode::Year => NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
    };
    local_midnight_ts(start_date, tz_name)
}

pub fn cache_key(mode: WindowMode, start_ts: i64, tz_name: &str) -> String {
    format!("{}:{}:{}", mode.as_str(), tz_name, start_ts)
}

pub fn resolve_window(now: DateTime<Utc>, policy: &WindowPolicy) -> Result<ResolvedWindow, ConfigError> {
    let start_ts = window_start(now, policy.mode, &policy.tz_name, policy.since_ts)?;
    Ok(ResolvedWindow {
        mode: policy.mode,
        tz_name: policy.tz_name.clone(),
        start_ts,
        cache_key: cache_key(policy.mode, start_ts, &policy.tz_name),
    })
}
