//! 每周定时刷新的下一次到期时间
//!
//! 纯函数，不做 I/O。
use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::config_error::ConfigError;
use crate::model::guild::RefreshSchedule;

pub fn parse_tz(tz_name: &str) -> Option<Tz> {
    tz_name.trim().parse::<Tz>().ok()
}

/// 本地时间转成带时区时间
///
/// 夏令时跳过的时刻顺延一小时，重复的时刻取较早的一个。
pub fn localize(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => tz.from_local_datetime(&(naive + Duration::hours(1))).earliest(),
    }
}

/// 校验 weekday / hour / minute 与时区名
pub fn validate_schedule(schedule: &RefreshSchedule) -> Result<Tz, ConfigError> {
    if schedule.weekday > 6 {
        return Err(ConfigError::InvalidSchedule(format!(
            "weekday must be 0..=6, got {}",
            schedule.weekday
        )));
    }
    if schedule.hour > 23 || schedule.minute > 59 {
        return Err(ConfigError::InvalidSchedule(format!(
            "invalid time {:02}:{:02}, hour=0..23 minute=0..59",
            schedule.hour, schedule.minute
        )));
    }
    parse_tz(&schedule.tz_name).ok_or_else(|| {
        ConfigError::InvalidSchedule(format!("unknown timezone {}", schedule.tz_name))
    })
}

/// 计算严格晚于 now 的下一次 (weekday, hour:minute) 本地时刻，返回 UTC 秒
pub fn next_due(now: DateTime<Utc>, schedule: &RefreshSchedule) -> Result<i64, ConfigError> {
    let tz = validate_schedule(schedule)?;
    let target_time = NaiveTime::from_hms_opt(u32::from(schedule.hour), u32::from(schedule.minute), 0)
        .ok_or_else(|| ConfigError::InvalidSchedule("invalid time of day".to_string()))?;

    let now_local = now.with_timezone(&tz);
    let days_ahead = (i64::from(schedule.weekday)
        - i64::from(now_local.weekday().num_days_from_monday()))
    .rem_euclid(7);
    let candidate_date = now_local.date_naive() + Duration::days(days_ahead);

    let unresolvable = || ConfigError::InvalidSchedule("local time cannot be resolved".to_string());
    let mut candidate = localize(&tz, candidate_date.and_time(target_time)).ok_or_else(unresolvable)?;
    // 时间已过（含相等）则顺延一周
    if candidate <= now_local {
        candidate = localize(&tz, (candidate_date + Duration::days(7)).and_time(target_time))
            .ok_or_else(unresolvable)?;
    }
    Ok(candidate.timestamp())
}
