//! guild 管理配置
//!
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::parameter::DEFAULT_TZ;
use crate::error::api_error::ApiError;
use crate::error::config_error::ConfigError;
use crate::model::guild::{BoardLocation, GuildSettings, QueuePolicy, RefreshSchedule, WindowMode};
use crate::repository::leaderboard_repository::LeaderboardRepositoryTrait;
use crate::utils::schedule_clock::{next_due, parse_tz};
use crate::utils::window_policy::{parse_since_date, resolve_window};

/// 状态查询结果，窗口计算失败时带上错误信息
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GuildStatus {
    pub settings: GuildSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_start_ts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_error: Option<String>,
}

#[derive(Clone)]
pub struct GuildConfigService {
    repo: Arc<dyn LeaderboardRepositoryTrait>,
}

fn tz_or_default(tz_name: Option<&str>) -> Result<String, ConfigError> {
    let tz_name = tz_name
        .map(str::trim)
        .filter(|tz| !tz.is_empty())
        .unwrap_or(DEFAULT_TZ);
    parse_tz(tz_name)
        .map(|_| tz_name.to_string())
        .ok_or_else(|| ConfigError::UnknownTimezone(tz_name.to_string()))
}

impl GuildConfigService {
    pub fn new(repo: Arc<dyn LeaderboardRepositoryTrait>) -> Self {
        Self { repo }
    }

    async fn save(&self, settings: GuildSettings) -> Result<GuildSettings, ApiError> {
        self.repo.update_guild_settings(&settings).await?;
        Ok(settings)
    }

    pub async fn set_board(
        &self,
        guild_id: &str,
        channel_id: &str,
        message_id: &str,
    ) -> Result<GuildSettings, ApiError> {
        let mut settings = self.repo.ensure_guild_settings(guild_id).await?;
        settings.board = Some(BoardLocation {
            channel_id: channel_id.to_string(),
            message_id: message_id.to_string(),
        });
        self.save(settings).await
    }

    /// 校验后保存，同时写入下一次到期时间
    pub async fn set_refresh(
        &self,
        guild_id: &str,
        weekday: u8,
        hour: u8,
        minute: u8,
        tz_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<GuildSettings, ApiError> {
        let schedule = RefreshSchedule {
            weekday,
            hour,
            minute,
            tz_name: tz_name
                .map(str::trim)
                .filter(|tz| !tz.is_empty())
                .unwrap_or(DEFAULT_TZ)
                .to_string(),
        };
        let next_ts = next_due(now, &schedule)?;

        let mut settings = self.repo.ensure_guild_settings(guild_id).await?;
        settings.schedule = Some(schedule);
        settings.next_refresh_ts = Some(next_ts);
        tracing::info!("set_refresh - guild_id:{} | next_refresh_ts:{}", guild_id, next_ts);
        self.save(settings).await
    }

    pub async fn clear_refresh(&self, guild_id: &str) -> Result<GuildSettings, ApiError> {
        let mut settings = self.repo.ensure_guild_settings(guild_id).await?;
        settings.schedule = None;
        settings.next_refresh_ts = None;
        self.save(settings).await
    }

    /// 切换到 week / month / year，清掉旧的 since 起点
    pub async fn set_window(
        &self,
        guild_id: &str,
        mode: &str,
        tz_name: Option<&str>,
    ) -> Result<GuildSettings, ApiError> {
        let mode: WindowMode = mode.parse()?;
        if mode == WindowMode::SinceDate {
            return Err(ConfigError::MissingSince.into());
        }
        let tz_name = tz_or_default(tz_name)?;

        let mut settings = self.repo.ensure_guild_settings(guild_id).await?;
        settings.window_mode = mode.as_str().to_string();
        settings.window_tz = tz_name;
        settings.window_since_ts = None;
        self.save(settings).await
    }

    /// `YYYY-MM-DD` 按窗口时区的 0 点存储
    pub async fn set_since(
        &self,
        guild_id: &str,
        date: &str,
        tz_name: Option<&str>,
    ) -> Result<GuildSettings, ApiError> {
        let tz_name = tz_or_default(tz_name)?;
        let since_ts = parse_since_date(date, &tz_name)?;

        let mut settings = self.repo.ensure_guild_settings(guild_id).await?;
        settings.window_mode = WindowMode::SinceDate.as_str().to_string();
        settings.window_tz = tz_name;
        settings.window_since_ts = Some(since_ts);
        self.save(settings).await
    }

    pub async fn set_queues(&self, guild_id: &str, policy: &str) -> Result<GuildSettings, ApiError> {
        let policy: QueuePolicy = policy.parse()?;
        let mut settings = self.repo.ensure_guild_settings(guild_id).await?;
        settings.queue_policy = policy.as_str().to_string();
        self.save(settings).await
    }

    pub async fn status(&self, guild_id: &str, now: DateTime<Utc>) -> Result<GuildStatus, ApiError> {
        let settings = self.repo.ensure_guild_settings(guild_id).await?;
        let window = settings
            .window_policy()
            .and_then(|policy| resolve_window(now, &policy));
        let status = match window {
            Ok(window) => GuildStatus {
                settings,
                window_start_ts: Some(window.start_ts),
                window_key: Some(window.cache_key),
                window_error: None,
            },
            Err(err) => GuildStatus {
                settings,
                window_start_ts: None,
                window_key: None,
                window_error: Some(err.to_string()),
            },
        };
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory_repository::MemoryRepository;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap()
    }

    fn service() -> (Arc<MemoryRepository>, GuildConfigService) {
        let repo = Arc::new(MemoryRepository::new());
        (repo.clone(), GuildConfigService::new(repo))
    }

    #[tokio::test]
    async fn first_action_creates_default_settings() {
        let (repo, service) = service();
        let settings = service.set_board("g1", "c1", "m1").await.unwrap();
        assert_eq!(settings.window_mode, "month");
        assert_eq!(settings.window_tz, DEFAULT_TZ);
        assert_eq!(settings.queue_policy, "all");
        assert_eq!(
            repo.get_guild_settings("g1").await.unwrap().unwrap().board,
            Some(BoardLocation {
                channel_id: "c1".to_string(),
                message_id: "m1".to_string()
            })
        );
    }

    #[tokio::test]
    async fn refresh_schedule_stores_next_due() {
        let (_, service) = service();
        let settings = service
            .set_refresh("g1", 4, 18, 30, Some("UTC"), now())
            .await
            .unwrap();
        // 周五 2026-10-16 18:30 UTC
        assert_eq!(
            settings.next_refresh_ts,
            Some(Utc.with_ymd_and_hms(2026, 10, 16, 18, 30, 0).unwrap().timestamp())
        );

        let cleared = service.clear_refresh("g1").await.unwrap();
        assert_eq!(cleared.schedule, None);
        assert_eq!(cleared.next_refresh_ts, None);
    }

    #[tokio::test]
    async fn invalid_schedule_is_rejected() {
        let (repo, service) = service();
        let res = service.set_refresh("g1", 7, 0, 0, None, now()).await;
        assert!(matches!(
            res,
            Err(ApiError::ConfigError(ConfigError::InvalidSchedule(_)))
        ));
        assert!(repo.get_guild_settings("g1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_window_clears_since_epoch() {
        let (_, service) = service();
        let since = service.set_since("g1", "2026-09-01", Some("UTC")).await.unwrap();
        assert_eq!(since.window_mode, "since_date");
        assert_eq!(
            since.window_since_ts,
            Some(Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap().timestamp())
        );

        let week = service.set_window("g1", "week", None).await.unwrap();
        assert_eq!(week.window_mode, "week");
        assert_eq!(week.window_since_ts, None);

        assert!(matches!(
            service.set_window("g1", "since_date", None).await,
            Err(ApiError::ConfigError(ConfigError::MissingSince))
        ));
        assert!(matches!(
            service.set_window("g1", "month", Some("Mars/Olympus")).await,
            Err(ApiError::ConfigError(ConfigError::UnknownTimezone(_)))
        ));
    }

    #[tokio::test]
    async fn status_reports_window_or_error() {
        let (repo, service) = service();
        service.set_queues("g1", "ranked_only").await.unwrap();
        let status = service.status("g1", now()).await.unwrap();
        assert_eq!(status.settings.queue_policy, "ranked_only");
        assert!(status.window_start_ts.is_some());
        assert!(status.window_error.is_none());

        let mut broken = repo.get_guild_settings("g1").await.unwrap().unwrap();
        broken.window_mode = "since_date".to_string();
        repo.update_guild_settings(&broken).await.unwrap();
        let status = service.status("g1", now()).await.unwrap();
        assert_eq!(status.window_start_ts, None);
        assert_eq!(status.window_error, Some(ConfigError::MissingSince.to_string()));
    }

    #[tokio::test]
    async fn unknown_queue_policy_is_rejected() {
        let (_, service) = service();
        assert!(matches!(
            service.set_queues("g1", "arena").await,
            Err(ApiError::ConfigError(ConfigError::UnknownQueuePolicy(_)))
        ));
    }
}
