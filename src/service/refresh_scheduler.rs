//! 定时扫描到期的 guild 并刷新排行榜
//!
//! 每个 tick 依次处理到期的 guild，单个 guild 出错不影响其他 guild。
//! 刷新成功或失败后都会重新计算下一次到期时间。
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use uuid::Uuid;

use crate::error::refresh_error::RefreshError;
use crate::model::guild::GuildSettings;
use crate::model::leaderboard::PublishedBoard;
use crate::repository::leaderboard_repository::LeaderboardRepositoryTrait;
use crate::repository::redis_board::{BoardPublisher, GuildDirectory};
use crate::service::ranking_service::{highlights, RankingEngine, HIGHLIGHT_COUNT};
use crate::service::stats_service::{StatsRefreshReport, StatsRefresher};
use crate::utils::schedule_clock::next_due;
use crate::utils::window_policy::{resolve_window, ResolvedWindow};

/// 一个 tick 的处理结果
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub due: usize,
    pub refreshed: usize,
    pub failed: usize,
    /// 机器人已看不到的 guild
    pub skipped: usize,
    /// 上一个 tick 还没结束
    pub overlapped: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GuildRefreshReport {
    pub guild_id: String,
    pub window: ResolvedWindow,
    /// 没有 API key 时为空
    pub stats: Option<StatsRefreshReport>,
    pub ranked_rows: usize,
    pub published: bool,
}

pub struct RefreshScheduler {
    repo: Arc<dyn LeaderboardRepositoryTrait>,
    directory: Arc<dyn GuildDirectory>,
    publisher: Arc<dyn BoardPublisher>,
    stats: Option<StatsRefresher>,
    ranking: RankingEngine,
    tick_guard: Mutex<()>,
}

impl RefreshScheduler {
    pub fn new(
        repo: Arc<dyn LeaderboardRepositoryTrait>,
        directory: Arc<dyn GuildDirectory>,
        publisher: Arc<dyn BoardPublisher>,
        stats: Option<StatsRefresher>,
    ) -> Self {
        Self {
            ranking: RankingEngine::new(repo.clone()),
            repo,
            directory,
            publisher,
            stats,
            tick_guard: Mutex::new(()),
        }
    }

    /// 注册周期任务并启动调度器
    pub async fn start(
        self: &Arc<Self>,
        sched: &JobScheduler,
        cron_expression: &str,
    ) -> Result<Uuid, JobSchedulerError> {
        let scheduler = Arc::clone(self);
        let job = Job::new_async(cron_expression, move |_uuid, _l| {
            let scheduler = scheduler.clone();
            Box::pin(async move {
                scheduler.run_tick(Utc::now()).await;
            })
        })?;
        let uuid = sched.add(job).await?;
        sched.start().await?;
        tracing::info!("refresh scheduler started, cron_expression:{}", cron_expression);
        Ok(uuid)
    }

    pub async fn run_tick(&self, now: DateTime<Utc>) -> TickReport {
        let Ok(_guard) = self.tick_guard.try_lock() else {
            tracing::warn!("run_tick - previous tick still running, skip");
            return TickReport {
                overlapped: true,
                ..Default::default()
            };
        };

        let mut report = TickReport::default();
        let due = match self.repo.list_guilds_due(now.timestamp()).await {
            Ok(due) => due,
            Err(err) => {
                // 下一个 tick 会重试
                tracing::error!("run_tick - list due guilds failed, error:{}", err);
                return report;
            }
        };
        report.due = due.len();

        for settings in due {
            match self.refresh_settings(&settings, now).await {
                Ok(_) => report.refreshed += 1,
                Err(RefreshError::GuildUnavailable(guild_id)) => {
                    tracing::info!("run_tick - guild unavailable, skip, guild_id:{}", guild_id);
                    report.skipped += 1;
                    continue;
                }
                Err(err) => {
                    tracing::error!(
                        "run_tick - refresh failed, guild_id:{} | error:{}",
                        settings.guild_id,
                        err
                    );
                    report.failed += 1;
                }
            }
            self.schedule_next(&settings, now).await;
        }

        if report.due > 0 {
            tracing::info!(
                "run_tick - due:{} | refreshed:{} | failed:{} | skipped:{}",
                report.due,
                report.refreshed,
                report.failed,
                report.skipped
            );
        }
        report
    }

    /// 管理员手动触发，不改动下次到期时间
    pub async fn refresh_now(
        &self,
        guild_id: &str,
        now: DateTime<Utc>,
    ) -> Result<GuildRefreshReport, RefreshError> {
        let settings = self.repo.ensure_guild_settings(guild_id).await?;
        self.refresh_settings(&settings, now).await
    }

    async fn refresh_settings(
        &self,
        settings: &GuildSettings,
        now: DateTime<Utc>,
    ) -> Result<GuildRefreshReport, RefreshError> {
        let guild_id = settings.guild_id.as_str();
        let member_ids = self
            .directory
            .member_ids(guild_id)
            .await?
            .ok_or_else(|| RefreshError::GuildUnavailable(guild_id.to_string()))?;

        let policy = settings.window_policy()?;
        let queue_policy = settings.queue_policy()?;
        let window = resolve_window(now, &policy)?;

        let stats = match &self.stats {
            Some(stats) => Some(
                stats
                    .refresh_guild(guild_id, &member_ids, &window, queue_policy, now)
                    .await?,
            ),
            None => {
                tracing::warn!(
                    "refresh_settings - riot api key missing, skip stats, guild_id:{}",
                    guild_id
                );
                None
            }
        };

        let mut report = GuildRefreshReport {
            guild_id: guild_id.to_string(),
            window,
            stats,
            ranked_rows: 0,
            published: false,
        };

        let Some(board) = settings.board.clone() else {
            tracing::info!("refresh_settings - no board configured, guild_id:{}", guild_id);
            self.repo.set_last_refresh(guild_id, now.timestamp()).await?;
            return Ok(report);
        };

        let rows = self
            .ranking
            .rank(guild_id, &member_ids, &report.window.cache_key, now)
            .await?;
        let published = PublishedBoard {
            guild_id: guild_id.to_string(),
            board,
            window_mode: report.window.mode,
            window_tz: report.window.tz_name.clone(),
            window_start_ts: report.window.start_ts,
            cache_key: report.window.cache_key.clone(),
            queue_policy,
            highlights: highlights(&rows, HIGHLIGHT_COUNT),
            rows,
            published_at: now.timestamp(),
        };
        self.publisher.publish(&published).await?;
        self.repo.set_last_refresh(guild_id, now.timestamp()).await?;

        report.ranked_rows = published.rows.len();
        report.published = true;
        Ok(report)
    }

    /// 失败也要重新排期，避免每个 tick 都重试
    async fn schedule_next(&self, settings: &GuildSettings, now: DateTime<Utc>) {
        let next_ts = match &settings.schedule {
            Some(schedule) => match next_due(now, schedule) {
                Ok(ts) => Some(ts),
                Err(err) => {
                    tracing::error!(
                        "schedule_next - invalid schedule, unschedule guild, guild_id:{} | error:{}",
                        settings.guild_id,
                        err
                    );
                    None
                }
            },
            None => None,
        };
        if let Err(err) = self.repo.set_next_refresh(&settings.guild_id, next_ts).await {
            tracing::error!(
                "schedule_next - write failed, guild_id:{} | error:{}",
                settings.guild_id,
                err
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::match_api::MockMatchApi;
    use crate::client::retry::{test_support::RecordingSleeper, RetryPolicy};
    use crate::model::account::NewAccount;
    use crate::model::guild::{BoardLocation, RefreshSchedule};
    use crate::model::leaderboard::Movement;
    use crate::repository::memory_repository::MemoryRepository;
    use crate::repository::redis_board::{MockBoardPublisher, MockGuildDirectory};
    use crate::service::match_counter::MatchCounter;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        // 2026-10-14 周三 12:00 UTC
        Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap()
    }

    fn scheduled_guild(guild_id: &str, with_board: bool) -> GuildSettings {
        let mut settings = GuildSettings::new(guild_id);
        settings.window_tz = "UTC".to_string();
        settings.schedule = Some(RefreshSchedule {
            weekday: 0,
            hour: 9,
            minute: 0,
            tz_name: "UTC".to_string(),
        });
        settings.next_refresh_ts = Some(now().timestamp() - 60);
        if with_board {
            settings.board = Some(BoardLocation {
                channel_id: "c1".to_string(),
                message_id: "m1".to_string(),
            });
        }
        settings
    }

    async fn seed_accounts(repo: &MemoryRepository) {
        for (member, puuid) in [("1", "p-1"), ("2", "p-2")] {
            repo.add_account(&NewAccount {
                member_id: member.to_string(),
                puuid: puuid.to_string(),
                riot_id: None,
                platform: Some("EUW1".to_string()),
            })
            .await
            .unwrap();
        }
    }

    fn stats_refresher(repo: Arc<MemoryRepository>, games: usize) -> StatsRefresher {
        let mut api = MockMatchApi::new();
        api.expect_fetch_page().returning(move |_| Ok(games));
        let counter = MatchCounter::new(
            Arc::new(api),
            RetryPolicy::default(),
            Arc::new(RecordingSleeper::default()),
            30,
        );
        StatsRefresher::new(repo, Arc::new(counter), 2)
    }

    fn directory_with_members() -> MockGuildDirectory {
        let mut directory = MockGuildDirectory::new();
        directory
            .expect_member_ids()
            .returning(|_| Ok(Some(vec!["1".to_string(), "2".to_string()])));
        directory
    }

    // 下一个周一 09:00 UTC
    const NEXT_MONDAY: i64 = 1_792_400_400;

    #[tokio::test]
    async fn due_guild_is_refreshed_published_and_rescheduled() {
        let repo = Arc::new(MemoryRepository::new());
        seed_accounts(&repo).await;
        repo.put_guild(scheduled_guild("g1", true)).await;

        let mut publisher = MockBoardPublisher::new();
        publisher
            .expect_publish()
            .withf(|board| {
                board.guild_id == "g1"
                    && board.rows.len() == 2
                    && board.rows.iter().all(|r| r.rank == 1 && r.movement == Movement::New)
                    && board.highlights.len() == 2
            })
            .times(1)
            .returning(|_| Ok(()));

        let scheduler = RefreshScheduler::new(
            repo.clone(),
            Arc::new(directory_with_members()),
            Arc::new(publisher),
            Some(stats_refresher(repo.clone(), 7)),
        );
        let report = scheduler.run_tick(now()).await;

        assert_eq!(
            report,
            TickReport {
                due: 1,
                refreshed: 1,
                ..Default::default()
            }
        );
        let settings = repo.get_guild_settings("g1").await.unwrap().unwrap();
        assert_eq!(settings.last_refresh_ts, Some(now().timestamp()));
        assert_eq!(settings.next_refresh_ts, Some(NEXT_MONDAY));
        assert!(settings.next_refresh_ts.unwrap() > now().timestamp());

        // 排期已推后，同一时刻再跑一次不会到期
        let again = scheduler.run_tick(now()).await;
        assert_eq!(again.due, 0);
    }

    #[tokio::test]
    async fn failing_guild_does_not_block_others() {
        let repo = Arc::new(MemoryRepository::new());
        seed_accounts(&repo).await;
        let mut broken = scheduled_guild("g0", true);
        broken.window_mode = "fortnight".to_string();
        repo.put_guild(broken).await;
        let mut healthy = scheduled_guild("g1", true);
        healthy.next_refresh_ts = Some(now().timestamp() - 30);
        repo.put_guild(healthy).await;

        let mut publisher = MockBoardPublisher::new();
        publisher
            .expect_publish()
            .withf(|board| board.guild_id == "g1")
            .times(1)
            .returning(|_| Ok(()));

        let scheduler = RefreshScheduler::new(
            repo.clone(),
            Arc::new(directory_with_members()),
            Arc::new(publisher),
            Some(stats_refresher(repo.clone(), 3)),
        );
        let report = scheduler.run_tick(now()).await;

        assert_eq!((report.due, report.refreshed, report.failed), (2, 1, 1));
        // 失败的 guild 也被重新排期
        let broken = repo.get_guild_settings("g0").await.unwrap().unwrap();
        assert_eq!(broken.next_refresh_ts, Some(NEXT_MONDAY));
        assert_eq!(broken.last_refresh_ts, None);
    }

    #[tokio::test]
    async fn unavailable_guild_is_skipped_without_reschedule() {
        let repo = Arc::new(MemoryRepository::new());
        let settings = scheduled_guild("gone", true);
        let due_at = settings.next_refresh_ts;
        repo.put_guild(settings).await;

        let mut directory = MockGuildDirectory::new();
        directory.expect_member_ids().returning(|_| Ok(None));
        let mut publisher = MockBoardPublisher::new();
        publisher.expect_publish().never();

        let scheduler = RefreshScheduler::new(
            repo.clone(),
            Arc::new(directory),
            Arc::new(publisher),
            Some(stats_refresher(repo.clone(), 1)),
        );
        let report = scheduler.run_tick(now()).await;

        assert_eq!((report.due, report.skipped), (1, 1));
        let settings = repo.get_guild_settings("gone").await.unwrap().unwrap();
        assert_eq!(settings.next_refresh_ts, due_at);
    }

    #[tokio::test]
    async fn guild_without_board_updates_stats_only() {
        let repo = Arc::new(MemoryRepository::new());
        seed_accounts(&repo).await;
        repo.put_guild(scheduled_guild("g1", false)).await;

        let mut publisher = MockBoardPublisher::new();
        publisher.expect_publish().never();

        let scheduler = RefreshScheduler::new(
            repo.clone(),
            Arc::new(directory_with_members()),
            Arc::new(publisher),
            Some(stats_refresher(repo.clone(), 4)),
        );
        let report = scheduler.refresh_now("g1", now()).await.unwrap();

        assert!(!report.published);
        assert_eq!(report.stats.map(|s| s.updated), Some(2));
        let stats = repo.stats_for(1, &report.window.cache_key).await.unwrap();
        assert_eq!(stats.games_played, 4);
        // 没有渲染就没有快照
        assert!(repo
            .snapshot_map("g1", &report.window.cache_key)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn missing_api_key_still_ranks_existing_stats() {
        let repo = Arc::new(MemoryRepository::new());
        repo.put_guild(scheduled_guild("g1", true)).await;

        let mut publisher = MockBoardPublisher::new();
        publisher.expect_publish().times(1).returning(|_| Ok(()));

        let scheduler = RefreshScheduler::new(
            repo.clone(),
            Arc::new(directory_with_members()),
            Arc::new(publisher),
            None,
        );
        let report = scheduler.refresh_now("g1", now()).await.unwrap();

        assert!(report.stats.is_none());
        assert!(report.published);
        assert_eq!(report.ranked_rows, 0);
        // 手动刷新不改排期
        let settings = repo.get_guild_settings("g1").await.unwrap().unwrap();
        assert_eq!(settings.next_refresh_ts, Some(now().timestamp() - 60));
    }

    #[tokio::test]
    async fn overlapping_tick_is_skipped() {
        let repo = Arc::new(MemoryRepository::new());
        let scheduler = RefreshScheduler::new(
            repo,
            Arc::new(MockGuildDirectory::new()),
            Arc::new(MockBoardPublisher::new()),
            None,
        );
        let _held = scheduler.tick_guard.lock().await;
        let report = scheduler.run_tick(now()).await;
        assert!(report.overlapped);
    }
}
