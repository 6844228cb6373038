//! 按 guild 刷新所有绑定账号的场数
//!
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::db_error::DbError;
use crate::error::riot_error::RiotApiError;
use crate::model::account::{Account, AccountStats};
use crate::model::guild::QueuePolicy;
use crate::repository::leaderboard_repository::LeaderboardRepositoryTrait;
use crate::service::match_counter::{CountRequest, MatchCounter};
use crate::utils::window_policy::ResolvedWindow;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatsRefreshReport {
    pub total_accounts: usize,
    pub updated: usize,
    pub failed: usize,
    /// 遇到鉴权错误后剩余账号直接跳过
    pub unauthorized: bool,
}

#[derive(Clone)]
pub struct StatsRefresher {
    repo: Arc<dyn LeaderboardRepositoryTrait>,
    counter: Arc<MatchCounter>,
    concurrency: usize,
}

enum AccountOutcome {
    Updated,
    Failed,
    Skipped,
}

impl StatsRefresher {
    pub fn new(
        repo: Arc<dyn LeaderboardRepositoryTrait>,
        counter: Arc<MatchCounter>,
        concurrency: usize,
    ) -> Self {
        Self {
            repo,
            counter,
            concurrency: concurrency.max(1),
        }
    }

    /// 单个账号失败只记日志，不影响其他账号
    pub async fn refresh_guild(
        &self,
        guild_id: &str,
        member_ids: &[String],
        window: &ResolvedWindow,
        queue_policy: QueuePolicy,
        now: DateTime<Utc>,
    ) -> Result<StatsRefreshReport, DbError> {
        let accounts = self.repo.list_accounts_for_members(member_ids).await?;
        let mut report = StatsRefreshReport {
            total_accounts: accounts.len(),
            ..Default::default()
        };
        if accounts.is_empty() {
            return Ok(report);
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let unauthorized = Arc::new(AtomicBool::new(false));
        let mut tasks = JoinSet::new();

        for account in accounts {
            let semaphore = semaphore.clone();
            let unauthorized = unauthorized.clone();
            let repo = self.repo.clone();
            let counter = self.counter.clone();
            let window_key = window.cache_key.clone();
            let start_ts = window.start_ts;
            let guild_id = guild_id.to_string();

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return AccountOutcome::Failed;
                };
                if unauthorized.load(Ordering::SeqCst) {
                    return AccountOutcome::Skipped;
                }
                let request = CountRequest {
                    puuid: &account.puuid,
                    platform: account.platform.as_deref(),
                    start_ts,
                    end_ts: None,
                    now_ts: now.timestamp(),
                    queue_policy,
                };
                match counter.count(&request).await {
                    Ok(games) => {
                        let stats = AccountStats {
                            account_id: account.id,
                            window_key,
                            games_played: games,
                            updated_at: now.timestamp(),
                        };
                        match repo.upsert_account_stats(&stats).await {
                            Ok(()) => AccountOutcome::Updated,
                            Err(err) => {
                                tracing::error!(
                                    "refresh_guild - upsert stats failed, guild_id:{} | account_id:{} | error:{}",
                                    guild_id,
                                    account.id,
                                    err
                                );
                                AccountOutcome::Failed
                            }
                        }
                    }
                    Err(err) => {
                        if matches!(err, RiotApiError::Unauthorized { .. }) {
                            unauthorized.store(true, Ordering::SeqCst);
                        }
                        log_count_failure(&guild_id, &account, &err);
                        AccountOutcome::Failed
                    }
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(AccountOutcome::Updated) => report.updated += 1,
                Ok(AccountOutcome::Failed) | Ok(AccountOutcome::Skipped) => report.failed += 1,
                Err(err) => {
                    tracing::error!("refresh_guild - task panicked, guild_id:{} | error:{}", guild_id, err);
                    report.failed += 1;
                }
            }
        }
        report.unauthorized = unauthorized.load(Ordering::SeqCst);

        tracing::info!(
            "refresh_guild - guild_id:{} | window_key:{} | accounts:{} | updated:{} | failed:{}",
            guild_id,
            window.cache_key,
            report.total_accounts,
            report.updated,
            report.failed
        );
        Ok(report)
    }
}

fn log_count_failure(guild_id: &str, account: &Account, err: &RiotApiError) {
    let label = account.riot_id.as_deref().unwrap_or(&account.puuid);
    match err {
        RiotApiError::NotFound => tracing::warn!(
            "refresh_guild - account not found, guild_id:{} | account:{}",
            guild_id,
            label
        ),
        _ => tracing::error!(
            "refresh_guild - count failed, guild_id:{} | account:{} | error:{}",
            guild_id,
            label,
            err
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::match_api::MockMatchApi;
    use crate::client::retry::{test_support::RecordingSleeper, RetryPolicy};
    use crate::model::account::NewAccount;
    use crate::model::guild::WindowMode;
    use crate::repository::memory_repository::MemoryRepository;
    use chrono::TimeZone;

    fn window() -> ResolvedWindow {
        ResolvedWindow {
            mode: WindowMode::Month,
            tz_name: "UTC".to_string(),
            start_ts: 1_790_000_000 - 86_400,
            cache_key: "month:UTC:1789913600".to_string(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_790_000_000, 0).unwrap()
    }

    async fn repo_with_accounts() -> Arc<MemoryRepository> {
        let repo = Arc::new(MemoryRepository::new());
        for (member, puuid) in [("m1", "p-1"), ("m2", "p-2"), ("m3", "p-3")] {
            repo.add_account(&NewAccount {
                member_id: member.to_string(),
                puuid: puuid.to_string(),
                riot_id: None,
                platform: Some("EUW1".to_string()),
            })
            .await
            .unwrap();
        }
        repo
    }

    fn refresher(repo: Arc<MemoryRepository>, api: MockMatchApi) -> StatsRefresher {
        let counter = MatchCounter::new(
            Arc::new(api),
            RetryPolicy::default(),
            Arc::new(RecordingSleeper::default()),
            30,
        );
        StatsRefresher::new(repo, Arc::new(counter), 2)
    }

    fn members() -> Vec<String> {
        vec!["m1".to_string(), "m2".to_string(), "m3".to_string()]
    }

    #[tokio::test]
    async fn one_failing_account_does_not_stop_others() {
        let repo = repo_with_accounts().await;
        let mut api = MockMatchApi::new();
        api.expect_fetch_page().returning(|q| {
            if q.puuid == "p-2" {
                Err(RiotApiError::NotFound)
            } else {
                Ok(5)
            }
        });

        let report = refresher(repo.clone(), api)
            .refresh_guild("g1", &members(), &window(), QueuePolicy::All, now())
            .await
            .unwrap();

        assert_eq!(report.total_accounts, 3);
        assert_eq!(report.updated, 2);
        assert_eq!(report.failed, 1);
        assert!(!report.unauthorized);

        let key = window().cache_key;
        assert_eq!(repo.stats_for(1, &key).await.unwrap().games_played, 5);
        assert!(repo.stats_for(2, &key).await.is_none());
        assert_eq!(repo.stats_for(3, &key).await.unwrap().games_played, 5);
    }

    #[tokio::test]
    async fn zero_matches_still_writes_a_row() {
        let repo = repo_with_accounts().await;
        let mut api = MockMatchApi::new();
        api.expect_fetch_page().returning(|_| Ok(0));

        let report = refresher(repo.clone(), api)
            .refresh_guild("g1", &members(), &window(), QueuePolicy::All, now())
            .await
            .unwrap();

        assert_eq!(report.updated, 3);
        let row = repo.stats_for(1, &window().cache_key).await.unwrap();
        assert_eq!(row.games_played, 0);
        assert_eq!(row.updated_at, 1_790_000_000);
    }

    #[tokio::test]
    async fn rerun_overwrites_same_window_key() {
        let repo = repo_with_accounts().await;
        let mut first = MockMatchApi::new();
        first.expect_fetch_page().returning(|_| Ok(3));
        refresher(repo.clone(), first)
            .refresh_guild("g1", &members(), &window(), QueuePolicy::All, now())
            .await
            .unwrap();

        let mut second = MockMatchApi::new();
        second.expect_fetch_page().returning(|_| Ok(8));
        refresher(repo.clone(), second)
            .refresh_guild("g1", &members(), &window(), QueuePolicy::All, now())
            .await
            .unwrap();

        assert_eq!(repo.stats_for(1, &window().cache_key).await.unwrap().games_played, 8);
    }

    #[tokio::test]
    async fn unauthorized_marks_report() {
        let repo = repo_with_accounts().await;
        let mut api = MockMatchApi::new();
        api.expect_fetch_page()
            .returning(|_| Err(RiotApiError::Unauthorized { status: 401 }));

        let report = refresher(repo, api)
            .refresh_guild("g1", &members(), &window(), QueuePolicy::All, now())
            .await
            .unwrap();

        assert!(report.unauthorized);
        assert_eq!(report.updated, 0);
        assert_eq!(report.failed, 3);
    }

    /// 记录同时进行中的请求数
    #[derive(Default)]
    struct InFlightApi {
        current: std::sync::atomic::AtomicUsize,
        peak: std::sync::atomic::AtomicUsize,
    }

    #[async_trait::async_trait]
    impl crate::client::match_api::MatchApi for InFlightApi {
        async fn fetch_page(
            &self,
            _query: &crate::client::match_api::MatchPageQuery,
        ) -> Result<usize, RiotApiError> {
            let now_running = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now_running, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok(1)
        }
    }

    #[tokio::test]
    async fn concurrent_calls_stay_within_limit() {
        let repo = Arc::new(MemoryRepository::new());
        let mut member_ids = Vec::new();
        for idx in 0..6 {
            let member = format!("m{idx}");
            repo.add_account(&NewAccount {
                member_id: member.clone(),
                puuid: format!("p-{idx}"),
                riot_id: None,
                platform: Some("EUW1".to_string()),
            })
            .await
            .unwrap();
            member_ids.push(member);
        }

        let api = Arc::new(InFlightApi::default());
        let counter = MatchCounter::new(
            api.clone(),
            RetryPolicy::default(),
            Arc::new(RecordingSleeper::default()),
            30,
        );
        let report = StatsRefresher::new(repo, Arc::new(counter), 2)
            .refresh_guild("g1", &member_ids, &window(), QueuePolicy::All, now())
            .await
            .unwrap();

        assert_eq!(report.updated, 6);
        assert_eq!(api.current.load(Ordering::SeqCst), 0);
        assert_eq!(api.peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn no_accounts_is_a_noop() {
        let repo = Arc::new(MemoryRepository::new());
        let api = MockMatchApi::new();
        let report = refresher(repo, api)
            .refresh_guild("g1", &members(), &window(), QueuePolicy::All, now())
            .await
            .unwrap();
        assert_eq!(report, StatsRefreshReport::default());
    }
}
