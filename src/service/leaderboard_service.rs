//! 排行榜只读查询，实时计算，不写快照
//!
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::api_error::ApiError;
use crate::error::refresh_error::RefreshError;
use crate::model::guild::QueuePolicy;
use crate::model::leaderboard::RankedRow;
use crate::repository::leaderboard_repository::LeaderboardRepositoryTrait;
use crate::repository::redis_board::GuildDirectory;
use crate::service::ranking_service::RankingEngine;
use crate::utils::window_policy::{resolve_window, ResolvedWindow};

pub const MIN_TOP_LIMIT: usize = 1;
pub const MAX_TOP_LIMIT: usize = 50;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BoardView {
    pub window: ResolvedWindow,
    pub queue_policy: QueuePolicy,
    pub rows: Vec<RankedRow>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MyRankView {
    pub window: ResolvedWindow,
    pub queue_policy: QueuePolicy,
    /// 没有上榜时为空
    pub me: Option<RankedRow>,
    pub leader: Option<RankedRow>,
}

#[derive(Clone)]
pub struct LeaderboardService {
    repo: Arc<dyn LeaderboardRepositoryTrait>,
    directory: Arc<dyn GuildDirectory>,
    ranking: RankingEngine,
}

impl LeaderboardService {
    pub fn new(
        repo: Arc<dyn LeaderboardRepositoryTrait>,
        directory: Arc<dyn GuildDirectory>,
    ) -> Self {
        Self {
            ranking: RankingEngine::new(repo.clone()),
            repo,
            directory,
        }
    }

    async fn current_rows(
        &self,
        guild_id: &str,
        now: DateTime<Utc>,
    ) -> Result<BoardView, RefreshError> {
        let settings = self.repo.ensure_guild_settings(guild_id).await?;
        let window = resolve_window(now, &settings.window_policy()?)?;
        let queue_policy = settings.queue_policy()?;
        let member_ids = self
            .directory
            .member_ids(guild_id)
            .await?
            .ok_or_else(|| RefreshError::GuildUnavailable(guild_id.to_string()))?;

        let rows = self
            .ranking
            .preview(guild_id, &member_ids, &window.cache_key)
            .await?;
        Ok(BoardView {
            window,
            queue_policy,
            rows,
        })
    }

    pub async fn top(&self, guild_id: &str, n: usize, now: DateTime<Utc>) -> Result<BoardView, ApiError> {
        let mut view = self.current_rows(guild_id, now).await?;
        view.rows
            .truncate(n.clamp(MIN_TOP_LIMIT, MAX_TOP_LIMIT));
        Ok(view)
    }

    pub async fn my_rank(
        &self,
        guild_id: &str,
        member_id: &str,
        now: DateTime<Utc>,
    ) -> Result<MyRankView, ApiError> {
        let view = self.current_rows(guild_id, now).await?;
        let me = view.rows.iter().find(|r| r.member_id == member_id).cloned();
        let leader = view.rows.first().cloned();
        Ok(MyRankView {
            window: view.window,
            queue_policy: view.queue_policy,
            me,
            leader,
        })
    }
}
