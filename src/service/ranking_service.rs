//! 成员汇总、密集排名与名次变化
//!
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::db_error::DbError;
use crate::model::leaderboard::{
    GrindTier, Highlight, MemberTotal, Movement, PlacementTier, RankedRow, SnapshotRow,
};
use crate::repository::leaderboard_repository::LeaderboardRepositoryTrait;

/// 刷新后展示的高光人数
pub const HIGHLIGHT_COUNT: usize = 3;

fn is_numeric_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
}

/// 成员 id 升序：纯数字 id 按数值在前，其余按字符串在后
///
/// 必须是全序，否则同分成员每次刷新的顺序可能不同。
pub fn compare_member_ids(a: &str, b: &str) -> Ordering {
    match (is_numeric_id(a), is_numeric_id(b)) {
        (true, true) => {
            let (x, y) = (a.trim_start_matches('0'), b.trim_start_matches('0'));
            x.len()
                .cmp(&y.len())
                .then_with(|| x.cmp(y))
                .then_with(|| a.cmp(b))
        }
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.cmp(b),
    }
}

/// 总数降序，同分按成员 id 升序；同分同名次，下一名次 +1
pub fn dense_rank(mut totals: Vec<MemberTotal>) -> Vec<(u32, MemberTotal)> {
    totals.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then_with(|| compare_member_ids(&a.member_id, &b.member_id))
    });

    let mut ranked = Vec::with_capacity(totals.len());
    let mut rank = 0u32;
    let mut last_total: Option<i64> = None;
    for row in totals {
        if last_total != Some(row.total) {
            rank += 1;
            last_total = Some(row.total);
        }
        ranked.push((rank, row));
    }
    ranked
}

pub fn movement(previous: Option<&SnapshotRow>, rank: u32) -> Movement {
    match previous {
        None => Movement::New,
        Some(prev) => match rank.cmp(&prev.rank) {
            Ordering::Less => Movement::Up,
            Ordering::Greater => Movement::Down,
            Ordering::Equal => Movement::Same,
        },
    }
}

pub fn build_rows(
    totals: Vec<MemberTotal>,
    previous: &HashMap<String, SnapshotRow>,
) -> Vec<RankedRow> {
    dense_rank(totals)
        .into_iter()
        .map(|(rank, row)| {
            let prev = previous.get(&row.member_id);
            RankedRow {
                rank,
                movement: movement(prev, rank),
                delta: prev.map(|p| row.total - p.total),
                tier: PlacementTier::for_rank(rank),
                member_id: row.member_id,
                total: row.total,
            }
        })
        .collect()
}

/// 新上榜的成员按总数计算本期新增
pub fn highlights(rows: &[RankedRow], count: usize) -> Vec<Highlight> {
    rows.iter()
        .take(count)
        .map(|row| {
            let gained = row.delta.unwrap_or(row.total);
            Highlight {
                member_id: row.member_id.clone(),
                total: row.total,
                gained,
                grind: GrindTier::for_gained(gained),
            }
        })
        .collect()
}

#[derive(Clone)]
pub struct RankingEngine {
    repo: Arc<dyn LeaderboardRepositoryTrait>,
}

impl RankingEngine {
    pub fn new(repo: Arc<dyn LeaderboardRepositoryTrait>) -> Self {
        Self { repo }
    }

    /// 只计算不写快照
    pub async fn preview(
        &self,
        guild_id: &str,
        member_ids: &[String],
        cache_key: &str,
    ) -> Result<Vec<RankedRow>, DbError> {
        let totals = self.repo.member_totals(member_ids, cache_key).await?;
        let previous = self.repo.snapshot_map(guild_id, cache_key).await?;
        Ok(build_rows(totals, &previous))
    }

    /// 计算排名并覆盖本次出现的成员的快照，其他成员的旧快照保留
    pub async fn rank(
        &self,
        guild_id: &str,
        member_ids: &[String],
        cache_key: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<RankedRow>, DbError> {
        let rows = self.preview(guild_id, member_ids, cache_key).await?;
        for row in &rows {
            let snapshot = SnapshotRow {
                member_id: row.member_id.clone(),
                rank: row.rank,
                total: row.total,
                updated_at: now.timestamp(),
            };
            self.repo.upsert_snapshot(guild_id, cache_key, &snapshot).await?;
        }
        tracing::debug!(
            "rank - guild_id:{} | cache_key:{} | rows:{}",
            guild_id,
            cache_key,
            rows.len()
        );
        Ok(rows)
    }
}
