//! 排行榜结果与快照
//!
use serde::{Deserialize, Serialize};

use crate::model::guild::{BoardLocation, QueuePolicy, WindowMode};

/// 成员在某个窗口内所有账号的场数之和
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MemberTotal {
    pub member_id: String,
    pub total: i64,
}

/// 上一次渲染时的排名
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SnapshotRow {
    pub member_id: String,
    #[sqlx(rename = "rank_pos")]
    pub rank: u32,
    #[sqlx(rename = "games_played")]
    pub total: i64,
    pub updated_at: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Movement {
    New,
    Up,
    Down,
    Same,
}

/// 按名次分档，渲染层据此挑图标
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementTier {
    Champion,
    Podium,
    TopTen,
    Field,
}

impl PlacementTier {
    pub fn for_rank(rank: u32) -> Self {
        match rank {
            1 => PlacementTier::Champion,
            2..=3 => PlacementTier::Podium,
            4..=10 => PlacementTier::TopTen,
            _ => PlacementTier::Field,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedRow {
    pub rank: u32,
    pub member_id: String,
    pub total: i64,
    pub movement: Movement,
    /// 没有上一次快照时为空
    pub delta: Option<i64>,
    pub tier: PlacementTier,
}

/// 本期新增场数的分档
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrindTier {
    Relentless,
    TouchGrass,
    SolidGrind,
    Steady,
    Chill,
}

impl GrindTier {
    pub fn for_gained(gained: i64) -> Self {
        match gained {
            g if g >= 40 => GrindTier::Relentless,
            g if g >= 20 => GrindTier::TouchGrass,
            g if g >= 10 => GrindTier::SolidGrind,
            g if g > 0 => GrindTier::Steady,
            _ => GrindTier::Chill,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    pub member_id: String,
    pub total: i64,
    pub gained: i64,
    pub grind: GrindTier,
}

/// 交给渲染方的完整排行榜
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedBoard {
    pub guild_id: String,
    pub board: BoardLocation,
    pub window_mode: WindowMode,
    pub window_tz: String,
    pub window_start_ts: i64,
    pub cache_key: String,
    pub queue_policy: QueuePolicy,
    pub rows: Vec<RankedRow>,
    pub highlights: Vec<Highlight>,
    pub published_at: i64,
}
