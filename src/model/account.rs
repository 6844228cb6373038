//! 绑定的游戏账号
//!
use serde::{Deserialize, Serialize};

/// 一个游戏账号只属于一个成员，puuid 全局唯一
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: i64,
    pub member_id: String,
    pub puuid: String,
    pub riot_id: Option<String>,
    pub platform: Option<String>,
    pub added_at: i64,
}

/// 待写入的账号，身份解析由外部绑定流程完成
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewAccount {
    pub member_id: String,
    pub puuid: String,
    pub riot_id: Option<String>,
    pub platform: Option<String>,
}

/// (账号, 窗口key) -> 比赛场数
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AccountStats {
    pub account_id: i64,
    pub window_key: String,
    pub games_played: i64,
    pub updated_at: i64,
}
