//! guild 配置相关模型
//!
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::parameter::{DEFAULT_QUEUE_POLICY, DEFAULT_TZ, DEFAULT_WINDOW_MODE};
use crate::error::config_error::ConfigError;

/// 排位队列
pub const RANKED_QUEUES: [u16; 2] = [420, 440];
/// 匹配 / 大乱斗队列
pub const NORMAL_QUEUES: [u16; 3] = [400, 430, 450];

/// 每周刷新时间，weekday 0 = 周一
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshSchedule {
    pub weekday: u8,
    pub hour: u8,
    pub minute: u8,
    pub tz_name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowMode {
    Week,
    Month,
    Year,
    SinceDate,
}

impl WindowMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowMode::Week => "week",
            WindowMode::Month => "month",
            WindowMode::Year => "year",
            WindowMode::SinceDate => "since_date",
        }
    }
}

impl FromStr for WindowMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "week" => Ok(WindowMode::Week),
            "month" => Ok(WindowMode::Month),
            "year" => Ok(WindowMode::Year),
            "since_date" => Ok(WindowMode::SinceDate),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for WindowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 哪些队列的比赛计入总数
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueuePolicy {
    All,
    RankedOnly,
    RankedNormal,
}

impl QueuePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueuePolicy::All => "all",
            QueuePolicy::RankedOnly => "ranked_only",
            QueuePolicy::RankedNormal => "ranked_normal",
        }
    }

    /// None 表示不过滤队列，一次查询即可
    pub fn queue_codes(&self) -> Vec<Option<u16>> {
        match self {
            QueuePolicy::All => vec![None],
            QueuePolicy::RankedOnly => RANKED_QUEUES.iter().copied().map(Some).collect(),
            QueuePolicy::RankedNormal => RANKED_QUEUES
                .iter()
                .chain(NORMAL_QUEUES.iter())
                .copied()
                .map(Some)
                .collect(),
        }
    }
}

impl FromStr for QueuePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(QueuePolicy::All),
            "ranked_only" => Ok(QueuePolicy::RankedOnly),
            "ranked_normal" => Ok(QueuePolicy::RankedNormal),
            _ => Err(ConfigError::UnknownQueuePolicy(s.to_string())),
        }
    }
}

impl fmt::Display for QueuePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 解析后的窗口配置
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowPolicy {
    pub mode: WindowMode,
    pub tz_name: String,
    pub since_ts: Option<i64>,
}

/// 排行榜消息所在位置
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardLocation {
    pub channel_id: String,
    pub message_id: String,
}

/// 每个 guild 一行，第一次管理操作时创建
///
/// 窗口模式和队列策略保留原始字符串，刷新时再解析，
/// 一行坏数据只影响自己的 guild。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildSettings {
    pub guild_id: String,
    pub board: Option<BoardLocation>,
    pub schedule: Option<RefreshSchedule>,
    pub window_mode: String,
    pub window_tz: String,
    pub window_since_ts: Option<i64>,
    pub queue_policy: String,
    pub next_refresh_ts: Option<i64>,
    pub last_refresh_ts: Option<i64>,
}

impl GuildSettings {
    pub fn new(guild_id: &str) -> Self {
        Self {
            guild_id: guild_id.to_string(),
            board: None,
            schedule: None,
            window_mode: DEFAULT_WINDOW_MODE.to_string(),
            window_tz: DEFAULT_TZ.to_string(),
            window_since_ts: None,
            queue_policy: DEFAULT_QUEUE_POLICY.to_string(),
            next_refresh_ts: None,
            last_refresh_ts: None,
        }
    }

    pub fn window_policy(&self) -> Result<WindowPolicy, ConfigError> {
        let tz_name = if self.window_tz.trim().is_empty() {
            DEFAULT_TZ.to_string()
        } else {
            self.window_tz.trim().to_string()
        };
        Ok(WindowPolicy {
            mode: self.window_mode.parse()?,
            tz_name,
            since_ts: self.window_since_ts,
        })
    }

    pub fn queue_policy(&self) -> Result<QueuePolicy, ConfigError> {
        self.queue_policy.parse()
    }
}

/// guild_settings 表的一行
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct GuildSettingsRow {
    pub guild_id: String,
    pub board_channel_id: Option<String>,
    pub board_message_id: Option<String>,
    pub refresh_weekday: Option<u8>,
    pub refresh_hour: Option<u8>,
    pub refresh_minute: Option<u8>,
    pub refresh_tz: Option<String>,
    pub window_mode: String,
    pub window_tz: String,
    pub window_since_ts: Option<i64>,
    pub queue_policy: String,
    pub next_refresh_ts: Option<i64>,
    pub last_refresh_ts: Option<i64>,
}

impl From<GuildSettingsRow> for GuildSettings {
    fn from(row: GuildSettingsRow) -> Self {
        let board = match (row.board_channel_id, row.board_message_id) {
            (Some(channel_id), Some(message_id)) => Some(BoardLocation {
                channel_id,
                message_id,
            }),
            _ => None,
        };
        let schedule = match (
            row.refresh_weekday,
            row.refresh_hour,
            row.refresh_minute,
            row.refresh_tz,
        ) {
            (Some(weekday), Some(hour), Some(minute), Some(tz_name)) => Some(RefreshSchedule {
                weekday,
                hour,
                minute,
                tz_name,
            }),
            _ => None,
        };
        Self {
            guild_id: row.guild_id,
            board,
            schedule,
            window_mode: row.window_mode,
            window_tz: row.window_tz,
            window_since_ts: row.window_since_ts,
            queue_policy: row.queue_policy,
            next_refresh_ts: row.next_refresh_ts,
            last_refresh_ts: row.last_refresh_ts,
        }
    }
}
