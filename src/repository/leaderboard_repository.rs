use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySql, QueryBuilder};

use crate::db::database::{Database, DatabaseTrait};
use crate::error::db_error::DbError;
use crate::model::account::{Account, AccountStats, NewAccount};
use crate::model::guild::{GuildSettings, GuildSettingsRow};
use crate::model::leaderboard::{MemberTotal, SnapshotRow};

const GUILD_COLUMNS: &str = "guild_id, board_channel_id, board_message_id, refresh_weekday, \
     refresh_hour, refresh_minute, refresh_tz, window_mode, window_tz, window_since_ts, \
     queue_policy, next_refresh_ts, last_refresh_ts";

const ACCOUNT_COLUMNS: &str = "id, member_id, puuid, riot_id, platform, added_at";

// 单条语句的占位符上限是 65535，成员列表分批查询
const MEMBER_CHUNK_SIZE: usize = 1000;

/// 去重后按批切分，同一成员只会出现在一批里
fn member_chunks(member_ids: &[String]) -> Vec<Vec<&str>> {
    let unique: BTreeSet<&str> = member_ids.iter().map(String::as_str).collect();
    let unique: Vec<&str> = unique.into_iter().collect();
    unique
        .chunks(MEMBER_CHUNK_SIZE)
        .map(|chunk| chunk.to_vec())
        .collect()
}

/// 刷新引擎需要的存储操作
#[async_trait]
pub trait LeaderboardRepositoryTrait: Send + Sync {
    async fn get_guild_settings(&self, guild_id: &str) -> Result<Option<GuildSettings>, DbError>;

    /// 第一次管理操作时创建默认配置
    async fn ensure_guild_settings(&self, guild_id: &str) -> Result<GuildSettings, DbError>;

    /// 管理操作写回整行
    async fn update_guild_settings(&self, settings: &GuildSettings) -> Result<(), DbError>;

    /// 调度器只改这两个字段
    async fn set_next_refresh(&self, guild_id: &str, next_ts: Option<i64>) -> Result<(), DbError>;

    async fn set_last_refresh(&self, guild_id: &str, last_ts: i64) -> Result<(), DbError>;

    /// next_refresh_ts <= now 的 guild
    async fn list_guilds_due(&self, now_ts: i64) -> Result<Vec<GuildSettings>, DbError>;

    /// puuid 已存在时返回 false
    async fn add_account(&self, account: &NewAccount) -> Result<bool, DbError>;

    async fn list_accounts_for_member(&self, member_id: &str) -> Result<Vec<Account>, DbError>;

    async fn list_accounts_for_members(
        &self,
        member_ids: &[String],
    ) -> Result<Vec<Account>, DbError>;

    async fn remove_account(&self, member_id: &str, account_id: i64) -> Result<bool, DbError>;

    async fn upsert_account_stats(&self, stats: &AccountStats) -> Result<(), DbError>;

    /// 按成员汇总窗口内的场数，没有统计行的成员不返回
    async fn member_totals(
        &self,
        member_ids: &[String],
        window_key: &str,
    ) -> Result<Vec<MemberTotal>, DbError>;

    async fn snapshot_map(
        &self,
        guild_id: &str,
        window_key: &str,
    ) -> Result<HashMap<String, SnapshotRow>, DbError>;

    async fn upsert_snapshot(
        &self,
        guild_id: &str,
        window_key: &str,
        row: &SnapshotRow,
    ) -> Result<(), DbError>;
}

#[derive(Clone)]
pub struct LeaderboardRepository {
    /// 主从分离
    pub(crate) db_conn: Arc<Database>,
}

impl LeaderboardRepository {
    pub fn new(db_conn: &Arc<Database>) -> Self {
        Self {
            db_conn: Arc::clone(db_conn),
        }
    }
}

#[async_trait]
impl LeaderboardRepositoryTrait for LeaderboardRepository {
    async fn get_guild_settings(&self, guild_id: &str) -> Result<Option<GuildSettings>, DbError> {
        let sql = format!("SELECT {GUILD_COLUMNS} FROM guild_settings WHERE guild_id = ?");
        let row = sqlx::query_as::<_, GuildSettingsRow>(&sql)
            .bind(guild_id)
            .fetch_optional(self.db_conn.get_master_pool())
            .await?;
        Ok(row.map(GuildSettings::from))
    }

    async fn ensure_guild_settings(&self, guild_id: &str) -> Result<GuildSettings, DbError> {
        let defaults = GuildSettings::new(guild_id);
        sqlx::query(
            "INSERT IGNORE INTO guild_settings (guild_id, window_mode, window_tz, queue_policy) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(&defaults.guild_id)
        .bind(&defaults.window_mode)
        .bind(&defaults.window_tz)
        .bind(&defaults.queue_policy)
        .execute(self.db_conn.get_master_pool())
        .await?;

        self.get_guild_settings(guild_id)
            .await?
            .ok_or_else(|| DbError::SomethingWentWrong(format!("guild {guild_id} not created")))
    }

    async fn update_guild_settings(&self, settings: &GuildSettings) -> Result<(), DbError> {
        let board = settings.board.as_ref();
        let schedule = settings.schedule.as_ref();
        let sql_ret = sqlx::query(
            "UPDATE guild_settings SET board_channel_id = ?, board_message_id = ?, \
             refresh_weekday = ?, refresh_hour = ?, refresh_minute = ?, refresh_tz = ?, \
             window_mode = ?, window_tz = ?, window_since_ts = ?, queue_policy = ?, \
             next_refresh_ts = ?, last_refresh_ts = ? WHERE guild_id = ?",
        )
        .bind(board.map(|b| b.channel_id.as_str()))
        .bind(board.map(|b| b.message_id.as_str()))
        .bind(schedule.map(|s| s.weekday))
        .bind(schedule.map(|s| s.hour))
        .bind(schedule.map(|s| s.minute))
        .bind(schedule.map(|s| s.tz_name.as_str()))
        .bind(&settings.window_mode)
        .bind(&settings.window_tz)
        .bind(settings.window_since_ts)
        .bind(&settings.queue_policy)
        .bind(settings.next_refresh_ts)
        .bind(settings.last_refresh_ts)
        .bind(&settings.guild_id)
        .execute(self.db_conn.get_master_pool())
        .await?;
        tracing::debug!(
            "update_guild_settings - guild_id:{} | rows_affected:{}",
            settings.guild_id,
            sql_ret.rows_affected()
        );
        Ok(())
    }

    async fn set_next_refresh(&self, guild_id: &str, next_ts: Option<i64>) -> Result<(), DbError> {
        sqlx::query("UPDATE guild_settings SET next_refresh_ts = ? WHERE guild_id = ?")
            .bind(next_ts)
            .bind(guild_id)
            .execute(self.db_conn.get_master_pool())
            .await?;
        Ok(())
    }

    async fn set_last_refresh(&self, guild_id: &str, last_ts: i64) -> Result<(), DbError> {
        sqlx::query("UPDATE guild_settings SET last_refresh_ts = ? WHERE guild_id = ?")
            .bind(last_ts)
            .bind(guild_id)
            .execute(self.db_conn.get_master_pool())
            .await?;
        Ok(())
    }

    async fn list_guilds_due(&self, now_ts: i64) -> Result<Vec<GuildSettings>, DbError> {
        // 调度读主库，避免从库延迟导致重复刷新
        let sql = format!(
            "SELECT {GUILD_COLUMNS} FROM guild_settings \
             WHERE next_refresh_ts IS NOT NULL AND next_refresh_ts <= ? \
             ORDER BY next_refresh_ts"
        );
        let rows = sqlx::query_as::<_, GuildSettingsRow>(&sql)
            .bind(now_ts)
            .fetch_all(self.db_conn.get_master_pool())
            .await?;
        Ok(rows.into_iter().map(GuildSettings::from).collect())
    }

    async fn add_account(&self, account: &NewAccount) -> Result<bool, DbError> {
        let res = sqlx::query(
            "INSERT INTO riot_accounts (member_id, puuid, riot_id, platform, added_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&account.member_id)
        .bind(&account.puuid)
        .bind(&account.riot_id)
        .bind(account.platform.as_ref().map(|p| p.trim().to_uppercase()))
        .bind(Utc::now().timestamp())
        .execute(self.db_conn.get_master_pool())
        .await;

        match res.map_err(DbError::from) {
            Ok(_) => Ok(true),
            Err(DbError::UniqueConstraintViolation(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn list_accounts_for_member(&self, member_id: &str) -> Result<Vec<Account>, DbError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM riot_accounts WHERE member_id = ? ORDER BY id");
        let accounts = sqlx::query_as::<_, Account>(&sql)
            .bind(member_id)
            .fetch_all(self.db_conn.get_slave_pool())
            .await?;
        Ok(accounts)
    }

    async fn list_accounts_for_members(
        &self,
        member_ids: &[String],
    ) -> Result<Vec<Account>, DbError> {
        let mut accounts = Vec::new();
        for chunk in member_chunks(member_ids) {
            let mut builder: QueryBuilder<MySql> = QueryBuilder::new(format!(
                "SELECT {ACCOUNT_COLUMNS} FROM riot_accounts WHERE member_id IN ("
            ));
            let mut separated = builder.separated(", ");
            for member_id in chunk {
                separated.push_bind(member_id);
            }
            separated.push_unseparated(")");

            let rows = builder
                .build_query_as::<Account>()
                .fetch_all(self.db_conn.get_slave_pool())
                .await?;
            accounts.extend(rows);
        }
        accounts.sort_by_key(|account| account.id);
        Ok(accounts)
    }

    async fn remove_account(&self, member_id: &str, account_id: i64) -> Result<bool, DbError> {
        let sql_ret = sqlx::query("DELETE FROM riot_accounts WHERE member_id = ? AND id = ?")
            .bind(member_id)
            .bind(account_id)
            .execute(self.db_conn.get_master_pool())
            .await?;
        Ok(sql_ret.rows_affected() > 0)
    }

    async fn upsert_account_stats(&self, stats: &AccountStats) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO account_stats (account_id, window_key, games_played, updated_at) \
             VALUES (?, ?, ?, ?) \
             ON DUPLICATE KEY UPDATE games_played = VALUES(games_played), updated_at = VALUES(updated_at)",
        )
        .bind(stats.account_id)
        .bind(&stats.window_key)
        .bind(stats.games_played)
        .bind(stats.updated_at)
        .execute(self.db_conn.get_master_pool())
        .await?;
        Ok(())
    }

    async fn member_totals(
        &self,
        member_ids: &[String],
        window_key: &str,
    ) -> Result<Vec<MemberTotal>, DbError> {
        let mut totals = Vec::new();
        for chunk in member_chunks(member_ids) {
            let mut builder: QueryBuilder<MySql> = QueryBuilder::new(
                "SELECT a.member_id AS member_id, CAST(SUM(s.games_played) AS SIGNED) AS total \
                 FROM account_stats s JOIN riot_accounts a ON a.id = s.account_id \
                 WHERE s.window_key = ",
            );
            builder.push_bind(window_key);
            builder.push(" AND a.member_id IN (");
            let mut separated = builder.separated(", ");
            for member_id in chunk {
                separated.push_bind(member_id);
            }
            separated.push_unseparated(") GROUP BY a.member_id ORDER BY a.member_id");

            let rows = builder
                .build_query_as::<MemberTotal>()
                .fetch_all(self.db_conn.get_master_pool())
                .await?;
            totals.extend(rows);
        }
        // 各批内部已排序，合并后再整体排一次
        totals.sort_by(|a, b| a.member_id.cmp(&b.member_id));
        Ok(totals)
    }

    async fn snapshot_map(
        &self,
        guild_id: &str,
        window_key: &str,
    ) -> Result<HashMap<String, SnapshotRow>, DbError> {
        let rows = sqlx::query_as::<_, SnapshotRow>(
            "SELECT member_id, rank_pos, games_played, updated_at FROM leaderboard_snapshots \
             WHERE guild_id = ? AND window_key = ?",
        )
        .bind(guild_id)
        .bind(window_key)
        .fetch_all(self.db_conn.get_master_pool())
        .await?;
        Ok(rows
            .into_iter()
            .map(|row| (row.member_id.clone(), row))
            .collect())
    }

    async fn upsert_snapshot(
        &self,
        guild_id: &str,
        window_key: &str,
        row: &SnapshotRow,
    ) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO leaderboard_snapshots \
             (guild_id, window_key, member_id, rank_pos, games_played, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?) \
             ON DUPLICATE KEY UPDATE rank_pos = VALUES(rank_pos), \
             games_played = VALUES(games_played), updated_at = VALUES(updated_at)",
        )
        .bind(guild_id)
        .bind(window_key)
        .bind(&row.member_id)
        .bind(row.rank)
        .bind(row.total)
        .bind(row.updated_at)
        .execute(self.db_conn.get_master_pool())
        .await?;
        Ok(())
    }
}
