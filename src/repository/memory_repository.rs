//! 内存存储实现
//!
//! 主要用于测试，行为与 MySQL 实现保持一致。
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::leaderboard_repository::LeaderboardRepositoryTrait;
use crate::error::db_error::DbError;
use crate::model::account::{Account, AccountStats, NewAccount};
use crate::model::guild::GuildSettings;
use crate::model::leaderboard::{MemberTotal, SnapshotRow};

#[derive(Debug, Default)]
pub struct MemoryRepository {
    guilds: RwLock<HashMap<String, GuildSettings>>,
    accounts: RwLock<HashMap<i64, Account>>,
    // (account_id, window_key)
    stats: RwLock<HashMap<(i64, String), AccountStats>>,
    // (guild_id, window_key) -> member_id -> row
    snapshots: RwLock<HashMap<(String, String), HashMap<String, SnapshotRow>>>,
    next_account_id: AtomicI64,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接写入一行配置
    pub async fn put_guild(&self, settings: GuildSettings) {
        self.guilds
            .write()
            .await
            .insert(settings.guild_id.clone(), settings);
    }

    pub async fn stats_for(&self, account_id: i64, window_key: &str) -> Option<AccountStats> {
        self.stats
            .read()
            .await
            .get(&(account_id, window_key.to_string()))
            .cloned()
    }
}

#[async_trait]
impl LeaderboardRepositoryTrait for MemoryRepository {
    async fn get_guild_settings(&self, guild_id: &str) -> Result<Option<GuildSettings>, DbError> {
        Ok(self.guilds.read().await.get(guild_id).cloned())
    }

    async fn ensure_guild_settings(&self, guild_id: &str) -> Result<GuildSettings, DbError> {
        let mut guilds = self.guilds.write().await;
        let settings = guilds
            .entry(guild_id.to_string())
            .or_insert_with(|| GuildSettings::new(guild_id));
        Ok(settings.clone())
    }

    async fn update_guild_settings(&self, settings: &GuildSettings) -> Result<(), DbError> {
        let mut guilds = self.guilds.write().await;
        if let Some(existing) = guilds.get_mut(&settings.guild_id) {
            *existing = settings.clone();
        }
        Ok(())
    }

    async fn set_next_refresh(&self, guild_id: &str, next_ts: Option<i64>) -> Result<(), DbError> {
        if let Some(settings) = self.guilds.write().await.get_mut(guild_id) {
            settings.next_refresh_ts = next_ts;
        }
        Ok(())
    }

    async fn set_last_refresh(&self, guild_id: &str, last_ts: i64) -> Result<(), DbError> {
        if let Some(settings) = self.guilds.write().await.get_mut(guild_id) {
            settings.last_refresh_ts = Some(last_ts);
        }
        Ok(())
    }

    async fn list_guilds_due(&self, now_ts: i64) -> Result<Vec<GuildSettings>, DbError> {
        let mut due: Vec<GuildSettings> = self
            .guilds
            .read()
            .await
            .values()
            .filter(|g| matches!(g.next_refresh_ts, Some(ts) if ts <= now_ts))
            .cloned()
            .collect();
        due.sort_by(|a, b| {
            a.next_refresh_ts
                .cmp(&b.next_refresh_ts)
                .then_with(|| a.guild_id.cmp(&b.guild_id))
        });
        Ok(due)
    }

    async fn add_account(&self, account: &NewAccount) -> Result<bool, DbError> {
        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|a| a.puuid == account.puuid) {
            return Ok(false);
        }
        let id = self.next_account_id.fetch_add(1, Ordering::SeqCst) + 1;
        accounts.insert(
            id,
            Account {
                id,
                member_id: account.member_id.clone(),
                puuid: account.puuid.clone(),
                riot_id: account.riot_id.clone(),
                platform: account.platform.as_ref().map(|p| p.trim().to_uppercase()),
                added_at: Utc::now().timestamp(),
            },
        );
        Ok(true)
    }

    async fn list_accounts_for_member(&self, member_id: &str) -> Result<Vec<Account>, DbError> {
        let mut accounts: Vec<Account> = self
            .accounts
            .read()
            .await
            .values()
            .filter(|a| a.member_id == member_id)
            .cloned()
            .collect();
        accounts.sort_by_key(|a| a.id);
        Ok(accounts)
    }

    async fn list_accounts_for_members(
        &self,
        member_ids: &[String],
    ) -> Result<Vec<Account>, DbError> {
        let mut accounts: Vec<Account> = self
            .accounts
            .read()
            .await
            .values()
            .filter(|a| member_ids.contains(&a.member_id))
            .cloned()
            .collect();
        accounts.sort_by_key(|a| a.id);
        Ok(accounts)
    }

    async fn remove_account(&self, member_id: &str, account_id: i64) -> Result<bool, DbError> {
        let mut accounts = self.accounts.write().await;
        let owned = matches!(accounts.get(&account_id), Some(a) if a.member_id == member_id);
        if !owned {
            return Ok(false);
        }
        accounts.remove(&account_id);
        // 与外键级联删除一致
        self.stats
            .write()
            .await
            .retain(|(id, _), _| *id != account_id);
        Ok(true)
    }

    async fn upsert_account_stats(&self, stats: &AccountStats) -> Result<(), DbError> {
        self.stats
            .write()
            .await
            .insert((stats.account_id, stats.window_key.clone()), stats.clone());
        Ok(())
    }

    async fn member_totals(
        &self,
        member_ids: &[String],
        window_key: &str,
    ) -> Result<Vec<MemberTotal>, DbError> {
        let accounts = self.accounts.read().await;
        let stats = self.stats.read().await;

        // 按成员 id 输出，与 MySQL 实现的 ORDER BY 一致
        let mut totals: BTreeMap<String, i64> = BTreeMap::new();
        for ((account_id, key), row) in stats.iter() {
            if key != window_key {
                continue;
            }
            let Some(account) = accounts.get(account_id) else {
                continue;
            };
            if member_ids.contains(&account.member_id) {
                *totals.entry(account.member_id.clone()).or_insert(0) += row.games_played;
            }
        }
        Ok(totals
            .into_iter()
            .map(|(member_id, total)| MemberTotal { member_id, total })
            .collect())
    }

    async fn snapshot_map(
        &self,
        guild_id: &str,
        window_key: &str,
    ) -> Result<HashMap<String, SnapshotRow>, DbError> {
        Ok(self
            .snapshots
            .read()
            .await
            .get(&(guild_id.to_string(), window_key.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn upsert_snapshot(
        &self,
        guild_id: &str,
        window_key: &str,
        row: &SnapshotRow,
    ) -> Result<(), DbError> {
        self.snapshots
            .write()
            .await
            .entry((guild_id.to_string(), window_key.to_string()))
            .or_default()
            .insert(row.member_id.clone(), row.clone());
        Ok(())
    }
}
