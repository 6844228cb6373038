//! 与聊天机器人之间通过 redis 交换数据
//!
//! 机器人维护 guild 成员集合，本服务把渲染好的排行榜数据写回去。
use async_trait::async_trait;
use deadpool_redis::Pool;

use crate::error::db_error::DbError;
use crate::model::leaderboard::PublishedBoard;

pub const BOARD_CHANNEL: &str = "leaderboard_updates";

fn get_redis_members_key(guild_id: &str) -> String {
    format!("guild:{}:members", guild_id)
}

fn get_redis_board_key(guild_id: &str) -> String {
    format!("leaderboard:{}", guild_id)
}

/// guild 当前成员
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GuildDirectory: Send + Sync {
    /// None 表示机器人已经看不到这个 guild
    async fn member_ids(&self, guild_id: &str) -> Result<Option<Vec<String>>, DbError>;
}

/// 排行榜渲染方
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BoardPublisher: Send + Sync {
    async fn publish(&self, board: &PublishedBoard) -> Result<(), DbError>;
}

#[derive(Clone)]
pub struct RedisGuildDirectory {
    redis_con_pool: Pool,
}

impl RedisGuildDirectory {
    pub fn new(redis_con_pool: &Pool) -> Self {
        Self {
            redis_con_pool: redis_con_pool.clone(),
        }
    }
}

#[async_trait]
impl GuildDirectory for RedisGuildDirectory {
    async fn member_ids(&self, guild_id: &str) -> Result<Option<Vec<String>>, DbError> {
        let mut con = self.redis_con_pool.get().await?;
        let members: Vec<String> = redis::cmd("SMEMBERS")
            .arg(get_redis_members_key(guild_id))
            .query_async(&mut con)
            .await?;
        // 空集合在 redis 中等同于不存在
        if members.is_empty() {
            return Ok(None);
        }
        Ok(Some(members))
    }
}

#[derive(Clone)]
pub struct RedisBoardPublisher {
    redis_con_pool: Pool,
}

impl RedisBoardPublisher {
    pub fn new(redis_con_pool: &Pool) -> Self {
        Self {
            redis_con_pool: redis_con_pool.clone(),
        }
    }
}

#[async_trait]
impl BoardPublisher for RedisBoardPublisher {
    async fn publish(&self, board: &PublishedBoard) -> Result<(), DbError> {
        let payload = serde_json::to_string(board)?;
        let mut con = self.redis_con_pool.get().await?;

        let mut cmd_pipe = redis::pipe();
        cmd_pipe
            .cmd("SET")
            .arg(get_redis_board_key(&board.guild_id))
            .arg(payload)
            .ignore()
            .cmd("PUBLISH")
            .arg(BOARD_CHANNEL)
            .arg(&board.guild_id)
            .ignore();
        cmd_pipe.query_async::<_, ()>(&mut con).await?;

        tracing::debug!(
            "publish - guild_id:{} | cache_key:{} | rows:{}",
            board.guild_id,
            board.cache_key,
            board.rows.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redis_keys() {
        assert_eq!(get_redis_members_key("42"), "guild:42:members");
        assert_eq!(get_redis_board_key("42"), "leaderboard:42");
    }
}
