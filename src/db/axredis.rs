use deadpool_redis::{Config, Pool, Runtime};

use crate::error::db_error::DbError;

pub async fn create_redis_pool(redis_url: &str) -> Result<Pool, DbError> {
    let mut cfg = Config::from_url(redis_url);
    if let Some(pool_cfg) = cfg.pool.as_mut() {
        pool_cfg.max_size = 10;
    }
    let pool = cfg
        .create_pool(Some(Runtime::Tokio1))
        .map_err(|e| DbError::SomethingWentWrong(e.to_string()))?;
    // 创建好连接池进行获取连接测试
    pool.get().await?;
    Ok(pool)
}
