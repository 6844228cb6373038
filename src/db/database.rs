use crate::config::parameter::AppConfig;
use async_trait::async_trait;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::{Error, MySql, Pool};

pub struct Database {
    master_pool: Pool<MySql>,
    slave_pool: Pool<MySql>,
}

#[async_trait]
pub trait DatabaseTrait {
    async fn init(config: &AppConfig) -> Result<Self, Error>
    where
        Self: Sized;
    fn get_master_pool(&self) -> &Pool<MySql>;
    fn get_slave_pool(&self) -> &Pool<MySql>;
}

async fn connect(url: &str) -> Result<Pool<MySql>, Error> {
    MySqlPoolOptions::new()
        .max_connections(10)
        .max_lifetime(std::time::Duration::from_secs(6 * 60 * 60))
        .connect(url)
        .await
}

#[async_trait]
impl DatabaseTrait for Database {
    async fn init(config: &AppConfig) -> Result<Self, Error> {
        let master_pool = connect(&config.master_db_url).await?;
        // 建表只在主库执行
        sqlx::migrate!("./migrations")
            .run(&master_pool)
            .await
            .map_err(|e| Error::Migrate(Box::new(e)))?;

        let slave_pool = if config.slave_db_url == config.master_db_url {
            master_pool.clone()
        } else {
            connect(&config.slave_db_url).await?
        };

        Ok(Self {
            master_pool,
            slave_pool,
        })
    }

    fn get_master_pool(&self) -> &Pool<MySql> {
        &self.master_pool
    }

    fn get_slave_pool(&self) -> &Pool<MySql> {
        &self.slave_pool
    }
}
