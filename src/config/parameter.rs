use std::str::FromStr;
use std::time::Duration;

use crate::error::config_error::ConfigError;

// 管理操作未指定时区时使用
pub const DEFAULT_TZ: &str = "Europe/Copenhagen";
pub const DEFAULT_WINDOW_MODE: &str = "month";
pub const DEFAULT_QUEUE_POLICY: &str = "all";

// 每分钟第0秒扫描一次到期的 guild
pub const DEFAULT_TICK_CRON: &str = "0 * * * * *";

/// 启动时从环境变量读取的配置，之后显式传递
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub master_db_url: String,
    pub slave_db_url: String,
    pub redis_url: String,
    pub port: u16,
    pub admin_secret: String,
    pub log_dir: String,
    pub tick_cron: String,
    pub riot: RiotConfig,
}

/// 比赛接口相关配置
#[derive(Clone, Debug)]
pub struct RiotConfig {
    /// 为空时跳过统计步骤
    pub api_key: Option<String>,
    pub request_timeout: Duration,
    pub max_attempts: u32,
    pub slice_days: i64,
    pub concurrency: usize,
}

impl AppConfig {
    /// 读取 .env 与环境变量
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        // 给日志库设置环境变量
        if std::env::var_os("RUST_LOG").is_none() {
            std::env::set_var("RUST_LOG", "debug")
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnv(key.to_string()))
        };

        let master_db_url = required("MASTER_DB_URL")?;
        // 没有配置从库时读写都走主库
        let slave_db_url = lookup("SLAVE_DB_URL")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| master_db_url.clone());

        let tick_cron = lookup("REFRESH_TICK_CRON").unwrap_or_else(|| DEFAULT_TICK_CRON.to_string());
        if cron::Schedule::from_str(&tick_cron).is_err() {
            return Err(ConfigError::InvalidEnv {
                key: "REFRESH_TICK_CRON".to_string(),
                value: tick_cron,
            });
        }

        let riot = RiotConfig {
            api_key: lookup("RIOT_API_KEY").filter(|value| !value.trim().is_empty()),
            request_timeout: Duration::from_secs(parse_or(&lookup, "RIOT_REQUEST_TIMEOUT_SECS", 10)?),
            max_attempts: parse_or(&lookup, "RIOT_MAX_ATTEMPTS", 5)?,
            slice_days: parse_or(&lookup, "RIOT_SLICE_DAYS", 30)?,
            concurrency: parse_or(&lookup, "STATS_CONCURRENCY", 2)?,
        };
        if riot.max_attempts == 0 || riot.slice_days <= 0 || riot.concurrency == 0 {
            return Err(ConfigError::InvalidEnv {
                key: "RIOT_*".to_string(),
                value: format!("{riot:?}"),
            });
        }

        Ok(Self {
            master_db_url,
            slave_db_url,
            redis_url: required("REDIS_URL")?,
            port: parse_or(&lookup, "PORT", 3000)?,
            admin_secret: required("ADMIN_SECRET")?,
            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "log".to_string()),
            tick_cron,
            riot,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
            key: key.to_string(),
            value,
        }),
        None => Ok(default),
    }
}
