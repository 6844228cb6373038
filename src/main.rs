use guild_rank_server::client::retry::{RetryPolicy, TokioSleeper};
use guild_rank_server::client::riot_http::RiotHttpClient;
use guild_rank_server::config::parameter::AppConfig;
use guild_rank_server::db::{
    axredis,
    database::{self, DatabaseTrait},
};
use guild_rank_server::repository::leaderboard_repository::{
    LeaderboardRepository, LeaderboardRepositoryTrait,
};
use guild_rank_server::repository::redis_board::{
    BoardPublisher, GuildDirectory, RedisBoardPublisher, RedisGuildDirectory,
};
use guild_rank_server::routes;
use guild_rank_server::service::match_counter::MatchCounter;
use guild_rank_server::service::refresh_scheduler::RefreshScheduler;
use guild_rank_server::service::stats_service::StatsRefresher;

use tokio_cron_scheduler::JobScheduler;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use std::sync::Arc;

// 内存分配器
#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[cfg(target_env = "msvc")]
use mimalloc::MiMalloc;

#[cfg(target_env = "msvc")]
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() {
    // 参数初始化
    let config = AppConfig::from_env().unwrap_or_else(|e| panic!("config error: {}", e));

    // 日志
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("logger")
        .filename_suffix("log")
        .max_log_files(60)
        .build(&config.log_dir)
        .expect("file log init failed!");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let file_log_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_timer(time::LocalTime::rfc_3339());

    let console_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_timer(time::LocalTime::rfc_3339());
    tracing_subscriber::registry()
        .with(file_log_subscriber)
        .with(console_subscriber)
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let connection = database::Database::init(&config)
        .await
        .unwrap_or_else(|e| panic!("Database error: {}", e));
    let mysql_pool = Arc::new(connection);

    // 初始化redis
    let redis_pool = axredis::create_redis_pool(&config.redis_url)
        .await
        .unwrap_or_else(|err| panic!("redis init failed, error:{}", err));

    let repo: Arc<dyn LeaderboardRepositoryTrait> =
        Arc::new(LeaderboardRepository::new(&mysql_pool));
    let directory: Arc<dyn GuildDirectory> = Arc::new(RedisGuildDirectory::new(&redis_pool));
    let publisher: Arc<dyn BoardPublisher> = Arc::new(RedisBoardPublisher::new(&redis_pool));

    // 没有 key 时只做排名，不拉比赛数据
    let stats = match &config.riot.api_key {
        Some(api_key) => {
            let client = RiotHttpClient::new(api_key, config.riot.request_timeout)
                .unwrap_or_else(|e| panic!("riot client init failed, error:{}", e));
            let counter = MatchCounter::new(
                Arc::new(client),
                RetryPolicy {
                    max_attempts: config.riot.max_attempts,
                    ..Default::default()
                },
                Arc::new(TokioSleeper),
                config.riot.slice_days,
            );
            Some(StatsRefresher::new(
                repo.clone(),
                Arc::new(counter),
                config.riot.concurrency,
            ))
        }
        None => {
            tracing::warn!("RIOT_API_KEY not set, stats refresh disabled");
            None
        }
    };

    let refresh_scheduler = Arc::new(RefreshScheduler::new(
        repo.clone(),
        directory.clone(),
        publisher,
        stats,
    ));
    let sched = JobScheduler::new().await.unwrap();
    refresh_scheduler
        .start(&sched, &config.tick_cron)
        .await
        .unwrap_or_else(|e| panic!("scheduler start failed, error:{}", e));

    let host = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(host).await.unwrap();
    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(
        listener,
        routes::root::routes(repo, directory, refresh_scheduler, &config.admin_secret),
    )
    .await
    .unwrap_or_else(|e| panic!("Server error: {}", e));
}
