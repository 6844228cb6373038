pub mod account_service;
pub mod guild_config_service;
pub mod leaderboard_service;
pub mod match_counter;
pub mod ranking_service;
pub mod refresh_scheduler;
pub mod stats_service;
