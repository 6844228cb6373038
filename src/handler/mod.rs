pub mod account_handler;
pub mod guild_handler;
pub mod leaderboard_handler;
