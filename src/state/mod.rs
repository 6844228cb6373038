pub mod account_state;
pub mod guild_state;
pub mod leaderboard_state;
pub mod signature_state;
