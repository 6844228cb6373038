pub mod account_dto;
pub mod guild_dto;
pub mod leaderboard_dto;
