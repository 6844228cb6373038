pub mod leaderboard_repository;
pub mod memory_repository;
pub mod redis_board;
