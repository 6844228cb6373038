pub mod account;
pub mod guild;
pub mod leaderboard;
pub mod root;
