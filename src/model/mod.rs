//! 内部用到的数据模型
//!
pub mod account;
pub mod guild;
pub mod leaderboard;
