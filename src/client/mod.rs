//! 外部比赛接口
//!
pub mod match_api;
pub mod retry;
pub mod riot_http;
