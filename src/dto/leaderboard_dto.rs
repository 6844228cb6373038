use serde::{Deserialize, Serialize};
use validator::Validate;

fn default_top_n() -> usize {
    10
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct TopReq {
    #[validate(length(min = 1, max = 32, message = "guild_id must be between 1 and 32 characters"))]
    pub guild_id: String,
    #[serde(default = "default_top_n")]
    #[validate(range(min = 1, max = 50, message = "n must be between 1 and 50"))]
    pub n: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct MyRankReq {
    #[validate(length(min = 1, max = 32, message = "guild_id must be between 1 and 32 characters"))]
    pub guild_id: String,
    #[validate(length(min = 1, max = 32, message = "member_id must be between 1 and 32 characters"))]
    pub member_id: String,
}
