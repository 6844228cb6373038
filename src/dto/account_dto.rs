use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::model::account::NewAccount;

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct LinkAccountReq {
    #[validate(length(min = 1, max = 32, message = "member_id must be between 1 and 32 characters"))]
    pub member_id: String,
    #[validate(length(min = 1, max = 128, message = "puuid must be between 1 and 128 characters"))]
    pub puuid: String,
    #[validate(length(max = 64, message = "riot_id must be at most 64 characters"))]
    pub riot_id: Option<String>,
    #[validate(length(min = 2, max = 8, message = "platform must be between 2 and 8 characters"))]
    pub platform: Option<String>,
}

impl From<LinkAccountReq> for NewAccount {
    fn from(req: LinkAccountReq) -> Self {
        Self {
            member_id: req.member_id,
            puuid: req.puuid,
            riot_id: req.riot_id,
            platform: req.platform,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct MemberReq {
    #[validate(length(min = 1, max = 32, message = "member_id must be between 1 and 32 characters"))]
    pub member_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct UnlinkAccountReq {
    #[validate(length(min = 1, max = 32, message = "member_id must be between 1 and 32 characters"))]
    pub member_id: String,
    #[validate(range(min = 1, message = "account_id must be positive"))]
    pub account_id: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct LinkAccountRes {
    /// false 表示该 puuid 已被绑定
    pub linked: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct UnlinkAccountRes {
    pub removed: bool,
}
