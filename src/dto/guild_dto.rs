//! guild 管理接口的请求结构
//!
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct GuildReq {
    #[validate(length(min = 1, max = 32, message = "guild_id must be between 1 and 32 characters"))]
    pub guild_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct SetBoardReq {
    #[validate(length(min = 1, max = 32, message = "guild_id must be between 1 and 32 characters"))]
    pub guild_id: String,
    #[validate(length(min = 1, max = 32, message = "channel_id must be between 1 and 32 characters"))]
    pub channel_id: String,
    #[validate(length(min = 1, max = 32, message = "message_id must be between 1 and 32 characters"))]
    pub message_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct SetRefreshReq {
    #[validate(length(min = 1, max = 32, message = "guild_id must be between 1 and 32 characters"))]
    pub guild_id: String,
    /// 0 = 周一
    #[validate(range(min = 0, max = 6, message = "weekday must be between 0 and 6"))]
    pub weekday: u8,
    #[validate(range(min = 0, max = 23, message = "hour must be between 0 and 23"))]
    pub hour: u8,
    #[validate(range(min = 0, max = 59, message = "minute must be between 0 and 59"))]
    pub minute: u8,
    pub tz: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct SetWindowReq {
    #[validate(length(min = 1, max = 32, message = "guild_id must be between 1 and 32 characters"))]
    pub guild_id: String,
    /// week / month / year
    pub mode: String,
    pub tz: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct SetSinceReq {
    #[validate(length(min = 1, max = 32, message = "guild_id must be between 1 and 32 characters"))]
    pub guild_id: String,
    /// YYYY-MM-DD
    #[validate(length(equal = 10, message = "date must be YYYY-MM-DD"))]
    pub date: String,
    pub tz: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct SetQueuesReq {
    #[validate(length(min = 1, max = 32, message = "guild_id must be between 1 and 32 characters"))]
    pub guild_id: String,
    /// all / ranked_only / ranked_normal
    pub policy: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_fields_are_range_checked() {
        let mut req = SetRefreshReq {
            guild_id: "42".to_string(),
            weekday: 6,
            hour: 23,
            minute: 59,
            tz: None,
        };
        assert!(req.validate().is_ok());
        req.weekday = 7;
        assert!(req.validate().is_err());
        req.weekday = 0;
        req.minute = 60;
        assert!(req.validate().is_err());
    }

    #[test]
    fn empty_guild_id_is_rejected() {
        let req = GuildReq {
            guild_id: String::new(),
        };
        assert!(req.validate().is_err());
    }
}
