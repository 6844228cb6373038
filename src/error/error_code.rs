// 配置错误
// 10xxx
pub const INVALID_SCHEDULE: u32 = 10001;
pub const UNKNOWN_TIMEZONE: u32 = 10002;
pub const UNKNOWN_WINDOW_MODE: u32 = 10003;
pub const MISSING_SINCE: u32 = 10004;
pub const UNKNOWN_QUEUE_POLICY: u32 = 10005;
pub const INVALID_DATE: u32 = 10006;
pub const ENV_ERROR: u32 = 10007;

// 刷新错误
// 11xxx
pub const GUILD_UNAVAILABLE: u32 = 11001;

// db错误
// 13xxx
pub const SOMETHING_WENT_WRONG: u32 = 13001;
pub const UNIQUE_CONSTRAINT_VIOLATION: u32 = 13002;

// request错误
// 20xxx
pub const VALIDATION_ERROR: u32 = 20001;
pub const JSON_REJECTION: u32 = 20002;
pub const SIGNATURE_ERROR: u32 = 20003;
