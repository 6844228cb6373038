use async_trait::async_trait;

use crate::error::riot_error::RiotApiError;

/// 单页最多返回的比赛数
pub const MATCH_PAGE_SIZE: u32 = 100;

/// 平台 -> 区域路由
pub fn regional_route(platform: &str) -> Option<&'static str> {
    match platform.trim().to_uppercase().as_str() {
        "EUW1" | "EUN1" | "TR1" | "RU" => Some("europe"),
        "NA1" | "BR1" | "LA1" | "LA2" => Some("americas"),
        "KR" | "JP1" => Some("asia"),
        "OC1" => Some("sea"),
        _ => None,
    }
}

/// 一次分页请求的参数
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchPageQuery {
    pub region: String,
    pub puuid: String,
    pub start_time: i64,
    /// 闭区间上界
    pub end_time: Option<i64>,
    pub offset: u32,
    pub count: u32,
    pub queue: Option<u16>,
}

/// 比赛 id 列表接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MatchApi: Send + Sync {
    /// 返回该页的比赛 id 数量
    async fn fetch_page(&self, query: &MatchPageQuery) -> Result<usize, RiotApiError>;
}
