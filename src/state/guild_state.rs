use crate::repository::leaderboard_repository::LeaderboardRepositoryTrait;
use crate::service::guild_config_service::GuildConfigService;
use crate::service::refresh_scheduler::RefreshScheduler;
use std::sync::Arc;

#[derive(Clone)]
pub struct GuildState {
    pub guild_config_service: Arc<GuildConfigService>,
    pub refresh_scheduler: Arc<RefreshScheduler>,
}

impl GuildState {
    pub fn new(
        repo: &Arc<dyn LeaderboardRepositoryTrait>,
        refresh_scheduler: &Arc<RefreshScheduler>,
    ) -> Self {
        Self {
            guild_config_service: Arc::new(GuildConfigService::new(repo.clone())),
            refresh_scheduler: refresh_scheduler.clone(),
        }
    }
}
