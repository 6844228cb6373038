use crate::repository::leaderboard_repository::LeaderboardRepositoryTrait;
use crate::repository::redis_board::GuildDirectory;
use crate::service::leaderboard_service::LeaderboardService;
use std::sync::Arc;

#[derive(Clone)]
pub struct LeaderboardState {
    pub leaderboard_service: Arc<LeaderboardService>,
}

impl LeaderboardState {
    pub fn new(
        repo: &Arc<dyn LeaderboardRepositoryTrait>,
        directory: &Arc<dyn GuildDirectory>,
    ) -> Self {
        Self {
            leaderboard_service: Arc::new(LeaderboardService::new(repo.clone(), directory.clone())),
        }
    }
}
