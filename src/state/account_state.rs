use crate::repository::leaderboard_repository::LeaderboardRepositoryTrait;
use crate::service::account_service::AccountService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AccountState {
    pub account_service: Arc<AccountService>,
}

impl AccountState {
    pub fn new(repo: &Arc<dyn LeaderboardRepositoryTrait>) -> Self {
        Self {
            account_service: Arc::new(AccountService::new(repo.clone())),
        }
    }
}
