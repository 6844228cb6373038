use std::sync::Arc;

use crate::error::api_error::ApiError;
use crate::model::account::{Account, NewAccount};
use crate::repository::leaderboard_repository::LeaderboardRepositoryTrait;

/// 账号绑定记录，身份解析在机器人侧完成
#[derive(Clone)]
pub struct AccountService {
    repo: Arc<dyn LeaderboardRepositoryTrait>,
}

impl AccountService {
    pub fn new(repo: Arc<dyn LeaderboardRepositoryTrait>) -> Self {
        Self { repo }
    }

    /// 同一个 puuid 只能绑定一次，重复绑定返回 false
    pub async fn link(&self, account: &NewAccount) -> Result<bool, ApiError> {
        let inserted = self.repo.add_account(account).await?;
        if !inserted {
            tracing::info!(
                "link - puuid already linked, member_id:{} | puuid:{}",
                account.member_id,
                account.puuid
            );
        }
        Ok(inserted)
    }

    pub async fn list(&self, member_id: &str) -> Result<Vec<Account>, ApiError> {
        Ok(self.repo.list_accounts_for_member(member_id).await?)
    }

    pub async fn unlink(&self, member_id: &str, account_id: i64) -> Result<bool, ApiError> {
        Ok(self.repo.remove_account(member_id, account_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory_repository::MemoryRepository;

    #[tokio::test]
    async fn link_list_unlink() {
        let service = AccountService::new(Arc::new(MemoryRepository::new()));
        let account = NewAccount {
            member_id: "42".to_string(),
            puuid: "puuid-42".to_string(),
            riot_id: Some("Faker#KR1".to_string()),
            platform: Some("kr".to_string()),
        };
        assert!(service.link(&account).await.unwrap());
        assert!(!service.link(&account).await.unwrap());

        let accounts = service.list("42").await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].platform.as_deref(), Some("KR"));

        assert!(service.unlink("42", accounts[0].id).await.unwrap());
        assert!(!service.unlink("42", accounts[0].id).await.unwrap());
        assert!(service.list("42").await.unwrap().is_empty());
    }
}
