use crate::middleware::body_signature::body_signature_verify;
use crate::repository::leaderboard_repository::LeaderboardRepositoryTrait;
use crate::repository::redis_board::GuildDirectory;
use crate::routes::{account, guild, leaderboard};
use crate::service::refresh_scheduler::RefreshScheduler;
use crate::state::account_state::AccountState;
use crate::state::guild_state::GuildState;
use crate::state::leaderboard_state::LeaderboardState;
use crate::state::signature_state::SignatureState;
use axum::routing::{get, IntoMakeService};
use axum::{middleware, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub fn router(
    repo: Arc<dyn LeaderboardRepositoryTrait>,
    directory: Arc<dyn GuildDirectory>,
    refresh_scheduler: Arc<RefreshScheduler>,
    admin_secret: &str,
) -> Router {
    let guild_state = GuildState::new(&repo, &refresh_scheduler);
    let leaderboard_state = LeaderboardState::new(&repo, &directory);
    let account_state = AccountState::new(&repo);
    let signature_state = SignatureState::new(admin_secret);

    // 除健康检查外都要求签名
    let signed_router = Router::new()
        .merge(guild::routes().with_state(guild_state))
        .merge(leaderboard::routes().with_state(leaderboard_state))
        .merge(account::routes().with_state(account_state))
        .layer(ServiceBuilder::new().layer(middleware::from_fn_with_state(
            signature_state,
            body_signature_verify,
        )));

    let merged_router = Router::new()
        .merge(signed_router)
        .merge(Router::new().route("/health", get(|| async move { "Healthy..." })));

    Router::new()
        .nest("/api", merged_router)
        .layer(TraceLayer::new_for_http())
}

pub fn routes(
    repo: Arc<dyn LeaderboardRepositoryTrait>,
    directory: Arc<dyn GuildDirectory>,
    refresh_scheduler: Arc<RefreshScheduler>,
    admin_secret: &str,
) -> IntoMakeService<Router> {
    router(repo, directory, refresh_scheduler, admin_secret).into_make_service()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory_repository::MemoryRepository;
    use crate::repository::redis_board::{MockBoardPublisher, MockGuildDirectory};
    use crate::utils::encrypt::body_signature;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const SECRET: &str = "s3cret";

    fn app() -> Router {
        let repo: Arc<dyn LeaderboardRepositoryTrait> = Arc::new(MemoryRepository::new());
        let mut directory = MockGuildDirectory::new();
        directory
            .expect_member_ids()
            .returning(|_| Ok(Some(vec!["1".to_string()])));
        let directory: Arc<dyn GuildDirectory> = Arc::new(directory);
        let scheduler = Arc::new(RefreshScheduler::new(
            repo.clone(),
            directory.clone(),
            Arc::new(MockBoardPublisher::new()),
            None,
        ));
        router(repo, directory, scheduler, SECRET)
    }

    fn signed(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("signature", body_signature(body, SECRET))
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_unsigned() {
        let response = app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn admin_routes_require_signature() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/guild/status")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"guild_id":"g1"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn signed_status_returns_default_settings() {
        let response = app()
            .oneshot(signed("/api/guild/status", r#"{"guild_id":"g1"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["code"], 0);
        assert_eq!(body["data"]["settings"]["guild_id"], "g1");
        assert_eq!(body["data"]["settings"]["window_mode"], "month");
    }

    #[tokio::test]
    async fn link_then_list_accounts() {
        let app = app();
        let link = r#"{"member_id":"1","puuid":"p-1","platform":"euw1"}"#;
        let response = app.clone().oneshot(signed("/api/account/link", link)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["data"]["linked"], true);

        let response = app
            .oneshot(signed("/api/account/list", r#"{"member_id":"1"}"#))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["data"][0]["puuid"], "p-1");
        assert_eq!(body["data"][0]["platform"], "EUW1");
    }

    #[tokio::test]
    async fn invalid_top_limit_is_rejected() {
        let response = app()
            .oneshot(signed("/api/leaderboard/top", r#"{"guild_id":"g1","n":0}"#))
            .await
            .unwrap();
        assert_ne!(response.status(), StatusCode::OK);
    }
}
