use crate::{handler::leaderboard_handler, state::leaderboard_state::LeaderboardState};
use axum::{routing::post, Router};

pub fn routes() -> Router<LeaderboardState> {
    Router::new().nest(
        "/leaderboard",
        Router::new()
            .route("/top", post(leaderboard_handler::top))
            .route("/my_rank", post(leaderboard_handler::my_rank)),
    )
}
