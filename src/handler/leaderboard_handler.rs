use chrono::Utc;

use crate::dto::leaderboard_dto::{MyRankReq, TopReq};
use crate::error::{api_error::ApiError, request_error::ValidatedRequest};
use crate::response::api_response::ApiSuccessResponse;
use crate::service::leaderboard_service::{BoardView, MyRankView};
use crate::state::leaderboard_state::LeaderboardState;
use axum::{extract::State, Json};

pub async fn top(
    State(state): State<LeaderboardState>,
    ValidatedRequest(payload): ValidatedRequest<TopReq>,
) -> Result<Json<ApiSuccessResponse<BoardView>>, ApiError> {
    let view = state
        .leaderboard_service
        .top(&payload.guild_id, payload.n, Utc::now())
        .await?;
    Ok(Json(ApiSuccessResponse::send(view)))
}

pub async fn my_rank(
    State(state): State<LeaderboardState>,
    ValidatedRequest(payload): ValidatedRequest<MyRankReq>,
) -> Result<Json<ApiSuccessResponse<MyRankView>>, ApiError> {
    let view = state
        .leaderboard_service
        .my_rank(&payload.guild_id, &payload.member_id, Utc::now())
        .await?;
    Ok(Json(ApiSuccessResponse::send(view)))
}
