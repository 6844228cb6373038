use chrono::Utc;

use crate::dto::guild_dto::{
    GuildReq, SetBoardReq, SetQueuesReq, SetRefreshReq, SetSinceReq, SetWindowReq,
};
use crate::error::{api_error::ApiError, request_error::ValidatedRequest};
use crate::model::guild::GuildSettings;
use crate::response::api_response::ApiSuccessResponse;
use crate::service::guild_config_service::GuildStatus;
use crate::service::refresh_scheduler::GuildRefreshReport;
use crate::state::guild_state::GuildState;
use axum::{extract::State, Json};
use axum_macros::debug_handler;

// 立即刷新
#[debug_handler]
pub async fn refresh_now(
    State(state): State<GuildState>,
    ValidatedRequest(payload): ValidatedRequest<GuildReq>,
) -> Result<Json<ApiSuccessResponse<GuildRefreshReport>>, ApiError> {
    let report = state
        .refresh_scheduler
        .refresh_now(&payload.guild_id, Utc::now())
        .await?;
    Ok(Json(ApiSuccessResponse::send(report)))
}

pub async fn status(
    State(state): State<GuildState>,
    ValidatedRequest(payload): ValidatedRequest<GuildReq>,
) -> Result<Json<ApiSuccessResponse<GuildStatus>>, ApiError> {
    let status = state
        .guild_config_service
        .status(&payload.guild_id, Utc::now())
        .await?;
    Ok(Json(ApiSuccessResponse::send(status)))
}

pub async fn set_board(
    State(state): State<GuildState>,
    ValidatedRequest(payload): ValidatedRequest<SetBoardReq>,
) -> Result<Json<ApiSuccessResponse<GuildSettings>>, ApiError> {
    let settings = state
        .guild_config_service
        .set_board(&payload.guild_id, &payload.channel_id, &payload.message_id)
        .await?;
    Ok(Json(ApiSuccessResponse::send(settings)))
}

pub async fn set_refresh(
    State(state): State<GuildState>,
    ValidatedRequest(payload): ValidatedRequest<SetRefreshReq>,
) -> Result<Json<ApiSuccessResponse<GuildSettings>>, ApiError> {
    let settings = state
        .guild_config_service
        .set_refresh(
            &payload.guild_id,
            payload.weekday,
            payload.hour,
            payload.minute,
            payload.tz.as_deref(),
            Utc::now(),
        )
        .await?;
    Ok(Json(ApiSuccessResponse::send(settings)))
}

pub async fn clear_refresh(
    State(state): State<GuildState>,
    ValidatedRequest(payload): ValidatedRequest<GuildReq>,
) -> Result<Json<ApiSuccessResponse<GuildSettings>>, ApiError> {
    let settings = state
        .guild_config_service
        .clear_refresh(&payload.guild_id)
        .await?;
    Ok(Json(ApiSuccessResponse::send(settings)))
}

pub async fn set_window(
    State(state): State<GuildState>,
    ValidatedRequest(payload): ValidatedRequest<SetWindowReq>,
) -> Result<Json<ApiSuccessResponse<GuildSettings>>, ApiError> {
    let settings = state
        .guild_config_service
        .set_window(&payload.guild_id, &payload.mode, payload.tz.as_deref())
        .await?;
    Ok(Json(ApiSuccessResponse::send(settings)))
}

pub async fn set_since(
    State(state): State<GuildState>,
    ValidatedRequest(payload): ValidatedRequest<SetSinceReq>,
) -> Result<Json<ApiSuccessResponse<GuildSettings>>, ApiError> {
    let settings = state
        .guild_config_service
        .set_since(&payload.guild_id, &payload.date, payload.tz.as_deref())
        .await?;
    Ok(Json(ApiSuccessResponse::send(settings)))
}

pub async fn set_queues(
    State(state): State<GuildState>,
    ValidatedRequest(payload): ValidatedRequest<SetQueuesReq>,
) -> Result<Json<ApiSuccessResponse<GuildSettings>>, ApiError> {
    let settings = state
        .guild_config_service
        .set_queues(&payload.guild_id, &payload.policy)
        .await?;
    Ok(Json(ApiSuccessResponse::send(settings)))
}
