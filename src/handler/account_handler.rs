use crate::dto::account_dto::{
    LinkAccountReq, LinkAccountRes, MemberReq, UnlinkAccountReq, UnlinkAccountRes,
};
use crate::error::{api_error::ApiError, request_error::ValidatedRequest};
use crate::model::account::{Account, NewAccount};
use crate::response::api_response::ApiSuccessResponse;
use crate::state::account_state::AccountState;
use axum::{extract::State, Json};

pub async fn link(
    State(state): State<AccountState>,
    ValidatedRequest(payload): ValidatedRequest<LinkAccountReq>,
) -> Result<Json<ApiSuccessResponse<LinkAccountRes>>, ApiError> {
    let account: NewAccount = payload.into();
    let linked = state.account_service.link(&account).await?;
    Ok(Json(ApiSuccessResponse::send(LinkAccountRes { linked })))
}

pub async fn list(
    State(state): State<AccountState>,
    ValidatedRequest(payload): ValidatedRequest<MemberReq>,
) -> Result<Json<ApiSuccessResponse<Vec<Account>>>, ApiError> {
    let accounts = state.account_service.list(&payload.member_id).await?;
    Ok(Json(ApiSuccessResponse::send(accounts)))
}

pub async fn unlink(
    State(state): State<AccountState>,
    ValidatedRequest(payload): ValidatedRequest<UnlinkAccountReq>,
) -> Result<Json<ApiSuccessResponse<UnlinkAccountRes>>, ApiError> {
    let removed = state
        .account_service
        .unlink(&payload.member_id, payload.account_id)
        .await?;
    Ok(Json(ApiSuccessResponse::send(UnlinkAccountRes { removed })))
}
