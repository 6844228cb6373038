use crate::response::api_response::ApiErrorResponse;
use async_trait::async_trait;
use axum::extract::{rejection::JsonRejection, FromRequest};
use axum::response::{IntoResponse, Response};
use axum::{extract::Request, Json};
use serde::de::DeserializeOwned;
use thiserror::Error;
use validator::Validate;

use super::error_code;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    ValidationError(#[from] validator::ValidationErrors),
    #[error(transparent)]
    JsonRejection(#[from] JsonRejection),
    #[error("signature error")]
    SignatureError,
}

impl RequestError {
    fn get_code(&self) -> u32 {
        match self {
            RequestError::ValidationError(_) => error_code::VALIDATION_ERROR,
            RequestError::JsonRejection(_) => error_code::JSON_REJECTION,
            RequestError::SignatureError => error_code::SIGNATURE_ERROR,
        }
    }
}

/// json 反序列化后再跑一遍 validator 校验
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedRequest<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedRequest<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = RequestError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidatedRequest(value))
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let msg = match &self {
            RequestError::ValidationError(_) => self.to_string().replace('\n', ", "),
            _ => self.to_string(),
        };
        let status = match self {
            RequestError::SignatureError => 401,
            _ => 400,
        };
        ApiErrorResponse::send(status, self.get_code(), Some(msg))
    }
}
