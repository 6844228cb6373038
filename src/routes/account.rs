use crate::{handler::account_handler, state::account_state::AccountState};
use axum::{routing::post, Router};

pub fn routes() -> Router<AccountState> {
    Router::new().nest(
        "/account",
        Router::new()
            .route("/link", post(account_handler::link))
            .route("/list", post(account_handler::list))
            .route("/unlink", post(account_handler::unlink)),
    )
}
