use crate::{handler::guild_handler, state::guild_state::GuildState};
use axum::{routing::post, Router};

pub fn routes() -> Router<GuildState> {
    Router::new().nest(
        "/guild",
        Router::new()
            .route("/refresh_now", post(guild_handler::refresh_now))
            .route("/status", post(guild_handler::status))
            .route("/set_board", post(guild_handler::set_board))
            .route("/set_refresh", post(guild_handler::set_refresh))
            .route("/clear_refresh", post(guild_handler::clear_refresh))
            .route("/set_window", post(guild_handler::set_window))
            .route("/set_since", post(guild_handler::set_since))
            .route("/set_queues", post(guild_handler::set_queues)),
    )
}
