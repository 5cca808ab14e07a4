use axum::{
    Router,
    extract::FromRef,
    routing::{get, post},
};
use axum_extra::extract::cookie::Key;

use std::sync::Arc;

use crate::{favorites, locations, reviews, user, votes};
use engine::Engine;

/// Process-wide settings the handlers need.
#[derive(Clone)]
pub struct ServerConfig {
    /// Signs the session cookie.
    pub key: Key,
    /// Handed to the map page for the map provider's script.
    pub maps_api_key: Option<String>,
}

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub key: Key,
    pub maps_api_key: Option<String>,
}

impl FromRef<ServerState> for Key {
    fn from_ref(state: &ServerState) -> Self {
        state.key.clone()
    }
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(locations::list))
        .route("/map", get(locations::map))
        .route("/location/{id}", get(locations::detail))
        .route("/vote_discount/{id}", post(votes::vote))
        .route("/add_review/{id}", post(reviews::add))
        .route("/toggle_favorite/{id}", post(favorites::toggle))
        .route("/favorites", get(favorites::list))
        .route("/register", get(user::register_form).post(user::register))
        .route("/login", get(user::login_form).post(user::login))
        .route("/logout", get(user::logout))
        .route("/profile", get(user::profile))
        .with_state(state)
}

/// Build the application router around `engine`.
pub fn app(engine: Engine, config: ServerConfig) -> Router {
    let state = ServerState {
        engine: Arc::new(engine),
        key: config.key,
        maps_api_key: config.maps_api_key,
    };
    router(state)
}

pub async fn run_with_listener(
    engine: Engine,
    config: ServerConfig,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(engine, config)).await
}
