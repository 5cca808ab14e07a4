use api_types::ApiError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use engine::EngineError;

pub use server::{ServerConfig, ServerState, app, run_with_listener};
pub use session::{CurrentUser, Notice, NOTICE_COOKIE, SESSION_COOKIE};

mod favorites;
mod locations;
mod reviews;
mod server;
mod session;
mod user;
mod votes;

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    /// Anonymous caller on a JSON endpoint.
    Unauthorized,
    /// Anonymous caller on a page: bounce to the login form.
    LoginRequired,
}

fn status_for_engine_error(err: &EngineError) -> (StatusCode, &'static str) {
    match err {
        EngineError::KeyNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        EngineError::ExistingKey(_) => (StatusCode::CONFLICT, "conflict"),
        EngineError::InvalidInput(_) | EngineError::InvalidFeed(_) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "invalid_input")
        }
        EngineError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "unauthorized"),
        EngineError::PasswordHash(_) | EngineError::Database(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
        }
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::PasswordHash(hash_err) => {
            tracing::error!("password hashing failed: {hash_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ServerError::Engine(err) => {
                let (status, code) = status_for_engine_error(&err);
                (status, code, message_for_engine_error(err))
            }
            ServerError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                Notice::LoginRequired.message(None),
            ),
            ServerError::LoginRequired => {
                let jar = CookieJar::new().add(Notice::LoginRequired.cookie());
                return (jar, Redirect::to("/login")).into_response();
            }
        };

        let body = ApiError {
            error: error.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
