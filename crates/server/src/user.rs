//! Accounts: registration, login, logout and the profile page.

use api_types::{
    Page,
    user::{FormView, LoginForm, ProfileView, RegisterForm},
};
use axum::{
    Form, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{CookieJar, SignedCookieJar};
use engine::EngineError;

use crate::{
    ServerError,
    server::ServerState,
    session::{
        CurrentUser, Notice, SESSION_COOKIE, page, page_with, redirect_with, session_cookie,
        session_removal,
    },
};

pub async fn register_form(
    user: CurrentUser,
    jar: CookieJar,
) -> (CookieJar, Json<Page<FormView>>) {
    page(jar, &user, FormView::default())
}

pub async fn register(
    user: CurrentUser,
    jar: CookieJar,
    State(state): State<ServerState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, ServerError> {
    let rejected = match state
        .engine
        .register(&form.username, &form.email, &form.password)
        .await
    {
        Ok(_) => return Ok(redirect_with(jar, "/login", Notice::Registered).into_response()),
        Err(EngineError::InvalidInput(_)) => Notice::AllFieldsRequired,
        Err(EngineError::ExistingKey(key)) if key == "username" => Notice::UsernameTaken,
        Err(EngineError::ExistingKey(_)) => Notice::EmailTaken,
        Err(err) => return Err(err.into()),
    };

    let body = FormView {
        username: Some(form.username),
        email: Some(form.email),
    };
    Ok((
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(page_with(&user, Some(rejected), body)),
    )
        .into_response())
}

pub async fn login_form(user: CurrentUser, jar: CookieJar) -> (CookieJar, Json<Page<FormView>>) {
    page(jar, &user, FormView::default())
}

pub async fn login(
    user: CurrentUser,
    jar: CookieJar,
    signed: SignedCookieJar,
    State(state): State<ServerState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, ServerError> {
    match state.engine.authenticate(&form.username, &form.password).await {
        Ok(account) => {
            let session_id = state.engine.open_session(&account).await?;
            tracing::info!(user_id = account.id, "user logged in");
            let signed = signed.add(session_cookie(session_id));
            let (jar, redirect) = redirect_with(jar, "/", Notice::Welcome);
            Ok((signed, jar, redirect).into_response())
        }
        Err(EngineError::InvalidCredentials) => {
            let body = FormView {
                username: Some(form.username),
                email: None,
            };
            Ok((
                StatusCode::UNAUTHORIZED,
                Json(page_with(&user, Some(Notice::InvalidCredentials), body)),
            )
                .into_response())
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn logout(
    jar: CookieJar,
    signed: SignedCookieJar,
    State(state): State<ServerState>,
) -> Result<(SignedCookieJar, CookieJar, Redirect), ServerError> {
    if let Some(cookie) = signed.get(SESSION_COOKIE) {
        state.engine.close_session(cookie.value()).await?;
    }
    let signed = signed.remove(session_removal());
    let (jar, redirect) = redirect_with(jar, "/", Notice::LoggedOut);
    Ok((signed, jar, redirect))
}

pub async fn profile(
    user: CurrentUser,
    jar: CookieJar,
    State(state): State<ServerState>,
) -> Result<(CookieJar, Json<Page<ProfileView>>), ServerError> {
    let identity = user.page_user()?;
    let profile = state.engine.profile(identity.user_id).await?;

    let body = ProfileView {
        username: profile.user.username,
        email: profile.user.email,
        created_at: profile.user.created_at,
        reviews_count: profile.reviews_count,
        favorites_count: profile.favorites_count,
    };
    Ok(page(jar, &user, body))
}
