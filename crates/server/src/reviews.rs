use api_types::review::ReviewForm;
use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use axum_extra::extract::CookieJar;

use crate::{
    ServerError,
    server::ServerState,
    session::{CurrentUser, Notice, redirect_with},
};

pub async fn add(
    user: CurrentUser,
    jar: CookieJar,
    State(state): State<ServerState>,
    Path(location_id): Path<i32>,
    Form(form): Form<ReviewForm>,
) -> Result<(CookieJar, Redirect), ServerError> {
    let identity = user.page_user()?;
    let location = state.engine.location(location_id).await?;
    let back = format!("/location/{}", location.id);

    if form.text.trim().is_empty() {
        return Ok(redirect_with(jar, &back, Notice::ReviewEmpty));
    }

    let rating = engine::normalize_rating(form.rating.as_deref());
    state
        .engine
        .add_review(identity.user_id, location.id, &form.text, rating)
        .await?;

    Ok(redirect_with(jar, &back, Notice::ReviewAdded))
}
