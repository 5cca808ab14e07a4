use api_types::vote::VoteForm;
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

/// Record whether the discount was honored, then go back to the location.
pub async fn vote(
    user: CurrentUser,
    jar: CookieJar,
    State(state): State<ServerState>,
    Path(location_id): Path<i32>,
    Form(form): Form<VoteForm>,
) -> Result<(CookieJar, Redirect), ServerError> {
    let identity = user.page_user()?;
    state
        .engine
        .vote_discount(identity.user_id, location_id, form.is_valid())
        .await?;

    Ok(redirect_with(
        jar,
        &format!("/location/{location_id}"),
        Notice::VoteThanks,
    ))
}
