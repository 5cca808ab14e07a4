use api_types::{Page, favorite::FavoriteToggled, location::FavoritesList};
use axum::{
    Json,
    extract::{Path, State},
};
use axum_extra::extract::CookieJar;
use engine::FavoriteToggle;

use crate::{
    ServerError,
    locations::map_location,
    server::ServerState,
    session::{CurrentUser, page},
};

/// JSON endpoint backing the favorite button.
pub async fn toggle(
    user: CurrentUser,
    State(state): State<ServerState>,
    Path(location_id): Path<i32>,
) -> Result<Json<FavoriteToggled>, ServerError> {
    let identity = user.api_user()?;
    let outcome = state
        .engine
        .toggle_favorite(identity.user_id, location_id)
        .await?;

    let message = match outcome {
        FavoriteToggle::Added => "Добавлено в избранное",
        FavoriteToggle::Removed => "Удалено из избранного",
    };
    Ok(Json(FavoriteToggled {
        status: outcome.as_str().to_string(),
        message: message.to_string(),
    }))
}

pub async fn list(
    user: CurrentUser,
    jar: CookieJar,
    State(state): State<ServerState>,
) -> Result<(CookieJar, Json<Page<FavoritesList>>), ServerError> {
    let identity = user.page_user()?;
    let locations = state
        .engine
        .favorite_locations(identity.user_id)
        .await?
        .into_iter()
        .map(map_location)
        .collect();

    Ok(page(jar, &user, FavoritesList { locations }))
}
