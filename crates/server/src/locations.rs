//! Browsing: listing, map and detail pages.

use api_types::{
    Page,
    location::{
        ListQuery, LocationDetailView, LocationList, LocationView, MapData, MapPointView,
    },
    review::ReviewView,
    vote::VoteTallyView,
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use axum_extra::extract::CookieJar;
use engine::LocationFilter;

use crate::{
    ServerError,
    server::ServerState,
    session::{CurrentUser, page},
};

pub(crate) fn map_location(location: engine::Location) -> LocationView {
    LocationView {
        discount: location.discount_display(),
        id: location.id,
        name: location.name,
        address: location.address,
        category: location.category,
        latitude: location.latitude,
        longitude: location.longitude,
        description: location.description,
    }
}

fn map_point(point: engine::MapPoint) -> MapPointView {
    MapPointView {
        id: point.id,
        name: point.name,
        address: point.address,
        discount: point.discount,
        category: point.category,
        lat: point.lat,
        lon: point.lon,
    }
}

fn map_review(review: engine::Review) -> ReviewView {
    ReviewView {
        id: review.id,
        username: review.username,
        text: review.text,
        rating: review.rating,
        created_at: review.created_at,
    }
}

pub async fn list(
    user: CurrentUser,
    jar: CookieJar,
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> Result<(CookieJar, Json<Page<LocationList>>), ServerError> {
    let filter = LocationFilter {
        search: query.search.clone(),
        category: query.category.clone(),
    };
    let locations = state
        .engine
        .locations(&filter)
        .await?
        .into_iter()
        .map(map_location)
        .collect();
    let categories = state.engine.categories().await?;

    Ok(page(
        jar,
        &user,
        LocationList {
            locations,
            categories,
            filter: query,
        },
    ))
}

pub async fn map(
    user: CurrentUser,
    jar: CookieJar,
    State(state): State<ServerState>,
) -> Result<(CookieJar, Json<Page<MapData>>), ServerError> {
    let points: Vec<_> = state
        .engine
        .map_points()
        .await?
        .into_iter()
        .map(map_point)
        .collect();
    tracing::debug!(points = points.len(), "map data prepared");

    Ok(page(
        jar,
        &user,
        MapData {
            total_points: points.len(),
            points,
            api_key: state.maps_api_key.clone(),
        },
    ))
}

pub async fn detail(
    user: CurrentUser,
    jar: CookieJar,
    State(state): State<ServerState>,
    Path(location_id): Path<i32>,
) -> Result<(CookieJar, Json<Page<LocationDetailView>>), ServerError> {
    let detail = state
        .engine
        .location_detail(location_id, user.0.as_ref())
        .await?;

    let (is_favorite, user_vote) = match detail.viewer {
        Some(viewer) => (Some(viewer.is_favorite), viewer.vote),
        None => (None, None),
    };
    let body = LocationDetailView {
        location: map_location(detail.location),
        average_rating: detail.average_rating,
        similar: detail.similar.into_iter().map(map_location).collect(),
        reviews: detail.reviews.into_iter().map(map_review).collect(),
        votes: VoteTallyView {
            valid: detail.votes.valid,
            invalid: detail.votes.invalid,
        },
        is_favorite,
        user_vote,
    };

    Ok(page(jar, &user, body))
}
