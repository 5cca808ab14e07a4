use sea_orm::{PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, prelude::*};

use crate::{
    Engine, EngineError, Identity, Location, LocationFilter, MapPoint, ResultEngine, Review,
    locations, reviews,
};

use super::{SIMILAR_LIMIT, VoteTally};

/// What the current user has done on a location.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewerState {
    pub is_favorite: bool,
    /// `Some(true)` when they voted the discount valid, `None` if they never voted.
    pub vote: Option<bool>,
}

/// Everything the detail page shows for one location.
#[derive(Clone, Debug, PartialEq)]
pub struct LocationDetail {
    pub location: Location,
    pub average_rating: f64,
    pub similar: Vec<Location>,
    /// Newest first.
    pub reviews: Vec<Review>,
    pub votes: VoteTally,
    /// Present only for an authenticated viewer.
    pub viewer: Option<ViewerState>,
}

impl Engine {
    /// Locations matching `filter`, in insertion order.
    ///
    /// The search is a case-insensitive substring match on name or address.
    /// SQLite `LIKE` folds ASCII only, so the match runs here on Unicode
    /// lowercase.
    pub async fn locations(&self, filter: &LocationFilter) -> ResultEngine<Vec<Location>> {
        let mut query = locations::Entity::find();
        if let Some(category) = filter.category() {
            query = query.filter(locations::Column::Category.eq(category));
        }

        let models = query
            .order_by_asc(locations::Column::Id)
            .all(&self.database)
            .await?;

        let needle = filter.search().map(str::to_lowercase);
        Ok(models
            .into_iter()
            .filter(|model| match &needle {
                Some(needle) => matches_search(model, needle),
                None => true,
            })
            .map(Location::from)
            .collect())
    }

    /// Distinct non-empty categories across all locations, sorted.
    pub async fn categories(&self) -> ResultEngine<Vec<String>> {
        let categories: Vec<Option<String>> = locations::Entity::find()
            .select_only()
            .column(locations::Column::Category)
            .distinct()
            .order_by_asc(locations::Column::Category)
            .into_tuple()
            .all(&self.database)
            .await?;

        Ok(categories
            .into_iter()
            .flatten()
            .filter(|category| !category.is_empty())
            .collect())
    }

    pub async fn location(&self, location_id: i32) -> ResultEngine<Location> {
        locations::Entity::find_by_id(location_id)
            .one(&self.database)
            .await?
            .map(Location::from)
            .ok_or_else(|| EngineError::KeyNotFound(format!("location {location_id}")))
    }

    /// Points for every location with both coordinates.
    pub async fn map_points(&self) -> ResultEngine<Vec<MapPoint>> {
        let models = locations::Entity::find()
            .filter(locations::Column::Latitude.is_not_null())
            .filter(locations::Column::Longitude.is_not_null())
            .order_by_asc(locations::Column::Id)
            .all(&self.database)
            .await?;

        Ok(models
            .into_iter()
            .filter_map(|model| Location::from(model).map_point())
            .collect())
    }

    /// Up to three other locations in the same category.
    ///
    /// Uncategorized locations are similar to each other.
    pub async fn similar_locations(&self, location: &Location) -> ResultEngine<Vec<Location>> {
        let same_category = match location.category.as_deref() {
            Some(category) => locations::Column::Category.eq(category),
            None => locations::Column::Category.is_null(),
        };

        let models = locations::Entity::find()
            .filter(same_category)
            .filter(locations::Column::Id.ne(location.id))
            .order_by_asc(locations::Column::Id)
            .limit(SIMILAR_LIMIT)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Location::from).collect())
    }

    /// Mean rating rounded to one decimal, `0.0` without reviews.
    pub async fn average_rating(&self, location_id: i32) -> ResultEngine<f64> {
        let ratings: Vec<i32> = reviews::Entity::find()
            .select_only()
            .column(reviews::Column::Rating)
            .filter(reviews::Column::LocationId.eq(location_id))
            .into_tuple()
            .all(&self.database)
            .await?;
        Ok(mean_rating(&ratings))
    }

    pub async fn reviews_count(&self, location_id: i32) -> ResultEngine<u64> {
        let count = reviews::Entity::find()
            .filter(reviews::Column::LocationId.eq(location_id))
            .count(&self.database)
            .await?;
        Ok(count)
    }

    pub async fn location_detail(
        &self,
        location_id: i32,
        viewer: Option<&Identity>,
    ) -> ResultEngine<LocationDetail> {
        let location = self.location(location_id).await?;
        let average_rating = self.average_rating(location_id).await?;
        let similar = self.similar_locations(&location).await?;
        let reviews = self.reviews_for(location_id).await?;
        let votes = self.vote_tally(location_id).await?;

        let viewer = match viewer {
            Some(identity) => Some(ViewerState {
                is_favorite: self.is_favorite(identity.user_id, location_id).await?,
                vote: self.user_vote(identity.user_id, location_id).await?,
            }),
            None => None,
        };

        Ok(LocationDetail {
            location,
            average_rating,
            similar,
            reviews,
            votes,
            viewer,
        })
    }
}

/// `needle` must already be lowercase.
fn matches_search(model: &locations::Model, needle: &str) -> bool {
    model.name.to_lowercase().contains(needle) || model.address.to_lowercase().contains(needle)
}

fn mean_rating(ratings: &[i32]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }

    let total: i64 = ratings.iter().copied().map(i64::from).sum();
    let mean = total as f64 / ratings.len() as f64;
    (mean * 10.0).round() / 10.0
}
