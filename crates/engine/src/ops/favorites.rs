use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, JoinType, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait, prelude::*,
};

use crate::{Engine, EngineError, Location, ResultEngine, favorites, locations, with_tx};

/// Result of toggling a favorite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FavoriteToggle {
    Added,
    Removed,
}

impl FavoriteToggle {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
        }
    }
}

impl Engine {
    /// Remove the favorite if present, add it otherwise.
    pub async fn toggle_favorite(
        &self,
        user_id: i32,
        location_id: i32,
    ) -> ResultEngine<FavoriteToggle> {
        let outcome = with_tx!(self, |db_tx| {
            Self::toggle_favorite_in(&db_tx, user_id, location_id).await
        });

        match outcome {
            // A concurrent toggle from the same user inserted the row first.
            Err(err) if err.is_unique_violation() => Ok(FavoriteToggle::Added),
            other => other,
        }
    }

    async fn toggle_favorite_in(
        db_tx: &DatabaseTransaction,
        user_id: i32,
        location_id: i32,
    ) -> ResultEngine<FavoriteToggle> {
        if locations::Entity::find_by_id(location_id)
            .one(db_tx)
            .await?
            .is_none()
        {
            return Err(EngineError::KeyNotFound(format!("location {location_id}")));
        }

        let existing = favorites::Entity::find()
            .filter(favorites::Column::UserId.eq(user_id))
            .filter(favorites::Column::LocationId.eq(location_id))
            .one(db_tx)
            .await?;

        match existing {
            Some(favorite) => {
                favorites::Entity::delete_by_id(favorite.id)
                    .exec(db_tx)
                    .await?;
                Ok(FavoriteToggle::Removed)
            }
            None => {
                favorites::ActiveModel {
                    id: ActiveValue::NotSet,
                    user_id: ActiveValue::Set(user_id),
                    location_id: ActiveValue::Set(location_id),
                    created_at: ActiveValue::Set(Utc::now()),
                }
                .insert(db_tx)
                .await?;
                Ok(FavoriteToggle::Added)
            }
        }
    }

    pub async fn is_favorite(&self, user_id: i32, location_id: i32) -> ResultEngine<bool> {
        let count = favorites::Entity::find()
            .filter(favorites::Column::UserId.eq(user_id))
            .filter(favorites::Column::LocationId.eq(location_id))
            .count(&self.database)
            .await?;
        Ok(count > 0)
    }

    /// Locations bookmarked by a user.
    pub async fn favorite_locations(&self, user_id: i32) -> ResultEngine<Vec<Location>> {
        let models = locations::Entity::find()
            .join(JoinType::InnerJoin, locations::Relation::Favorites.def())
            .filter(favorites::Column::UserId.eq(user_id))
            .order_by_asc(locations::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Location::from).collect())
    }

    pub async fn favorites_count(&self, user_id: i32) -> ResultEngine<u64> {
        let count = favorites::Entity::find()
            .filter(favorites::Column::UserId.eq(user_id))
            .count(&self.database)
            .await?;
        Ok(count)
    }
}
