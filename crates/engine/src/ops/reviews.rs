use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};

use crate::{
    Engine, EngineError, ResultEngine, Review, locations,
    reviews::{self, MAX_RATING, MIN_RATING},
    users, with_tx,
};

/// Turn the submitted rating into a stored one.
///
/// Missing or unparseable input defaults to the maximum rating, and so does
/// any value outside `1..=5`, including values below the minimum.
pub fn normalize_rating(raw: Option<&str>) -> i32 {
    raw.and_then(|raw| raw.trim().parse::<i32>().ok())
        .filter(|rating| (MIN_RATING..=MAX_RATING).contains(rating))
        .unwrap_or(MAX_RATING)
}

impl Engine {
    /// Store a review from `user_id` on `location_id`.
    ///
    /// The text is trimmed and must not be empty; an out-of-range rating is
    /// replaced with the maximum.
    pub async fn add_review(
        &self,
        user_id: i32,
        location_id: i32,
        text: &str,
        rating: i32,
    ) -> ResultEngine<Review> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EngineError::InvalidInput(
                "review text must not be empty".to_string(),
            ));
        }
        let rating = if (MIN_RATING..=MAX_RATING).contains(&rating) {
            rating
        } else {
            MAX_RATING
        };

        let review = with_tx!(self, |db_tx| {
            Self::insert_review(&db_tx, user_id, location_id, text, rating).await
        })?;
        tracing::debug!(
            review_id = review.id,
            location_id,
            rating,
            "review added"
        );
        Ok(review)
    }

    async fn insert_review(
        db_tx: &DatabaseTransaction,
        user_id: i32,
        location_id: i32,
        text: &str,
        rating: i32,
    ) -> ResultEngine<Review> {
        if locations::Entity::find_by_id(location_id)
            .one(db_tx)
            .await?
            .is_none()
        {
            return Err(EngineError::KeyNotFound(format!("location {location_id}")));
        }
        let author = users::Entity::find_by_id(user_id)
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("user {user_id}")))?;

        let model = reviews::ActiveModel {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::Set(user_id),
            location_id: ActiveValue::Set(location_id),
            text: ActiveValue::Set(text.to_string()),
            rating: ActiveValue::Set(rating),
            created_at: ActiveValue::Set(Utc::now()),
        }
        .insert(db_tx)
        .await?;

        Ok(Review::with_author(model, author.username))
    }

    /// Reviews of a location, newest first.
    pub async fn reviews_for(&self, location_id: i32) -> ResultEngine<Vec<Review>> {
        let rows = reviews::Entity::find()
            .filter(reviews::Column::LocationId.eq(location_id))
            .find_also_related(users::Entity)
            .order_by_desc(reviews::Column::CreatedAt)
            .order_by_desc(reviews::Column::Id)
            .all(&self.database)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(review, author)| {
                let username = author.map(|user| user.username).unwrap_or_default();
                Review::with_author(review, username)
            })
            .collect())
    }

    /// Number of reviews written by a user.
    pub async fn user_reviews_count(&self, user_id: i32) -> ResultEngine<u64> {
        let count = reviews::Entity::find()
            .filter(reviews::Column::UserId.eq(user_id))
            .count(&self.database)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_rating;

    #[test]
    fn valid_rating_is_kept() {
        assert_eq!(normalize_rating(Some("3")), 3);
        assert_eq!(normalize_rating(Some(" 1 ")), 1);
    }

    #[test]
    fn out_of_range_rating_becomes_five() {
        assert_eq!(normalize_rating(Some("7")), 5);
        assert_eq!(normalize_rating(Some("0")), 5);
        assert_eq!(normalize_rating(Some("-2")), 5);
    }

    #[test]
    fn missing_or_garbage_rating_becomes_five() {
        assert_eq!(normalize_rating(None), 5);
        assert_eq!(normalize_rating(Some("")), 5);
        assert_eq!(normalize_rating(Some("four")), 5);
    }
}
