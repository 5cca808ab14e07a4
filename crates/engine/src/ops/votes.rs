use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QuerySelect, TransactionTrait,
    prelude::*,
};

use crate::{Engine, EngineError, ResultEngine, discount_votes, locations, with_tx};

/// What a vote did to the stored state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteOutcome {
    Created,
    Updated,
}

/// Votes cast on a location's discount.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VoteTally {
    pub valid: u64,
    pub invalid: u64,
}

impl Engine {
    /// Record whether `user_id` saw the discount of `location_id` honored.
    ///
    /// A second vote by the same user overwrites the first.
    pub async fn vote_discount(
        &self,
        user_id: i32,
        location_id: i32,
        is_valid: bool,
    ) -> ResultEngine<VoteOutcome> {
        let outcome = with_tx!(self, |db_tx| {
            Self::upsert_vote(&db_tx, user_id, location_id, is_valid).await
        });

        let outcome = match outcome {
            Err(err) if err.is_unique_violation() => {
                // Lost the insert race against a concurrent vote from the same
                // user: the row exists now, so this pass updates it.
                tracing::debug!(user_id, location_id, "vote insert raced, retrying as update");
                with_tx!(self, |db_tx| {
                    Self::upsert_vote(&db_tx, user_id, location_id, is_valid).await
                })
            }
            other => other,
        }?;

        tracing::debug!(user_id, location_id, is_valid, ?outcome, "discount vote stored");
        Ok(outcome)
    }

    async fn upsert_vote(
        db_tx: &DatabaseTransaction,
        user_id: i32,
        location_id: i32,
        is_valid: bool,
    ) -> ResultEngine<VoteOutcome> {
        if locations::Entity::find_by_id(location_id)
            .one(db_tx)
            .await?
            .is_none()
        {
            return Err(EngineError::KeyNotFound(format!("location {location_id}")));
        }

        let existing = discount_votes::Entity::find()
            .filter(discount_votes::Column::UserId.eq(user_id))
            .filter(discount_votes::Column::LocationId.eq(location_id))
            .one(db_tx)
            .await?;

        match existing {
            Some(vote) => {
                let mut vote: discount_votes::ActiveModel = vote.into();
                vote.is_valid = ActiveValue::Set(is_valid);
                vote.update(db_tx).await?;
                Ok(VoteOutcome::Updated)
            }
            None => {
                discount_votes::ActiveModel {
                    id: ActiveValue::NotSet,
                    user_id: ActiveValue::Set(user_id),
                    location_id: ActiveValue::Set(location_id),
                    is_valid: ActiveValue::Set(is_valid),
                    created_at: ActiveValue::Set(Utc::now()),
                }
                .insert(db_tx)
                .await?;
                Ok(VoteOutcome::Created)
            }
        }
    }

    /// The vote `user_id` cast on `location_id`, if any.
    pub async fn user_vote(&self, user_id: i32, location_id: i32) -> ResultEngine<Option<bool>> {
        let vote = discount_votes::Entity::find()
            .filter(discount_votes::Column::UserId.eq(user_id))
            .filter(discount_votes::Column::LocationId.eq(location_id))
            .select_only()
            .column(discount_votes::Column::IsValid)
            .into_tuple::<bool>()
            .one(&self.database)
            .await?;
        Ok(vote)
    }

    pub async fn vote_tally(&self, location_id: i32) -> ResultEngine<VoteTally> {
        let valid = self.count_votes(location_id, true).await?;
        let invalid = self.count_votes(location_id, false).await?;
        Ok(VoteTally { valid, invalid })
    }

    async fn count_votes(&self, location_id: i32, is_valid: bool) -> ResultEngine<u64> {
        let count = discount_votes::Entity::find()
            .filter(discount_votes::Column::LocationId.eq(location_id))
            .filter(discount_votes::Column::IsValid.eq(is_valid))
            .count(&self.database)
            .await?;
        Ok(count)
    }
}
