//! Reviews: a rated comment from a user about a location.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// Lowest accepted rating.
pub const MIN_RATING: i32 = 1;
/// Highest accepted rating, also used in place of any out-of-range value.
pub const MAX_RATING: i32 = 5;

/// A review together with its author's username.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Review {
    pub id: i32,
    pub user_id: i32,
    pub username: String,
    pub location_id: i32,
    pub text: String,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub(crate) fn with_author(model: Model, username: String) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            username,
            location_id: model.location_id,
            text: model.text,
            rating: model.rating,
            created_at: model.created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub location_id: i32,
    #[sea_orm(column_type = "Text")]
    pub text: String,
    pub rating: i32,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::locations::Entity",
        from = "Column::LocationId",
        to = "super::locations::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Location,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::locations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
