//! The module contains `Location`, a place offering a discount.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use crate::discount::discount_display;

/// A discount-offering place.
#[derive(Clone, Debug, PartialEq)]
pub struct Location {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub category: Option<String>,
    /// Free-text fallback used when no numeric bound is known.
    pub discount_value: Option<String>,
    pub discount_min: Option<f64>,
    pub discount_max: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Location {
    /// Human readable discount, see [`discount_display`].
    pub fn discount_display(&self) -> String {
        discount_display(
            self.discount_min,
            self.discount_max,
            self.discount_value.as_deref(),
        )
    }

    /// `(latitude, longitude)` when both are known.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }

    /// Project the location to a map point, `None` without coordinates.
    pub fn map_point(&self) -> Option<MapPoint> {
        let (lat, lon) = self.coordinates()?;
        Some(MapPoint {
            id: self.id,
            name: self.name.clone(),
            address: self.address.clone(),
            discount: self.discount_display(),
            category: self.category.clone().unwrap_or_default(),
            lat,
            lon,
        })
    }
}

impl From<Model> for Location {
    fn from(value: Model) -> Self {
        Self {
            id: value.id,
            name: value.name,
            address: value.address,
            category: value.category,
            discount_value: value.discount_value,
            discount_min: value.discount_min,
            discount_max: value.discount_max,
            latitude: value.latitude,
            longitude: value.longitude,
            description: value.description,
            created_at: value.created_at,
        }
    }
}

/// Lightweight projection consumed by the map front end.
#[derive(Clone, Debug, PartialEq)]
pub struct MapPoint {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub discount: String,
    pub category: String,
    pub lat: f64,
    pub lon: f64,
}

/// Listing filter; empty strings count as "no filter".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LocationFilter {
    /// Substring matched against name or address.
    pub search: Option<String>,
    /// Exact category.
    pub category: Option<String>,
}

impl LocationFilter {
    pub(crate) fn search(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }

    pub(crate) fn category(&self) -> Option<&str> {
        self.category.as_deref().filter(|s| !s.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "locations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub address: String,
    pub category: Option<String>,
    pub discount_value: Option<String>,
    pub discount_min: Option<f64>,
    pub discount_max: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::reviews::Entity")]
    Reviews,
    #[sea_orm(has_many = "super::favorites::Entity")]
    Favorites,
    #[sea_orm(has_many = "super::discount_votes::Entity")]
    DiscountVotes,
}

impl Related<super::reviews::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl Related<super::favorites::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Favorites.def()
    }
}

impl Related<super::discount_votes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DiscountVotes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::DEFAULT_DISCOUNT;

    fn location() -> Location {
        Location {
            id: 1,
            name: "Аптека №1".to_string(),
            address: "ул. Тверская, 1, Москва".to_string(),
            category: None,
            discount_value: None,
            discount_min: None,
            discount_max: None,
            latitude: None,
            longitude: None,
            description: None,
            created_at: Utc.timestamp_opt(0, 0).unwrap(),
        }
    }

    #[test]
    fn map_point_requires_both_coordinates() {
        let mut location = location();
        location.latitude = Some(55.75);
        assert_eq!(location.map_point(), None);

        location.longitude = Some(37.61);
        let point = location.map_point().unwrap();
        assert_eq!(point.lat, 55.75);
        assert_eq!(point.lon, 37.61);
        assert_eq!(point.category, "");
        assert_eq!(point.discount, DEFAULT_DISCOUNT);
    }

    #[test]
    fn discount_display_uses_bounds_before_value() {
        let mut location = location();
        location.discount_value = Some("По студенческому".to_string());
        assert_eq!(location.discount_display(), "По студенческому");

        location.discount_max = Some(15.0);
        assert_eq!(location.discount_display(), "15%");
    }

    #[test]
    fn empty_filter_values_are_ignored() {
        let filter = LocationFilter {
            search: Some(String::new()),
            category: Some("Кафе".to_string()),
        };
        assert_eq!(filter.search(), None);
        assert_eq!(filter.category(), Some("Кафе"));
    }
}
