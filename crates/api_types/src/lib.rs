use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error body of every failed JSON request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    /// Machine readable code, e.g. `not_found`.
    pub error: String,
    pub message: String,
}

/// Envelope shared by all page views.
///
/// The layout shows who is logged in and the pending flash notice; the page
/// specific fields are flattened next to them.
#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub current_user: Option<String>,
    pub notice: Option<notice::Notice>,
    #[serde(flatten)]
    pub body: T,
}

pub mod notice {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum NoticeLevel {
        Success,
        Info,
        Warning,
        Error,
    }

    /// One-shot message shown on the next page view.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Notice {
        pub level: NoticeLevel,
        pub message: String,
    }
}

pub mod location {
    use super::*;
    use crate::{review::ReviewView, vote::VoteTallyView};

    /// Query string of the listing page. Empty values mean "no filter".
    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ListQuery {
        pub search: Option<String>,
        pub category: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LocationView {
        pub id: i32,
        pub name: String,
        pub address: String,
        pub category: Option<String>,
        /// Display form, e.g. `10-15%`.
        pub discount: String,
        pub latitude: Option<f64>,
        pub longitude: Option<f64>,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LocationList {
        pub locations: Vec<LocationView>,
        /// Every distinct category, sorted, regardless of the filter.
        pub categories: Vec<String>,
        pub filter: ListQuery,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MapPointView {
        pub id: i32,
        pub name: String,
        pub address: String,
        pub discount: String,
        pub category: String,
        pub lat: f64,
        pub lon: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MapData {
        pub points: Vec<MapPointView>,
        pub total_points: usize,
        /// Key for the map provider's JavaScript API, when configured.
        pub api_key: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LocationDetailView {
        pub location: LocationView,
        pub average_rating: f64,
        pub similar: Vec<LocationView>,
        /// Newest first.
        pub reviews: Vec<ReviewView>,
        pub votes: VoteTallyView,
        /// `None` for anonymous visitors.
        pub is_favorite: Option<bool>,
        /// The visitor's own vote, `None` if anonymous or not voted yet.
        pub user_vote: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FavoritesList {
        pub locations: Vec<LocationView>,
    }
}

pub mod review {
    use super::*;

    /// Form body of `POST /add_review/{id}`.
    ///
    /// The rating is kept raw; unparseable input is not an error.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ReviewForm {
        pub text: String,
        pub rating: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReviewView {
        pub id: i32,
        pub username: String,
        pub text: String,
        pub rating: i32,
        pub created_at: DateTime<Utc>,
    }
}

pub mod vote {
    use super::*;

    /// Form body of `POST /vote_discount/{id}`. Only `"1"` means valid.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct VoteForm {
        #[serde(default = "VoteForm::default_is_valid")]
        pub is_valid: String,
    }

    impl VoteForm {
        fn default_is_valid() -> String {
            "1".to_string()
        }

        pub fn is_valid(&self) -> bool {
            self.is_valid == "1"
        }
    }

    impl Default for VoteForm {
        fn default() -> Self {
            Self {
                is_valid: Self::default_is_valid(),
            }
        }
    }

    #[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct VoteTallyView {
        pub valid: u64,
        pub invalid: u64,
    }
}

pub mod favorite {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FavoriteToggled {
        /// `added` or `removed`.
        pub status: String,
        pub message: String,
    }
}

pub mod user {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    pub struct RegisterForm {
        pub username: String,
        pub email: String,
        pub password: String,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    pub struct LoginForm {
        pub username: String,
        pub password: String,
    }

    /// Register and login forms. Echoes the submitted username on failure.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct FormView {
        pub username: Option<String>,
        pub email: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProfileView {
        pub username: String,
        pub email: String,
        pub created_at: DateTime<Utc>,
        pub reviews_count: u64,
        pub favorites_count: u64,
    }
}
