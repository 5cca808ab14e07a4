//! Engine operations, one module per concern.
//!
//! Every method takes `&self`: the engine holds no mutable state besides the
//! connection pool, and concurrent requests are serialized by the database.

mod favorites;
mod import;
mod locations;
mod reviews;
mod sessions;
mod users;
mod votes;

pub use favorites::FavoriteToggle;
pub use import::{IMPORT_BATCH_SIZE, ImportReport};
pub use locations::{LocationDetail, ViewerState};
pub use reviews::normalize_rating;
pub use users::Profile;
pub use votes::{VoteOutcome, VoteTally};

/// How many similar locations a detail page lists.
pub(crate) const SIMILAR_LIMIT: u64 = 3;
