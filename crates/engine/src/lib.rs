//! Storage and domain rules for the discount directory.
//!
//! [`Engine`] owns the database connection and exposes one method per
//! operation the web handlers and the bulk loader need. Entities are plain
//! sea-orm models related by id; every read returns an owned domain value.

use sea_orm::DatabaseConnection;

pub use discount::{DEFAULT_DISCOUNT, discount_display};
pub use error::EngineError;
pub use import::{ALLOWED_CATEGORIES, Candidate, SkipReason, admit, decode_feed};
pub use locations::{Location, LocationFilter, MapPoint};
pub use ops::{
    FavoriteToggle, IMPORT_BATCH_SIZE, ImportReport, LocationDetail, Profile, ViewerState,
    VoteOutcome, VoteTally, normalize_rating,
};
pub use reviews::Review;
pub use sessions::Identity;
pub use users::User;

pub mod discount_votes;
pub mod favorites;
pub mod locations;
pub mod reviews;
pub mod sessions;
pub mod users;

mod discount;
mod error;
mod import;
mod ops;

type ResultEngine<T> = Result<T, EngineError>;

/// Bounds accepted by bcrypt for the work factor.
const PASSWORD_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    password_cost: u32,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// The builder for `Engine`
pub struct EngineBuilder {
    database: DatabaseConnection,
    password_cost: u32,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            password_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override the bcrypt cost used for new password hashes.
    pub fn password_cost(mut self, cost: u32) -> EngineBuilder {
        self.password_cost = cost;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        if !PASSWORD_COST_RANGE.contains(&self.password_cost) {
            return Err(EngineError::InvalidInput(format!(
                "password cost must be between {} and {}",
                PASSWORD_COST_RANGE.start(),
                PASSWORD_COST_RANGE.end()
            )));
        }

        Ok(Engine {
            database: self.database,
            password_cost: self.password_cost,
        })
    }
}
