use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, SqlErr, prelude::*};

use crate::{Engine, EngineError, ResultEngine, User, users};

/// A user with their activity counters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Profile {
    pub user: User,
    pub reviews_count: u64,
    pub favorites_count: u64,
}

impl Engine {
    /// Create an account.
    ///
    /// Username and email are trimmed; all three fields are required, the
    /// password is taken verbatim. The username is checked before the email,
    /// so a request clashing on both reports the username.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> ResultEngine<User> {
        let username = username.trim();
        let email = email.trim();
        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(EngineError::InvalidInput(
                "username, email and password are required".to_string(),
            ));
        }

        if self.find_user_by(users::Column::Username, username).await?.is_some() {
            return Err(EngineError::ExistingKey("username".to_string()));
        }
        if self.find_user_by(users::Column::Email, email).await?.is_some() {
            return Err(EngineError::ExistingKey("email".to_string()));
        }

        let hash = self.hash_password(password).await?;

        let model = users::ActiveModel {
            id: ActiveValue::NotSet,
            username: ActiveValue::Set(username.to_string()),
            email: ActiveValue::Set(email.to_string()),
            password: ActiveValue::Set(hash),
            created_at: ActiveValue::Set(Utc::now()),
        }
        .insert(&self.database)
        .await
        .map_err(|err| match err.sql_err() {
            // Registered concurrently between the checks and the insert.
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                EngineError::ExistingKey(clashing_key(&detail).to_string())
            }
            _ => EngineError::from(err),
        })?;

        tracing::info!(user_id = model.id, username = %model.username, "user registered");
        Ok(model.into())
    }

    /// Check a username/password pair.
    ///
    /// Unknown users and wrong passwords produce the same error.
    pub async fn authenticate(&self, username: &str, password: &str) -> ResultEngine<User> {
        let Some(model) = self
            .find_user_by(users::Column::Username, username.trim())
            .await?
        else {
            return Err(EngineError::InvalidCredentials);
        };

        let password = password.to_string();
        let hash = model.password.clone();
        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|err| EngineError::PasswordHash(err.to_string()))?;

        match verified {
            Ok(true) => Ok(model.into()),
            Ok(false) => Err(EngineError::InvalidCredentials),
            Err(err) => {
                tracing::warn!(user_id = model.id, "stored password hash unreadable: {err}");
                Err(EngineError::InvalidCredentials)
            }
        }
    }

    /// bcrypt is CPU bound, so it runs off the async workers.
    async fn hash_password(&self, password: &str) -> ResultEngine<String> {
        let password = password.to_string();
        let cost = self.password_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|err| EngineError::PasswordHash(err.to_string()))?
            .map_err(|err| EngineError::PasswordHash(err.to_string()))
    }

    pub async fn user(&self, user_id: i32) -> ResultEngine<User> {
        users::Entity::find_by_id(user_id)
            .one(&self.database)
            .await?
            .map(User::from)
            .ok_or_else(|| EngineError::KeyNotFound(format!("user {user_id}")))
    }

    pub async fn profile(&self, user_id: i32) -> ResultEngine<Profile> {
        let user = self.user(user_id).await?;
        let reviews_count = self.user_reviews_count(user_id).await?;
        let favorites_count = self.favorites_count(user_id).await?;
        Ok(Profile {
            user,
            reviews_count,
            favorites_count,
        })
    }

    async fn find_user_by(
        &self,
        column: users::Column,
        value: &str,
    ) -> ResultEngine<Option<users::Model>> {
        let user = users::Entity::find()
            .filter(column.eq(value))
            .one(&self.database)
            .await?;
        Ok(user)
    }
}

/// Which unique users column a constraint violation names.
fn clashing_key(detail: &str) -> &'static str {
    if detail.contains("email") {
        "email"
    } else {
        "username"
    }
}
