use chrono::Utc;
use sea_orm::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{Engine, Identity, ResultEngine, User, sessions};

impl Engine {
    /// Open a session for `user` and return its opaque id.
    pub async fn open_session(&self, user: &User) -> ResultEngine<String> {
        let id = Uuid::new_v4().simple().to_string();
        sessions::ActiveModel {
            id: ActiveValue::Set(id.clone()),
            user_id: ActiveValue::Set(user.id),
            username: ActiveValue::Set(user.username.clone()),
            created_at: ActiveValue::Set(Utc::now()),
        }
        .insert(&self.database)
        .await?;

        tracing::debug!(user_id = user.id, "session opened");
        Ok(id)
    }

    /// Resolve a session id. Unknown ids are anonymous, not errors.
    pub async fn identity(&self, session_id: &str) -> ResultEngine<Option<Identity>> {
        let session = sessions::Entity::find_by_id(session_id.to_string())
            .one(&self.database)
            .await?;
        Ok(session.map(Identity::from))
    }

    /// Forget a session. Closing an unknown session is a no-op.
    pub async fn close_session(&self, session_id: &str) -> ResultEngine<()> {
        sessions::Entity::delete_by_id(session_id.to_string())
            .exec(&self.database)
            .await?;
        Ok(())
    }
}
