// The aggregate root for identity: validated creation, authentication,
// admin toggling, and destruction with cascades.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::core::{current_time_millis, IdGenerator, UserId};
use crate::error::{AppError, AppResult};
use crate::identity::password;
use crate::identity::validation::validate_new_user;
use crate::models::{NewUser, User};
use crate::storage::GraphStorage;

pub struct UserStore {
    storage: Arc<dyn GraphStorage>,
    ids: Arc<IdGenerator>,
}

impl UserStore {
    pub fn new(storage: Arc<dyn GraphStorage>, ids: Arc<IdGenerator>) -> Self {
        Self { storage, ids }
    }

    /// Create a user from validated attributes. Validation runs first, then
    /// a duplicate-email pre-check; the storage layer's unique index is the
    /// real guard, so a concurrent creation racing past the pre-check still
    /// fails there.
    #[instrument(skip(self, attrs), fields(email = %attrs.email))]
    pub async fn create(&self, attrs: NewUser) -> AppResult<User> {
        let violations = validate_new_user(&attrs);
        if !violations.is_empty() {
            return Err(AppError::Validation(violations));
        }

        if self.storage.get_user_by_email(&attrs.email).await?.is_some() {
            return Err(AppError::DuplicateEmail(attrs.email));
        }

        let (salt, digest) = password::hash(&attrs.password)?;
        let user = User {
            id: self.ids.next_id(),
            name: attrs.name,
            email: attrs.email,
            password_salt: salt,
            password_digest: digest,
            admin: false,
            created_at: current_time_millis(),
        };

        let user = self.storage.insert_user(user).await?;
        info!(user_id = user.id, "user created");
        Ok(user)
    }

    /// Look up by email and verify the password. Returns `None` for both an
    /// unknown email and a wrong password; the unknown-email path verifies
    /// against a dummy digest so the two cases cost the same.
    #[instrument(skip(self, password_attempt))]
    pub async fn authenticate(
        &self,
        email: &str,
        password_attempt: &str,
    ) -> AppResult<Option<User>> {
        match self.storage.get_user_by_email(email).await? {
            Some(user) => {
                if password::verify(password_attempt, &user.password_digest) {
                    Ok(Some(user))
                } else {
                    Ok(None)
                }
            }
            None => {
                let _ = password::verify(password_attempt, password::dummy_digest());
                Ok(None)
            }
        }
    }

    /// Flip the admin flag and persist the change.
    #[instrument(skip(self))]
    pub async fn toggle_admin(&self, id: UserId) -> AppResult<User> {
        let mut user = self
            .storage
            .get_user(id)
            .await?
            .ok_or(AppError::UnknownUser(id))?;
        user.admin = !user.admin;
        self.storage.update_user(&user).await?;
        info!(user_id = id, admin = user.admin, "admin flag toggled");
        Ok(user)
    }

    /// Destroy the user and everything owned by or referencing it: edges in
    /// both directions, then posts, then the record, atomically.
    #[instrument(skip(self))]
    pub async fn destroy(&self, id: UserId) -> AppResult<()> {
        if self.storage.destroy_user_cascade(id).await? {
            info!(user_id = id, "user destroyed");
            Ok(())
        } else {
            warn!(user_id = id, "destroy of unknown user");
            Err(AppError::UnknownUser(id))
        }
    }

    pub async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        self.storage.get_user(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.storage.get_user_by_email(email).await
    }
}
