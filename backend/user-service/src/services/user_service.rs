//! User directory operations on top of a [`UserStore`], plus manual
//! notification through the user event producer.

use std::sync::Arc;

use tracing::{info, warn};
use user_events::{PublishResult, UserEventProducer, UserRecord};

use crate::db::UserStore;
use crate::error::{AppError, Result};
use crate::models::{User, UserRequest};

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    producer: UserEventProducer,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, producer: UserEventProducer) -> Self {
        Self { store, producer }
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        self.store.list().await
    }

    pub async fn get(&self, id: i64) -> Result<User> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {} not found", id)))
    }

    pub async fn create(&self, request: UserRequest) -> Result<User> {
        let new_user = request.into_new_user()?;

        if self.store.exists_by_email(&new_user.email).await? {
            warn!(email = %new_user.email, "Rejected user with duplicate email");
            return Err(AppError::Conflict(format!(
                "email '{}' is already registered",
                new_user.email
            )));
        }

        let user = self.store.create(&new_user).await?;
        info!(user_id = user.id, email = %user.email, "Created user");
        Ok(user)
    }

    pub async fn update(&self, id: i64, request: UserRequest) -> Result<User> {
        let new_user = request.into_new_user()?;

        let existing = self.get(id).await?;
        if existing.email != new_user.email && self.store.exists_by_email(&new_user.email).await? {
            warn!(user_id = id, email = %new_user.email, "Rejected update to duplicate email");
            return Err(AppError::Conflict(format!(
                "email '{}' is already registered",
                new_user.email
            )));
        }

        let user = self
            .store
            .update(id, &new_user)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {} not found", id)))?;
        info!(user_id = user.id, "Updated user");
        Ok(user)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if !self.store.delete(id).await? {
            return Err(AppError::NotFound(format!("user {} not found", id)));
        }
        info!(user_id = id, "Deleted user");
        Ok(())
    }

    /// Publish the stored record for `id` to the user events topic.
    pub async fn notify(&self, id: i64) -> Result<PublishResult> {
        let user = self.get(id).await?;
        let result = self.producer.publish(&UserRecord::from(&user)).await?;
        info!(
            user_id = id,
            topic = %result.topic,
            offset = result.offset,
            "Sent user notification"
        );
        Ok(result)
    }

    pub async fn health_check(&self) -> Result<()> {
        self.store.health_check().await
    }
}
