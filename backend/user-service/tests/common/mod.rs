//! Shared fixtures: an in-memory user store and service state over the
//! in-process user events broker.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use actix_web::web;
use async_trait::async_trait;
use chrono::Utc;
use user_events::memory::InMemoryBroker;
use user_events::{UserEventProducer, USER_EVENTS_TOPIC};
use user_service::db::UserStore;
use user_service::models::{NewUser, User, UserRequest};
use user_service::services::UserService;
use user_service::{AppError, AppState, Result};

#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<BTreeMap<i64, User>>,
    next_id: AtomicI64,
    unhealthy: AtomicBool,
}

impl InMemoryUserStore {
    pub fn set_unhealthy(&self, unhealthy: bool) {
        self.unhealthy.store(unhealthy, Ordering::SeqCst);
    }

    fn email_taken(users: &BTreeMap<i64, User>, email: &str, except: Option<i64>) -> bool {
        users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn list(&self) -> Result<Vec<User>> {
        Ok(self.users.lock().unwrap().values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool> {
        let users = self.users.lock().unwrap();
        Ok(Self::email_taken(&users, email, None))
    }

    async fn create(&self, user: &NewUser) -> Result<User> {
        let mut users = self.users.lock().unwrap();
        if Self::email_taken(&users, &user.email, None) {
            return Err(AppError::Conflict(format!(
                "email '{}' is already registered",
                user.email
            )));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        let stored = User {
            id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            created_at: now,
            updated_at: now,
        };
        users.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, id: i64, user: &NewUser) -> Result<Option<User>> {
        let mut users = self.users.lock().unwrap();
        if Self::email_taken(&users, &user.email, Some(id)) {
            return Err(AppError::Conflict(format!(
                "email '{}' is already registered",
                user.email
            )));
        }

        Ok(users.get_mut(&id).map(|stored| {
            stored.name = user.name.clone();
            stored.email = user.email.clone();
            stored.phone = user.phone.clone();
            stored.updated_at = Utc::now();
            stored.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.users.lock().unwrap().remove(&id).is_some())
    }

    async fn health_check(&self) -> Result<()> {
        if self.unhealthy.load(Ordering::SeqCst) {
            return Err(AppError::Internal("store offline".into()));
        }
        Ok(())
    }
}

pub struct TestContext {
    pub state: web::Data<AppState>,
    pub broker: InMemoryBroker,
    pub store: Arc<InMemoryUserStore>,
}

impl TestContext {
    pub fn new() -> Self {
        let broker = InMemoryBroker::new();
        let store = Arc::new(InMemoryUserStore::default());
        let producer = UserEventProducer::new(Arc::new(broker.clone()), USER_EVENTS_TOPIC);
        let service = UserService::new(store.clone(), producer);

        Self {
            state: web::Data::new(AppState::new(service)),
            broker,
            store,
        }
    }

    pub async fn seed(&self, name: &str, email: &str, phone: Option<&str>) -> User {
        self.state
            .users
            .create(UserRequest {
                name: name.to_string(),
                email: email.to_string(),
                phone: phone.map(str::to_string),
            })
            .await
            .expect("seed user")
    }
}
