//! In-memory fixtures shared by unit and integration tests.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::Router;
use chrono::Utc;
use sea_orm::{DbErr, entity::prelude::DateTimeWithTimeZone};
use uuid::Uuid;

use crate::{
    auth::{
        HashParams, PasswordHasher, Role,
        bootstrap::build_auth_services_with,
        clock::{Clock, SystemClock},
    },
    config::AppConfig,
    db::{
        DbHealth, NewUser, UserRecord, UserStore,
        dao::{DaoLayerError, DaoResult},
        entities::user::AUTH_PROVIDER_LOCAL,
    },
    rate_limit::FixedWindowRateLimiter,
    routes::app,
    state::AppState,
};

pub const TEST_JWT_SECRET: &str = "test-secret-that-is-at-least-32-characters";
pub const TEST_API_KEY: &str = "test-api-key-that-is-32-characters!!";

const ENTITY: &str = "user";

pub fn low_cost_hasher() -> PasswordHasher {
    PasswordHasher::new(None, HashParams::low_cost()).expect("low cost hasher")
}

fn now() -> DateTimeWithTimeZone {
    Utc::now().fixed_offset()
}

/// A local account row with display name "Alice" and no password.
pub fn user_record(email: &str, role: Role) -> UserRecord {
    let ts = now();
    UserRecord {
        id: Uuid::new_v4(),
        email: email.to_string(),
        display_name: "Alice".to_string(),
        password_hash: None,
        role: role.as_str().to_string(),
        auth_provider: AUTH_PROVIDER_LOCAL.to_string(),
        external_id: None,
        email_verified: false,
        is_active: true,
        last_login_at: None,
        created_at: ts,
        updated_at: ts,
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<Uuid, UserRecord>>,
    failing_lookups: AtomicBool,
    duplicate_next_insert: AtomicBool,
}

impl InMemoryUserStore {
    fn with_users<T>(&self, f: impl FnOnce(&mut HashMap<Uuid, UserRecord>) -> T) -> T {
        let mut users = self.users.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut users)
    }

    fn update(&self, id: Uuid, f: impl FnOnce(&mut UserRecord)) -> DaoResult<()> {
        self.with_users(|users| match users.get_mut(&id) {
            Some(user) => {
                f(user);
                user.updated_at = now();
                Ok(())
            }
            None => Err(DaoLayerError::NotFound { entity: ENTITY, id }),
        })
    }

    pub fn get(&self, id: Uuid) -> Option<UserRecord> {
        self.with_users(|users| users.get(&id).cloned())
    }

    pub fn len(&self) -> usize {
        self.with_users(|users| users.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn set_active(&self, id: Uuid, active: bool) {
        self.update(id, |user| user.is_active = active)
            .expect("set_active on unknown user");
    }

    pub fn set_role(&self, id: Uuid, role: &str) {
        self.update(id, |user| user.role = role.to_string())
            .expect("set_role on unknown user");
    }

    /// Seeds an externally provisioned account that has no local password.
    pub fn seed_external(&self, email: &str) -> Uuid {
        let mut record = user_record(email, Role::Public);
        record.auth_provider = "oidc".to_string();
        record.external_id = Some(format!("ext-{}", record.id));
        let id = record.id;
        self.with_users(|users| users.insert(id, record));
        id
    }

    /// Makes every lookup fail as if the database were unreachable.
    pub fn fail_lookups(&self, fail: bool) {
        self.failing_lookups.store(fail, Ordering::SeqCst);
    }

    /// The next insert reports a unique violation even for a fresh email.
    pub fn fail_next_insert_as_duplicate(&self) {
        self.duplicate_next_insert.store(true, Ordering::SeqCst);
    }

    fn check_lookup(&self) -> DaoResult<()> {
        if self.failing_lookups.load(Ordering::SeqCst) {
            return Err(DaoLayerError::Db(DbErr::Custom(
                "connection refused".to_string(),
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> DaoResult<Option<UserRecord>> {
        self.check_lookup()?;
        Ok(self.get(id))
    }

    async fn find_by_email(&self, email: &str) -> DaoResult<Option<UserRecord>> {
        self.check_lookup()?;
        Ok(self.with_users(|users| users.values().find(|u| u.email == email).cloned()))
    }

    async fn insert(&self, new_user: NewUser) -> DaoResult<UserRecord> {
        if self.duplicate_next_insert.swap(false, Ordering::SeqCst) {
            return Err(DaoLayerError::Duplicate { entity: ENTITY });
        }

        self.with_users(|users| {
            if users.values().any(|u| u.email == new_user.email) {
                return Err(DaoLayerError::Duplicate { entity: ENTITY });
            }
            let mut record = user_record(&new_user.email, new_user.role);
            record.display_name = new_user.display_name;
            record.password_hash = new_user.password_hash;
            users.insert(record.id, record.clone());
            Ok(record)
        })
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: String) -> DaoResult<()> {
        self.update(id, |user| user.password_hash = Some(password_hash))
    }

    async fn set_last_login(&self, id: Uuid, at: DateTimeWithTimeZone) -> DaoResult<()> {
        self.update(id, |user| user.last_login_at = Some(at))
    }
}

/// Database stand-in whose health is switched by the test.
#[derive(Debug)]
pub struct FakeDb {
    healthy: AtomicBool,
}

impl Default for FakeDb {
    fn default() -> Self {
        Self {
            healthy: AtomicBool::new(true),
        }
    }
}

impl FakeDb {
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }
}

#[async_trait]
impl DbHealth for FakeDb {
    async fn ping(&self) -> Result<(), DbErr> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DbErr::Custom("connection refused".to_string()))
        }
    }
}

/// Development settings with accounts on, auth resolution off and a
/// generous rate limit.
pub fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: Some(TEST_JWT_SECRET.to_string()),
        rate_limit_max: 1_000,
        ..AppConfig::default()
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub store: Arc<InMemoryUserStore>,
    pub db: Arc<FakeDb>,
}

pub fn test_app(cfg: AppConfig) -> TestApp {
    test_app_with_clock(cfg, Arc::new(SystemClock))
}

pub fn test_app_with_clock(cfg: AppConfig, clock: Arc<dyn Clock>) -> TestApp {
    let store = Arc::new(InMemoryUserStore::default());
    let auth = build_auth_services_with(&cfg, store.clone(), HashParams::low_cost(), clock)
        .expect("auth services");
    let limiter = Arc::new(FixedWindowRateLimiter::new(
        cfg.rate_limit_max,
        Duration::from_millis(cfg.rate_limit_window_ms),
    ));
    let db = Arc::new(FakeDb::default());
    let state = AppState::new(cfg, auth, limiter, db.clone());
    TestApp {
        router: app(Arc::clone(&state)),
        state,
        store,
        db,
    }
}

pub fn test_router(cfg: AppConfig) -> Router {
    test_app(cfg).router
}
