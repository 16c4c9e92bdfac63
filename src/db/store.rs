use async_trait::async_trait;
use sea_orm::entity::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

use super::{dao::DaoResult, entities::user};
use crate::auth::Role;

pub type UserRecord = user::Model;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub display_name: String,
    pub password_hash: Option<String>,
    pub role: Role,
}

/// Persistence the account service needs. Lookups return `Ok(None)` for
/// missing rows; writes against a missing id fail with `NotFound`.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> DaoResult<Option<UserRecord>>;

    async fn find_by_email(&self, email: &str) -> DaoResult<Option<UserRecord>>;

    /// Fails with `Duplicate` when the email is already taken.
    async fn insert(&self, new_user: NewUser) -> DaoResult<UserRecord>;

    async fn set_password_hash(&self, id: Uuid, password_hash: String) -> DaoResult<()>;

    async fn set_last_login(&self, id: Uuid, at: DateTimeWithTimeZone) -> DaoResult<()>;
}
