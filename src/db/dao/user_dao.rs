use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    entity::prelude::DateTimeWithTimeZone,
};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::{
    entities::{prelude::User, user},
    store::{NewUser, UserRecord, UserStore},
};

#[derive(Clone)]
pub struct UserDao {
    db: DatabaseConnection,
}

impl DaoBase for UserDao {
    type Entity = User;
    const ENTITY: &'static str = "user";

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl UserDao {
    pub async fn find_by_email(&self, email: &str) -> DaoResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn create_user(&self, new_user: NewUser) -> DaoResult<user::Model> {
        let model = user::ActiveModel {
            email: Set(new_user.email),
            display_name: Set(new_user.display_name),
            password_hash: Set(new_user.password_hash),
            role: Set(new_user.role.as_str().to_string()),
            auth_provider: Set(user::AUTH_PROVIDER_LOCAL.to_string()),
            external_id: Set(None),
            email_verified: Set(false),
            is_active: Set(true),
            last_login_at: Set(None),
            ..Default::default()
        };
        self.create(model).await
    }

    pub async fn set_password_hash(&self, id: Uuid, password_hash: String) -> DaoResult<()> {
        self.update(id, move |active| {
            active.password_hash = Set(Some(password_hash));
        })
        .await
        .map(|_| ())
    }

    pub async fn set_last_login(&self, id: Uuid, at: DateTimeWithTimeZone) -> DaoResult<()> {
        self.update(id, move |active| {
            active.last_login_at = Set(Some(at));
        })
        .await
        .map(|_| ())
    }

    pub async fn set_active(&self, id: Uuid, is_active: bool) -> DaoResult<()> {
        self.update(id, move |active| {
            active.is_active = Set(is_active);
        })
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl UserStore for UserDao {
    async fn find_by_id(&self, id: Uuid) -> DaoResult<Option<UserRecord>> {
        self.find_optional(id).await
    }

    async fn find_by_email(&self, email: &str) -> DaoResult<Option<UserRecord>> {
        UserDao::find_by_email(self, email).await
    }

    async fn insert(&self, new_user: NewUser) -> DaoResult<UserRecord> {
        self.create_user(new_user).await
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: String) -> DaoResult<()> {
        UserDao::set_password_hash(self, id, password_hash).await
    }

    async fn set_last_login(&self, id: Uuid, at: DateTimeWithTimeZone) -> DaoResult<()> {
        UserDao::set_last_login(self, id, at).await
    }
}
