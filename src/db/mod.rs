pub mod connection;
pub mod dao;
pub mod entities;
pub mod health;
pub mod store;

pub use health::DbHealth;
pub use store::{NewUser, UserRecord, UserStore};
