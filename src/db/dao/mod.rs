pub mod base;
pub mod error;
pub mod user_dao;

pub use base::{DaoBase, HasIdActiveModel, TimestampedActiveModel};
pub use error::{DaoLayerError, DaoResult};
pub use user_dao::UserDao;
