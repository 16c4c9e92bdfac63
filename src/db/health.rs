use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DbErr};

/// Connectivity check behind `/ready`.
#[async_trait]
pub trait DbHealth: Send + Sync {
    async fn ping(&self) -> Result<(), DbErr>;
}

#[async_trait]
impl DbHealth for DatabaseConnection {
    async fn ping(&self) -> Result<(), DbErr> {
        DatabaseConnection::ping(self).await
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{ConnectOptions, Database};

    use super::DbHealth;

    #[tokio::test]
    async fn sqlite_connection_answers_ping() {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1).sqlx_logging(false);
        let db = Database::connect(options).await.expect("sqlite should connect");

        DbHealth::ping(&db).await.expect("ping should succeed");
    }
}
