pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_APP_ENV: &str = "development";
pub const DEFAULT_RUST_LOG: &str = "info,tower_http=info";
pub const DEFAULT_DEV_DATABASE_URL: &str = "sqlite://kartixa.db?mode=rwc";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_DB_MIN_IDLE: u32 = 2;
pub const DEFAULT_RATE_LIMIT_MAX: u32 = 100;
pub const DEFAULT_RATE_LIMIT_WINDOW_MS: u64 = 60_000;
pub const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000";

pub const MIN_JWT_SECRET_LEN: usize = 32;
pub const MIN_API_KEY_LEN: usize = 32;
