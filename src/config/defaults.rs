pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: i64 = 3000;
pub const DEFAULT_RUST_LOG: &str = "info,tower_http=info";
pub const DEFAULT_DB_MAX_CONNECTIONS: i64 = 10;
pub const DEFAULT_DB_MIN_IDLE: i64 = 2;
pub const DEFAULT_ACCESS_TTL_SECS: i64 = 15 * 60;
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 12;
pub const DEFAULT_DAILY_HOURS_LIMIT: f64 = 8.0;
pub const DEFAULT_WEEKLY_HOURS_LIMIT: f64 = 40.0;
pub const DEFAULT_MAX_SHIFT_HOURS: f64 = 16.0;
pub const DEFAULT_MIN_PIN_LENGTH: i64 = 4;
pub const DEFAULT_ENFORCE_DAILY_LIMIT: bool = true;
pub const DEFAULT_TRANSACTION_MAX_WAIT_MS: i64 = 2_000;
pub const DEFAULT_TRANSACTION_TIMEOUT_MS: i64 = 5_000;
