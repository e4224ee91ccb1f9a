pub mod configs;
pub mod defaults;
pub mod envconfig;
pub mod validate;

pub use configs::{
    AppConfig, AuthConfig, DatabaseConfig, GeneralConfig, LoggingConfig, TransactionConfig,
    WorkforceConfig,
};
pub use envconfig::EnvConfig;
