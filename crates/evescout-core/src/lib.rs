pub mod config;
pub mod models;

pub use config::{load_config, load_config_from_env, ConfigError, ScraperConfig};
pub use models::{CoreError, EventRecord, ResultPage, SearchFilter};
