pub mod error;
pub mod loader;
pub mod raw;
pub mod types;

pub use error::ConfigError;
pub use loader::load_config;
pub use types::ServiceConfig;
