//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + API_PROXY_CLIENT_ID
//!     → loader.rs (parse, deserialize, env override)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → handed to startup, which builds every subsystem from it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_default_config, ConfigError};
pub use schema::{
    CacheConfig, LimitsConfig, ListenerConfig, ObservabilityConfig, ProxyConfig, RoutesConfig,
    TimeoutConfig, UpstreamConfig,
};
pub use validation::ValidationError;
