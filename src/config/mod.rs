//! Layered configuration
//!
//! Layers, lowest precedence first:
//! 1. Built-in defaults
//! 2. TOML file (`--config`)
//! 3. CLI overrides

mod defaults;
mod effective;
mod merge;
mod settings;

pub use defaults::BuiltinDefaults;
pub use effective::{ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig};
pub use merge::{deep_merge, merge_layers};
pub use settings::{
    PromotionSettings, RepositoryManagerSettings, Settings, StoreNames, MAX_REQUEST_TIMEOUT_SECONDS,
};
