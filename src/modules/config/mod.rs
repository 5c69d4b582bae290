//! Application configuration.
//!
//! Loaded from `<data_dir>/config.json` (or an explicit path), then overridden
//! by `CALCUTTA_*` environment variables. Every field has a default, so a
//! missing file is not an error.

pub mod settings;

pub use settings::{AppConfig, ConfigError};
