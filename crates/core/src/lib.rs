//! Core library for projektor: movie discovery, debrid activation and
//! channel automation.

pub mod batch;
pub mod catalog;
pub mod channel;
pub mod config;
pub mod debrid;
pub mod library;
pub mod metrics;
pub mod proxy;
pub mod retry;
pub mod search;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
