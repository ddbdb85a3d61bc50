pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use adapters::LocalStorage;
pub use app::{build_router, AppState};
pub use config::TomlConfig;
pub use crate::core::aggregator::SearchAggregator;
pub use utils::error::{Result, SearchError};
