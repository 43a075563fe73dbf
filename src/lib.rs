pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{AnalyticEphemeris, HorizonsEphemeris, LocalStorage};
pub use app::{build_engine, render_summary, ProfileExporter};
pub use config::TomlConfig;
pub use crate::core::engine::ProfileEngine;
pub use domain::model::{BirthRequest, DesignMode, Profile};
pub use utils::error::{GeneGraphError, Result};
