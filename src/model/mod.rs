pub mod analytics;
pub mod config;
pub mod progress;
pub mod submission;
pub mod survey;

pub use config::{CatalogAsset, CatalogProcess, CatalogThreat, Config, SeedConfig};
pub use survey::*;
