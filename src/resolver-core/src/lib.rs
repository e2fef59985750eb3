pub mod catalog;
pub mod config;
pub mod logging;
pub mod models;
pub mod paths;

pub use catalog::{Catalog, CatalogError, CatalogProvider, CatalogResult, Database, StaticCatalog};
pub use config::{
    Config, ConfigError, DaapConfig, LogLevel, LoggingConfig, ResolverConfig, ValidationError,
};
pub use logging::{init_logging, LoggingError, LoggingGuard};
pub use models::{MatchResult, StreamLocator, StreamUrl, Track, TrackId};
pub use paths::{AppDirs, DirsError};

pub const APP_NAME: &str = "daap-resolver";
pub const APP_AUTHOR: &str = "DAAP Resolver";
pub const APP_QUALIFIER: &str = "io";
