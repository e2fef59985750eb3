use crate::models::{StreamLocator, Track};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// A database exposed by a share. DAAP shares normally expose exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    pub id: u32,
    #[serde(default)]
    pub name: String,
}

/// Common categories of catalog failures.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("network error: {message}")]
    NetworkError { message: String },
    #[error("protocol error: {message}")]
    ProtocolError { message: String },
    #[error("entity not found: {entity}")]
    NotFound { entity: String },
    #[error("{message}")]
    Other { message: String },
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Source of the track snapshot.
///
/// Implementations hold an established session; the resolver only ever
/// reads from them once, at startup.
pub trait CatalogProvider {
    fn databases(&self) -> CatalogResult<Vec<Database>>;

    /// The primary library among [`CatalogProvider::databases`].
    fn library(&self) -> CatalogResult<Database>;

    fn tracks(&self, database: &Database) -> CatalogResult<Vec<Track>>;

    /// URL parameters for streaming items out of `database` in this session.
    fn stream_locator(&self, database: &Database) -> StreamLocator;
}

/// Read-only snapshot of the library, shared by every request.
#[derive(Debug, Clone)]
pub struct Catalog {
    tracks: Vec<Track>,
    locator: StreamLocator,
}

impl Catalog {
    pub fn new(tracks: Vec<Track>, locator: StreamLocator) -> Self {
        Self { tracks, locator }
    }

    pub fn load(provider: &dyn CatalogProvider) -> CatalogResult<Self> {
        let library = provider.library()?;
        let database = provider
            .databases()?
            .into_iter()
            .find(|d| d.id == library.id)
            .ok_or_else(|| CatalogError::NotFound {
                entity: format!("library database {}", library.id),
            })?;

        let tracks = provider.tracks(&database)?;
        tracing::info!(
            database_id = database.id,
            database = %database.name,
            tracks = tracks.len(),
            "Catalog snapshot loaded"
        );
        Ok(Self {
            locator: provider.stream_locator(&database),
            tracks,
        })
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn locator(&self) -> &StreamLocator {
        &self.locator
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

/// An in-memory provider with a single database, used for offline catalogs
/// and fixtures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticCatalog {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_database_id")]
    pub database_id: u32,
    #[serde(default)]
    pub session_id: u32,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl StaticCatalog {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_id: default_database_id(),
            session_id: 0,
            tracks,
        }
    }

    pub fn from_json_file(path: &Path) -> CatalogResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| CatalogError::Other {
            message: format!("failed to read catalog file {}: {e}", path.display()),
        })?;
        serde_json::from_str(&contents).map_err(|e| CatalogError::ProtocolError {
            message: format!("invalid catalog file {}: {e}", path.display()),
        })
    }

    fn database(&self) -> Database {
        Database {
            id: self.database_id,
            name: "Static Library".into(),
        }
    }
}

impl CatalogProvider for StaticCatalog {
    fn databases(&self) -> CatalogResult<Vec<Database>> {
        Ok(vec![self.database()])
    }

    fn library(&self) -> CatalogResult<Database> {
        Ok(self.database())
    }

    fn tracks(&self, database: &Database) -> CatalogResult<Vec<Track>> {
        if database.id != self.database_id {
            return Err(CatalogError::NotFound {
                entity: format!("database {}", database.id),
            });
        }
        Ok(self.tracks.clone())
    }

    fn stream_locator(&self, database: &Database) -> StreamLocator {
        StreamLocator {
            host: self.host.clone(),
            port: self.port,
            database_id: database.id,
            session_id: self.session_id,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    3689
}

fn default_database_id() -> u32 {
    1
}
