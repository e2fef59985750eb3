pub mod dmap;
mod mapping;
pub mod models;

use dmap::DmapItem;
use mapping::{map_database, map_track};
use models::{envelope, listing, LoginResponse, ServerInfo};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use resolver_core::catalog::{CatalogError, CatalogProvider, CatalogResult, Database};
use resolver_core::config::DaapConfig;
use resolver_core::models::{StreamLocator, Track};
use std::time::Duration;
use thiserror::Error;
use url::Url;

const ITEM_META: &str =
    "dmap.itemid,dmap.itemname,dmap.itemkind,daap.songartist,daap.songalbum,daap.songtime";

#[derive(Debug, Error)]
pub enum DaapError {
    #[error("invalid share address: {0}")]
    InvalidAddress(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("share refused access (HTTP {0}); password-protected shares are not supported")]
    Unauthorized(u16),
    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),
    #[error("malformed DMAP body: {0}")]
    Dmap(#[from] dmap::DmapError),
    #[error("expected `{expected}` response, got `{found}`")]
    UnexpectedResponse {
        expected: &'static str,
        found: String,
    },
    #[error("response is missing `{0}`")]
    MissingField(&'static str),
    #[error("share answered with status {0}")]
    Status(u64),
    #[error("share lists no databases")]
    NoDatabases,
}

impl From<DaapError> for CatalogError {
    fn from(err: DaapError) -> Self {
        match err {
            DaapError::Http(e) => CatalogError::NetworkError {
                message: e.to_string(),
            },
            DaapError::NoDatabases => CatalogError::NotFound {
                entity: "library database".into(),
            },
            other => CatalogError::ProtocolError {
                message: other.to_string(),
            },
        }
    }
}

/// A logged-in session against one DAAP share.
pub struct DaapSession {
    client: Client,
    base_url: Url,
    host: String,
    port: u16,
    session_id: u32,
}

impl DaapSession {
    /// Checks the share answers as a DAAP server and opens a session.
    pub fn connect(config: &DaapConfig) -> Result<Self, DaapError> {
        let base_url = Url::parse(&format!("http://{}:{}/", config.host, config.port))
            .map_err(|e| DaapError::InvalidAddress(e.to_string()))?;
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .default_headers(daap_headers())
            .build()?;

        let info = ServerInfo::from_dmap(&fetch(&client, &base_url, "server-info", &[], b"msrv")?);
        let login = LoginResponse::from_dmap(&fetch(&client, &base_url, "login", &[], b"mlog")?)?;
        tracing::info!(
            host = %config.host,
            port = config.port,
            server = info.name.as_deref().unwrap_or("unknown"),
            databases = ?info.database_count,
            session_id = login.session_id,
            "Connected to DAAP share"
        );

        Ok(Self {
            client,
            base_url,
            host: config.host.clone(),
            port: config.port,
            session_id: login.session_id,
        })
    }

    pub fn session_id(&self) -> u32 {
        self.session_id
    }

    pub fn list_databases(&self) -> Result<Vec<Database>, DaapError> {
        let root = self.fetch("databases", &[], b"avdb")?;
        Ok(listing(&root)?.into_iter().filter_map(map_database).collect())
    }

    pub fn list_tracks(&self, database_id: u32) -> Result<Vec<Track>, DaapError> {
        let root = self.fetch(
            &format!("databases/{database_id}/items"),
            &[("type", "music".into()), ("meta", ITEM_META.into())],
            b"adbs",
        )?;
        let items = listing(&root)?;
        let listed = items.len();
        let tracks: Vec<Track> = items.into_iter().filter_map(map_track).collect();
        if tracks.len() < listed {
            tracing::warn!(
                skipped = listed - tracks.len(),
                database_id,
                "Skipped items without a usable id"
            );
        }
        Ok(tracks)
    }

    fn fetch(
        &self,
        path: &str,
        query: &[(&str, String)],
        tag: &'static [u8; 4],
    ) -> Result<DmapItem, DaapError> {
        let mut params = vec![("session-id", self.session_id.to_string())];
        params.extend(query.iter().cloned());
        fetch(&self.client, &self.base_url, path, &params, tag)
    }

    fn logout(&self) {
        let Ok(url) = self.base_url.join("logout") else {
            return;
        };
        let result = self
            .client
            .get(url)
            .query(&[("session-id", self.session_id.to_string())])
            .send();
        if let Err(e) = result {
            tracing::debug!(error = %e, "DAAP logout failed");
        }
    }
}

impl CatalogProvider for DaapSession {
    fn databases(&self) -> CatalogResult<Vec<Database>> {
        Ok(self.list_databases()?)
    }

    fn library(&self) -> CatalogResult<Database> {
        // Shares publish their main library first.
        self.list_databases()?
            .into_iter()
            .next()
            .ok_or_else(|| DaapError::NoDatabases.into())
    }

    fn tracks(&self, database: &Database) -> CatalogResult<Vec<Track>> {
        Ok(self.list_tracks(database.id)?)
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

impl Drop for DaapSession {
    fn drop(&mut self) {
        self.logout();
    }
}

fn daap_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static("client-daap-version"),
        HeaderValue::from_static("3.0"),
    );
    headers.insert(
        HeaderName::from_static("client-daap-access-index"),
        HeaderValue::from_static("2"),
    );
    headers
}

fn fetch(
    client: &Client,
    base_url: &Url,
    path: &str,
    query: &[(&str, String)],
    tag: &'static [u8; 4],
) -> Result<DmapItem, DaapError> {
    let url = base_url
        .join(path)
        .map_err(|e| DaapError::InvalidAddress(e.to_string()))?;
    let resp = client.get(url).query(query).send()?;
    match resp.status() {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            return Err(DaapError::Unauthorized(resp.status().as_u16()))
        }
        status if !status.is_success() => return Err(DaapError::HttpStatus(status.as_u16())),
        _ => {}
    }
    let body = resp.bytes()?;
    envelope(dmap::decode(&body)?, tag)
}
