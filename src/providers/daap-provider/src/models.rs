use crate::dmap::DmapItem;
use crate::DaapError;

const STATUS_OK: u64 = 200;

/// `GET /server-info`
#[derive(Debug)]
pub struct ServerInfo {
    pub name: Option<String>,
    pub database_count: Option<u64>,
}

/// `GET /login`
#[derive(Debug)]
pub struct LoginResponse {
    pub session_id: u32,
}

/// One `mlit` of a database or item listing.
#[derive(Debug, Default)]
pub struct ListingItem {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub time_ms: Option<u64>,
}

/// Picks the single top-level element named `tag` and checks its `mstt`.
pub fn envelope(items: Vec<DmapItem>, tag: &'static [u8; 4]) -> Result<DmapItem, DaapError> {
    let root = items
        .into_iter()
        .next()
        .ok_or(DaapError::MissingField(tag_name(tag)))?;
    if !root.is(tag) {
        return Err(DaapError::UnexpectedResponse {
            expected: tag_name(tag),
            found: root.tag.to_string(),
        });
    }
    match root.child_int(b"mstt") {
        Some(STATUS_OK) => Ok(root),
        Some(status) => Err(DaapError::Status(status)),
        None => Err(DaapError::MissingField("mstt")),
    }
}

fn tag_name(tag: &'static [u8; 4]) -> &'static str {
    std::str::from_utf8(tag).unwrap_or("????")
}

impl ServerInfo {
    pub fn from_dmap(root: &DmapItem) -> Self {
        Self {
            name: root.child_text(b"minm").map(str::to_owned),
            database_count: root.child_int(b"msdc"),
        }
    }
}

impl LoginResponse {
    pub fn from_dmap(root: &DmapItem) -> Result<Self, DaapError> {
        let session_id = root
            .child_int(b"mlid")
            .ok_or(DaapError::MissingField("mlid"))?;
        Ok(Self {
            session_id: session_id as u32,
        })
    }
}

impl ListingItem {
    pub fn from_dmap(item: &DmapItem) -> Self {
        Self {
            id: item.child_int(b"miid"),
            name: item.child_text(b"minm").map(str::to_owned),
            artist: item.child_text(b"asar").map(str::to_owned),
            album: item.child_text(b"asal").map(str::to_owned),
            time_ms: item.child_int(b"astm"),
        }
    }
}

/// Every `mlit` under the envelope's `mlcl`.
pub fn listing(root: &DmapItem) -> Result<Vec<ListingItem>, DaapError> {
    let list = root
        .child(b"mlcl")
        .ok_or(DaapError::MissingField("mlcl"))?;
    Ok(list
        .children()
        .iter()
        .filter(|item| item.is(b"mlit"))
        .map(ListingItem::from_dmap)
        .collect())
}
