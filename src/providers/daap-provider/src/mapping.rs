use crate::models::ListingItem;
use resolver_core::catalog::Database;
use resolver_core::models::{Track, TrackId};

pub fn map_database(item: ListingItem) -> Option<Database> {
    Some(Database {
        id: u32::try_from(item.id?).ok()?,
        name: item.name.unwrap_or_default(),
    })
}

/// Items without a usable id cannot be streamed and are skipped.
pub fn map_track(item: ListingItem) -> Option<Track> {
    let id = u32::try_from(item.id?).ok()?;
    Some(Track {
        id: TrackId(id),
        artist: item.artist.unwrap_or_default(),
        title: item.name.unwrap_or_default(),
        album: item.album.unwrap_or_default(),
        duration_ms: item.time_ms,
    })
}
