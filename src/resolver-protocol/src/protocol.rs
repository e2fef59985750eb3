//! Message types exchanged with the playback host.
//!
//! Every message is a JSON object discriminated by its `_msgtype` field.

use resolver_core::config::ResolverConfig;
use resolver_core::models::MatchResult;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message received from the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_msgtype")]
pub enum Inbound {
    /// A resolve request.
    #[serde(rename = "rq")]
    Resolve(ResolveRequest),
    /// Any message kind this resolver does not handle yet.
    #[serde(other)]
    Unknown,
}

/// A resolve request with its query already validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawResolveRequest", into = "RawResolveRequest")]
pub struct ResolveRequest {
    /// Caller-chosen id echoed back in the response.
    pub qid: String,
    pub query: Query,
}

/// What the host is looking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Free text typed by a user.
    Fulltext(String),
    /// A known artist and track title.
    ArtistTrack { artist: String, track: String },
}

/// The request as it appears on the wire, before its shape is checked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawResolveRequest {
    qid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fulltext: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    track: Option<String>,
}

/// A request that carries neither `fulltext` nor both `artist` and `track`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("request {qid} needs either `fulltext` or both `artist` and `track`")]
pub struct MissingQuery {
    pub qid: String,
}

impl TryFrom<RawResolveRequest> for ResolveRequest {
    type Error = MissingQuery;

    fn try_from(raw: RawResolveRequest) -> Result<Self, Self::Error> {
        let query = match (raw.fulltext, raw.artist, raw.track) {
            (Some(text), _, _) => Query::Fulltext(text),
            (None, Some(artist), Some(track)) => Query::ArtistTrack { artist, track },
            _ => return Err(MissingQuery { qid: raw.qid }),
        };
        Ok(Self {
            qid: raw.qid,
            query,
        })
    }
}

impl From<ResolveRequest> for RawResolveRequest {
    fn from(request: ResolveRequest) -> Self {
        let (fulltext, artist, track) = match request.query {
            Query::Fulltext(text) => (Some(text), None, None),
            Query::ArtistTrack { artist, track } => (None, Some(artist), Some(track)),
        };
        Self {
            qid: request.qid,
            fulltext,
            artist,
            track,
        }
    }
}

/// Message sent to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_msgtype", rename_all = "lowercase")]
pub enum Outbound {
    /// Capability announcement, sent once before any request is read.
    Settings(Settings),
    /// Matches for one request. Never sent with an empty list.
    Results(ResultsResponse),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub name: String,
    /// Advisory response time in milliseconds.
    pub targettime: u32,
    pub weight: u32,
}

impl From<&ResolverConfig> for Settings {
    fn from(config: &ResolverConfig) -> Self {
        Self {
            name: config.name.clone(),
            targettime: config.targettime,
            weight: config.weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsResponse {
    pub qid: String,
    pub results: Vec<MatchResult>,
}

/// Errors raised while talking to the host.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("failed to read from host: {0}")]
    Read(std::io::Error),
    #[error("failed to write to host: {0}")]
    Write(std::io::Error),
    #[error("failed to encode message: {0}")]
    Encode(serde_json::Error),
    #[error("failed to decode message: {0}")]
    Decode(serde_json::Error),
    #[error("outgoing message of {0} bytes does not fit a 32-bit length prefix")]
    FrameTooLarge(usize),
}

/// Parses a frame body, rejecting anything that does not match the schema.
pub fn decode_inbound(body: &[u8]) -> Result<Inbound, ProtocolError> {
    serde_json::from_slice(body).map_err(ProtocolError::Decode)
}
