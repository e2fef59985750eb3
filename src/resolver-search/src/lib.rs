//! Track matching for the DAAP resolver.
//!
//! - [`similarity`]: the quick character-multiset ratio used for every score
//! - [`feat`]: strips "featuring" credits before artist+title comparison
//! - [`search`]: the two catalog scans answering host queries

pub mod feat;
pub mod search;
pub mod similarity;

pub use feat::FeatureStripper;
pub use search::{CandidateSearcher, ARTIST_TRACK_THRESHOLD, FULLTEXT_THRESHOLD};
pub use similarity::{quick_ratio, QuickRatio};
