use crate::feat::FeatureStripper;
use crate::similarity::QuickRatio;
use resolver_core::catalog::Catalog;
use resolver_core::models::MatchResult;
use tracing::Span;

/// Minimum best-field score for a free-text hit.
pub const FULLTEXT_THRESHOLD: f64 = 0.30;
/// Minimum mean of artist and title scores for an artist+track hit.
pub const ARTIST_TRACK_THRESHOLD: f64 = 0.85;

/// Scans the catalog snapshot for candidates. Every query is one linear pass
/// and results come back in catalog order; the host does its own ranking.
pub struct CandidateSearcher<'a> {
    catalog: &'a Catalog,
    stripper: FeatureStripper,
    /// Stripped `(artist, title)` per catalog track, same order as the catalog.
    stripped: Vec<(String, String)>,
    span: Span,
}

impl<'a> CandidateSearcher<'a> {
    pub fn new(catalog: &'a Catalog, span: Span) -> Self {
        let stripper = FeatureStripper::new();
        let stripped = catalog
            .tracks()
            .iter()
            .map(|t| (stripper.strip(&t.artist), stripper.strip(&t.title)))
            .collect();
        Self {
            catalog,
            stripper,
            stripped,
            span,
        }
    }

    pub fn fulltext(&self, query: &str) -> Vec<MatchResult> {
        let _entered = self.span.enter();
        tracing::info!(query, tracks = self.catalog.len(), "Searching fulltext");

        let reference = QuickRatio::new(query);
        let locator = self.catalog.locator();
        let found: Vec<MatchResult> = self
            .catalog
            .tracks()
            .iter()
            .filter_map(|track| {
                let score = reference
                    .ratio(&track.artist)
                    .max(reference.ratio(&track.album))
                    .max(reference.ratio(&track.title));
                (score >= FULLTEXT_THRESHOLD)
                    .then(|| MatchResult::from_track(track, locator, score))
            })
            .collect();

        tracing::info!(matches = found.len(), "Fulltext search finished");
        found
    }

    pub fn artist_track(&self, artist: &str, track: &str) -> Vec<MatchResult> {
        let _entered = self.span.enter();
        tracing::info!(artist, track, tracks = self.catalog.len(), "Searching artist and track");

        let artist_ref = QuickRatio::new(&self.stripper.strip(artist));
        let track_ref = QuickRatio::new(&self.stripper.strip(track));
        let locator = self.catalog.locator();
        let found: Vec<MatchResult> = self
            .catalog
            .tracks()
            .iter()
            .zip(&self.stripped)
            .filter_map(|(candidate, (stripped_artist, stripped_title))| {
                let score_artist = artist_ref.ratio(stripped_artist);
                let score_track = track_ref.ratio(stripped_title);
                let score = (score_artist + score_track) / 2.0;
                if score < ARTIST_TRACK_THRESHOLD {
                    return None;
                }
                tracing::debug!(
                    candidate_artist = %candidate.artist,
                    candidate_title = %candidate.title,
                    score_artist,
                    score_track,
                    score,
                    "Artist and track match"
                );
                Some(MatchResult::from_track(candidate, locator, score))
            })
            .collect();

        tracing::info!(matches = found.len(), "Artist and track search finished");
        found
    }
}
