use crate::protocol::{Inbound, Outbound, Query, ResultsResponse};
use resolver_search::CandidateSearcher;

/// Routes decoded requests to the matching search and builds the reply.
pub struct Dispatcher<'a> {
    searcher: CandidateSearcher<'a>,
}

impl<'a> Dispatcher<'a> {
    pub fn new(searcher: CandidateSearcher<'a>) -> Self {
        Self { searcher }
    }

    /// Returns the frame to send back, or `None` when nothing should be sent:
    /// no matches, or a message kind we do not handle.
    pub fn handle(&self, message: Inbound) -> Option<Outbound> {
        let request = match message {
            Inbound::Resolve(request) => request,
            Inbound::Unknown => {
                tracing::debug!("Ignoring unsupported message");
                return None;
            }
        };

        let results = match &request.query {
            Query::Fulltext(text) => self.searcher.fulltext(text),
            Query::ArtistTrack { artist, track } => self.searcher.artist_track(artist, track),
        };

        if results.is_empty() {
            return None;
        }
        Some(Outbound::Results(ResultsResponse {
            qid: request.qid,
            results,
        }))
    }
}
