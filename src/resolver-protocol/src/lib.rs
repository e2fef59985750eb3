//! Host protocol for the DAAP resolver.
//!
//! This crate provides:
//! - The typed messages exchanged with the host ([`protocol`])
//! - Length-prefixed framing over stdio ([`framing`])
//! - Request routing into the matching engine ([`Dispatcher`])
//! - The blocking request loop ([`RequestLoop`])
//!
//! # Conversation
//!
//! ```text
//! resolver -> host   [len]{"_msgtype":"settings","name":..,"targettime":400,"weight":100}
//! loop:
//!     host -> resolver   [len]{"_msgtype":"rq","qid":"..","fulltext":".."}
//!                     or [len]{"_msgtype":"rq","qid":"..","artist":"..","track":".."}
//!     resolver -> host   [len]{"_msgtype":"results","qid":"..","results":[..]}   (only on a match)
//! host -> resolver   [0]   (shutdown)
//! ```
//!
//! `[len]` is a 4-byte big-endian unsigned length of the JSON body that follows.
//!
//! # Usage
//!
//! ```rust,ignore
//! use resolver_protocol::{Dispatcher, FrameReader, FrameWriter, RequestLoop};
//! use resolver_search::CandidateSearcher;
//!
//! let dispatcher = Dispatcher::new(CandidateSearcher::new(&catalog, span.clone()));
//! let mut server = RequestLoop::new(
//!     FrameReader::new(std::io::stdin().lock()),
//!     writer,
//!     dispatcher,
//!     span,
//! );
//! let exit = server.run()?;
//! ```

mod dispatch;
pub mod framing;
pub mod protocol;
mod server;

pub use dispatch::Dispatcher;
pub use framing::{FrameEvent, FrameReader, FrameState, FrameWriter, MAX_FRAME_LEN};
pub use protocol::{
    decode_inbound, Inbound, MissingQuery, Outbound, ProtocolError, Query, ResolveRequest,
    ResultsResponse, Settings,
};
pub use server::{LoopExit, RequestLoop};
