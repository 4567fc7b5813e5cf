//! Kensaku Client - Backend Fetchers
//!
//! Network implementations of the core fetcher seams:
//! - Http: REST client for search, similarity snapshots and recommendations
//! - OneShot: Batch fetcher emitting one completion per session
//! - Stream: WebSocket fetcher emitting matches as they arrive
//! - Protocol: Backend wire format

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod http;
pub mod oneshot;
pub mod protocol;
pub mod stream;

pub use error::{Error, Result};
pub use http::{HttpSearchClient, SearchPage};
pub use oneshot::OneShotFetcher;
pub use protocol::{StreamMessage, StreamRequest};
pub use stream::StreamingFetcher;
