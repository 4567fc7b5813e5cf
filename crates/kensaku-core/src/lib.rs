//! Kensaku Core - Search Session State Machine
//!
//! This crate provides the client-side state machine behind the Kensaku
//! search UI:
//! - Intent: Search intents parsed from query text and URL parameters
//! - Item: Result items (videos and entity bios) and their display tiers
//! - Panel: DOM-agnostic presentation models (cards, headers, knowledge panel)
//! - Event: Session-tagged events produced by result fetchers
//! - Session: Session controller owning the current search and its cancellation
//! - Projector: Pure mapping from events to render state and render instructions
//! - Store: View-state store with URL synchronisation
//! - Port: Output ports (view, history) and fetcher seams
//! - App: The event loop tying the pieces together
//!
//! ## Usage
//!
//! ```ignore
//! use kensaku_core::{ClientConfig, Fetchers, MemoryHistory, SearchApp, UiAction};
//!
//! let config = ClientConfig::default();
//! let history = MemoryHistory::new("http://localhost/".parse()?);
//! let mut app = SearchApp::new(&config, fetchers, view, history);
//!
//! app.dispatch(UiAction::Submit("office romance".into()));
//! app.settle().await;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod action;
pub mod app;
pub mod config;
pub mod error;
pub mod event;
pub mod intent;
pub mod item;
pub mod panel;
pub mod port;
pub mod projector;
pub mod session;
pub mod store;

// Re-export main types
pub use action::UiAction;
pub use app::{Fetchers, SearchApp};
pub use config::{ClientConfig, RecommendationConfig, SearchDefaults};
pub use error::{Error, Result};
pub use event::{
    BatchMeta, Completion, EventKind, Failure, FailureKind, FetchKind, SessionEvent, SourceMeta,
};
pub use intent::{SearchIntent, SearchMode, IDENTIFIER_PREFIX};
pub use item::{DisplayTier, EntityBio, Fact, ResultItem, SocialLink, Video};
pub use panel::{
    CollaboratorProfile, EntityHeader, KnowledgePanel, ListEntry, PanelHeading, Placeholder,
    Recommendations, Sidebar, VideoCard,
};
pub use port::{
    EventSink, HistoryPort, MemoryHistory, RecommendationSource, ResultFetcher, SessionEmitter,
    ViewPort,
};
pub use projector::{
    dominant_collaborator, FollowUp, Projection, RenderInstruction, RenderMode, RenderProjector,
    RenderState,
};
pub use session::{Session, SessionController, SessionId, SessionStatus};
pub use store::{intent_from_url, url_for_intent, UiMode, ViewStateStore};
