//! Render Projector
//!
//! A pure mapping from `(RenderState, SessionEvent)` to the next
//! `RenderState` plus the render instructions a view port should apply.
//! Events from a session other than the current one produce no change.
//!
//! The projector never performs I/O. When a completed batch is dominated
//! by one collaborator it returns a [`FollowUp`] for the caller to run.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::RecommendationConfig;
use crate::event::{Completion, EventKind, Failure, FetchKind, SessionEvent, SourceMeta};
use crate::item::ResultItem;
use crate::panel::{
    EntityHeader, KnowledgePanel, ListEntry, Placeholder, Recommendations, Sidebar, VideoCard,
};
use crate::session::SessionId;

/// Mode label for similarity streams
pub const STREAMING_MODE_LABEL: &str = "Deep Similarity";

/// Results region modes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Landing page, nothing searched
    #[default]
    Home,
    /// Waiting for the first result
    ResultsLoading,
    /// Results are arriving one by one
    ResultsStreaming,
    /// Fetch finished
    ResultsDone,
    /// Fetch failed
    ResultsError,
}

impl RenderMode {
    /// Get the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::ResultsLoading => "results_loading",
            Self::ResultsStreaming => "results_streaming",
            Self::ResultsDone => "results_done",
            Self::ResultsError => "results_error",
        }
    }

    /// Check if a fetch is still in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::ResultsLoading | Self::ResultsStreaming)
    }
}

impl std::fmt::Display for RenderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derived state of the results region
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderState {
    /// Current mode
    pub mode: RenderMode,
    /// Session the state belongs to
    pub session: Option<SessionId>,
    /// Query text of that session
    pub query: Option<String>,
    /// Received items, in display order
    pub items: Vec<ResultItem>,
    /// Meta line above the list
    pub meta_text: Option<String>,
    /// Sidebar content
    pub sidebar: Option<Sidebar>,
    /// "Similar to" header
    pub similar_header: Option<SourceMeta>,
    /// Number of streamed items received
    pub partials_received: usize,
    /// Placeholder occupying the list
    pub placeholder: Option<Placeholder>,
    /// Failure shown in the list region
    pub error: Option<Failure>,
    /// Loading indicator
    pub loading: bool,
    /// A user anchor is waiting for the next streaming `Start`
    pub anchor_pending: bool,
    /// Session whose header was anchored by the user
    pub anchored_session: Option<SessionId>,
}

impl RenderState {
    /// Check if the state belongs to `id`
    #[must_use]
    pub fn belongs_to(&self, id: SessionId) -> bool {
        self.session == Some(id)
    }
}

/// A view-port command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "args", rename_all = "snake_case")]
pub enum RenderInstruction {
    /// Switch the results region mode
    SetMode(RenderMode),
    /// Toggle the loading indicator
    SetLoading(bool),
    /// Set or hide the meta line
    SetMeta(Option<String>),
    /// Replace the list content with a placeholder
    ShowPlaceholder(Placeholder),
    /// Empty the list
    ClearList,
    /// Replace the list content with entries
    ReplaceList(Vec<ListEntry>),
    /// Append one entry
    AppendItem(ListEntry),
    /// Show the sidebar with a knowledge panel
    ShowSidebar(KnowledgePanel),
    /// Append recommendations to the sidebar
    AppendSidebar(Recommendations),
    /// Hide and clear the sidebar
    HideSidebar,
    /// Show the "similar to" header
    ShowSimilarHeader(SourceMeta),
    /// Hide the "similar to" header
    HideSimilarHeader,
    /// Show an error message in the list region
    ShowError(String),
    /// Set the search box text
    SetQueryText(String),
    /// Expand or collapse the options panel
    SetOptionsPanel(bool),
    /// Open the image viewer
    OpenImage {
        /// Image URL
        src: String,
        /// Caption
        caption: String,
    },
}

/// Work the caller should start after a projection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUp {
    /// Fetch the named collaborator's top items
    Recommendations {
        /// Collaborator name
        name: String,
    },
}

/// Result of projecting one event
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// Next state
    pub state: RenderState,
    /// Instructions, in application order
    pub instructions: Vec<RenderInstruction>,
    /// Follow-up work
    pub follow_up: Option<FollowUp>,
}

impl Projection {
    fn unchanged(state: &RenderState) -> Self {
        Self {
            state: state.clone(),
            instructions: Vec::new(),
            follow_up: None,
        }
    }

    /// Check if nothing changed
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.instructions.is_empty() && self.follow_up.is_none()
    }
}

/// Pure event-to-render mapping
#[derive(Debug, Clone, Default)]
pub struct RenderProjector {
    recommendations: RecommendationConfig,
}

impl RenderProjector {
    /// Create a projector
    #[must_use]
    pub fn new(recommendations: &RecommendationConfig) -> Self {
        Self {
            recommendations: *recommendations,
        }
    }

    /// Apply an event to a state
    ///
    /// `current` is the controller's current session; anything else is
    /// discarded without instructions.
    #[must_use]
    pub fn project(
        &self,
        state: &RenderState,
        event: &SessionEvent,
        current: Option<SessionId>,
    ) -> Projection {
        if current != Some(event.session_id) {
            trace!(
                session_id = %event.session_id,
                event = %event.kind,
                "Discarding event from stale session"
            );
            return Projection::unchanged(state);
        }

        let id = event.session_id;
        match &event.kind {
            EventKind::Start(kind) => self.on_start(state, id, kind),
            EventKind::Source(meta) => self.on_source(state, id, meta),
            EventKind::Partial(item) => self.on_partial(state, id, item),
            EventKind::Complete(Completion::Batch { items, meta }) => {
                self.on_batch(state, id, items, &meta.mode_label, meta.source.as_ref())
            }
            EventKind::Complete(Completion::Streamed { total_count }) => {
                self.on_streamed(state, id, *total_count)
            }
            EventKind::Error(failure) => self.on_error(state, id, failure),
            EventKind::Recommendations(recs) => self.on_recommendations(state, id, recs.as_ref()),
        }
    }

    /// Return to the landing page
    #[must_use]
    pub fn home(&self) -> Projection {
        Projection {
            state: RenderState::default(),
            instructions: vec![
                RenderInstruction::SetLoading(false),
                RenderInstruction::ClearList,
                RenderInstruction::HideSidebar,
                RenderInstruction::HideSimilarHeader,
                RenderInstruction::SetMeta(None),
                RenderInstruction::SetMode(RenderMode::Home),
            ],
            follow_up: None,
        }
    }

    /// Anchor the "similar to" header ahead of a stream
    ///
    /// The following `Start` keeps the header when it streams the same
    /// identifier.
    #[must_use]
    pub fn anchor(&self, state: &RenderState, source: SourceMeta) -> Projection {
        let mut next = state.clone();
        next.similar_header = Some(source.clone());
        next.anchor_pending = true;
        Projection {
            state: next,
            instructions: vec![RenderInstruction::ShowSimilarHeader(source)],
            follow_up: None,
        }
    }

    /// Stop following the current session without clearing results
    ///
    /// Hides the similar header and settles an in-flight mode.
    #[must_use]
    pub fn interrupt(&self, state: &RenderState) -> Projection {
        let mut next = state.clone();
        let mut instructions = Vec::new();

        if next.similar_header.take().is_some() {
            instructions.push(RenderInstruction::HideSimilarHeader);
        }
        next.anchor_pending = false;
        next.anchored_session = None;
        if next.loading {
            next.loading = false;
            instructions.push(RenderInstruction::SetLoading(false));
        }
        if next.mode.is_loading() {
            next.mode = RenderMode::ResultsDone;
            instructions.push(RenderInstruction::SetMode(RenderMode::ResultsDone));
        }

        Projection {
            state: next,
            instructions,
            follow_up: None,
        }
    }

    fn on_start(&self, state: &RenderState, id: SessionId, kind: &FetchKind) -> Projection {
        let meta = match kind {
            FetchKind::OneShot { .. } => None,
            FetchKind::Streaming { .. } => {
                Some(format!("Mode: {STREAMING_MODE_LABEL} (Streaming...)"))
            }
        };

        if state.belongs_to(id) && !state.items.is_empty() {
            let mut next = state.clone();
            next.meta_text.clone_from(&meta);
            return Projection {
                state: next,
                instructions: vec![RenderInstruction::SetMeta(meta)],
                follow_up: None,
            };
        }

        let (query, placeholder, keep_header) = match kind {
            FetchKind::OneShot { query } => (query.clone(), Placeholder::searching(), false),
            FetchKind::Streaming { identifier } => (
                format!("{}{identifier}", crate::intent::IDENTIFIER_PREFIX),
                Placeholder::connecting(identifier),
                state
                    .similar_header
                    .as_ref()
                    .is_some_and(|header| &header.identifier == identifier),
            ),
        };

        let mut instructions = vec![
            RenderInstruction::SetMode(RenderMode::ResultsLoading),
            RenderInstruction::HideSidebar,
        ];
        let similar_header = if keep_header {
            state.similar_header.clone()
        } else {
            if state.similar_header.is_some() {
                instructions.push(RenderInstruction::HideSimilarHeader);
            }
            None
        };
        instructions.extend([
            RenderInstruction::ClearList,
            RenderInstruction::ShowPlaceholder(placeholder.clone()),
            RenderInstruction::SetLoading(true),
            RenderInstruction::SetMeta(meta.clone()),
        ]);

        Projection {
            state: RenderState {
                mode: RenderMode::ResultsLoading,
                session: Some(id),
                query: Some(query),
                items: Vec::new(),
                meta_text: meta,
                sidebar: None,
                similar_header,
                partials_received: 0,
                placeholder: Some(placeholder),
                error: None,
                loading: true,
                anchor_pending: false,
                anchored_session: (keep_header && state.anchor_pending).then_some(id),
            },
            instructions,
            follow_up: None,
        }
    }

    fn on_source(&self, state: &RenderState, id: SessionId, meta: &SourceMeta) -> Projection {
        if !state.belongs_to(id) {
            return Projection::unchanged(state);
        }
        let mut next = state.clone();
        next.similar_header = Some(meta.clone());
        Projection {
            state: next,
            instructions: vec![RenderInstruction::ShowSimilarHeader(meta.clone())],
            follow_up: None,
        }
    }

    fn on_partial(&self, state: &RenderState, id: SessionId, item: &ResultItem) -> Projection {
        if !state.belongs_to(id) {
            return Projection::unchanged(state);
        }
        let mut next = state.clone();
        let mut instructions = Vec::new();

        if next.partials_received == 0 {
            next.placeholder = None;
            next.mode = RenderMode::ResultsStreaming;
            next.loading = false;
            instructions.extend([
                RenderInstruction::ClearList,
                RenderInstruction::SetMode(RenderMode::ResultsStreaming),
                RenderInstruction::SetLoading(false),
            ]);
        }

        next.partials_received += 1;
        next.items.push(item.clone());
        if let Some(entry) = list_entry(item) {
            instructions.push(RenderInstruction::AppendItem(entry));
        }

        Projection {
            state: next,
            instructions,
            follow_up: None,
        }
    }

    fn on_batch(
        &self,
        state: &RenderState,
        id: SessionId,
        items: &[ResultItem],
        mode_label: &str,
        source: Option<&SourceMeta>,
    ) -> Projection {
        if !state.belongs_to(id) {
            return Projection::unchanged(state);
        }
        let mut next = state.clone();
        let mut instructions = vec![RenderInstruction::SetLoading(false)];
        let meta = format!("About {} results • Mode: {mode_label}", items.len());

        next.mode = RenderMode::ResultsDone;
        next.loading = false;
        next.items = items.to_vec();
        next.meta_text = Some(meta.clone());
        next.error = None;

        // A snapshot anchored on a source item shows the header instead of bios
        match source {
            Some(source) => {
                next.similar_header = Some(source.clone());
                instructions.push(RenderInstruction::ShowSimilarHeader(source.clone()));
            }
            None if next.similar_header.take().is_some() => {
                next.anchored_session = None;
                instructions.push(RenderInstruction::HideSimilarHeader);
            }
            None => {}
        }

        let panel = if source.is_none() {
            items
                .iter()
                .filter_map(ResultItem::as_bio)
                .find_map(KnowledgePanel::for_bio)
        } else {
            None
        };
        match panel {
            Some(panel) => {
                next.sidebar = Some(Sidebar {
                    panel: Some(panel.clone()),
                    recommendations: None,
                });
                instructions.push(RenderInstruction::ShowSidebar(panel));
            }
            None => {
                next.sidebar = None;
                instructions.push(RenderInstruction::HideSidebar);
            }
        }

        let entries: Vec<ListEntry> = items
            .iter()
            .filter(|item| source.is_none() || !item.is_bio())
            .filter_map(list_entry)
            .collect();
        // Hidden tiers can leave nothing to show
        if entries.is_empty() {
            let placeholder = Placeholder::NoResults {
                query: next.query.clone().unwrap_or_default(),
            };
            next.placeholder = Some(placeholder.clone());
            instructions.push(RenderInstruction::ShowPlaceholder(placeholder));
        } else {
            next.placeholder = None;
            instructions.push(RenderInstruction::ReplaceList(entries));
        }

        instructions.push(RenderInstruction::SetMeta(Some(meta)));
        instructions.push(RenderInstruction::SetMode(RenderMode::ResultsDone));

        let follow_up = if self.recommendations.enabled {
            dominant_collaborator(items, self.recommendations.dominance_percent)
                .map(|name| FollowUp::Recommendations { name })
        } else {
            None
        };
        if let Some(FollowUp::Recommendations { name }) = &follow_up {
            debug!(session_id = %id, collaborator = %name, "Dominant collaborator found");
        }

        Projection {
            state: next,
            instructions,
            follow_up,
        }
    }

    fn on_streamed(&self, state: &RenderState, id: SessionId, total: usize) -> Projection {
        if !state.belongs_to(id) {
            return Projection::unchanged(state);
        }
        let mut next = state.clone();
        let meta = format!("About {total} results • Mode: {STREAMING_MODE_LABEL}");
        let mut instructions = vec![RenderInstruction::SetLoading(false)];

        if next.partials_received == 0 {
            next.placeholder = Some(Placeholder::NoSimilarItems);
            instructions.push(RenderInstruction::ShowPlaceholder(Placeholder::NoSimilarItems));
        }
        next.mode = RenderMode::ResultsDone;
        next.loading = false;
        next.meta_text = Some(meta.clone());
        instructions.push(RenderInstruction::SetMeta(Some(meta)));
        instructions.push(RenderInstruction::SetMode(RenderMode::ResultsDone));

        Projection {
            state: next,
            instructions,
            follow_up: None,
        }
    }

    fn on_error(&self, state: &RenderState, id: SessionId, failure: &Failure) -> Projection {
        let mut next = state.clone();
        next.session = Some(id);
        next.mode = RenderMode::ResultsError;
        next.items.clear();
        next.sidebar = None;
        next.placeholder = None;
        next.meta_text = None;
        next.loading = false;
        next.error = Some(failure.clone());
        next.anchor_pending = false;

        let mut instructions = vec![
            RenderInstruction::SetLoading(false),
            RenderInstruction::SetMode(RenderMode::ResultsError),
            RenderInstruction::ClearList,
            RenderInstruction::HideSidebar,
            RenderInstruction::SetMeta(None),
        ];
        // Only a header the user anchored for this session outlives a failure
        if next.anchored_session != Some(id) && next.similar_header.take().is_some() {
            instructions.push(RenderInstruction::HideSimilarHeader);
        }
        instructions.push(RenderInstruction::ShowError(failure.message.clone()));

        Projection {
            state: next,
            instructions,
            follow_up: None,
        }
    }

    fn on_recommendations(
        &self,
        state: &RenderState,
        id: SessionId,
        recommendations: Option<&Recommendations>,
    ) -> Projection {
        let Some(recommendations) = recommendations else {
            return Projection::unchanged(state);
        };
        if !state.belongs_to(id)
            || state.mode != RenderMode::ResultsDone
            || recommendations.is_empty()
        {
            return Projection::unchanged(state);
        }

        let mut next = state.clone();
        next.sidebar
            .get_or_insert_with(Sidebar::default)
            .recommendations = Some(recommendations.clone());
        Projection {
            state: next,
            instructions: vec![RenderInstruction::AppendSidebar(recommendations.clone())],
            follow_up: None,
        }
    }
}

/// How an item renders in the list, if at all
fn list_entry(item: &ResultItem) -> Option<ListEntry> {
    match item {
        ResultItem::Video(video) => Some(ListEntry::Card(VideoCard::from(video))),
        ResultItem::EntityBio(bio) if bio.tier.shows_header() => {
            Some(ListEntry::EntityHeader(EntityHeader::from(bio)))
        }
        ResultItem::EntityBio(_) => None,
    }
}

/// Find a collaborator credited on at least `percent` of the videos
///
/// Bios are ignored. A name listed twice on one video counts once. Ties
/// go to the name seen first.
#[must_use]
pub fn dominant_collaborator(items: &[ResultItem], percent: u32) -> Option<String> {
    let videos: Vec<_> = items.iter().filter_map(ResultItem::as_video).collect();
    if videos.is_empty() {
        return None;
    }

    let mut counts: Vec<(&str, usize)> = Vec::new();
    for video in &videos {
        let mut seen: Vec<&str> = Vec::new();
        for name in video.actress_names.iter().map(|name| name.trim()) {
            if name.is_empty() || seen.contains(&name) {
                continue;
            }
            seen.push(name);
            match counts.iter_mut().find(|(known, _)| *known == name) {
                Some((_, count)) => *count += 1,
                None => counts.push((name, 1)),
            }
        }
    }

    let total = videos.len() as u64;
    let mut best: Option<(&str, usize)> = None;
    for (name, count) in counts {
        if (count as u64) * 100 < total * u64::from(percent) {
            continue;
        }
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((name, count));
        }
    }
    best.map(|(name, _)| name.to_string())
}

#[cfg(test)]
#[path = "projector_tests.rs"]
mod tests;
