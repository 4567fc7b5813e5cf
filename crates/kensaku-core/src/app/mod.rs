//! Search App - the event loop
//!
//! Ties the session controller, the fetchers, the render projector and the
//! view-state store together. Actions come in through [`SearchApp::dispatch`];
//! fetchers run as spawned tasks and report back over one unbounded channel
//! that the app drains in delivery order.
//!
//! The app is meant for a current-thread runtime: it is the single writer
//! of render state and session status, so nothing here takes a lock.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use url::Url;

use crate::action::UiAction;
use crate::config::ClientConfig;
use crate::event::{EventKind, SessionEvent, SourceMeta};
use crate::intent::{SearchIntent, SearchMode, IDENTIFIER_PREFIX};
use crate::port::{HistoryPort, RecommendationSource, ResultFetcher, ViewPort};
use crate::projector::{FollowUp, Projection, RenderInstruction, RenderProjector, RenderState};
use crate::session::{SessionController, SessionId};
use crate::store::ViewStateStore;


/// Collaborators that talk to the backend
#[derive(Clone)]
pub struct Fetchers {
    /// One-shot fetcher for text intents
    pub text: Arc<dyn ResultFetcher>,
    /// Streaming fetcher for identifier intents
    pub similar: Arc<dyn ResultFetcher>,
    /// Collaborator lookup for the sidebar
    pub recommendations: Arc<dyn RecommendationSource>,
}

impl Fetchers {
    fn for_mode(&self, mode: SearchMode) -> Arc<dyn ResultFetcher> {
        match mode {
            SearchMode::Text => Arc::clone(&self.text),
            SearchMode::ByIdentifier => Arc::clone(&self.similar),
        }
    }
}

/// The search UI state machine
pub struct SearchApp<V, H> {
    controller: SessionController,
    projector: RenderProjector,
    state: RenderState,
    store: ViewStateStore,
    view: V,
    history: H,
    fetchers: Fetchers,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    tasks: JoinSet<()>,
}

impl<V: ViewPort, H: HistoryPort> SearchApp<V, H> {
    /// Create an app at Home
    ///
    /// URLs are built against the history's current URL.
    pub fn new(config: &ClientConfig, fetchers: Fetchers, view: V, history: H) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let store = ViewStateStore::new(config.search, history.current());
        Self {
            controller: SessionController::new(),
            projector: RenderProjector::new(&config.recommendations),
            state: RenderState::default(),
            store,
            view,
            history,
            fetchers,
            events_tx,
            events_rx,
            tasks: JoinSet::new(),
        }
    }

    /// Restore from the URL the host was opened with
    ///
    /// Must be called within a tokio runtime.
    pub fn boot(&mut self) -> Option<SessionId> {
        let url = self.history.current();
        let intent = self.store.initial_load(&url);
        if self.store.options_expanded() {
            self.view.apply(&RenderInstruction::SetOptionsPanel(true));
        }

        match intent {
            Some(intent) => {
                info!(url = %url, "Booting from search url");
                Some(self.begin(intent, false))
            }
            None => {
                let projection = self.projector.home();
                self.apply(projection);
                None
            }
        }
    }

    /// Handle a user action
    ///
    /// Must be called within a tokio runtime.
    pub fn dispatch(&mut self, action: UiAction) {
        debug!(action = action.name(), "Dispatching action");
        match action {
            UiAction::Submit(query) => self.submit(&query),
            UiAction::FindSimilar {
                identifier,
                title,
                image,
            } => self.find_similar(&identifier, title, image),
            UiAction::CopyId(identifier) => {
                if !self.view.copy_to_clipboard(&identifier) {
                    debug!(identifier = %identifier, "Clipboard unavailable");
                }
            }
            UiAction::ViewImage { src, caption } => {
                self.view.apply(&RenderInstruction::OpenImage { src, caption });
            }
            UiAction::SetLimit(limit) => {
                self.store.set_limit(limit);
                self.rerun();
            }
            UiAction::SetThreshold(threshold) => {
                self.store.set_threshold(threshold);
                self.rerun();
            }
            UiAction::ToggleOptions => {
                let expanded = self.store.toggle_options();
                self.view.apply(&RenderInstruction::SetOptionsPanel(expanded));
            }
            UiAction::CloseSimilar => self.close_similar(),
            UiAction::Reset => self.reset(),
            UiAction::Navigate(url) => self.navigate(&url),
        }
    }

    fn submit(&mut self, query: &str) {
        match self.store.intent_for(query) {
            Ok(intent) => {
                self.begin(intent, true);
            }
            Err(err) => debug!(code = err.code(), "Ignoring submit"),
        }
    }

    fn find_similar(&mut self, identifier: &str, title: String, image: Option<String>) {
        let intent =
            match SearchIntent::by_identifier(identifier, self.store.limit(), self.store.threshold())
            {
                Ok(intent) => intent,
                Err(err) => {
                    debug!(code = err.code(), "Ignoring find-similar");
                    return;
                }
            };

        let source = SourceMeta::new(identifier.trim(), title).with_image(image);
        let projection = self.projector.anchor(&self.state, source);
        self.apply(projection);
        self.begin(intent, true);
    }

    /// Re-issue the active search with the current parameters
    fn rerun(&mut self) {
        let intent = match &self.state.similar_header {
            Some(header) => SearchIntent::by_identifier(
                &header.identifier,
                self.store.limit(),
                self.store.threshold(),
            ),
            None if !self.store.query_text().trim().is_empty() => {
                self.store.intent_for(self.store.query_text())
            }
            None => return,
        };
        if let Ok(intent) = intent {
            self.begin(intent, true);
        }
    }

    fn close_similar(&mut self) {
        let Some(header) = self.state.similar_header.clone() else {
            return;
        };
        self.controller.cancel_current();
        let projection = self.projector.interrupt(&self.state);
        self.apply(projection);

        let text = format!("{IDENTIFIER_PREFIX}{}", header.identifier);
        self.view.apply(&RenderInstruction::SetQueryText(text.clone()));
        self.store.set_query_text(text);
    }

    fn reset(&mut self) {
        self.go_home();
        let url = self.store.reset();
        self.history.push(&url);
    }

    fn go_home(&mut self) {
        self.controller.cancel_current();
        let projection = self.projector.home();
        self.apply(projection);
        self.view.apply(&RenderInstruction::SetQueryText(String::new()));
        self.view.apply(&RenderInstruction::SetOptionsPanel(false));
    }

    /// History navigation: rebuild everything from the URL
    fn navigate(&mut self, url: &Url) {
        if self.state.similar_header.is_some() {
            let projection = self.projector.interrupt(&self.state);
            self.apply(projection);
        }

        match self.store.restore_from_url(url) {
            Some(intent) => {
                info!(url = %url, "Restoring search from history");
                self.begin(intent, false);
            }
            None => {
                self.go_home();
                self.store.reset();
            }
        }
    }

    /// Start a session and spawn its fetcher
    fn begin(&mut self, intent: SearchIntent, push: bool) -> SessionId {
        if push {
            let url = self.store.record_search(&intent);
            self.history.push(&url);
        } else {
            self.store.note_search(&intent);
        }
        self.view.apply(&RenderInstruction::SetQueryText(
            intent.query_text().to_string(),
        ));

        let fetcher = self.fetchers.for_mode(intent.mode());
        let session_id = self.controller.start_search(intent.clone());
        let cancel = self.controller.current_token().unwrap_or_default();
        let sink = self.events_tx.clone();
        self.tasks.spawn(async move {
            fetcher.run(session_id, intent, sink, cancel).await;
        });
        session_id
    }

    fn handle_event(&mut self, event: SessionEvent) {
        let current = self.controller.current_session_id();
        if current != Some(event.session_id) {
            debug!(
                session_id = %event.session_id,
                event = %event.kind,
                "Dropped event from stale session"
            );
            return;
        }

        match &event.kind {
            EventKind::Error(failure) => warn!(
                session_id = %event.session_id,
                code = failure.code(),
                message = %failure.message,
                "Search failed"
            ),
            EventKind::Complete(_) => info!(session_id = %event.session_id, "Search complete"),
            _ => {}
        }

        self.controller.observe(&event);
        let projection = self.projector.project(&self.state, &event, current);
        self.apply(projection);
    }

    fn apply(&mut self, projection: Projection) {
        for instruction in &projection.instructions {
            self.view.apply(instruction);
        }
        self.state = projection.state;
        self.store
            .set_similar_header_visible(self.state.similar_header.is_some());

        if let Some(FollowUp::Recommendations { name }) = projection.follow_up {
            self.spawn_recommendations(name);
        }
    }

    fn spawn_recommendations(&mut self, name: String) {
        let Some(session_id) = self.controller.current_session_id() else {
            return;
        };
        let source = Arc::clone(&self.fetchers.recommendations);
        let sink = self.events_tx.clone();
        self.tasks.spawn(async move {
            let recommendations = match source.top_items(&name).await {
                Ok(recommendations) => Some(recommendations),
                Err(err) => {
                    warn!(
                        session_id = %session_id,
                        collaborator = %name,
                        error = %err,
                        "Recommendations lookup failed"
                    );
                    None
                }
            };
            // The loop may already be gone on shutdown
            let _ = sink.send(SessionEvent::new(
                session_id,
                EventKind::Recommendations(recommendations),
            ));
        });
    }

    /// Apply every event that is already queued
    pub fn drain_ready(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            applied += 1;
        }
        applied
    }

    /// Check if no fetcher or follow-up is running
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run until every spawned task has finished and its events are applied
    pub async fn settle(&mut self) {
        loop {
            self.drain_ready();
            if self.tasks.is_empty() {
                break;
            }

            tokio::select! {
                Some(event) = self.events_rx.recv() => self.handle_event(event),
                Some(joined) = self.tasks.join_next() => {
                    if let Err(err) = joined {
                        warn!(error = %err, "Fetch task ended abnormally");
                    }
                }
            }
        }
    }

    /// Current render state
    #[must_use]
    pub fn state(&self) -> &RenderState {
        &self.state
    }

    /// View state
    #[must_use]
    pub fn store(&self) -> &ViewStateStore {
        &self.store
    }

    /// Session controller
    #[must_use]
    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    /// The view port
    #[must_use]
    pub fn view(&self) -> &V {
        &self.view
    }

    /// The history port
    #[must_use]
    pub fn history(&self) -> &H {
        &self.history
    }
}
