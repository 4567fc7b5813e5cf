//! One-shot fetcher and REST client against a local backend

mod common;

use kensaku_client::{HttpSearchClient, OneShotFetcher};
use kensaku_core::{
    Completion, EventKind, FailureKind, FetchKind, RecommendationSource, ResultFetcher,
    SearchIntent, SessionId,
};
use tokio_util::sync::CancellationToken;

async fn fetch(query: &str, limit: u32) -> Vec<kensaku_core::SessionEvent> {
    let base = common::spawn_backend().await;
    let fetcher = OneShotFetcher::new(HttpSearchClient::new(base));
    let (sink, rx) = common::channel();
    let intent = SearchIntent::new(query, limit, 0.65).unwrap();
    fetcher
        .run(SessionId::new(7), intent, sink, CancellationToken::new())
        .await;
    common::collect(rx).await
}

#[tokio::test]
async fn test_batch_success() {
    let events = fetch("office romance", 20).await;
    assert_eq!(common::kinds(&events), vec!["start", "complete"]);
    assert!(events.iter().all(|e| e.session_id == SessionId::new(7)));

    match &events[0].kind {
        EventKind::Start(FetchKind::OneShot { query }) => assert_eq!(query, "office romance"),
        other => panic!("unexpected start: {other:?}"),
    }
    match &events[1].kind {
        EventKind::Complete(Completion::Batch { items, meta }) => {
            assert_eq!(meta.mode_label, "Hybrid");
            assert!(meta.source.is_none());
            assert_eq!(items.len(), 3);
            assert!(items[0].is_bio());
            assert_eq!(items[0].as_bio().unwrap().tier.value(), 2);
            let video = items[1].as_video().unwrap();
            assert_eq!(video.identifier, "ABC-123");
            assert_eq!(video.actress_names, vec!["Aoi", "Mei"]);
            assert_eq!(video.match_percent(), 91);
        }
        other => panic!("unexpected completion: {other:?}"),
    }
}

#[tokio::test]
async fn test_limit_is_forwarded() {
    let events = fetch("office romance", 2).await;
    match &events[1].kind {
        EventKind::Complete(Completion::Batch { items, .. }) => assert_eq!(items.len(), 2),
        other => panic!("unexpected completion: {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_batch() {
    let events = fetch("nothing", 20).await;
    assert_eq!(common::kinds(&events), vec!["start", "complete"]);
    assert!(matches!(
        &events[1].kind,
        EventKind::Complete(Completion::Batch { items, .. }) if items.is_empty()
    ));
}

#[tokio::test]
async fn test_rejection_carries_detail() {
    let events = fetch("broken", 20).await;
    assert_eq!(common::kinds(&events), vec!["start", "error"]);
    match &events[1].kind {
        EventKind::Error(failure) => {
            assert_eq!(failure.kind, FailureKind::Rejected { status: Some(503) });
            assert_eq!(failure.message, "API error: HTTP 503 (Index warming up)");
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_failure() {
    // Nothing listens on port 9 locally
    let base = url::Url::parse("http://127.0.0.1:9").unwrap();
    let fetcher = OneShotFetcher::new(HttpSearchClient::new(base));
    let (sink, rx) = common::channel();
    let intent = SearchIntent::new("beach", 20, 0.65).unwrap();
    fetcher
        .run(SessionId::new(1), intent, sink, CancellationToken::new())
        .await;

    let events = common::collect(rx).await;
    assert_eq!(common::kinds(&events), vec!["start", "error"]);
    assert!(matches!(
        &events[1].kind,
        EventKind::Error(failure) if failure.kind == FailureKind::Transport
    ));
}

#[tokio::test]
async fn test_cancelled_before_start_emits_nothing() {
    let base = common::spawn_backend().await;
    let fetcher = OneShotFetcher::new(HttpSearchClient::new(base));
    let (sink, rx) = common::channel();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let intent = SearchIntent::new("office romance", 20, 0.65).unwrap();
    fetcher.run(SessionId::new(2), intent, sink, cancel).await;
    assert!(common::collect(rx).await.is_empty());
}

#[tokio::test]
async fn test_identifier_intent_uses_snapshot() {
    let events = fetch("id:ABC-123", 20).await;
    match &events[1].kind {
        EventKind::Complete(Completion::Batch { items, meta }) => {
            let source = meta.source.as_ref().unwrap();
            assert_eq!(source.identifier, "ABC-123");
            assert!(source.image.is_none());
            assert_eq!(items[0].identifier(), "SIM-1");
        }
        other => panic!("unexpected completion: {other:?}"),
    }
}

#[tokio::test]
async fn test_recommendation_source() {
    let base = common::spawn_backend().await;
    let client = HttpSearchClient::new(base);

    let recs = client.top_items("Aoi").await.unwrap();
    assert_eq!(recs.profile.native_name.as_deref(), Some("葵"));
    let ids: Vec<_> = recs.videos.iter().map(|v| v.identifier.as_str()).collect();
    assert_eq!(ids, vec!["TOP-1", "TOP-2"]);

    let err = client.top_items("Nobody").await.unwrap_err();
    assert_eq!(err.code(), "recommendations_unavailable");
}
