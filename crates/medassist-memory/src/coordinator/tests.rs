//! Tests for the memory coordinator

use super::*;
use crate::backend::MockMemoryBackend;
use crate::backends::{HistoryStore, RecencyWindow};
use std::time::Duration;

fn hit(key: &str, relevance: f32) -> MemoryQueryResult {
    MemoryQueryResult::new(
        MemoryRecord::from_new(key, NewRecord::new(format!("content of {key}"))),
        relevance,
    )
}

fn mock(kind: MemoryKind, results: Vec<MemoryQueryResult>) -> MockMemoryBackend {
    let mut backend = MockMemoryBackend::new();
    backend.expect_kind().return_const(kind);
    backend.expect_name().return_const(format!("mock-{kind}"));
    backend
        .expect_search()
        .returning(move |_, _, _| Ok(results.clone()));
    backend
}

fn failing(kind: MemoryKind) -> MockMemoryBackend {
    let mut backend = MockMemoryBackend::new();
    backend.expect_kind().return_const(kind);
    backend.expect_name().return_const(format!("broken-{kind}"));
    backend.expect_search().returning(move |_, _, _| {
        Err(Error::Backend {
            backend: "broken".into(),
            message: "connection refused".into(),
        })
    });
    backend
}

fn unweighted() -> CoordinatorConfig {
    CoordinatorConfig {
        default_weights: BTreeMap::new(),
        ..CoordinatorConfig::default()
    }
}

#[tokio::test]
async fn test_search_queries_all_registered() {
    let coordinator = MemoryCoordinator::builder()
        .with_config(unweighted())
        .register(Arc::new(mock(MemoryKind::Similarity, vec![hit("d1", 0.9)])))
        .register(Arc::new(mock(MemoryKind::WorkflowGraph, vec![hit("p1", 0.4)])))
        .build();

    let results = coordinator.search(&MemoryQuery::new("nausea")).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[&MemoryKind::Similarity][0].record.key, "d1");
    assert_eq!(results[&MemoryKind::WorkflowGraph][0].record.key, "p1");
}

#[tokio::test]
async fn test_failing_backend_yields_empty_entry() {
    let coordinator = MemoryCoordinator::builder()
        .with_config(unweighted())
        .register(Arc::new(failing(MemoryKind::LongTermHistory)))
        .register(Arc::new(mock(MemoryKind::Similarity, vec![hit("d1", 0.9)])))
        .build();

    let results = coordinator.search(&MemoryQuery::new("nausea")).await.unwrap();

    assert!(results[&MemoryKind::LongTermHistory].is_empty());
    assert_eq!(results[&MemoryKind::Similarity].len(), 1);
}

#[tokio::test]
async fn test_no_backends_is_error() {
    let coordinator = MemoryCoordinator::builder().build();
    let err = coordinator.search(&MemoryQuery::new("x")).await.unwrap_err();
    assert!(matches!(err, Error::NoBackends));
}

#[tokio::test]
async fn test_only_unregistered_kinds_is_error() {
    let coordinator = MemoryCoordinator::builder()
        .register(Arc::new(mock(MemoryKind::Similarity, Vec::new())))
        .build();
    let query = MemoryQuery::new("x").with_kinds([MemoryKind::WorkflowGraph]);
    let err = coordinator.search(&query).await.unwrap_err();
    assert!(matches!(err, Error::NoBackends));
}

#[tokio::test]
async fn test_explicit_kinds_skip_unregistered() {
    let coordinator = MemoryCoordinator::builder()
        .with_config(unweighted())
        .register(Arc::new(mock(MemoryKind::Similarity, vec![hit("d1", 0.5)])))
        .build();
    let query = MemoryQuery::new("x").with_kinds([MemoryKind::WorkflowGraph, MemoryKind::Similarity]);

    let results = coordinator.search(&query).await.unwrap();

    assert_eq!(results.keys().copied().collect::<Vec<_>>(), vec![MemoryKind::Similarity]);
}

#[tokio::test]
async fn test_zero_weight_backend_not_queried() {
    let mut silent = MockMemoryBackend::new();
    silent.expect_kind().return_const(MemoryKind::LongTermHistory);
    silent.expect_name().return_const("silent".to_string());
    silent.expect_search().never();

    let coordinator = MemoryCoordinator::builder()
        .with_config(unweighted())
        .register(Arc::new(silent))
        .register(Arc::new(mock(MemoryKind::Similarity, vec![hit("d1", 0.5)])))
        .build();
    let query = MemoryQuery::new("x").with_weight(MemoryKind::LongTermHistory, 0.0);

    let results = coordinator.search(&query).await.unwrap();

    assert!(!results.contains_key(&MemoryKind::LongTermHistory));
    assert!(results.contains_key(&MemoryKind::Similarity));
}

#[tokio::test]
async fn test_weight_scales_kept_items() {
    let many: Vec<_> = (0..5).map(|i| hit(&format!("h{i}"), 0.9 - i as f32 * 0.1)).collect();
    let coordinator = MemoryCoordinator::builder()
        .register(Arc::new(mock(MemoryKind::LongTermHistory, many)))
        .build();

    // default weight for long-term history is 0.5: ceil(5 * 0.5) = 3
    let results = coordinator.search(&MemoryQuery::new("x").with_limit(5)).await.unwrap();
    assert_eq!(results[&MemoryKind::LongTermHistory].len(), 3);

    let tiny = MemoryQuery::new("x")
        .with_limit(5)
        .with_weight(MemoryKind::LongTermHistory, 0.01);
    let results = coordinator.search(&tiny).await.unwrap();
    assert_eq!(results[&MemoryKind::LongTermHistory].len(), 1);
}

#[test]
fn test_kept_count_bounds() {
    assert_eq!(MemoryCoordinator::kept_count(5, 1.0), 5);
    assert_eq!(MemoryCoordinator::kept_count(5, 2.5), 5);
    assert_eq!(MemoryCoordinator::kept_count(5, 0.5), 3);
    assert_eq!(MemoryCoordinator::kept_count(5, 0.01), 1);
}

#[tokio::test]
async fn test_results_sorted_with_key_tiebreak() {
    let unsorted = vec![hit("b", 0.5), hit("c", 0.9), hit("a", 0.5)];
    let coordinator = MemoryCoordinator::builder()
        .with_config(unweighted())
        .register(Arc::new(mock(MemoryKind::Similarity, unsorted)))
        .build();

    let results = coordinator.search(&MemoryQuery::new("x")).await.unwrap();
    let keys: Vec<_> = results[&MemoryKind::Similarity]
        .iter()
        .map(|r| r.record.key.as_str())
        .collect();
    assert_eq!(keys, vec!["c", "a", "b"]);
}

#[tokio::test]
async fn test_unified_context_empty_when_nothing_found() {
    let coordinator = MemoryCoordinator::builder()
        .register(Arc::new(mock(MemoryKind::Similarity, Vec::new())))
        .build();
    let context = coordinator
        .build_unified_context(&MemoryQuery::new("x"))
        .await
        .unwrap();
    assert!(context.is_empty());
    assert_eq!(context.render(), "");
}

#[tokio::test]
async fn test_health_summary() {
    let mut alive = MockMemoryBackend::new();
    alive.expect_kind().return_const(MemoryKind::Similarity);
    alive.expect_name().return_const("alive".to_string());
    alive.expect_health_check().returning(|| true);

    let mut dead = MockMemoryBackend::new();
    dead.expect_kind().return_const(MemoryKind::LongTermHistory);
    dead.expect_name().return_const("dead".to_string());
    dead.expect_health_check().returning(|| false);

    let coordinator = MemoryCoordinator::builder()
        .register(Arc::new(alive))
        .register(Arc::new(dead))
        .build();

    let summary = coordinator.health_summary().await;
    assert!(summary.overall);
    assert!(summary.backends[&MemoryKind::Similarity]);
    assert!(!summary.backends[&MemoryKind::LongTermHistory]);
}

#[tokio::test]
async fn test_health_summary_all_down() {
    let mut dead = MockMemoryBackend::new();
    dead.expect_kind().return_const(MemoryKind::WorkflowGraph);
    dead.expect_name().return_const("dead".to_string());
    dead.expect_health_check().returning(|| false);

    let coordinator = MemoryCoordinator::builder().register(Arc::new(dead)).build();
    assert!(!coordinator.health_summary().await.overall);
    assert!(!MemoryCoordinator::builder().build().health_summary().await.overall);
}

#[tokio::test]
async fn test_store_requires_registered_kind() {
    let coordinator = MemoryCoordinator::builder().build();
    let err = coordinator
        .store(MemoryKind::Similarity, None, NewRecord::new("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotRegistered(MemoryKind::Similarity)));
}

#[tokio::test]
async fn test_store_conversation_turn_writes_both_stores() {
    let history = HistoryStore::in_memory().await.unwrap();
    let coordinator = MemoryCoordinator::builder()
        .register(Arc::new(RecencyWindow::new(10, Duration::from_secs(60))))
        .register(Arc::new(history))
        .build();

    let stored = coordinator
        .store_conversation_turn("c1", "Is nausea normal?", "It is common early on.")
        .await
        .unwrap();
    assert_eq!(stored.len(), 2);

    let context = coordinator
        .build_unified_context(&MemoryQuery::new("nausea").with_conversation("c1"))
        .await
        .unwrap();
    let text = context.render();
    assert!(text.contains("## Recent Conversation Context\nUser: Is nausea normal?"));
    assert!(text.contains("## Similar Past Conversations"));
}

#[tokio::test]
async fn test_store_conversation_turn_tolerates_one_failure() {
    let mut broken = MockMemoryBackend::new();
    broken.expect_kind().return_const(MemoryKind::LongTermHistory);
    broken.expect_name().return_const("broken".to_string());
    broken
        .expect_store()
        .returning(|_, _| Err(Error::Internal("disk full".into())));

    let coordinator = MemoryCoordinator::builder()
        .register(Arc::new(RecencyWindow::default()))
        .register(Arc::new(broken))
        .build();

    let stored = coordinator
        .store_conversation_turn("c1", "hi", "hello")
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].0, MemoryKind::Recency);
}

#[tokio::test]
async fn test_store_conversation_turn_without_targets() {
    let coordinator = MemoryCoordinator::builder()
        .register(Arc::new(mock(MemoryKind::Similarity, Vec::new())))
        .build();
    let err = coordinator
        .store_conversation_turn("c1", "hi", "hello")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NoBackends));
}
