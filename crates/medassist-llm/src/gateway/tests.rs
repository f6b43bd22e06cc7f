//! Tests for the generation gateway

use super::*;
use crate::message::Message;
use crate::mock::{ScriptedAdapter, ScriptedOutcome};
use crate::retry::RetryConfig;
use crate::router::RoutingTable;

fn fast_retry() -> RetryExecutor {
    RetryExecutor::new(
        RetryConfig::new()
            .with_max_attempts(3)
            .with_initial_delay(Duration::from_millis(10))
            .with_max_delay(Duration::from_millis(40))
            .with_jitter(false)
            .with_attempt_timeout(Duration::from_secs(2)),
    )
}

fn gateway(adapters: &[Arc<ScriptedAdapter>], table: RoutingTable) -> GenerationGateway {
    let mut registry = BackendRegistry::new();
    for a in adapters {
        registry.register(a.clone());
    }
    let router = CapabilityRouter::new(Arc::new(registry), table);
    GenerationGateway::new(router, ValidationPipeline::with_defaults().unwrap(), fast_retry())
}

fn request() -> GenerationRequest {
    GenerationRequest::new()
        .with_message(Message::user("Can I take ibuprofen with my current treatment?"))
        .with_safety_context("domain", "obesity_treatment")
        .with_safety_context("safety_level", "standard")
}

#[tokio::test]
async fn test_primary_success_is_validated() {
    let a = Arc::new(
        ScriptedAdapter::universal("A")
            .with_default(ScriptedOutcome::reply("Please consult your doctor about dosage.")),
    );
    let gw = gateway(&[a.clone()], RoutingTable::empty());

    let result = gw
        .generate(Capability::ClinicalConversation, &request(), None)
        .await;

    assert_eq!(result.backend, "A");
    assert!(result.validated);
    assert_eq!(result.metadata["attempts"], 1);
    assert_eq!(result.metadata["fallback_used"], false);
    assert_eq!(result.metadata["capability"], "clinical_conversation");
    assert_eq!(gw.stats().primary_successes, 1);
}

#[tokio::test]
async fn test_caller_request_not_mutated() {
    let a = Arc::new(ScriptedAdapter::universal("A"));
    let gw = gateway(&[a], RoutingTable::empty());
    let req = request();

    gw.generate(Capability::MedicalReasoning, &req, None).await;

    assert!(!req.safety_context.contains_key(CAPABILITY_CONTEXT_KEY));
}

#[tokio::test(start_paused = true)]
async fn test_transient_retries_stay_on_primary() {
    let a = Arc::new(
        ScriptedAdapter::universal("A")
            .with_script([ScriptedOutcome::Transient, ScriptedOutcome::RateLimited])
            .with_default(ScriptedOutcome::reply("Rest and consult your doctor.")),
    );
    let b = Arc::new(ScriptedAdapter::universal("B"));
    let gw = gateway(&[a.clone(), b.clone()], RoutingTable::empty());

    let result = gw
        .generate(Capability::ClinicalConversation, &request(), None)
        .await;

    assert_eq!(result.backend, "A");
    assert_eq!(a.calls(), 3);
    assert_eq!(b.calls(), 0);
    assert_eq!(result.metadata["attempts"], 3);
}

#[tokio::test]
async fn test_fatal_skips_retries() {
    let a = Arc::new(ScriptedAdapter::universal("A").with_default(ScriptedOutcome::Fatal));
    let b = Arc::new(
        ScriptedAdapter::universal("B").with_default(ScriptedOutcome::reply("Consult your doctor.")),
    );
    let gw = gateway(&[a.clone(), b.clone()], RoutingTable::empty());

    let result = gw
        .generate(Capability::MedicalReasoning, &request(), None)
        .await;

    assert_eq!(a.calls(), 1);
    assert_eq!(b.calls(), 1);
    assert_eq!(result.backend, "B");
    assert_eq!(result.metadata["fallback_used"], true);
    assert_eq!(gw.stats().fallback_successes, 1);
}

#[tokio::test(start_paused = true)]
async fn test_all_failing_returns_degraded() {
    let adapters: Vec<Arc<ScriptedAdapter>> = ["A", "B", "C"]
        .into_iter()
        .map(|id| Arc::new(ScriptedAdapter::universal(id).with_default(ScriptedOutcome::Transient)))
        .collect();
    let gw = gateway(&adapters, RoutingTable::empty());

    let result = gw
        .generate(Capability::KnowledgeRetrieval, &request(), None)
        .await;

    assert_eq!(result.content, DEFAULT_DEGRADED_MESSAGE);
    assert!(result.validated);
    assert!(result.is_degraded());
    assert_eq!(result.backend, DEGRADED_BACKEND);
    assert_eq!(result.model, DEGRADED_MODEL);
    assert_eq!(result.metadata["backends_tried"], serde_json::json!(["A", "B", "C"]));
    assert!(result.metadata["error"].as_str().unwrap().contains("unavailable"));
    for a in &adapters {
        assert_eq!(a.calls(), 3);
    }
    assert_eq!(gw.stats().degraded, 1);
}

#[tokio::test]
async fn test_empty_registry_degrades() {
    let gw = gateway(&[], RoutingTable::default());
    let result = gw
        .generate(Capability::PatientMonitoring, &request(), None)
        .await;
    assert!(result.is_degraded());
    assert!(result.validated);
    assert!(!result.content.is_empty());
}

#[tokio::test]
async fn test_unsafe_reply_not_retried_or_rerouted() {
    let a = Arc::new(
        ScriptedAdapter::universal("A")
            .with_default(ScriptedOutcome::reply("You can stop taking medication today.")),
    );
    let b = Arc::new(ScriptedAdapter::universal("B"));
    let gw = gateway(&[a.clone(), b.clone()], RoutingTable::empty());

    let result = gw
        .generate(Capability::ClinicalConversation, &request(), None)
        .await;

    assert!(!result.validated);
    assert_eq!(result.backend, "A");
    assert_eq!(result.metadata["safety_rejected"], true);
    assert_eq!(a.calls(), 1);
    assert_eq!(b.calls(), 0);
    assert_eq!(gw.stats().safety_rejections, 1);
}

#[tokio::test(start_paused = true)]
async fn test_hanging_backend_times_out_then_falls_back() {
    let a = Arc::new(ScriptedAdapter::universal("A").with_default(ScriptedOutcome::Hang));
    let b = Arc::new(
        ScriptedAdapter::universal("B").with_default(ScriptedOutcome::reply("Consult your doctor.")),
    );
    let gw = gateway(&[a.clone(), b], RoutingTable::empty());

    let result = gw
        .generate(Capability::ClinicalConversation, &request(), None)
        .await;

    assert_eq!(result.backend, "B");
    assert_eq!(a.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_limits_whole_call() {
    let a = Arc::new(ScriptedAdapter::universal("A").with_default(ScriptedOutcome::Hang));
    let b = Arc::new(ScriptedAdapter::universal("B").with_default(ScriptedOutcome::Hang));
    let gw = gateway(&[a, b.clone()], RoutingTable::empty()).with_deadline(Duration::from_millis(500));

    let start = Instant::now();
    let result = gw
        .generate(Capability::ClinicalConversation, &request(), None)
        .await;

    assert!(result.is_degraded());
    assert!(start.elapsed() <= Duration::from_millis(500));
    assert_eq!(b.calls(), 0);
}

#[tokio::test]
async fn test_missing_disclaimer_keeps_validated() {
    let a = Arc::new(
        ScriptedAdapter::universal("A").with_default(ScriptedOutcome::reply("Drink water and rest.")),
    );
    let gw = gateway(&[a], RoutingTable::empty());

    let result = gw
        .generate(Capability::ClinicalConversation, &request().with_temperature(0.9), None)
        .await;

    assert!(result.validated);
    let warnings = result.metadata["validation_warnings"].as_array().unwrap();
    assert_eq!(warnings.len(), 2);
}

#[tokio::test]
async fn test_request_without_safety_context_has_no_warnings() {
    let a = Arc::new(
        ScriptedAdapter::universal("A")
            .with_default(ScriptedOutcome::reply("Please consult your doctor about dosage.")),
    );
    let gw = gateway(&[a], RoutingTable::empty());
    let bare = GenerationRequest::new().with_message(Message::user("Is nausea normal?"));

    let result = gw
        .generate(Capability::ClinicalConversation, &bare, None)
        .await;

    assert!(result.validated);
    assert_eq!(result.metadata["capability"], "clinical_conversation");
    assert!(!result.metadata.contains_key("validation_warnings"));
}

#[tokio::test]
async fn test_health_check_all() {
    let a = Arc::new(ScriptedAdapter::universal("A"));
    let b = Arc::new(ScriptedAdapter::universal("B").with_alive(false));
    let gw = gateway(&[a, b], RoutingTable::empty());

    let health = gw.health_check_all().await;

    assert_eq!(health.len(), 2);
    assert!(health[0].alive);
    assert!(!health[1].alive);
    assert!(health[1].error.is_some());
}
