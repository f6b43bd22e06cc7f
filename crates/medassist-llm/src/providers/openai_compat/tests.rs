use super::*;
use crate::adapter::BackendAdapter;
use crate::capability::Capability;
use crate::error::Error;
use crate::message::Message;
use crate::request::GenerationRequest;
use std::time::Duration;

#[test]
fn test_presets() {
    let openai = OpenAiCompatibleConfig::openai("sk-test-key-123456");
    assert_eq!(openai.id, "openai");
    assert_eq!(openai.base_url, OPENAI_BASE_URL);

    let groq = OpenAiCompatibleConfig::groq("gsk-test-key-123456");
    assert_eq!(groq.id, "groq");
    assert_eq!(groq.model, GROQ_DEFAULT_MODEL);
    assert!(groq.capabilities.contains(&Capability::KnowledgeRetrieval));
}

#[test]
fn test_debug_masks_key() {
    let config = OpenAiCompatibleConfig::openai("sk-1234567890abcdefghij");
    let debug = format!("{config:?}");
    assert!(!debug.contains("567890abcdef"));
    assert!(debug.contains("sk-1...ghij"));
}

#[test]
fn test_empty_key_rejected() {
    let result = OpenAiCompatibleAdapter::new(OpenAiCompatibleConfig::openai(""));
    assert!(matches!(result, Err(Error::NotConfigured(_))));
}

#[test]
fn test_build_request_prepends_system_prompt() {
    let adapter = OpenAiCompatibleAdapter::new(OpenAiCompatibleConfig::openai("sk-test-key-123456")).unwrap();
    let request = GenerationRequest::new()
        .with_system_prompt("You are a careful medical assistant.")
        .with_message(Message::user("Is nausea common?"))
        .with_message(Message::assistant("It can be."))
        .with_temperature(0.1);

    let body = adapter.build_request(&request);

    assert_eq!(body.messages.len(), 3);
    assert_eq!(body.messages[0].role, "system");
    assert_eq!(body.messages[1].role, "user");
    assert_eq!(body.messages[2].role, "assistant");
    assert_eq!(body.temperature, Some(0.1));
    assert_eq!(body.max_tokens, Some(1024));
}

#[tokio::test]
async fn test_unreachable_backend_is_transient() {
    let config = OpenAiCompatibleConfig::openai("sk-test-key-123456")
        .with_base_url("http://127.0.0.1:9")
        .with_timeout(Duration::from_secs(2));
    let adapter = OpenAiCompatibleAdapter::new(config).unwrap();
    let request = GenerationRequest::new().with_message(Message::user("hello"));

    let err = adapter
        .call(&request, Duration::from_secs(2))
        .await
        .unwrap_err();

    assert!(err.is_transient(), "unexpected error: {err}");
}

#[tokio::test]
async fn test_health_check_unreachable() {
    let config = OpenAiCompatibleConfig::openai("sk-test-key-123456")
        .with_base_url("http://127.0.0.1:9")
        .with_timeout(Duration::from_secs(2));
    let adapter = OpenAiCompatibleAdapter::new(config).unwrap();

    let health = adapter.health_check().await;

    assert!(!health.alive);
    assert_eq!(health.backend, "openai");
}
