//! Wire-format tests for the generation providers, against wiremock.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use shelftalker::{
    AnthropicProvider, GenerateOptions, GenerationProvider, OpenAiProvider,
    RecommendationAdapter, ShelftalkerError,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn options() -> GenerateOptions {
    GenerateOptions::new("test-model")
}

// =========================================================================
// OpenAI
// =========================================================================

#[tokio::test]
async fn openai_sends_bearer_auth_and_reads_first_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "messages": [{"role": "user", "content": "recommend books"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "[]"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAiProvider::with_base_url("sk-test", server.uri());
    let raw = provider.complete("recommend books", &options()).await.unwrap();
    assert_eq!(raw, "[]");
}

#[tokio::test]
async fn openai_maps_429_to_rate_limited_with_hint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "2"))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::with_base_url("sk-test", server.uri());
    let err = provider.complete("p", &options()).await.unwrap_err();
    assert!(err.is_transient());
    assert_eq!(err.retry_after(), Some(Duration::from_secs(2)));
}

#[tokio::test]
async fn openai_maps_500_to_transient_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::with_base_url("sk-test", server.uri());
    let err = provider.complete("p", &options()).await.unwrap_err();
    assert!(matches!(err, ShelftalkerError::Api { status: 500, .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn openai_maps_401_to_permanent_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::with_base_url("sk-test", server.uri());
    let err = provider.complete("p", &options()).await.unwrap_err();
    assert!(matches!(err, ShelftalkerError::Api { status: 401, .. }));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn openai_empty_choices_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::with_base_url("sk-test", server.uri());
    assert!(provider.complete("p", &options()).await.is_err());
}

// =========================================================================
// Anthropic
// =========================================================================

#[tokio::test]
async fn anthropic_sends_api_key_and_version_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-ant-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "messages": [{"role": "user", "content": "recommend books"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{"type": "text", "text": "Here are some books"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = AnthropicProvider::with_base_url("sk-ant-test", server.uri());
    let raw = provider.complete("recommend books", &options()).await.unwrap();
    assert_eq!(raw, "Here are some books");
}

#[tokio::test]
async fn anthropic_concatenates_text_blocks() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [
                {"type": "text", "text": "part one "},
                {"type": "text", "text": "part two"}
            ]
        })))
        .mount(&server)
        .await;

    let provider = AnthropicProvider::with_base_url("sk-ant-test", server.uri());
    let raw = provider.complete("p", &options()).await.unwrap();
    assert_eq!(raw, "part one part two");
}

// =========================================================================
// Adapter behaviour over a provider
// =========================================================================

#[tokio::test]
async fn adapter_parses_provider_output() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant",
                "content": "[{\"title\":\"Dune\",\"author\":\"Frank Herbert\"}]"}}]
        })))
        .mount(&server)
        .await;

    let provider = Arc::new(OpenAiProvider::with_base_url("sk-test", server.uri()));
    let adapter = RecommendationAdapter::new(provider, options());

    let set = adapter.get_recommendations("recommend").await.unwrap();
    assert_eq!(set.recommendations.len(), 1);
    assert_eq!(set.recommendations[0].title, "Dune");
    assert!(set.raw.contains("Dune"));
}

#[tokio::test]
async fn adapter_turns_provider_failure_into_generation_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let provider = Arc::new(OpenAiProvider::with_base_url("sk-test", server.uri()));
    let adapter = RecommendationAdapter::new(provider, options());

    let err = adapter.get_recommendations("recommend").await.unwrap_err();
    assert!(matches!(err, ShelftalkerError::Generation(_)));
}

#[tokio::test]
async fn adapter_timeout_is_a_generation_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"choices": []}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let provider = Arc::new(OpenAiProvider::with_base_url("sk-test", server.uri()));
    let adapter = RecommendationAdapter::new(
        provider,
        options().timeout(Duration::from_millis(50)),
    );

    let err = adapter.get_recommendations("recommend").await.unwrap_err();
    match err {
        ShelftalkerError::Generation(message) => assert!(message.contains("timed out")),
        other => panic!("expected Generation, got {other:?}"),
    }
}

#[tokio::test]
async fn adapter_degrades_unparseable_output_to_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant",
                "content": "I'm sorry, I can't do that."}}]
        })))
        .mount(&server)
        .await;

    let provider = Arc::new(OpenAiProvider::with_base_url("sk-test", server.uri()));
    let adapter = RecommendationAdapter::new(provider, options());

    let set = adapter.get_recommendations("recommend").await.unwrap();
    assert!(set.recommendations.is_empty());
}
