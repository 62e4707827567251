//! LLM client tests against a mock chat completions server.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pdfharvest::llm::{
    CallOverrides, ChatRequest, ChatTransport, ConcurrencyLimit, LlmClient, LlmConfig, LlmError,
    PromptPair,
};

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

fn client_for(server: &MockServer) -> LlmClient {
    let config = LlmConfig::default()
        .with_endpoint(&server.uri())
        .with_api_key("test-key");
    LlmClient::new(config).unwrap()
}

#[tokio::test]
async fn test_call_sends_merged_parameters() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "max_tokens": 1000,
            "messages": [
                {"role": "system", "content": "You are terse."},
                {"role": "user", "content": "Describe Mars in one word."}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Red")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let prompt = PromptPair::new("You are terse.", "Describe {planet} in one word.")
        .with_input("planet", "Mars");
    let overrides = CallOverrides::default().model("gpt-4o-mini");

    let response = client.call(&prompt, &overrides).await.unwrap();
    assert_eq!(response, "Red");
}

#[tokio::test]
async fn test_api_error_is_returned_and_permit_released() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.ask("system", "user").await.unwrap_err();

    match err {
        LlmError::Api { status, ref body } => {
            assert_eq!(status, 500);
            assert!(body.contains("upstream exploded"));
        }
        other => panic!("expected API error, got {:?}", other),
    }
    assert!(err.is_transport());
    assert_eq!(client.limiter().available(), client.limiter().capacity());
}

#[tokio::test]
async fn test_missing_placeholder_makes_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("unused")))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let prompt = PromptPair::new("system", "Hello {name}").with_inputs(HashMap::new());

    let err = client
        .call(&prompt, &CallOverrides::default())
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::Formatting(_)));
    assert_eq!(client.limiter().available(), 5);
}

#[tokio::test]
async fn test_connection_refused() {
    // Grab a free port, then close it so nothing is listening.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let config = LlmConfig::default()
        .with_endpoint(&endpoint)
        .with_api_key("test-key");
    let client = LlmClient::new(config).unwrap();

    let err = client.ask("system", "user").await.unwrap_err();
    assert!(matches!(err, LlmError::Connection(_)));
    assert_eq!(client.limiter().in_flight(), 0);
}

/// Tracks the highest number of overlapping requests.
struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl ChatTransport for Gauge {
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok(request.user.clone())
    }
}

#[tokio::test]
async fn test_concurrent_calls_respect_capacity() {
    let gauge = Arc::new(Gauge {
        current: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    });
    let client = Arc::new(LlmClient::with_transport(
        LlmConfig::default().call_parameters(),
        ConcurrencyLimit::new(3),
        gauge.clone(),
    ));

    let calls = (0..12).map(|i| {
        let client = client.clone();
        tokio::spawn(async move { client.ask("system", &format!("call {}", i)).await })
    });
    let results = futures::future::join_all(calls).await;

    for (i, result) in results.into_iter().enumerate() {
        assert_eq!(result.unwrap().unwrap(), format!("call {}", i));
    }
    let peak = gauge.peak.load(Ordering::SeqCst);
    assert!(peak >= 1 && peak <= 3, "peak was {}", peak);
    assert_eq!(client.limiter().available(), 3);
}

#[test]
fn test_default_capacity_is_five() {
    assert_eq!(LlmConfig::default().max_concurrency, 5);
    assert_eq!(ConcurrencyLimit::default().capacity(), 5);
}
