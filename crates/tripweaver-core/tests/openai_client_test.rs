//! Tests for OpenAiClient against a mocked `/chat/completions` endpoint.

use serde_json::json;
use tripweaver_core::llm::{
    ChatMessage, CompletionClient, CompletionError, OpenAiClient, OpenAiConfig,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> OpenAiClient {
    let config = OpenAiConfig::new("test-key")
        .with_base_url(format!("{}/v1", server.uri()))
        .with_model("test-model");
    OpenAiClient::new(config).unwrap()
}

fn completion_body(content: serde_json::Value) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            {
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }
        ]
    })
}

#[tokio::test]
async fn returns_first_choice_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "response_format": {"type": "json_object"},
            "messages": [{"role": "user", "content": "plan it"}]
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion_body(json!("{\"data\":[]}"))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let content = client
        .complete(&[ChatMessage::user("plan it")])
        .await
        .unwrap();
    assert_eq!(content, "{\"data\":[]}");
}

#[tokio::test]
async fn non_success_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .complete(&[ChatMessage::user("x")])
        .await
        .unwrap_err();
    match err {
        CompletionError::Status { status, body } => {
            assert_eq!(status, 429);
            assert_eq!(body, "rate limited");
        }
        other => panic!("expected Status, got {other:?}"),
    }
}

#[tokio::test]
async fn null_content_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(json!(null))))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .complete(&[ChatMessage::user("x")])
        .await
        .unwrap_err();
    assert!(matches!(err, CompletionError::Empty), "got {err:?}");
}

#[tokio::test]
async fn no_choices_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .complete(&[ChatMessage::user("x")])
        .await
        .unwrap_err();
    assert!(matches!(err, CompletionError::Empty), "got {err:?}");
}

#[tokio::test]
async fn garbage_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .complete(&[ChatMessage::user("x")])
        .await
        .unwrap_err();
    assert!(matches!(err, CompletionError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_error() {
    let config = OpenAiConfig::new("k").with_base_url("http://127.0.0.1:9/v1");
    let err = OpenAiClient::new(config)
        .unwrap()
        .complete(&[ChatMessage::user("x")])
        .await
        .unwrap_err();
    assert!(matches!(err, CompletionError::Transport(_)), "got {err:?}");
}
