use super::*;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

fn client_for(server: &MockServer) -> GeminiClient {
    let config = GeminiConfig {
        api_url: server.uri(),
        ..GeminiConfig::default()
    };
    GeminiClient::new(&config, "gm-test-key").expect("client should build")
}

#[test]
fn endpoint_includes_model() {
    let client =
        GeminiClient::new(&GeminiConfig::default(), "key").expect("client should build");

    assert_eq!(
        client.endpoint.as_str(),
        "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
    );
    assert_eq!(client.model(), "gemini-1.5-flash");
}

#[tokio::test]
async fn sends_single_user_turn() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "gm-test-key"))
        .and(body_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "What is the leave policy?" }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{ "text": "Employees receive " }, { "text": "15 days." }]
                },
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = client_for(&server)
        .generate("What is the leave policy?")
        .expect("generation should succeed");

    assert_eq!(text, "Employees receive 15 days.");
}

#[tokio::test]
async fn blocked_prompt_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .mount(&server)
        .await;

    let error = client_for(&server)
        .generate("prompt")
        .expect_err("blocked prompt should fail");

    assert!(error.to_string().contains("SAFETY"));
}

#[tokio::test]
async fn empty_candidate_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "finishReason": "MAX_TOKENS" }]
        })))
        .mount(&server)
        .await;

    let error = client_for(&server)
        .generate("prompt")
        .expect_err("empty candidate should fail");

    assert!(error.to_string().contains("MAX_TOKENS"));
}

#[tokio::test]
async fn http_failure_is_attempted_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let error = client_for(&server)
        .generate("prompt")
        .expect_err("unavailable service should fail");

    assert!(format!("{:#}", error).contains("HTTP 503"));
}
