use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use parley::error::{ErrorKind, ParleyError};
use parley::provider::{
    test_connection, FinishReason, ModelProvider, OpenAiCompatibleProvider, ProviderRequest,
};
use parley::search::{SearchBackend, TavilyClient};
use parley::types::{ContentPart, ModelMessage};

fn provider(server: &MockServer) -> OpenAiCompatibleProvider {
    OpenAiCompatibleProvider::new("test-key", format!("{}/v1/", server.uri()))
}

#[tokio::test]
async fn parses_text_and_tool_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({"model": "vendor/model-a"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {
                    "content": [{"type": "text", "text": "Let me look"}],
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "search_tool", "arguments": "{\"query\":\"rust\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 7, "total_tokens": 19}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = ProviderRequest::new("vendor/model-a", vec![ModelMessage::user("search rust")]);
    let response = provider(&server).generate_text(&request).await.unwrap();

    assert_eq!(response.text, "Let me look");
    assert_eq!(response.tool_calls[0].name, "search_tool");
    assert_eq!(response.tool_calls[0].arguments, json!({"query": "rust"}));
    assert_eq!(response.finish_reason, Some(FinishReason::ToolCalls));
    assert_eq!(response.usage.total_tokens, 19);
}

#[tokio::test]
async fn sends_assistant_content_as_plain_string() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [
                {"role": "user", "content": "hi"},
                {"role": "assistant", "content": "part one\npart two"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "ok"}, "finish_reason": "stop"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let history = vec![
        ModelMessage::user("hi"),
        ModelMessage::assistant_parts(vec![ContentPart::text("part one"), ContentPart::text("part two")]),
    ];
    let response = provider(&server)
        .generate_text(&ProviderRequest::new("m", history))
        .await
        .unwrap();

    assert_eq!(response.text, "ok");
}

#[tokio::test]
async fn maps_http_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": {"message": "Invalid API key"}})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let provider = provider(&server);
    let chat_err = provider
        .generate_text(&ProviderRequest::new("m", vec![ModelMessage::user("hi")]))
        .await
        .unwrap_err();
    let models_err = provider.list_models().await.unwrap_err();

    assert!(matches!(chat_err, ParleyError::Authentication(ref m) if m.contains("Invalid API key")));
    assert_eq!(chat_err.kind(), ErrorKind::InvalidCredential);
    assert_eq!(models_err.kind(), ErrorKind::EndpointNotFound);
}

#[tokio::test]
async fn lists_models_with_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "openai/gpt-4o", "supported_parameters": ["tools", "response_format"], "pricing": {"prompt": "1"}},
                {"id": "tiny/model"}
            ]
        })))
        .mount(&server)
        .await;

    let models = provider(&server).list_models().await.unwrap();

    assert_eq!(models.len(), 2);
    assert!(models[0].is_tool_capable());
    assert_eq!(models[0].extra["pricing"], json!({"prompt": "1"}));
    assert!(!models[1].is_tool_capable());
}

#[tokio::test]
async fn connection_test_reports_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"max_tokens": 20})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "connection ok"}, "finish_reason": "stop"}]
        })))
        .mount(&server)
        .await;

    let report = test_connection(&provider(&server), "vendor/model-a").await.unwrap();

    assert_eq!(report.model, "vendor/model-a");
    assert_eq!(report.response, "connection ok");
}

#[tokio::test]
async fn tavily_search_and_extract() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(header("authorization", "Bearer tvly-key"))
        .and(body_partial_json(json!({"query": "rust async"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": "rust async",
            "results": [{"title": "Tokio", "url": "https://tokio.rs"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/extract"))
        .and(body_partial_json(json!({"urls": ["https://tokio.rs"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"url": "https://tokio.rs", "raw_content": "Tokio is a runtime"}]
        })))
        .mount(&server)
        .await;

    let client = TavilyClient::new(server.uri());
    let search = client.search("tvly-key", "rust async").await.unwrap();
    let extract = client.extract("tvly-key", "https://tokio.rs").await.unwrap();

    assert_eq!(search["results"][0]["title"], json!("Tokio"));
    assert_eq!(extract["results"][0]["raw_content"], json!("Tokio is a runtime"));
}

#[tokio::test]
async fn tavily_rejects_bad_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": {"error": "Unauthorized"}})))
        .mount(&server)
        .await;

    let err = TavilyClient::new(server.uri()).search("bad", "q").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidCredential);
}
