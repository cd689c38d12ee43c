mod common;

use pretty_assertions::assert_eq;
use serde_json::json;

use common::{complete_config, scripted_context, tool_result};
use parley::agent::AgentRole;
use parley::config::ConfigUpdate;
use parley::models::ModelInfo;
use parley::session::ChatSession;
use parley::types::Role;

#[tokio::test]
async fn handoff_to_helper_and_back() {
    let (ctx, provider) = scripted_context(complete_config());
    provider.set_models(vec![ModelInfo::new("vendor/model-a"), ModelInfo::new("vendor/model-b")]);

    // Turn 1: Main delegates, Helper lists models and answers.
    provider.queue_tool_call("h1", "transfer_to_helper", json!({}));
    provider.queue_tool_call("l1", "list_models", json!({}));
    provider.queue_text("Available: vendor/model-a, vendor/model-b");
    // Turn 2: Helper is still active and hands back; Main answers.
    provider.queue_tool_call("b1", "transform_to_default_agent", json!({}));
    provider.queue_text("Sure, what is the weather like?");

    let mut session = ChatSession::new(ctx);

    let first = session.send_message("which models can I use?").await.unwrap();
    assert_eq!(first.to_string(), "Assistant → Model Helper: Available: vendor/model-a, vendor/model-b");
    assert_eq!(session.active_agent(), AgentRole::Helper);
    assert_eq!(tool_result(session.transcript(), "l1")["data"], json!(["vendor/model-a", "vendor/model-b"]));

    let second = session.send_message("never mind, tell me a joke").await.unwrap();
    assert_eq!(second.started_by, "Model Helper");
    assert_eq!(second.ended_by, "Assistant");
    assert_eq!(session.active_agent(), AgentRole::Main);

    let requests = provider.requests();
    // The second turn starts on the Helper.
    assert!(requests[3].messages[0].text().contains("Model Helper"));
    assert!(requests[4].messages[0].text().contains("You are Assistant"));
}

#[tokio::test]
async fn filtered_handoff_hides_tool_traffic_from_helper_only() {
    let (ctx, provider) = scripted_context(complete_config());
    provider.queue_tool_call("g1", "get_history", json!({}));
    provider.queue_tool_call("h1", "transfer_to_helper", json!({}));
    provider.queue_text("Helper at your service");
    let mut session = ChatSession::new(ctx);

    session.send_message("models please").await.unwrap();

    let helper_request = provider.last_request();
    assert!(helper_request.messages.iter().all(|m| !m.has_tool_traffic()));
    assert!(helper_request.tools.iter().any(|t| t.name == "transform_to_default_agent"));
    assert!(helper_request.tools.iter().all(|t| t.name != "search_tool"));

    // The transcript keeps every tool call and result.
    let tool_messages = session.transcript().iter().filter(|m| m.role == Role::Tool).count();
    assert_eq!(tool_messages, 2);
}

#[tokio::test]
async fn only_the_first_handoff_of_a_step_is_followed() {
    let (ctx, provider) = scripted_context(complete_config());
    provider.queue_tool_calls(&[
        ("h1", "transfer_to_helper", json!({})),
        ("h2", "transfer_to_helper", json!({})),
    ]);
    provider.queue_text("done");
    let mut session = ChatSession::new(ctx);

    session.send_message("go").await.unwrap();

    assert_eq!(tool_result(session.transcript(), "h1")["ok"], json!(true));
    assert_eq!(tool_result(session.transcript(), "h2")["ok"], json!(false));
    assert_eq!(session.active_agent(), AgentRole::Helper);
}

#[tokio::test]
async fn switching_model_rebuilds_agents_for_next_message() {
    let (ctx, provider) = scripted_context(complete_config());
    provider.queue_tool_call("h1", "transfer_to_helper", json!({}));
    provider.queue_tool_call("s1", "switch_to_model", json!({"modelId": "vendor/model-b"}));
    provider.queue_text("Switched to vendor/model-b");
    provider.queue_text("Hi from model b");
    let mut session = ChatSession::new(ctx.clone());

    session.send_message("switch to model b").await.unwrap();
    // The rest of the run keeps the model it started with.
    assert_eq!(provider.last_request().model, "vendor/model-a");
    assert_eq!(ctx.config.get().model_id, "vendor/model-b");

    session.send_message("hello").await.unwrap();

    let request = provider.last_request();
    assert_eq!(request.model, "vendor/model-b");
    assert!(request.messages[0].text().contains("vendor/model-b"));
    // Pointer survives the rebuild.
    assert_eq!(session.active_agent(), AgentRole::Helper);
    assert_eq!(session.graph().unwrap().main().model_id(), "vendor/model-b");
}

#[tokio::test]
async fn model_detail_reports_not_found() {
    let (ctx, provider) = scripted_context(complete_config());
    provider.set_models(vec![ModelInfo::new("vendor/model-a")]);
    provider.queue_tool_call("h1", "transfer_to_helper", json!({}));
    provider.queue_tool_calls(&[
        ("d1", "model_detail", json!({"modelId": "vendor/model-a"})),
        ("d2", "model_detail", json!({"modelId": "vendor/missing"})),
    ]);
    provider.queue_text("Here you go");
    let mut session = ChatSession::new(ctx);

    session.send_message("details please").await.unwrap();

    assert_eq!(tool_result(session.transcript(), "d1")["data"]["id"], json!("vendor/model-a"));
    assert_eq!(tool_result(session.transcript(), "d2")["error"]["kind"], json!("not_found"));
}

#[tokio::test]
async fn current_config_tool_masks_secrets() {
    let (ctx, provider) = scripted_context(complete_config());
    provider.queue_tool_call("h1", "transfer_to_helper", json!({}));
    provider.queue_tool_call("c1", "get_current_config", json!({}));
    provider.queue_text("You are on vendor/model-a");
    let mut session = ChatSession::new(ctx);

    session.send_message("what is my config?").await.unwrap();

    let config = tool_result(session.transcript(), "c1")["data"].clone();
    assert_eq!(config["apiKey"], json!("******"));
    assert_eq!(config["modelId"], json!("vendor/model-a"));
}

#[tokio::test]
async fn round_trip_within_one_turn_leaves_main_active() {
    let (ctx, provider) = scripted_context(complete_config());
    provider.queue_tool_call("h1", "transfer_to_helper", json!({}));
    provider.queue_tool_call("b1", "transform_to_default_agent", json!({}));
    provider.queue_text("Back with you");
    provider.queue_text("Next answer");
    let mut session = ChatSession::new(ctx);

    let reply = session.send_message("hand this around").await.unwrap();

    assert_eq!(reply.started_by, "Assistant");
    assert_eq!(reply.ended_by, "Assistant");
    assert_eq!(reply.to_string(), "Assistant: Back with you");
    assert_eq!(session.active_agent(), AgentRole::Main);
    assert_eq!(tool_result(session.transcript(), "b1")["ok"], json!(true));

    let next = session.send_message("and now?").await.unwrap();
    assert_eq!(next.started_by, "Assistant");
    assert!(provider.last_request().messages[0].text().contains("You are Assistant"));
}

#[tokio::test]
async fn model_cache_follows_the_endpoint() {
    let (ctx, provider) = scripted_context(complete_config());
    provider.set_models(vec![ModelInfo::new("vendor/model-a")]);
    assert_eq!(ctx.models().await.unwrap()[0].id, "vendor/model-a");

    provider.set_models(vec![ModelInfo::new("other/model-x")]);
    ctx.config.update(ConfigUpdate::model("vendor/model-b")).unwrap();
    assert_eq!(ctx.models().await.unwrap()[0].id, "vendor/model-a");

    ctx.config
        .update(ConfigUpdate::builder().base_url("https://other.example.test/v1").build())
        .unwrap();
    assert_eq!(ctx.models().await.unwrap()[0].id, "other/model-x");
}
