//! Transcript clean-up applied right before a request is sent.

use std::collections::{HashMap, HashSet};

use serde_json::json;

use crate::types::{ContentPart, ModelMessage, Role};

/// Prepare messages for the wire.
///
/// Empty messages are dropped, adjacent text parts are joined with newlines, and every
/// assistant tool call is followed by exactly one matching tool result
/// (orphaned results are removed, missing ones get a synthetic error).
pub fn normalize_for_dispatch(messages: &[ModelMessage]) -> Vec<ModelMessage> {
    let merged: Vec<ModelMessage> = messages.iter().filter_map(merge_text_parts).collect();
    pair_tool_results(&merged)
}

fn merge_text_parts(message: &ModelMessage) -> Option<ModelMessage> {
    let mut parts: Vec<ContentPart> = Vec::with_capacity(message.content.len());
    for part in &message.content {
        match (parts.last_mut(), part) {
            (_, ContentPart::Text { text }) if text.is_empty() => {}
            (Some(ContentPart::Text { text: prev }), ContentPart::Text { text }) => {
                prev.push('\n');
                prev.push_str(text);
            }
            _ => parts.push(part.clone()),
        }
    }
    if parts.is_empty() {
        return None;
    }
    let mut next = message.clone();
    next.content = parts;
    Some(next)
}

fn pair_tool_results(messages: &[ModelMessage]) -> Vec<ModelMessage> {
    let mut out: Vec<ModelMessage> = Vec::with_capacity(messages.len());

    let mut i = 0usize;
    while i < messages.len() {
        let msg = &messages[i];
        if msg.role != Role::Assistant {
            if msg.role != Role::Tool {
                out.push(msg.clone());
            }
            i += 1;
            continue;
        }

        let calls = msg.tool_calls();
        if calls.is_empty() {
            out.push(msg.clone());
            i += 1;
            continue;
        }

        let ids: HashSet<&str> = calls.iter().map(|c| c.id.as_str()).collect();
        let mut span: HashMap<String, ModelMessage> = HashMap::new();

        let mut j = i + 1;
        while j < messages.len() && messages[j].role == Role::Tool {
            for part in &messages[j].content {
                if let ContentPart::ToolResult(result) = part {
                    let id = result.tool_call_id.as_str();
                    if ids.contains(id) {
                        // Ids are only unique within one assistant span; keep the first result.
                        span.entry(id.to_string()).or_insert_with(|| {
                            ModelMessage::tool_result(id, result.result.clone(), result.is_error)
                        });
                    }
                }
            }
            j += 1;
        }

        out.push(msg.clone());
        for call in calls {
            match span.remove(&call.id) {
                Some(result) => out.push(result),
                None => out.push(ModelMessage::tool_result(
                    call.id.clone(),
                    json!({ "ok": false, "error": { "kind": "internal", "message": "tool result missing from transcript" } }),
                    true,
                )),
            }
        }
        i = j;
    }

    out
}
