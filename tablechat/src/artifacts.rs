//! Recursive artifact discovery in untyped agent responses.
//!
//! Agent responses embed chart attachments in an `artifacts` array that can
//! sit at any nesting depth (top level, inside `agentReasoning` entries,
//! inside tool traces). The search walks the full object graph, bounded by a
//! recursion-depth cap to guard against pathological payloads.

use serde_json::Value;

/// Maximum nesting depth the search will descend into
const MAX_SEARCH_DEPTH: usize = 32;

/// Image kinds the chart panel can render
const IMAGE_TYPES: [&str; 3] = ["png", "jpeg", "gif"];

/// Storage-reference prefix used by the chart file API
pub const FILE_STORAGE_PREFIX: &str = "FILE-STORAGE::";

/// Find every non-null entry of any `artifacts` array in the value graph.
pub fn find_artifacts(value: &Value) -> Vec<Value> {
    let mut found = Vec::new();
    collect(value, 0, &mut found);
    found
}

fn collect(value: &Value, depth: usize, found: &mut Vec<Value>) {
    if depth > MAX_SEARCH_DEPTH {
        return;
    }
    match value {
        Value::Object(map) => {
            if let Some(Value::Array(entries)) = map.get("artifacts") {
                found.extend(entries.iter().filter(|v| !v.is_null()).cloned());
            }
            for child in map.values() {
                collect(child, depth + 1, found);
            }
        }
        Value::Array(entries) => {
            for child in entries {
                collect(child, depth + 1, found);
            }
        }
        _ => {}
    }
}

/// An artifact is a renderable chart when its `type` is an image kind and
/// its `data` field is a string (inline payload or storage reference).
pub fn image_data(artifact: &Value) -> Option<(&str, &str)> {
    let kind = artifact.get("type")?.as_str()?;
    if !IMAGE_TYPES.contains(&kind) {
        return None;
    }
    let data = artifact.get("data")?.as_str()?;
    Some((kind, data))
}

/// Build the download URL for an artifact's image data.
///
/// Storage references (`FILE-STORAGE::<name>`) resolve through the chart
/// file API, scoped by the producing chatflow and chat; anything else is
/// already a usable URL or data URI.
pub fn image_url(
    data: &str,
    storage_base: &str,
    chatflow_id: Option<&str>,
    chat_id: Option<&str>,
) -> String {
    match data.strip_prefix(FILE_STORAGE_PREFIX) {
        Some(file_name) => format!(
            "{}?chatflowId={}&chatId={}&fileName={}",
            storage_base,
            chatflow_id.unwrap_or(""),
            chat_id.unwrap_or(""),
            file_name
        ),
        None => data.to_string(),
    }
}
