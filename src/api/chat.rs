//! Agent chat endpoint

use crate::gateway::ApiRequest;
use serde::Deserialize;
use serde_json::json;

/// `POST /process`
///
/// Only the new message is sent; the service keeps conversational context.
pub fn process(agent_id: &str, query: &str) -> ApiRequest {
    ApiRequest::post("/process")
        .body(json!({ "agent_id": agent_id, "query": query }))
        .fallback("Failed to get response")
}

/// Agent answer
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatReply {
    pub message: String,
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub chunks_used: Option<u32>,
}
