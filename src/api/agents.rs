//! Agent and knowledge-scrape endpoints

use super::null_as_default;
use crate::error::Result;
use crate::gateway::ApiRequest;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

/// Agent availability
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    #[default]
    Active,
    Inactive,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Active => "active",
            AgentStatus::Inactive => "inactive",
        }
    }

    /// The status a toggle would switch to
    pub fn toggled(self) -> Self {
        match self {
            AgentStatus::Active => AgentStatus::Inactive,
            AgentStatus::Inactive => AgentStatus::Active,
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A knowledge agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    #[serde(rename = "agent_id")]
    pub id: String,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub status: AgentStatus,
    #[serde(rename = "chunks_count", default, deserialize_with = "null_as_default")]
    pub knowledge_chunk_count: u64,
    #[serde(rename = "last_scraped", default)]
    pub last_scraped_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Source URL attached to an agent's knowledge base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeConfig {
    pub config_id: String,
    pub url: String,
    #[serde(default)]
    pub css_selector: Option<String>,
    #[serde(default)]
    pub xpath: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub auto_scrape: bool,
    #[serde(default)]
    pub scrape_interval_hours: Option<u32>,
}

/// `GET /agents/{id}` response
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentDetail {
    pub agent: Agent,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scrape_configs: Vec<ScrapeConfig>,
}

impl AgentDetail {
    /// The agent has nothing to answer from yet
    pub fn needs_source(&self) -> bool {
        self.scrape_configs.is_empty()
    }
}

/// Partial agent update; absent fields are left as they are
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl AgentPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.role.is_none()
    }
}

/// Add a URL to an agent's knowledge base
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapeRequest {
    pub agent_id: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub css_selector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xpath: Option<String>,
    pub multi_page: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,
    pub auto_scrape: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scrape_interval_hours: Option<u32>,
}

impl ScrapeRequest {
    /// Single-page, one-off scrape
    pub fn single_page(agent_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            url: url.into(),
            css_selector: None,
            xpath: None,
            multi_page: false,
            max_pages: None,
            auto_scrape: false,
            scrape_interval_hours: None,
        }
    }
}

/// `GET /agents/list`, optionally filtered by status
pub fn list(status: Option<AgentStatus>) -> ApiRequest {
    let request = ApiRequest::get("/agents/list").fallback("Failed to fetch agents");
    match status {
        Some(status) => request.query("status", status),
        None => request,
    }
}

/// `GET /agents/{id}`
pub fn get(agent_id: &str) -> ApiRequest {
    ApiRequest::get(format!("/agents/{}", agent_id)).fallback("Failed to load agent")
}

/// `POST /agents/create`
pub fn create(name: &str, role: &str) -> ApiRequest {
    ApiRequest::post("/agents/create")
        .body(json!({ "name": name, "role": role }))
        .fallback("Failed to create agent")
}

/// `PATCH /agents/{id}`
pub fn update(agent_id: &str, patch: &AgentPatch) -> Result<ApiRequest> {
    Ok(ApiRequest::patch(format!("/agents/{}", agent_id))
        .json(patch)?
        .fallback("Failed to update agent"))
}

/// `PATCH /agents/{id}/status`
pub fn set_status(agent_id: &str, status: AgentStatus) -> ApiRequest {
    ApiRequest::patch(format!("/agents/{}/status", agent_id))
        .body(json!({ "status": status }))
        .fallback("Failed to update status")
}

/// `DELETE /agents/{id}`
pub fn delete(agent_id: &str) -> ApiRequest {
    ApiRequest::delete(format!("/agents/{}", agent_id)).fallback("Failed to delete agent")
}

/// `POST /scrape`
pub fn scrape(request: &ScrapeRequest) -> Result<ApiRequest> {
    Ok(ApiRequest::post("/scrape")
        .json(request)?
        .fallback("Failed to scrape website"))
}

/// `POST /scrape/refresh/{id}`, re-scrape the primary source
pub fn refresh(agent_id: &str) -> ApiRequest {
    ApiRequest::post(format!("/scrape/refresh/{}", agent_id)).fallback("Failed to refresh agent")
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;

    #[test]
    fn test_agent_wire_names() {
        let agent: Agent = serde_json::from_value(json!({
            "agent_id": "a1",
            "user_id": "u1",
            "name": "Docs bot",
            "role": "Answers questions about the docs",
            "status": "inactive",
            "created_at": "2026-01-01T00:00:00",
            "updated_at": null,
            "last_scraped": null,
            "chunks_count": null
        }))
        .unwrap();

        assert_eq!(agent.id, "a1");
        assert_eq!(agent.status, AgentStatus::Inactive);
        assert_eq!(agent.knowledge_chunk_count, 0);
        assert!(agent.last_scraped_at.is_none());
    }

    #[test]
    fn test_list_filter_query() {
        assert_eq!(list(None).query_value("status"), None);
        assert_eq!(
            list(Some(AgentStatus::Active)).query_value("status"),
            Some("active")
        );
    }

    #[test]
    fn test_patch_skips_absent_fields() {
        let patch = AgentPatch {
            name: Some("Renamed".to_string()),
            role: None,
        };
        let request = update("a1", &patch).unwrap();
        assert_eq!(request.method, Method::PATCH);
        assert_eq!(request.path, "/agents/a1");
        assert_eq!(request.body, Some(json!({"name": "Renamed"})));
        assert!(!patch.is_empty());
        assert!(AgentPatch::default().is_empty());
    }

    #[test]
    fn test_status_body() {
        let request = set_status("a1", AgentStatus::Inactive);
        assert_eq!(request.path, "/agents/a1/status");
        assert_eq!(request.body, Some(json!({"status": "inactive"})));
        assert_eq!(AgentStatus::Inactive.toggled(), AgentStatus::Active);
    }

    #[test]
    fn test_single_page_scrape_body() {
        let request = scrape(&ScrapeRequest::single_page("a1", "https://a.com")).unwrap();
        assert_eq!(
            request.body,
            Some(json!({
                "agent_id": "a1",
                "url": "https://a.com",
                "multi_page": false,
                "auto_scrape": false
            }))
        );
    }

    #[test]
    fn test_agent_detail_needs_source() {
        let detail: AgentDetail = serde_json::from_value(json!({
            "agent": {"agent_id": "a1", "name": "n", "role": "r"},
            "scrape_configs": []
        }))
        .unwrap();
        assert!(detail.needs_source());
    }
}
