//! Page-change reminder endpoints

use super::null_as_default;
use crate::error::{Error, Result};
use crate::gateway::ApiRequest;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::ops::RangeInclusive;

/// Accepted check intervals, in hours
pub const INTERVAL_HOURS: RangeInclusive<u32> = 1..=168;

/// Interval choices offered when creating a reminder
pub const INTERVAL_PRESETS: &[(u32, &str)] = &[
    (1, "1 hour"),
    (6, "6 hours"),
    (12, "12 hours"),
    (24, "24 hours (1 day)"),
    (48, "48 hours (2 days)"),
    (168, "1 week"),
];

/// A watched URL that mails on change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    #[serde(rename = "reminder_id")]
    pub id: String,
    pub url: String,
    pub email: String,
    pub interval_hours: u32,
    #[serde(default)]
    pub css_selector: Option<String>,
    #[serde(default)]
    pub xpath: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(rename = "last_scraped", default)]
    pub last_scraped_at: Option<String>,
}

/// One detected change of a reminder's page
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReminderChange {
    #[serde(rename = "history_id")]
    pub id: String,
    pub old_content_preview: Option<String>,
    pub new_content_preview: Option<String>,
    pub change_summary: Option<String>,
    pub detected_at: Option<String>,
}

/// A reminder with its most recent changes
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReminderDetail {
    pub reminder: Reminder,
    #[serde(default, deserialize_with = "null_as_default")]
    pub history: Vec<ReminderChange>,
}

/// Payload for creating a reminder
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewReminder {
    pub url: String,
    pub email: String,
    pub interval_hours: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub css_selector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xpath: Option<String>,
}

impl NewReminder {
    pub fn new(url: impl Into<String>, email: impl Into<String>, interval_hours: u32) -> Self {
        Self {
            url: url.into(),
            email: email.into(),
            interval_hours,
            css_selector: None,
            xpath: None,
        }
    }

    /// Trim fields and drop blank selectors
    pub fn normalized(mut self) -> Self {
        self.url = self.url.trim().to_string();
        self.email = self.email.trim().to_string();
        self.css_selector = non_blank(self.css_selector);
        self.xpath = non_blank(self.xpath);
        self
    }

    /// Required-field and range checks done before any request
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() || self.email.trim().is_empty() {
            return Err(Error::Validation(
                "Please fill in all required fields".to_string(),
            ));
        }
        validate_interval(self.interval_hours)
    }
}

/// Partial reminder update
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReminderPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_hours: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub css_selector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xpath: Option<String>,
}

impl ReminderPatch {
    pub fn validate(&self) -> Result<()> {
        match self.interval_hours {
            Some(hours) => validate_interval(hours),
            None => Ok(()),
        }
    }
}

fn validate_interval(hours: u32) -> Result<()> {
    if !INTERVAL_HOURS.contains(&hours) {
        return Err(Error::Validation(format!(
            "Interval must be between {} and {} hours",
            INTERVAL_HOURS.start(),
            INTERVAL_HOURS.end()
        )));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// What a manual check found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    Changed,
    NoChange,
    NoContent,
    Error,
    Other,
}

/// `POST /reminders/{id}/trigger` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TriggerResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub result: Option<Value>,
}

impl TriggerResponse {
    pub fn outcome(&self) -> TriggerOutcome {
        let status = self
            .result
            .as_ref()
            .and_then(|r| r.get("status"))
            .and_then(Value::as_str);
        match status {
            Some("changed") => TriggerOutcome::Changed,
            Some("no_change") => TriggerOutcome::NoChange,
            Some("no_content") => TriggerOutcome::NoContent,
            Some("error") => TriggerOutcome::Error,
            _ => TriggerOutcome::Other,
        }
    }

    /// Message to show, with a default per outcome
    pub fn summary(&self) -> String {
        if let Some(message) = self.message.as_deref().filter(|m| !m.is_empty()) {
            return message.to_string();
        }
        let default = match self.outcome() {
            TriggerOutcome::Changed => "Changes detected! Email sent.",
            TriggerOutcome::NoChange => "No changes detected.",
            TriggerOutcome::NoContent => "Could not extract content.",
            TriggerOutcome::Error | TriggerOutcome::Other => "Check completed!",
        };
        default.to_string()
    }
}

/// `GET /reminders/list?active_only=`
pub fn list(active_only: bool) -> ApiRequest {
    ApiRequest::get("/reminders/list")
        .query("active_only", active_only)
        .fallback("Failed to fetch reminders")
}

/// `GET /reminders/{id}`
pub fn get(reminder_id: &str) -> ApiRequest {
    ApiRequest::get(format!("/reminders/{}", reminder_id)).fallback("Failed to load reminder")
}

/// `POST /reminders/create`
pub fn create(reminder: &NewReminder) -> Result<ApiRequest> {
    Ok(ApiRequest::post("/reminders/create")
        .json(reminder)?
        .fallback("Failed to create reminder"))
}

/// `PATCH /reminders/{id}`
pub fn update(reminder_id: &str, patch: &ReminderPatch) -> Result<ApiRequest> {
    Ok(ApiRequest::patch(format!("/reminders/{}", reminder_id))
        .json(patch)?
        .fallback("Failed to update reminder"))
}

/// `PATCH /reminders/{id}/toggle`
///
/// The service reads `is_active` from the query string; the body carries it too.
pub fn toggle(reminder_id: &str, is_active: bool) -> ApiRequest {
    ApiRequest::patch(format!("/reminders/{}/toggle", reminder_id))
        .query("is_active", is_active)
        .body(json!({ "is_active": is_active }))
        .fallback("Failed to update status")
}

/// `DELETE /reminders/{id}`
pub fn delete(reminder_id: &str) -> ApiRequest {
    ApiRequest::delete(format!("/reminders/{}", reminder_id))
        .fallback("Failed to delete reminder")
}

/// `POST /reminders/{id}/trigger`, run a check now
pub fn trigger(reminder_id: &str) -> ApiRequest {
    ApiRequest::post(format!("/reminders/{}/trigger", reminder_id))
        .fallback("Failed to trigger reminder")
}
