//! Endpoint catalog for the resource API
//!
//! Request builders and wire types for every endpoint the client consumes.
//! Builders only describe requests; sending them is the gateway's job.

pub mod agents;
pub mod auth;
pub mod chat;
pub mod reminders;

pub use agents::{Agent, AgentDetail, AgentPatch, AgentStatus, ScrapeConfig, ScrapeRequest};
pub use auth::{AuthResponse, IdentityResponse, MessageResponse};
pub use chat::ChatReply;
pub use reminders::{
    NewReminder, Reminder, ReminderChange, ReminderDetail, ReminderPatch, TriggerOutcome,
    TriggerResponse,
};

use serde::{Deserialize, Deserializer};

/// Treat an explicit `null` the same as a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
