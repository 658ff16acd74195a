//! Reminders collection

use super::{ResourceController, ResourceKind};
use crate::api::{
    reminders, NewReminder, Reminder, ReminderDetail, ReminderPatch, TriggerOutcome,
    TriggerResponse,
};
use crate::error::{Error, Result};
use crate::gateway::ApiRequest;
use crate::notifier::Notice;
use serde_json::Value;

/// Which reminders the list shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReminderFilter {
    #[default]
    ActiveOnly,
    All,
}

/// Mutations on reminders
#[derive(Debug, Clone, PartialEq)]
pub enum ReminderAction {
    Create(NewReminder),
    Update { id: String, patch: ReminderPatch },
    Toggle { id: String, is_active: bool },
    Delete { id: String },
    /// Run a change check now
    TriggerNow { id: String },
}

/// Reminders resource kind
pub struct Reminders;

pub type ReminderController = ResourceController<Reminders>;

impl ResourceKind for Reminders {
    type Item = Reminder;
    type Filter = ReminderFilter;
    type Action = ReminderAction;

    const LIST_FIELD: &'static str = "reminders";
    const LOAD_FAILED: &'static str = "Failed to fetch reminders";

    fn list_request(filter: &ReminderFilter) -> ApiRequest {
        reminders::list(*filter == ReminderFilter::ActiveOnly)
    }

    fn action_request(action: &ReminderAction) -> Result<ApiRequest> {
        match action {
            ReminderAction::Create(reminder) => {
                let reminder = reminder.clone().normalized();
                reminder.validate()?;
                reminders::create(&reminder)
            }
            ReminderAction::Update { id, patch } => {
                patch.validate()?;
                reminders::update(id, patch)
            }
            ReminderAction::Toggle { id, is_active } => Ok(reminders::toggle(id, *is_active)),
            ReminderAction::Delete { id } => Ok(reminders::delete(id)),
            ReminderAction::TriggerNow { id } => Ok(reminders::trigger(id)),
        }
    }

    fn action_key(action: &ReminderAction) -> String {
        match action {
            ReminderAction::Create(_) => "reminder:create".to_string(),
            ReminderAction::Update { id, .. } => format!("reminder:update:{}", id),
            ReminderAction::Toggle { id, .. } => format!("reminder:toggle:{}", id),
            ReminderAction::Delete { id } => format!("reminder:delete:{}", id),
            ReminderAction::TriggerNow { id } => format!("reminder:trigger:{}", id),
        }
    }

    fn success_notice(action: &ReminderAction, response: &Value) -> Notice {
        match action {
            ReminderAction::Create(_) => Notice::success("Reminder created successfully!"),
            ReminderAction::Update { .. } => Notice::success("Reminder updated successfully!"),
            ReminderAction::Toggle { is_active, .. } => {
                if *is_active {
                    Notice::success("Reminder activated")
                } else {
                    Notice::success("Reminder deactivated")
                }
            }
            ReminderAction::Delete { .. } => Notice::success("Reminder deleted successfully"),
            ReminderAction::TriggerNow { .. } => {
                let response: TriggerResponse =
                    serde_json::from_value(response.clone()).unwrap_or_default();
                match response.outcome() {
                    TriggerOutcome::NoContent => Notice::error(response.summary()),
                    _ => Notice::success(response.summary()),
                }
            }
        }
    }

    fn failure_notice(action: &ReminderAction, error: &Error) -> Notice {
        match action {
            ReminderAction::Create(_) | ReminderAction::Update { .. } => {
                Notice::error(error.user_message())
            }
            ReminderAction::Toggle { .. } => Notice::error("Failed to update status"),
            ReminderAction::Delete { .. } => Notice::error("Failed to delete reminder"),
            ReminderAction::TriggerNow { .. } => Notice::error("Failed to trigger reminder"),
        }
    }
}

impl ResourceController<Reminders> {
    /// Fetch one reminder with its change history
    pub async fn get(&self, reminder_id: &str) -> Result<ReminderDetail> {
        Ok(self.gateway().send(reminders::get(reminder_id)).await?)
    }

    /// Flip a reminder between active and paused
    pub async fn toggle(&self, reminder: &Reminder) -> Result<Value> {
        self.mutate(ReminderAction::Toggle {
            id: reminder.id.clone(),
            is_active: !reminder.is_active,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::NoticeKind;
    use crate::resources::test_support::Harness;
    use crate::resources::LoadOrdering;
    use reqwest::Method;
    use serde_json::json;

    fn reminder_json(id: &str, is_active: bool) -> Value {
        json!({
            "reminder_id": id,
            "url": "https://a.com",
            "email": "a@a.com",
            "interval_hours": 24,
            "is_active": is_active
        })
    }

    #[tokio::test]
    async fn test_create_triggers_exactly_one_load() {
        let mut h = Harness::new();
        let controller = ReminderController::new(h.gateway.clone(), h.notifier.clone());
        h.transport.respond(
            Method::POST,
            "/reminders/create",
            200,
            json!({"message": "Reminder created successfully", "reminder_id": "r1"}),
        );
        h.transport.respond(
            Method::GET,
            "/reminders/list",
            200,
            json!({"reminders": [reminder_json("r1", true)]}),
        );

        controller
            .mutate(ReminderAction::Create(NewReminder::new(
                "https://a.com",
                "a@a.com",
                24,
            )))
            .await
            .unwrap();

        assert_eq!(h.transport.count(Method::GET, "/reminders/list"), 1);
        assert_eq!(h.transport.calls().len(), 2);
        assert_eq!(controller.items()[0].id, "r1");
        assert_eq!(
            h.drain_notices(),
            vec![Notice::success("Reminder created successfully!")]
        );
    }

    #[tokio::test]
    async fn test_create_validation() {
        let mut h = Harness::new();
        let controller = ReminderController::new(h.gateway.clone(), h.notifier.clone());

        let err = controller
            .mutate(ReminderAction::Create(NewReminder::new("https://a.com", "", 24)))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert!(h.transport.calls().is_empty());
        assert_eq!(
            h.drain_notices(),
            vec![Notice::error("Please fill in all required fields")]
        );
    }

    #[tokio::test]
    async fn test_create_failure_surfaces_detail() {
        let mut h = Harness::new();
        let controller = ReminderController::new(h.gateway.clone(), h.notifier.clone());
        h.transport.respond(
            Method::POST,
            "/reminders/create",
            400,
            json!({"detail": "Invalid URL"}),
        );

        controller
            .mutate(ReminderAction::Create(NewReminder::new("https://a.com", "a@a.com", 24)))
            .await
            .unwrap_err();

        assert_eq!(h.drain_notices(), vec![Notice::error("Invalid URL")]);
        assert_eq!(h.transport.count(Method::GET, "/reminders/list"), 0);
    }

    #[tokio::test]
    async fn test_last_completion_wins() {
        let h = Harness::new();
        let controller = ReminderController::with_ordering(
            h.gateway.clone(),
            h.notifier.clone(),
            LoadOrdering::LastCompletion,
        );
        let release = h.transport.respond_gated(
            Method::GET,
            "/reminders/list",
            200,
            json!({"reminders": [reminder_json("first", true)]}),
        );
        h.transport.respond(
            Method::GET,
            "/reminders/list",
            200,
            json!({"reminders": [reminder_json("second", false)]}),
        );

        let first = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.load(ReminderFilter::ActiveOnly).await })
        };
        h.transport.wait_for_calls(1).await;
        controller.load(ReminderFilter::All).await.unwrap();
        assert_eq!(controller.items()[0].id, "second");

        release.send(()).unwrap();
        first.await.unwrap().unwrap();

        let items = controller.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "first");
        assert!(!controller.is_loading());

        let calls = h.transport.calls();
        assert_eq!(calls[0].request.query_value("active_only"), Some("true"));
        assert_eq!(calls[1].request.query_value("active_only"), Some("false"));
    }

    #[tokio::test]
    async fn test_cancelled_load_clears_loading() {
        let h = Harness::new();
        let controller = ReminderController::new(h.gateway.clone(), h.notifier.clone());
        let _release = h
            .transport
            .respond_gated(Method::GET, "/reminders/list", 200, json!({"reminders": []}));

        let task = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.load(ReminderFilter::All).await })
        };
        h.transport.wait_for_calls(1).await;
        assert!(controller.is_loading());

        task.abort();
        let _ = task.await;
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn test_reload_defaults_to_active_only() {
        let mut h = Harness::new();
        let controller = ReminderController::new(h.gateway.clone(), h.notifier.clone());
        h.transport.respond(
            Method::GET,
            "/reminders/list",
            200,
            json!({"reminders": [reminder_json("r1", true)]}),
        );

        assert_eq!(controller.filter(), ReminderFilter::ActiveOnly);
        controller.reload().await.unwrap();

        let call = &h.transport.calls()[0];
        assert_eq!(call.request.query_value("active_only"), Some("true"));
        assert!(h.drain_notices().is_empty());
    }

    #[tokio::test]
    async fn test_get_returns_history() {
        let h = Harness::new();
        let controller = ReminderController::new(h.gateway.clone(), h.notifier.clone());
        h.transport.respond(
            Method::GET,
            "/reminders/r1",
            200,
            json!({
                "reminder": reminder_json("r1", false),
                "history": [{
                    "history_id": "h1",
                    "reminder_id": "r1",
                    "change_summary": "Price dropped",
                    "detected_at": "2026-10-01T08:00:00"
                }]
            }),
        );

        let detail = controller.get("r1").await.unwrap();

        assert!(!detail.reminder.is_active);
        assert_eq!(detail.history.len(), 1);
        assert_eq!(detail.history[0].change_summary.as_deref(), Some("Price dropped"));
        assert!(controller.items().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_sends_new_state() {
        let mut h = Harness::new();
        let controller = ReminderController::new(h.gateway.clone(), h.notifier.clone());
        let reminder: Reminder = serde_json::from_value(reminder_json("r1", true)).unwrap();
        h.transport.respond(Method::PATCH, "/reminders/r1/toggle", 200, json!({}));
        h.transport.respond(Method::GET, "/reminders/list", 200, json!({"reminders": []}));

        controller.toggle(&reminder).await.unwrap();

        let call = &h.transport.calls()[0];
        assert_eq!(call.request.query_value("is_active"), Some("false"));
        assert_eq!(h.drain_notices(), vec![Notice::success("Reminder deactivated")]);
    }

    #[tokio::test]
    async fn test_trigger_notice_follows_outcome() {
        let mut h = Harness::new();
        let controller = ReminderController::new(h.gateway.clone(), h.notifier.clone());
        h.transport.respond(
            Method::POST,
            "/reminders/r1/trigger",
            200,
            json!({"message": "", "result": {"status": "no_content"}}),
        );
        h.transport.respond(
            Method::POST,
            "/reminders/r1/trigger",
            200,
            json!({"message": "No changes detected", "result": {"status": "no_change"}}),
        );
        h.transport.respond(Method::GET, "/reminders/list", 200, json!({"reminders": []}));
        h.transport.respond(Method::GET, "/reminders/list", 200, json!({"reminders": []}));

        let trigger = || ReminderAction::TriggerNow { id: "r1".to_string() };
        controller.mutate(trigger()).await.unwrap();
        controller.mutate(trigger()).await.unwrap();

        let notices = h.drain_notices();
        assert_eq!(notices[0].kind, NoticeKind::Error);
        assert_eq!(notices[0].message, "Could not extract content.");
        assert_eq!(notices[1], Notice::success("No changes detected"));
    }

    #[tokio::test]
    async fn test_trigger_failure_notice() {
        let mut h = Harness::new();
        let controller = ReminderController::new(h.gateway.clone(), h.notifier.clone());
        h.transport.fail(Method::POST, "/reminders/r1/trigger", "connection reset");

        controller
            .mutate(ReminderAction::TriggerNow { id: "r1".to_string() })
            .await
            .unwrap_err();

        assert_eq!(
            h.drain_notices(),
            vec![Notice::error("Failed to trigger reminder")]
        );
    }
}
