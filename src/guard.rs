//! Route guard
//!
//! Gates navigation on the session status. Public routes always render;
//! protected routes wait for the session to settle and send anonymous users
//! to the login page, once per anonymous episode.

use crate::session::{Session, SessionStatus};
use std::fmt;
use tokio::sync::watch;

/// Navigable destinations
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    ResetPassword { token: Option<String> },
    NotFound,
    Home,
    Agents,
    Reminders,
    Chat { agent_id: String },
}

impl Route {
    /// Parse a path such as `/agents/a1/chat` or `/reset-password?token=x`
    ///
    /// Anything unrecognized maps to [`Route::NotFound`].
    pub fn parse(path: &str) -> Self {
        let (path, query) = match path.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (path, None),
        };
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Route::Home,
            ["login"] => Route::Login,
            ["reset-password"] => Route::ResetPassword {
                token: query
                    .and_then(|q| query_param(q, "token"))
                    .filter(|t| !t.is_empty()),
            },
            ["404"] => Route::NotFound,
            ["agents"] => Route::Agents,
            ["reminders"] => Route::Reminders,
            ["agents", agent_id, "chat"] => Route::Chat {
                agent_id: (*agent_id).to_string(),
            },
            _ => Route::NotFound,
        }
    }

    /// Reachable without a session
    pub fn is_public(&self) -> bool {
        matches!(
            self,
            Route::Login | Route::ResetPassword { .. } | Route::NotFound
        )
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::ResetPassword { token: Some(token) } => {
                format!("/reset-password?token={}", token)
            }
            Route::ResetPassword { token: None } => "/reset-password".to_string(),
            Route::NotFound => "/404".to_string(),
            Route::Home => "/".to_string(),
            Route::Agents => "/agents".to_string(),
            Route::Reminders => "/reminders".to_string(),
            Route::Chat { agent_id } => format!("/agents/{}/chat", agent_id),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

fn query_param(query: &str, name: &str) -> Option<String> {
    query.split('&').find_map(|pair| match pair.split_once('=') {
        Some((key, value)) if key == name => Some(value.to_string()),
        None if pair == name => Some(String::new()),
        _ => None,
    })
}

/// What the host should do with a navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Show the route
    Render,
    /// Session not settled yet; show a loading indicator
    Loading,
    /// Navigate to the given route instead
    Redirect(Route),
    /// Still anonymous; the redirect for this episode was already issued
    Redirected,
}

/// Decision for `route` under `status`
pub fn decide(status: SessionStatus, route: &Route) -> GuardDecision {
    if route.is_public() {
        return GuardDecision::Render;
    }
    match status {
        SessionStatus::Unknown | SessionStatus::Authenticating => GuardDecision::Loading,
        SessionStatus::Anonymous => GuardDecision::Redirect(Route::Login),
        SessionStatus::Authenticated => GuardDecision::Render,
    }
}

/// Stateful guard that follows a session
pub struct RouteGuard {
    session: watch::Receiver<Session>,
    redirected: bool,
}

impl RouteGuard {
    pub fn new(session: watch::Receiver<Session>) -> Self {
        Self {
            session,
            redirected: false,
        }
    }

    /// Decision for the current session status
    pub fn current(&mut self, route: &Route) -> GuardDecision {
        let status = self.session.borrow_and_update().status();
        self.evaluate(status, route)
    }

    /// Wait for the session to settle, then decide
    ///
    /// If the session store is gone the last published status is used.
    pub async fn settle(&mut self, route: &Route) -> GuardDecision {
        let settled = self
            .session
            .wait_for(|s| s.status().is_terminal())
            .await
            .map(|session| session.status())
            .ok();
        let status = settled.unwrap_or_else(|| self.session.borrow().status());
        self.evaluate(status, route)
    }

    fn evaluate(&mut self, status: SessionStatus, route: &Route) -> GuardDecision {
        if status != SessionStatus::Anonymous {
            self.redirected = false;
        }

        match decide(status, route) {
            GuardDecision::Redirect(target) => {
                if self.redirected {
                    return GuardDecision::Redirected;
                }
                self.redirected = true;
                tracing::debug!("Redirecting {} to {}", route, target);
                GuardDecision::Redirect(target)
            }
            decision => decision,
        }
    }
}
