//! Scripted transport for unit tests

use super::transport::{ApiRequest, ApiResponse, Transport, TransportError};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, Notify};

struct Scripted {
    outcome: Result<ApiResponse, TransportError>,
    gate: Option<oneshot::Receiver<()>>,
}

/// A request as the transport saw it
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub request: ApiRequest,
    pub credential: Option<String>,
}

/// Replays queued responses per `(method, path)`, in order
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Scripted>>>,
    calls: Mutex<Vec<RecordedCall>>,
    call_made: Notify,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, method: Method, path: &str, scripted: Scripted) {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(scripted);
    }

    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        self.respond_raw(method, path, status, &body.to_string());
    }

    pub fn respond_raw(&self, method: Method, path: &str, status: u16, body: &str) {
        self.push(
            method,
            path,
            Scripted {
                outcome: Ok(ApiResponse::new(status, body)),
                gate: None,
            },
        );
    }

    pub fn fail(&self, method: Method, path: &str, message: &str) {
        self.push(
            method,
            path,
            Scripted {
                outcome: Err(TransportError::new(message)),
                gate: None,
            },
        );
    }

    /// Queue a response that is held back until the returned sender fires
    pub fn respond_gated(
        &self,
        method: Method,
        path: &str,
        status: u16,
        body: Value,
    ) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.push(
            method,
            path,
            Scripted {
                outcome: Ok(ApiResponse::json(status, &body)),
                gate: Some(rx),
            },
        );
        tx
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.request.method == method && c.request.path == path)
            .count()
    }

    /// Wait until at least `n` requests have reached the transport
    pub async fn wait_for_calls(&self, n: usize) {
        loop {
            let notified = self.call_made.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.calls.lock().unwrap().len() >= n {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(
        &self,
        request: ApiRequest,
        credential: Option<String>,
    ) -> Result<ApiResponse, TransportError> {
        let key = (request.method.clone(), request.path.clone());
        self.calls.lock().unwrap().push(RecordedCall {
            request,
            credential,
        });
        self.call_made.notify_waiters();

        let scripted = self
            .routes
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front);

        let Some(scripted) = scripted else {
            let body = json!({"detail": format!("no scripted response for {} {}", key.0, key.1)});
            return Ok(ApiResponse::json(404, &body));
        };

        if let Some(gate) = scripted.gate {
            let _ = gate.await;
        }
        scripted.outcome
    }
}
