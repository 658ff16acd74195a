//! Request gateway
//!
//! Every call to the resource API goes through [`RequestGateway`]. It reads
//! the credential from the current session at issue time, delegates the
//! exchange to a [`Transport`], and turns every failure into an [`ApiError`].

use super::error::ApiError;
use super::transport::{ApiRequest, Transport};
use crate::session::Session;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;

/// Credential-injecting, failure-normalizing front for the resource API
#[derive(Clone)]
pub struct RequestGateway {
    transport: Arc<dyn Transport>,
    session: watch::Receiver<Session>,
}

impl RequestGateway {
    /// Create a gateway that reads credentials from `session`
    pub fn new(transport: Arc<dyn Transport>, session: watch::Receiver<Session>) -> Self {
        Self { transport, session }
    }

    /// Credential that a request issued right now would carry
    pub fn credential(&self) -> Option<String> {
        self.session.borrow().token().map(str::to_string)
    }

    /// Send a request and return the decoded JSON body
    ///
    /// Empty success bodies decode as `null`.
    pub async fn send_value(&self, request: ApiRequest) -> Result<Value, ApiError> {
        // Captured once; a logout while this request is in flight does not affect it
        let credential = self.credential();
        let method = request.method.clone();
        let path = request.path.clone();
        let fallback = request.fallback.clone();

        tracing::debug!(
            "{} {} (credential: {})",
            method,
            path,
            if credential.is_some() { "yes" } else { "no" }
        );

        let response = match self.transport.execute(request, credential).await {
            Ok(response) => response,
            Err(e) => {
                let err = ApiError::from_transport(&e.message, &fallback);
                tracing::warn!("{} {} failed in transport: {}", method, path, err);
                return Err(err);
            }
        };

        if !response.is_success() {
            let err = ApiError::from_status(response.status, &response.body, &fallback);
            tracing::debug!(
                "{} {} returned {}: {}",
                method,
                path,
                response.status,
                err
            );
            return Err(err);
        }

        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&response.body).map_err(|e| {
            ApiError::new(
                Some(response.status),
                format!("invalid response body: {}", e),
                Some(Value::String(response.body.clone())),
            )
        })
    }

    /// Send a request and decode the body into `T`
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let value = self.send_value(request).await?;
        serde_json::from_value(value.clone()).map_err(|e| {
            ApiError::new(
                None,
                format!("invalid response body: {}", e),
                Some(value),
            )
        })
    }
}
