// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the external delivery endpoint.

use std::time::Duration;

use async_trait::async_trait;
use courier_config::model::WebhookConfig;
use courier_core::{
    AdapterType, CourierError, HealthStatus, PluginAdapter, WebhookAdapter, WebhookResponse,
};
use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::response::{REQUEST_ID_HEADER, extract_identifier, normalize_body};

/// Request header carrying the endpoint authentication key.
pub const AUTH_HEADER: &str = "x-ins-auth-key";

/// Posts messages to the configured webhook endpoint.
///
/// A missing URL is not a construction error: every send fails with
/// [`CourierError::Config`] instead, so the pipeline can record the failure
/// per message.
#[derive(Clone)]
pub struct WebhookClient {
    client: reqwest::Client,
    url: Option<String>,
    auth_key: Option<SecretString>,
    timeout: Duration,
}

impl std::fmt::Debug for WebhookClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookClient")
            .field("url", &self.url)
            .field("auth_key", &self.auth_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl WebhookClient {
    /// Build a client from configuration.
    ///
    /// Fails only if the auth key cannot be sent as a header value.
    pub fn new(config: &WebhookConfig) -> Result<Self, CourierError> {
        let auth_key = config
            .auth_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .map(|k| {
                HeaderValue::from_str(k).map_err(|e| {
                    CourierError::Config(format!("invalid webhook auth key header value: {e}"))
                })?;
                Ok::<_, CourierError>(SecretString::from(k.to_string()))
            })
            .transpose()?;

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| CourierError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            url: config
                .url
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(str::to_string),
            auth_key,
            timeout: config.timeout(),
        })
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether an endpoint URL is configured.
    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }

    fn map_send_error(&self, e: reqwest::Error) -> CourierError {
        if e.is_timeout() {
            CourierError::Timeout {
                duration: self.timeout,
            }
        } else {
            CourierError::Transport {
                message: format!("webhook request failed: {e}"),
                source: Some(Box::new(e)),
            }
        }
    }
}

#[async_trait]
impl PluginAdapter for WebhookClient {
    fn name(&self) -> &str {
        "webhook"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Webhook
    }

    async fn health_check(&self) -> Result<HealthStatus, CourierError> {
        if self.is_configured() {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy(
                "webhook.url is not configured".to_string(),
            ))
        }
    }

    async fn shutdown(&self) -> Result<(), CourierError> {
        Ok(())
    }
}

#[async_trait]
impl WebhookAdapter for WebhookClient {
    async fn send(
        &self,
        phone_number: &str,
        content: &str,
    ) -> Result<WebhookResponse, CourierError> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| CourierError::Config("webhook.url is not configured".to_string()))?;

        let mut request = self
            .client
            .post(url)
            .timeout(self.timeout)
            .json(&serde_json::json!({ "to": phone_number, "content": content }));

        if let Some(key) = &self.auth_key {
            let mut value = HeaderValue::from_str(key.expose_secret()).map_err(|e| {
                CourierError::Config(format!("invalid webhook auth key header value: {e}"))
            })?;
            value.set_sensitive(true);
            request = request.header(AUTH_HEADER, value);
        }

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(|e| self.map_send_error(e))?;
        let body = normalize_body(&bytes);

        let success = status.is_success();
        let external_message_id = if success {
            extract_identifier(&body, request_id.as_deref())
        } else {
            None
        };

        debug!(
            status = status.as_u16(),
            success,
            external_message_id = external_message_id.as_deref().unwrap_or(""),
            "webhook response received"
        );

        Ok(WebhookResponse {
            success,
            external_message_id,
            body,
            http_status: status.as_u16(),
        })
    }
}
