use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use serde_json::{Value, json};
use sha2::Sha256;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::utils::error::RelayError;
use crate::utils::hex::encode_hex;

const AUTH_VERSION: &str = "1.0";

/// Realtime channel the relay fans events out to.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, channel: &str, event: &str, payload: &Value) -> Result<(), RelayError>;
}

/// Pusher Channels HTTP API, `POST /apps/{app_id}/events`.
#[derive(Clone)]
pub struct PusherClient {
    config: Arc<Config>,
    http: reqwest::Client,
}

impl PusherClient {
    pub fn new(config: Arc<Config>) -> Result<Self, RelayError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("slack-pusher-relay/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { config, http })
    }
}

#[async_trait]
impl EventPublisher for PusherClient {
    async fn publish(&self, channel: &str, event: &str, payload: &Value) -> Result<(), RelayError> {
        let (app_id, key, secret) = self.config.pusher.credentials()?;
        let base_url = self.config.pusher.base_url()?;

        let data = serde_json::to_string(payload)
            .map_err(|err| RelayError::Transport(format!("failed to encode event data: {err}")))?;
        let body = serde_json::to_vec(&json!({
            "name": event,
            "channels": [channel],
            "data": data
        }))
        .map_err(|err| RelayError::Transport(format!("failed to encode event body: {err}")))?;

        let path = format!("/apps/{app_id}/events");
        let mut url = Url::parse(&format!("{base_url}{path}"))
            .map_err(|err| RelayError::Configuration(format!("invalid pusher host: {err}")))?;
        let query = signed_query(
            &path,
            key,
            secret,
            &body,
            &Utc::now().timestamp().to_string(),
        );
        url.query_pairs_mut().extend_pairs(query.iter());

        debug!("publishing pusher event channel={} event={}", channel, event);
        let response = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|err| RelayError::Transport(format!("pusher request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RelayError::Transport(format!(
                "pusher publish failed status={status} body={text}"
            )));
        }
        Ok(())
    }
}

/// Auth query for a Pusher REST call: the sorted auth parameters followed by
/// `auth_signature`.
fn signed_query(
    path: &str,
    key: &str,
    secret: &str,
    body: &[u8],
    timestamp: &str,
) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("auth_key", key.to_string()),
        ("auth_timestamp", timestamp.to_string()),
        ("auth_version", AUTH_VERSION.to_string()),
        ("body_md5", encode_hex(&Md5::digest(body))),
    ];
    params.sort_by(|left, right| left.0.cmp(right.0));

    let signature = sign(secret, &string_to_sign(path, &params));
    params.push(("auth_signature", signature));
    params
}

fn string_to_sign(path: &str, params: &[(&str, String)]) -> String {
    let query = params
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("POST\n{path}\n{query}")
}

fn sign(secret: &str, payload: &str) -> String {
    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(payload.as_bytes());
    encode_hex(&mac.finalize().into_bytes())
}
