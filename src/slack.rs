use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::config::Config;
use crate::emoji::{EmojiDirectory, EmojiDirectorySource};
use crate::utils::error::RelayError;

pub mod events;
pub mod signature;
pub mod text;

pub use self::events::{InboundEvent, MessageEvent, ReactionEvent, parse_webhook};

/// Where `chat.postMessage` put the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub ts: String,
    /// Thread the message belongs to. A message that started a thread is its
    /// own root.
    pub thread_ts: String,
}

/// The Slack Web API calls the relay makes on behalf of the front end.
#[async_trait]
pub trait SlackApi: Send + Sync {
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<PostedMessage, RelayError>;

    async fn add_reaction(&self, channel: &str, ts: &str, name: &str) -> Result<(), RelayError>;

    async fn remove_reaction(&self, channel: &str, ts: &str, name: &str)
    -> Result<(), RelayError>;
}

#[derive(Clone)]
pub struct SlackClient {
    config: Arc<Config>,
    http: reqwest::Client,
}

impl SlackClient {
    pub fn new(config: Arc<Config>) -> Result<Self, RelayError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("slack-pusher-relay/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { config, http })
    }

    async fn slack_api_post(&self, method: &str, payload: Value) -> Result<Value, RelayError> {
        let token = self.config.slack.require_bot_token()?;
        let url = format!("{}/{method}", self.config.slack.api_base_url);
        debug!("calling slack api method={}", method);

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
            .map_err(|err| {
                RelayError::Transport(format!("request to Slack API method {method} failed: {err}"))
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::Transport(format!(
                "Slack API {method} failed status={status}"
            )));
        }
        let value: Value = response.json().await.map_err(|err| {
            RelayError::Transport(format!("Slack API method {method} returned non-JSON body: {err}"))
        })?;

        if !value.get("ok").and_then(Value::as_bool).unwrap_or(false) {
            let code = value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown_error");
            return Err(RelayError::rejected(method, code));
        }

        Ok(value)
    }

    /// The user id Slack attributes the bot's own reactions to.
    pub async fn bot_user_id(&self) -> Result<String, RelayError> {
        let value = self.slack_api_post("auth.test", json!({})).await?;
        value
            .get("user_id")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned)
            .ok_or_else(|| RelayError::Transport("auth.test response missing user_id".to_string()))
    }

    async fn reaction_call(
        &self,
        method: &str,
        channel: &str,
        ts: &str,
        name: &str,
    ) -> Result<(), RelayError> {
        let payload = json!({
            "channel": channel,
            "timestamp": ts,
            "name": name
        });
        self.slack_api_post(method, payload)
            .await
            .map(|_| ())
            .map_err(|err| err.with_emoji(name))
    }
}

#[async_trait]
impl SlackApi for SlackClient {
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<PostedMessage, RelayError> {
        let mut payload = json!({
            "channel": channel,
            "text": text
        });
        if let Some(thread_ts) = thread_ts {
            payload["thread_ts"] = Value::String(thread_ts.to_string());
        }

        let value = self.slack_api_post("chat.postMessage", payload).await?;
        let ts = value
            .get("ts")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                RelayError::Transport("chat.postMessage response missing ts".to_string())
            })?
            .to_string();
        let thread_ts = thread_ts.map(ToOwned::to_owned).unwrap_or_else(|| ts.clone());
        Ok(PostedMessage { ts, thread_ts })
    }

    async fn add_reaction(&self, channel: &str, ts: &str, name: &str) -> Result<(), RelayError> {
        self.reaction_call("reactions.add", channel, ts, name).await
    }

    async fn remove_reaction(
        &self,
        channel: &str,
        ts: &str,
        name: &str,
    ) -> Result<(), RelayError> {
        self.reaction_call("reactions.remove", channel, ts, name).await
    }
}

#[async_trait]
impl EmojiDirectorySource for SlackClient {
    async fn fetch_emoji_directory(&self) -> Result<EmojiDirectory, RelayError> {
        let value = self.slack_api_post("emoji.list", json!({})).await?;
        let listing = value
            .get("emoji")
            .and_then(Value::as_object)
            .ok_or_else(|| RelayError::Transport("emoji.list response missing emoji".to_string()))?;

        Ok(EmojiDirectory::from_listing(listing.iter().filter_map(
            |(name, target)| target.as_str().map(|target| (name.clone(), target)),
        )))
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use secrecy::SecretString;

    use super::*;
    use crate::emoji::directory::DirectoryEntry;

    fn client_for(server: &MockServer, token: Option<&str>) -> SlackClient {
        let mut config = Config::default();
        config.slack.api_base_url = server.base_url();
        config.slack.bot_token = token.map(SecretString::from);
        SlackClient::new(Arc::new(config)).expect("client")
    }

    #[tokio::test]
    async fn add_reaction_sends_bearer_token_and_name() {
        let server = MockServer::start();
        let add = server.mock(|when, then| {
            when.method(POST)
                .path("/reactions.add")
                .header("authorization", "Bearer xoxb-test")
                .body_includes("\"name\":\"thumbsup\"")
                .body_includes("\"timestamp\":\"100.1\"");
            then.status(200).json_body(json!({"ok": true}));
        });

        let client = client_for(&server, Some("xoxb-test"));
        client
            .add_reaction("C1", "100.1", "thumbsup")
            .await
            .expect("reaction added");
        add.assert_calls(1);
    }

    #[tokio::test]
    async fn ok_false_becomes_rejection_with_emoji() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/reactions.add");
            then.status(200)
                .json_body(json!({"ok": false, "error": "already_reacted"}));
        });

        let client = client_for(&server, Some("xoxb-test"));
        let err = client
            .add_reaction("C1", "100.1", "thumbsup")
            .await
            .expect_err("rejected");
        assert_eq!(
            err,
            RelayError::Rejected {
                method: "reactions.add".to_string(),
                code: "already_reacted".to_string(),
                emoji: Some("thumbsup".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn non_success_status_is_transport_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/reactions.remove");
            then.status(503).body("unavailable");
        });

        let client = client_for(&server, Some("xoxb-test"));
        let err = client
            .remove_reaction("C1", "100.1", "thumbsup")
            .await
            .expect_err("transport failure");
        assert!(matches!(err, RelayError::Transport(_)));
    }

    #[tokio::test]
    async fn missing_token_fails_before_any_request() {
        let server = MockServer::start();
        let post = server.mock(|when, then| {
            when.method(POST).path("/chat.postMessage");
            then.status(200).json_body(json!({"ok": true, "ts": "1.0"}));
        });

        let client = client_for(&server, None);
        let err = client
            .post_message("C1", "hello", None)
            .await
            .expect_err("no token");
        assert!(matches!(err, RelayError::Configuration(_)));
        post.assert_calls(0);
    }

    #[tokio::test]
    async fn post_message_reports_thread() {
        let server = MockServer::start();
        let top_level = server.mock(|when, then| {
            when.method(POST)
                .path("/chat.postMessage")
                .body_includes("\"text\":\"hello\"");
            then.status(200)
                .json_body(json!({"ok": true, "channel": "C1", "ts": "200.2"}));
        });
        let reply = server.mock(|when, then| {
            when.method(POST)
                .path("/chat.postMessage")
                .body_includes("\"thread_ts\":\"100.1\"");
            then.status(200)
                .json_body(json!({"ok": true, "channel": "C1", "ts": "200.3"}));
        });

        let client = client_for(&server, Some("xoxb-test"));
        let posted = client
            .post_message("C1", "hello", None)
            .await
            .expect("posted");
        assert_eq!(
            posted,
            PostedMessage {
                ts: "200.2".to_string(),
                thread_ts: "200.2".to_string(),
            }
        );

        let posted = client
            .post_message("C1", "in thread", Some("100.1"))
            .await
            .expect("posted reply");
        assert_eq!(posted.ts, "200.3");
        assert_eq!(posted.thread_ts, "100.1");
        top_level.assert_calls(1);
        reply.assert_calls(1);
    }

    #[tokio::test]
    async fn auth_test_reports_bot_user() {
        let server = MockServer::start();
        let auth = server.mock(|when, then| {
            when.method(POST)
                .path("/auth.test")
                .header("authorization", "Bearer xoxb-test");
            then.status(200)
                .json_body(json!({"ok": true, "user_id": "UBOT", "team_id": "T1"}));
        });

        let client = client_for(&server, Some("xoxb-test"));
        assert_eq!(client.bot_user_id().await, Ok("UBOT".to_string()));
        auth.assert_calls(1);
    }

    #[tokio::test]
    async fn emoji_list_builds_directory() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/emoji.list");
            then.status(200).json_body(json!({
                "ok": true,
                "emoji": {
                    "party_parrot": "https://emoji.slack-edge.com/T1/party_parrot/abc.gif",
                    "parrot": "alias:party_parrot"
                }
            }));
        });

        let client = client_for(&server, Some("xoxb-test"));
        let directory = client.fetch_emoji_directory().await.expect("directory");
        assert_eq!(directory.len(), 2);
        assert_eq!(
            directory.get("parrot"),
            Some(&DirectoryEntry::Alias("party_parrot".to_string()))
        );
    }
}
