use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use super::reaction::{ReactionDirection, ToggleOutcome};
use crate::config::Config;
use crate::pusher::EventPublisher;
use crate::utils::error::RelayError;
use crate::utils::metrics::Metrics;

pub const MESSAGE_EVENT: &str = "message";
pub const REACTION_EVENT: &str = "reaction";
pub const REACTION_REMOVED_EVENT: &str = "reaction_removed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessagePayload {
    pub text: String,
    pub user: String,
    #[serde(rename = "isUser")]
    pub is_user: bool,
    pub thread_ts: String,
    pub ts: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReactionPayload {
    pub emoji: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    pub thread_ts: String,
}

/// Shapes relay events and hands them to the configured pub/sub channel.
#[derive(Clone)]
pub struct RelayPublisher {
    publisher: Arc<dyn EventPublisher>,
    config: Arc<Config>,
}

impl RelayPublisher {
    pub fn new(publisher: Arc<dyn EventPublisher>, config: Arc<Config>) -> Self {
        Self { publisher, config }
    }

    /// A message typed in Slack.
    pub async fn publish_slack_message(
        &self,
        text: String,
        thread_ts: &str,
        ts: &str,
    ) -> Result<(), RelayError> {
        let payload = MessagePayload {
            text,
            user: self.config.relay.platform_display_name.clone(),
            is_user: false,
            thread_ts: thread_ts.to_string(),
            ts: ts.to_string(),
        };
        self.send(MESSAGE_EVENT, &payload).await?;
        Metrics::message_relayed();
        Ok(())
    }

    /// A message the front end posted through the relay.
    pub async fn publish_front_end_message(
        &self,
        text: String,
        thread_ts: &str,
        ts: &str,
    ) -> Result<(), RelayError> {
        let payload = MessagePayload {
            text,
            user: self.config.relay.front_end_display_name.clone(),
            is_user: true,
            thread_ts: thread_ts.to_string(),
            ts: ts.to_string(),
        };
        self.send(MESSAGE_EVENT, &payload).await?;
        Metrics::message_relayed();
        Ok(())
    }

    pub async fn publish_reaction(
        &self,
        emoji: &str,
        thread_ts: &str,
        direction: ReactionDirection,
    ) -> Result<(), RelayError> {
        let (event, count) = match direction {
            ReactionDirection::Add => (REACTION_EVENT, Some(1)),
            ReactionDirection::Remove => (REACTION_REMOVED_EVENT, None),
        };
        let payload = ReactionPayload {
            emoji: emoji.to_string(),
            count,
            thread_ts: thread_ts.to_string(),
        };
        self.send(event, &payload).await?;
        Metrics::reaction_relayed();
        Ok(())
    }

    /// Republishes the delta a front-end toggle produced. Nothing changed for
    /// `AlreadyRemoved`, so nothing is sent.
    pub async fn publish_toggle(
        &self,
        outcome: ToggleOutcome,
        emoji: &str,
        thread_ts: &str,
    ) -> Result<(), RelayError> {
        match outcome {
            ToggleOutcome::Added => {
                self.publish_reaction(emoji, thread_ts, ReactionDirection::Add)
                    .await
            }
            ToggleOutcome::Removed => {
                self.publish_reaction(emoji, thread_ts, ReactionDirection::Remove)
                    .await
            }
            ToggleOutcome::AlreadyRemoved => Ok(()),
        }
    }

    async fn send<T: Serialize>(&self, event: &str, payload: &T) -> Result<(), RelayError> {
        let channel = &self.config.pusher.channel;
        let value = serde_json::to_value(payload)
            .map_err(|err| RelayError::Transport(format!("failed to encode {event} payload: {err}")))?;

        match self.publisher.publish(channel, event, &value).await {
            Ok(()) => {
                info!("relayed event={} channel={}", event, channel);
                Ok(())
            }
            Err(err) => {
                Metrics::publish_failed();
                error!("failed to publish event={} channel={}: {}", event, channel, err);
                Err(err)
            }
        }
    }
}
