use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, warn};

use super::publisher::RelayPublisher;
use crate::config::Config;
use crate::emoji::{EmojiDirectoryCache, EmojiTarget, normalize};
use crate::slack::text::display_text;
use crate::slack::{InboundEvent, MessageEvent, ReactionEvent, parse_webhook};
use crate::utils::metrics::Metrics;

/// What the webhook endpoint sends back to Slack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookReply {
    Challenge(String),
    Ack,
}

/// Turns Slack Events API deliveries into pub/sub events. Failures are logged
/// and never reach Slack, which would otherwise retry the delivery.
pub struct InboundWebhookHandler {
    config: Arc<Config>,
    emoji_cache: Arc<EmojiDirectoryCache>,
    publisher: RelayPublisher,
}

impl InboundWebhookHandler {
    pub fn new(
        config: Arc<Config>,
        emoji_cache: Arc<EmojiDirectoryCache>,
        publisher: RelayPublisher,
    ) -> Self {
        Self {
            config,
            emoji_cache,
            publisher,
        }
    }

    pub async fn handle(&self, body: &Value) -> WebhookReply {
        Metrics::webhook_received();

        match parse_webhook(body) {
            InboundEvent::UrlVerification { challenge } => WebhookReply::Challenge(challenge),
            InboundEvent::Message(message) => {
                if self.is_relayed_channel(&message.channel) {
                    self.relay_message(message).await;
                }
                WebhookReply::Ack
            }
            InboundEvent::Reaction(reaction) => {
                if self.is_relayed_channel(&reaction.channel) && !self.is_own_reaction(&reaction) {
                    self.relay_reaction(reaction).await;
                }
                WebhookReply::Ack
            }
            InboundEvent::Ignored(reason) => {
                debug!("ignoring slack event reason={}", reason);
                WebhookReply::Ack
            }
        }
    }

    fn is_relayed_channel(&self, channel: &str) -> bool {
        match self.config.slack.require_channel_id() {
            Ok(expected) if expected == channel => true,
            Ok(expected) => {
                debug!(
                    "ignoring event from other channel channel={} expected={}",
                    channel, expected
                );
                false
            }
            Err(err) => {
                warn!("cannot relay slack event: {}", err);
                false
            }
        }
    }

    /// The outbound path already published reactions the bot itself made.
    fn is_own_reaction(&self, reaction: &ReactionEvent) -> bool {
        match (&self.config.slack.bot_user_id, &reaction.user) {
            (Some(bot), Some(user)) => bot == user,
            _ => false,
        }
    }

    async fn relay_message(&self, message: MessageEvent) {
        let directory = self.emoji_cache.get().await;
        let text = display_text(&message.text, &directory);

        if let Err(err) = self
            .publisher
            .publish_slack_message(text, message.thread_root(), &message.ts)
            .await
        {
            error!("failed to relay slack message ts={}: {}", message.ts, err);
        }
    }

    async fn relay_reaction(&self, reaction: ReactionEvent) {
        let emoji = normalize(&reaction.reaction, EmojiTarget::Display);

        if let Err(err) = self
            .publisher
            .publish_reaction(&emoji, &reaction.item_ts, reaction.direction)
            .await
        {
            error!(
                "failed to relay slack reaction ts={} name={}: {}",
                reaction.item_ts, reaction.reaction, err
            );
        }
    }
}
