use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, info, warn};

use super::publisher::RelayPublisher;
use super::reaction::{ReactionController, ReactionDirection};
use crate::config::Config;
use crate::slack::SlackApi;
use crate::utils::error::RelayError;
use crate::utils::metrics::Metrics;

/// A request from the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundCommand {
    Message {
        text: String,
        thread_ts: Option<String>,
    },
    Reaction {
        emoji: String,
        thread_ts: String,
        direction: ReactionDirection,
    },
}

#[derive(Debug, Deserialize)]
struct RawCommand {
    #[serde(rename = "type")]
    kind: Option<String>,
    message: Option<String>,
    emoji: Option<String>,
    thread_ts: Option<String>,
}

impl OutboundCommand {
    pub fn parse(body: &[u8]) -> Result<Self, RelayError> {
        let raw: RawCommand = serde_json::from_slice(body)
            .map_err(|err| RelayError::InvalidCommand(format!("invalid JSON body: {err}")))?;
        let thread_ts = non_empty(raw.thread_ts);

        match raw.kind.as_deref() {
            None | Some("message") => {
                let text = non_empty(raw.message)
                    .ok_or_else(|| RelayError::InvalidCommand("message is required".to_string()))?;
                Ok(Self::Message { text, thread_ts })
            }
            Some(kind @ ("reaction" | "remove_reaction")) => {
                let emoji = non_empty(raw.emoji)
                    .ok_or_else(|| RelayError::InvalidCommand("emoji is required".to_string()))?;
                let thread_ts = thread_ts.ok_or_else(|| {
                    RelayError::InvalidCommand("thread_ts is required".to_string())
                })?;
                let direction = if kind == "reaction" {
                    ReactionDirection::Add
                } else {
                    ReactionDirection::Remove
                };
                Ok(Self::Reaction {
                    emoji,
                    thread_ts,
                    direction,
                })
            }
            Some(other) => Err(RelayError::InvalidCommand(format!(
                "unknown command type: {other}"
            ))),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// HTTP status and JSON body for a handled command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResponse {
    pub status: u16,
    pub body: Value,
}

impl CommandResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn from_error(err: &RelayError) -> Self {
        let status = match err {
            RelayError::InvalidCommand(_) => 400,
            _ => 500,
        };
        Self {
            status,
            body: json!({ "error": err.to_string() }),
        }
    }
}

pub struct OutboundCommandHandler {
    config: Arc<Config>,
    slack: Arc<dyn SlackApi>,
    reactions: ReactionController,
    publisher: RelayPublisher,
}

impl OutboundCommandHandler {
    pub fn new(config: Arc<Config>, slack: Arc<dyn SlackApi>, publisher: RelayPublisher) -> Self {
        let reactions = ReactionController::new(slack.clone(), config.clone());
        Self {
            config,
            slack,
            reactions,
            publisher,
        }
    }

    pub async fn handle(&self, body: &[u8]) -> CommandResponse {
        Metrics::command_received();

        let command = match OutboundCommand::parse(body) {
            Ok(command) => command,
            Err(err) => {
                warn!("rejected front-end command: {}", err);
                return CommandResponse::from_error(&err);
            }
        };

        match command {
            OutboundCommand::Message { text, thread_ts } => {
                self.post_message(text, thread_ts.as_deref()).await
            }
            OutboundCommand::Reaction {
                emoji,
                thread_ts,
                direction,
            } => self.toggle_reaction(&emoji, &thread_ts, direction).await,
        }
    }

    async fn post_message(&self, text: String, thread_ts: Option<&str>) -> CommandResponse {
        let result = async {
            let channel = self.config.slack.require_channel_id()?;
            let posted = self.slack.post_message(channel, &text, thread_ts).await?;
            Metrics::message_posted();
            info!("posted front-end message ts={} thread_ts={}", posted.ts, posted.thread_ts);

            self.publisher
                .publish_front_end_message(text.clone(), &posted.thread_ts, &posted.ts)
                .await?;
            Ok::<_, RelayError>(posted)
        }
        .await;

        match result {
            Ok(posted) => CommandResponse::ok(json!({
                "success": true,
                "ts": posted.ts,
                "thread_ts": posted.thread_ts
            })),
            Err(err) => {
                error!("failed to post front-end message: {}", err);
                CommandResponse::from_error(&err)
            }
        }
    }

    async fn toggle_reaction(
        &self,
        emoji: &str,
        thread_ts: &str,
        direction: ReactionDirection,
    ) -> CommandResponse {
        let applied = match self.reactions.apply(thread_ts, emoji, direction).await {
            Ok(applied) => applied,
            Err(RelayError::Rejected { code, emoji: name, .. }) => {
                warn!("slack rejected reaction ts={} code={}", thread_ts, code);
                return CommandResponse::ok(json!({
                    "success": false,
                    "error": code,
                    "emoji": name.unwrap_or_else(|| emoji.to_string())
                }));
            }
            Err(err) => {
                error!("failed to apply reaction ts={}: {}", thread_ts, err);
                return CommandResponse::from_error(&err);
            }
        };

        if let Err(err) = self
            .publisher
            .publish_toggle(applied.outcome, &applied.display_emoji, thread_ts)
            .await
        {
            return CommandResponse::from_error(&err);
        }

        CommandResponse::ok(json!({
            "success": true,
            "action": applied.outcome,
            "emoji": applied.display_emoji
        }))
    }
}
