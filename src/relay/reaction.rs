use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::emoji::{EmojiTarget, normalize};
use crate::slack::SlackApi;
use crate::utils::error::RelayError;
use crate::utils::metrics::Metrics;

const ALREADY_REACTED: &str = "already_reacted";
const NO_REACTION: &str = "no_reaction";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionDirection {
    Add,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ToggleOutcome {
    Added,
    Removed,
    AlreadyRemoved,
}

impl ToggleOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::AlreadyRemoved => "alreadyRemoved",
        }
    }
}

impl fmt::Display for ToggleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionApplied {
    pub outcome: ToggleOutcome,
    /// Name sent to `reactions.add` / `reactions.remove`.
    pub api_name: String,
    /// Form republished to subscribers.
    pub display_emoji: String,
}

/// Whether the bot's reaction is on the message, as far as Slack has told us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RemoteState {
    Unset,
    Set,
}

impl RemoteState {
    /// The state a command presumes until Slack says otherwise.
    fn assumed_for(direction: ReactionDirection) -> Self {
        match direction {
            ReactionDirection::Add => Self::Unset,
            ReactionDirection::Remove => Self::Set,
        }
    }

    fn revealed_by(err: &RelayError) -> Option<Self> {
        match err.rejection_code()? {
            ALREADY_REACTED => Some(Self::Set),
            NO_REACTION => Some(Self::Unset),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReactionCall {
    Add,
    Remove,
}

impl ReactionCall {
    fn outcome(self) -> ToggleOutcome {
        match self {
            Self::Add => ToggleOutcome::Added,
            Self::Remove => ToggleOutcome::Removed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Call(ReactionCall),
    Settle(ToggleOutcome),
}

fn next_step(direction: ReactionDirection, state: RemoteState) -> Step {
    match (direction, state) {
        (ReactionDirection::Add, RemoteState::Unset) => Step::Call(ReactionCall::Add),
        (ReactionDirection::Add, RemoteState::Set) => Step::Call(ReactionCall::Remove),
        (ReactionDirection::Remove, RemoteState::Set) => Step::Call(ReactionCall::Remove),
        (ReactionDirection::Remove, RemoteState::Unset) => {
            Step::Settle(ToggleOutcome::AlreadyRemoved)
        }
    }
}

/// Applies a front-end reaction command to a message in the configured
/// channel. `Add` on an existing reaction toggles it off.
pub struct ReactionController {
    slack: Arc<dyn SlackApi>,
    config: Arc<Config>,
}

impl ReactionController {
    pub fn new(slack: Arc<dyn SlackApi>, config: Arc<Config>) -> Self {
        Self { slack, config }
    }

    pub async fn apply(
        &self,
        thread_ts: &str,
        emoji: &str,
        direction: ReactionDirection,
    ) -> Result<ReactionApplied, RelayError> {
        let channel = self.config.slack.require_channel_id()?;
        let api_name = normalize(emoji, EmojiTarget::Api);
        let display_emoji = normalize(&api_name, EmojiTarget::Display);

        let result = self.run(channel, thread_ts, &api_name, direction).await;
        match &result {
            Ok(outcome) => {
                Metrics::reaction_toggled();
                info!(
                    "reaction applied ts={} name={} outcome={}",
                    thread_ts, api_name, outcome
                );
            }
            Err(RelayError::Rejected { .. }) => Metrics::reaction_rejected(),
            Err(_) => {}
        }

        Ok(ReactionApplied {
            outcome: result?,
            api_name,
            display_emoji,
        })
    }

    async fn run(
        &self,
        channel: &str,
        ts: &str,
        name: &str,
        direction: ReactionDirection,
    ) -> Result<ToggleOutcome, RelayError> {
        let mut state = RemoteState::assumed_for(direction);
        let mut corrected = false;

        loop {
            let call = match next_step(direction, state) {
                Step::Settle(outcome) => return Ok(outcome),
                Step::Call(call) => call,
            };

            let result = match call {
                ReactionCall::Add => self.slack.add_reaction(channel, ts, name).await,
                ReactionCall::Remove => self.slack.remove_reaction(channel, ts, name).await,
            };
            let err = match result {
                Ok(()) => return Ok(call.outcome()),
                Err(err) => err,
            };

            match RemoteState::revealed_by(&err) {
                Some(revealed) if !corrected && revealed != state => {
                    debug!(
                        "reaction state corrected ts={} name={} state={:?}",
                        ts, name, revealed
                    );
                    state = revealed;
                    corrected = true;
                }
                _ => return Err(err.with_emoji(name)),
            }
        }
    }
}
