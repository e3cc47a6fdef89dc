use serde_json::Value;

use crate::relay::ReactionDirection;

/// Message subtypes that still carry a user's new message.
const RELAYED_SUBTYPES: &[&str] = &["thread_broadcast", "file_share"];

/// What an Events API delivery asks the relay to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    UrlVerification { challenge: String },
    Message(MessageEvent),
    Reaction(ReactionEvent),
    Ignored(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    pub channel: String,
    pub text: String,
    pub ts: String,
    pub thread_ts: Option<String>,
    pub user: Option<String>,
}

impl MessageEvent {
    /// Thread root: the parent's ts, or the message's own ts.
    pub fn thread_root(&self) -> &str {
        self.thread_ts.as_deref().unwrap_or(&self.ts)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionEvent {
    pub channel: String,
    pub item_ts: String,
    pub user: Option<String>,
    pub reaction: String,
    pub direction: ReactionDirection,
}

pub fn parse_webhook(body: &Value) -> InboundEvent {
    if body.get("type").and_then(Value::as_str) == Some("url_verification") {
        let challenge = body
            .get("challenge")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return InboundEvent::UrlVerification { challenge };
    }

    let Some(event) = body.get("event") else {
        return InboundEvent::Ignored("no event");
    };

    match event.get("type").and_then(Value::as_str) {
        Some("message") => parse_message(event),
        Some("reaction_added") => parse_reaction(event, ReactionDirection::Add),
        Some("reaction_removed") => parse_reaction(event, ReactionDirection::Remove),
        _ => InboundEvent::Ignored("unhandled event type"),
    }
}

fn parse_message(event: &Value) -> InboundEvent {
    if event.get("bot_id").is_some_and(|value| !value.is_null()) {
        return InboundEvent::Ignored("bot message");
    }
    match event.get("subtype").and_then(Value::as_str) {
        Some("bot_message") => return InboundEvent::Ignored("bot message"),
        Some(subtype) if !RELAYED_SUBTYPES.contains(&subtype) => {
            return InboundEvent::Ignored("message subtype");
        }
        _ => {}
    }

    let Some(channel) = event.get("channel").and_then(Value::as_str) else {
        return InboundEvent::Ignored("message without channel");
    };
    let Some(ts) = event.get("ts").and_then(Value::as_str) else {
        return InboundEvent::Ignored("message without ts");
    };

    InboundEvent::Message(MessageEvent {
        channel: channel.to_string(),
        text: event
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        ts: ts.to_string(),
        thread_ts: string_field(event, "thread_ts"),
        user: string_field(event, "user"),
    })
}

fn parse_reaction(event: &Value, direction: ReactionDirection) -> InboundEvent {
    let Some(channel) = event.pointer("/item/channel").and_then(Value::as_str) else {
        return InboundEvent::Ignored("reaction without item channel");
    };
    let Some(item_ts) = event.pointer("/item/ts").and_then(Value::as_str) else {
        return InboundEvent::Ignored("reaction without item ts");
    };
    let Some(reaction) = event.get("reaction").and_then(Value::as_str) else {
        return InboundEvent::Ignored("reaction without name");
    };

    InboundEvent::Reaction(ReactionEvent {
        channel: channel.to_string(),
        item_ts: item_ts.to_string(),
        user: string_field(event, "user"),
        reaction: reaction.to_string(),
        direction,
    })
}

fn string_field(event: &Value, key: &str) -> Option<String> {
    event
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn url_verification_echoes_challenge() {
        let body = json!({"type": "url_verification", "challenge": "abc123"});
        assert_eq!(
            parse_webhook(&body),
            InboundEvent::UrlVerification {
                challenge: "abc123".to_string()
            }
        );
    }

    #[test]
    fn plain_message_is_relayed() {
        let body = json!({
            "type": "event_callback",
            "event": {
                "type": "message",
                "channel": "C1",
                "user": "U1",
                "text": "hi :wave:",
                "ts": "100.1"
            }
        });
        let InboundEvent::Message(message) = parse_webhook(&body) else {
            panic!("expected message");
        };
        assert_eq!(message.text, "hi :wave:");
        assert_eq!(message.thread_root(), "100.1");
        assert_eq!(message.user.as_deref(), Some("U1"));
    }

    #[test]
    fn threaded_reply_keeps_parent() {
        let body = json!({
            "event": {
                "type": "message",
                "subtype": "thread_broadcast",
                "channel": "C1",
                "text": "reply",
                "ts": "100.2",
                "thread_ts": "100.1"
            }
        });
        let InboundEvent::Message(message) = parse_webhook(&body) else {
            panic!("expected message");
        };
        assert_eq!(message.thread_root(), "100.1");
    }

    #[test]
    fn bot_and_edited_messages_are_ignored() {
        let bot = json!({"event": {"type": "message", "bot_id": "B1", "channel": "C1", "ts": "1.0"}});
        let bot_subtype =
            json!({"event": {"type": "message", "subtype": "bot_message", "channel": "C1", "ts": "1.0"}});
        let edited =
            json!({"event": {"type": "message", "subtype": "message_changed", "channel": "C1", "ts": "1.0"}});

        assert_eq!(parse_webhook(&bot), InboundEvent::Ignored("bot message"));
        assert_eq!(parse_webhook(&bot_subtype), InboundEvent::Ignored("bot message"));
        assert_eq!(parse_webhook(&edited), InboundEvent::Ignored("message subtype"));
    }

    #[test]
    fn reactions_carry_direction_and_item() {
        let added = json!({
            "event": {
                "type": "reaction_added",
                "user": "U1",
                "reaction": "thumbsup",
                "item": {"type": "message", "channel": "C1", "ts": "100.1"}
            }
        });
        assert_eq!(
            parse_webhook(&added),
            InboundEvent::Reaction(ReactionEvent {
                channel: "C1".to_string(),
                item_ts: "100.1".to_string(),
                user: Some("U1".to_string()),
                reaction: "thumbsup".to_string(),
                direction: ReactionDirection::Add,
            })
        );

        let removed = json!({
            "event": {
                "type": "reaction_removed",
                "reaction": "tada",
                "item": {"channel": "C1", "ts": "100.1"}
            }
        });
        let InboundEvent::Reaction(reaction) = parse_webhook(&removed) else {
            panic!("expected reaction");
        };
        assert_eq!(reaction.direction, ReactionDirection::Remove);
        assert_eq!(reaction.user, None);
    }

    #[test]
    fn unknown_payloads_are_ignored() {
        assert_eq!(parse_webhook(&json!({})), InboundEvent::Ignored("no event"));
        assert_eq!(
            parse_webhook(&json!({"event": {"type": "channel_created"}})),
            InboundEvent::Ignored("unhandled event type")
        );
    }
}
