pub mod inbound;
pub mod outbound;
pub mod publisher;
pub mod reaction;

pub use self::inbound::{InboundWebhookHandler, WebhookReply};
pub use self::outbound::OutboundCommandHandler;
pub use self::publisher::RelayPublisher;
pub use self::reaction::ReactionDirection;
