use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use once_cell::sync::Lazy;

static STARTED_AT: Lazy<Instant> = Lazy::new(Instant::now);

static WEBHOOKS_RECEIVED: AtomicU64 = AtomicU64::new(0);
static MESSAGES_RELAYED: AtomicU64 = AtomicU64::new(0);
static REACTIONS_RELAYED: AtomicU64 = AtomicU64::new(0);
static PUBLISH_FAILURES: AtomicU64 = AtomicU64::new(0);
static COMMANDS_RECEIVED: AtomicU64 = AtomicU64::new(0);
static MESSAGES_POSTED: AtomicU64 = AtomicU64::new(0);
static REACTIONS_TOGGLED: AtomicU64 = AtomicU64::new(0);
static REACTION_REJECTIONS: AtomicU64 = AtomicU64::new(0);
static EMOJI_CACHE_HITS: AtomicU64 = AtomicU64::new(0);
static EMOJI_CACHE_MISSES: AtomicU64 = AtomicU64::new(0);
static EMOJI_CACHE_REFRESH_FAILURES: AtomicU64 = AtomicU64::new(0);

pub struct Metrics;

impl Metrics {
    pub fn mark_started() {
        Lazy::force(&STARTED_AT);
    }

    pub fn webhook_received() {
        WEBHOOKS_RECEIVED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn message_relayed() {
        MESSAGES_RELAYED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reaction_relayed() {
        REACTIONS_RELAYED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn publish_failed() {
        PUBLISH_FAILURES.fetch_add(1, Ordering::Relaxed);
    }

    pub fn command_received() {
        COMMANDS_RECEIVED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn message_posted() {
        MESSAGES_POSTED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reaction_toggled() {
        REACTIONS_TOGGLED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reaction_rejected() {
        REACTION_REJECTIONS.fetch_add(1, Ordering::Relaxed);
    }

    pub fn emoji_cache_hit() {
        EMOJI_CACHE_HITS.fetch_add(1, Ordering::Relaxed);
    }

    pub fn emoji_cache_miss() {
        EMOJI_CACHE_MISSES.fetch_add(1, Ordering::Relaxed);
    }

    pub fn emoji_cache_refresh_failed() {
        EMOJI_CACHE_REFRESH_FAILURES.fetch_add(1, Ordering::Relaxed);
    }
}

pub fn format_prometheus() -> String {
    let counters: [(&str, &str, &AtomicU64); 11] = [
        (
            "relay_webhooks_received_total",
            "Slack webhook deliveries received",
            &WEBHOOKS_RECEIVED,
        ),
        (
            "relay_messages_relayed_total",
            "Messages published to the pub/sub channel",
            &MESSAGES_RELAYED,
        ),
        (
            "relay_reactions_relayed_total",
            "Reaction deltas published to the pub/sub channel",
            &REACTIONS_RELAYED,
        ),
        (
            "relay_publish_failures_total",
            "Publish calls that failed",
            &PUBLISH_FAILURES,
        ),
        (
            "relay_commands_received_total",
            "Front-end commands received",
            &COMMANDS_RECEIVED,
        ),
        (
            "relay_messages_posted_total",
            "Messages posted to Slack",
            &MESSAGES_POSTED,
        ),
        (
            "relay_reactions_toggled_total",
            "Reaction commands that reached a toggle outcome",
            &REACTIONS_TOGGLED,
        ),
        (
            "relay_reaction_rejections_total",
            "Reaction commands Slack rejected",
            &REACTION_REJECTIONS,
        ),
        (
            "relay_emoji_cache_hits_total",
            "Emoji directory reads served from cache",
            &EMOJI_CACHE_HITS,
        ),
        (
            "relay_emoji_cache_misses_total",
            "Emoji directory reads that needed a fetch",
            &EMOJI_CACHE_MISSES,
        ),
        (
            "relay_emoji_cache_refresh_failures_total",
            "Emoji directory fetches that failed",
            &EMOJI_CACHE_REFRESH_FAILURES,
        ),
    ];

    let mut output = format!(
        "# HELP relay_uptime_seconds Number of seconds the relay has been running\n\
         # TYPE relay_uptime_seconds gauge\n\
         relay_uptime_seconds {}\n",
        STARTED_AT.elapsed().as_secs()
    );
    for (name, help, counter) in counters {
        output.push_str(&format!(
            "\n# HELP {name} {help}\n# TYPE {name} counter\n{name} {}\n",
            counter.load(Ordering::Relaxed)
        ));
    }
    output
}
