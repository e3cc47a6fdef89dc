use salvo::prelude::*;
use serde_json::json;

use super::render_error;
use crate::web::web_state;

#[handler]
pub async fn health_check(res: &mut Response) {
    res.render("OK");
}

#[handler]
pub async fn get_status(res: &mut Response) {
    let Some(state) = web_state() else {
        render_error(res, StatusCode::SERVICE_UNAVAILABLE, "relay is not initialized");
        return;
    };
    let uptime_seconds = state.started_at.elapsed().as_secs();

    let status = json!({
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": uptime_seconds,
        "relay": {
            "slack_channel": state.config.slack.channel_id,
            "pusher_channel": state.config.pusher.channel,
        },
        "emoji_cache": {
            "entries": state.emoji_cache.snapshot_len(),
            "age_seconds": state.emoji_cache.snapshot_age().map(|age| age.num_seconds()),
        }
    });

    res.render(Json(status));
}
