use chrono::Utc;
use salvo::prelude::*;
use secrecy::ExposeSecret;
use serde_json::{Value, json};
use tracing::warn;

use super::{accept_post, render_error};
use crate::relay::WebhookReply;
use crate::slack::signature::{SIGNATURE_HEADER, TIMESTAMP_HEADER, verify_slack_v0};
use crate::web::web_state;

/// Slack Events API endpoint. Everything but a bad signature is acknowledged.
#[handler]
pub async fn slack_events(req: &mut Request, res: &mut Response) {
    if !accept_post(req, res) {
        return;
    }
    let Some(state) = web_state() else {
        render_error(res, StatusCode::SERVICE_UNAVAILABLE, "relay is not initialized");
        return;
    };

    let body = match req.payload().await {
        Ok(body) => body.clone(),
        Err(err) => {
            warn!("failed to read slack webhook body: {}", err);
            res.render(Json(json!({ "ok": true })));
            return;
        }
    };

    if let Some(secret) = &state.config.slack.signing_secret {
        let signature = req.header::<String>(SIGNATURE_HEADER);
        let timestamp = req.header::<String>(TIMESTAMP_HEADER);
        if let Err(err) = verify_slack_v0(
            &body,
            signature.as_deref(),
            timestamp.as_deref(),
            secret.expose_secret(),
            Utc::now(),
        ) {
            warn!("rejected slack webhook: {}", err);
            render_error(res, StatusCode::UNAUTHORIZED, &err.to_string());
            return;
        }
    }

    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(err) => {
            warn!("malformed slack webhook body: {}", err);
            res.render(Json(json!({ "ok": true })));
            return;
        }
    };

    match state.inbound.handle(&value).await {
        WebhookReply::Challenge(challenge) => res.render(Json(json!({ "challenge": challenge }))),
        WebhookReply::Ack => res.render(Json(json!({ "ok": true }))),
    }
}
