use salvo::prelude::*;
use tracing::warn;

use super::{accept_post, render_error};
use crate::web::web_state;

/// Front-end commands: post a message or toggle a reaction.
#[handler]
pub async fn chat_command(req: &mut Request, res: &mut Response) {
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
            warn!("failed to read chat command body: {}", err);
            render_error(res, StatusCode::BAD_REQUEST, &format!("invalid body: {err}"));
            return;
        }
    };

    let response = state.outbound.handle(&body).await;
    res.status_code(
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
    );
    res.render(Json(response.body));
}
