use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use once_cell::sync::OnceCell;
use salvo::http::Method;
use salvo::http::header::{self, HeaderValue};
use salvo::prelude::*;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::emoji::EmojiDirectoryCache;
use crate::relay::{InboundWebhookHandler, OutboundCommandHandler};

mod chat;
mod events;
mod health;
mod metrics;

use chat::chat_command;
use events::slack_events;
use health::{get_status, health_check};
use metrics::metrics_endpoint;

const ALLOWED_METHODS: &str = "POST, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type, X-Slack-Signature, X-Slack-Request-Timestamp";

pub struct WebState {
    pub config: Arc<Config>,
    pub inbound: InboundWebhookHandler,
    pub outbound: OutboundCommandHandler,
    pub emoji_cache: Arc<EmojiDirectoryCache>,
    pub started_at: Instant,
}

static WEB_STATE: OnceCell<WebState> = OnceCell::new();

pub fn web_state() -> Option<&'static WebState> {
    WEB_STATE.get()
}

#[derive(Clone)]
pub struct WebServer {
    config: Arc<Config>,
}

impl WebServer {
    pub fn new(state: WebState) -> Self {
        let config = state.config.clone();
        if WEB_STATE.set(state).is_err() {
            warn!("web state was already initialized; keeping the first one");
        }
        Self { config }
    }

    pub async fn start(&self) -> Result<()> {
        let bind_addr = format!(
            "{}:{}",
            self.config.server.bind_address, self.config.server.port
        );
        info!("starting web server on {}", bind_addr);

        let acceptor = TcpListener::new(bind_addr).bind().await;
        Server::new(acceptor).serve(root_router()).await;

        Ok(())
    }
}

pub fn root_router() -> Router {
    Router::new()
        .push(Router::with_path("health").get(health_check))
        .push(Router::with_path("status").get(get_status))
        .push(Router::with_path("metrics").get(metrics_endpoint))
        .push(
            Router::with_path("api")
                .push(Router::with_path("events").goal(slack_events))
                .push(Router::with_path("chat").goal(chat_command)),
        )
}

fn render_error(res: &mut Response, status: StatusCode, message: &str) {
    res.status_code(status);
    res.render(Json(json!({ "error": message })));
}

/// Sets CORS headers and answers anything that is not a POST. Returns true
/// when the handler should go on to process the body.
fn accept_post(req: &Request, res: &mut Response) -> bool {
    apply_cors(req, res);
    match req.method() {
        &Method::POST => true,
        &Method::OPTIONS => {
            res.status_code(StatusCode::OK);
            false
        }
        other => {
            debug!("method not allowed method={} path={}", other, req.uri().path());
            res.headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
            res.status_code(StatusCode::METHOD_NOT_ALLOWED);
            false
        }
    }
}

/// Echoes the caller's `Origin`, limited to `server.allowed_origins` when that
/// list is non-empty.
fn apply_cors(req: &Request, res: &mut Response) {
    let Some(origin) = req.header::<String>(header::ORIGIN) else {
        return;
    };
    if let Some(state) = web_state() {
        let allowed = &state.config.server.allowed_origins;
        if !allowed.is_empty() && !allowed.iter().any(|candidate| candidate == &origin) {
            debug!("origin not allowed origin={}", origin);
            return;
        }
    }
    let Ok(origin) = HeaderValue::from_str(&origin) else {
        return;
    };

    let headers = res.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    headers.insert(header::VARY, HeaderValue::from_static("Origin"));
}
