use salvo::http::header::{self, HeaderValue};
use salvo::prelude::*;

use crate::utils::metrics::format_prometheus;

#[handler]
pub async fn metrics_endpoint(res: &mut Response) {
    res.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
    );
    res.body(format_prometheus());
}
