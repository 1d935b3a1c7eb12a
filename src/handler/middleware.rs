use crate::metrics::consts::*;
use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use metrics::{counter, histogram};

/// Records status and latency. The body is passed through untouched so
/// streamed responses stay streamed; the duration covers time to headers.
pub(crate) async fn metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let response = next.run(request).await;

    if response.status().is_success() || response.status().is_redirection() {
        counter!(HTTP_RESPONSE_SUCCESS).increment(1)
    } else {
        counter!(HTTP_RESPONSE_FAILURE, "status" => response.status().as_u16().to_string())
            .increment(1)
    }

    histogram!(HTTP_REQUEST_DURATION_SECS).record(start.elapsed().as_secs_f64());

    response
}
