use axum::{
    http::{self, StatusCode},
    response::{IntoResponse, Response},
};

/// Terminal failures of a forward. Each maps to one status code and a short
/// plain-text body.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ForwardError {
    #[error("Missing \"url\" query parameter")]
    MissingParameter,
    #[error("Malformed \"url\" query parameter: {0}")]
    MalformedUrl(String),
    #[error("Forbidden: Host not allowed by proxy: {0}")]
    HostNotAllowed(String),
    #[error("Redirect with no location header")]
    RedirectMissingLocation,
    #[error("Redirect to an invalid location: {0}")]
    InvalidRedirect(String),
    #[error("Too many redirects")]
    TooManyRedirects,
    #[error("Proxy request failed")]
    UpstreamUnavailable(#[source] reqwest::Error),
    #[error("Upstream did not respond in time")]
    UpstreamTimeout,
}

impl ForwardError {
    pub(crate) fn status(&self) -> StatusCode {
        match self {
            ForwardError::MissingParameter | ForwardError::MalformedUrl(_) => {
                StatusCode::BAD_REQUEST
            }
            ForwardError::HostNotAllowed(_) => StatusCode::FORBIDDEN,
            ForwardError::RedirectMissingLocation => StatusCode::INTERNAL_SERVER_ERROR,
            ForwardError::InvalidRedirect(_) | ForwardError::UpstreamUnavailable(_) => {
                StatusCode::BAD_GATEWAY
            }
            ForwardError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            ForwardError::TooManyRedirects => StatusCode::LOOP_DETECTED,
        }
    }

    /// Metric label.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            ForwardError::MissingParameter => "missing_parameter",
            ForwardError::MalformedUrl(_) => "malformed_url",
            ForwardError::HostNotAllowed(_) => "host_not_allowed",
            ForwardError::RedirectMissingLocation => "redirect_missing_location",
            ForwardError::InvalidRedirect(_) => "invalid_redirect",
            ForwardError::TooManyRedirects => "too_many_redirects",
            ForwardError::UpstreamUnavailable(_) => "upstream_unavailable",
            ForwardError::UpstreamTimeout => "upstream_timeout",
        }
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(
                http::header::CONTENT_TYPE,
                http::HeaderValue::from_static("text/plain; charset=utf-8"),
            )],
            self.to_string(),
        )
            .into_response()
    }
}
