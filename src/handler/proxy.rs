use super::errors::ForwardError;
use super::state::ProxyState;
use super::upstream::{self, ALLOWED_SCHEMES, MAX_REDIRECTS, URL_QUERY_PARAMETER};
use crate::metrics::consts as crate_metrics;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{self, HeaderMap, HeaderValue, Method, Uri},
    response::{IntoResponse, Response},
};
use std::time::Instant;
use tracing::instrument;
use url::{form_urlencoded, Url};

fn uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[instrument(
    skip_all,
    err(level = tracing::Level::WARN),
    fields(
        request_id = uuid(),
        method = %client_request.method(),
        target_url = tracing::field::Empty,
    )
)]
pub(crate) async fn proxy(
    State(state): State<ProxyState>,
    client_request: Request<Body>,
) -> Result<Response, ForwardError> {
    forward(&state, client_request).await.inspect_err(|error| {
        metrics::counter!(crate_metrics::FORWARD_ERROR, "kind" => error.kind()).increment(1)
    })
}

async fn forward(state: &ProxyState, client_request: Request<Body>) -> Result<Response, ForwardError> {
    let request_start = Instant::now();
    tracing::debug!(?client_request);

    let target = target_url(client_request.uri())?;
    tracing::Span::current().record("target_url", target.as_str());
    state.allowlist.check(&target)?;

    let mut method = client_request.method().clone();
    let client_request_headers = client_request.headers();
    let user_agent = client_request_headers
        .get(http::header::USER_AGENT)
        .cloned()
        .unwrap_or_else(|| state.default_user_agent.clone());
    let content_type = client_request_headers.get(http::header::CONTENT_TYPE).cloned();

    let mut outbound_body = forwards_body(&method).then(|| {
        reqwest::Body::wrap_stream(client_request.into_body().into_data_stream())
    });

    let mut current_url = target;
    let mut redirect_count = 0;
    loop {
        let hop = Hop {
            method: &method,
            url: &current_url,
            user_agent: &user_agent,
            content_type: content_type.as_ref(),
            // A streamed body can only be sent once.
            body: outbound_body.take(),
        };
        let server_response = hop.send(state).await?;

        if !upstream::is_redirect(server_response.status()) {
            tracing::info!(
                server_response_status = %server_response.status(),
                redirect_count,
                elapsed_ms = request_start.elapsed().as_millis() as u64,
                "Forwarding upstream response."
            );
            return Ok(stream_response(server_response));
        }

        let next_url = redirect_target(&current_url, server_response.headers())?;
        let redirect_status = server_response.status();
        // Releases the redirect response's connection before the next hop.
        drop(server_response);

        state.allowlist.check(&next_url)?;

        redirect_count += 1;
        if redirect_count > MAX_REDIRECTS {
            return Err(ForwardError::TooManyRedirects);
        }

        if redirect_status == http::StatusCode::SEE_OTHER && method != Method::HEAD {
            method = Method::GET;
        }

        tracing::debug!(%redirect_status, from = %current_url, to = %next_url, redirect_count);
        metrics::counter!(crate_metrics::UPSTREAM_REDIRECTS_FOLLOWED).increment(1);
        current_url = next_url;
    }
}

/// One outbound request of a redirect chain.
struct Hop<'a> {
    method: &'a Method,
    url: &'a Url,
    user_agent: &'a HeaderValue,
    content_type: Option<&'a HeaderValue>,
    body: Option<reqwest::Body>,
}

impl Hop<'_> {
    #[instrument(skip_all, level = tracing::Level::DEBUG, fields(url = %self.url))]
    async fn send(self, state: &ProxyState) -> Result<reqwest::Response, ForwardError> {
        let mut proxy_request = state
            .http_client
            .request(self.method.clone(), self.url.clone())
            .header(http::header::USER_AGENT, self.user_agent.clone());
        if let Some(body) = self.body {
            if let Some(content_type) = self.content_type {
                proxy_request = proxy_request.header(http::header::CONTENT_TYPE, content_type.clone());
            }
            proxy_request = proxy_request.body(body);
        }

        let reqwest_start = Instant::now();
        let server_response = tokio::time::timeout(state.upstream_timeout, proxy_request.send())
            .await
            .map_err(|_| ForwardError::UpstreamTimeout)?
            .map_err(|error| match error.is_timeout() {
                true => ForwardError::UpstreamTimeout,
                false => {
                    tracing::error!(?error, "Proxy request error.");
                    ForwardError::UpstreamUnavailable(error)
                }
            })?;

        metrics::histogram!(crate_metrics::UPSTREAM_REQUEST_DURATION_SECS)
            .record(reqwest_start.elapsed().as_secs_f64());
        tracing::debug!(server_response_status = %server_response.status());

        Ok(server_response)
    }
}

fn forwards_body(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD)
}

fn target_url(uri: &Uri) -> Result<Url, ForwardError> {
    let raw_target = uri
        .query()
        .and_then(|query| {
            form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == URL_QUERY_PARAMETER)
                .map(|(_, value)| value.into_owned())
        })
        .filter(|value| !value.is_empty())
        .ok_or(ForwardError::MissingParameter)?;

    let target = Url::parse(&raw_target)
        .map_err(|error| ForwardError::MalformedUrl(format!("{raw_target}: {error}")))?;
    if !ALLOWED_SCHEMES.contains(&target.scheme()) || target.host_str().is_none() {
        return Err(ForwardError::MalformedUrl(raw_target));
    }
    Ok(target)
}

fn redirect_target(current_url: &Url, headers: &HeaderMap) -> Result<Url, ForwardError> {
    let location = headers
        .get(http::header::LOCATION)
        .filter(|location| !location.is_empty())
        .ok_or(ForwardError::RedirectMissingLocation)?
        .to_str()
        .map_err(|error| ForwardError::InvalidRedirect(error.to_string()))?;

    let next_url = current_url
        .join(location)
        .map_err(|error| ForwardError::InvalidRedirect(format!("{location}: {error}")))?;
    if !ALLOWED_SCHEMES.contains(&next_url.scheme()) || next_url.host_str().is_none() {
        return Err(ForwardError::InvalidRedirect(location.to_string()));
    }
    Ok(next_url)
}

fn stream_response(server_response: reqwest::Response) -> Response {
    let server_response_status = server_response.status();
    let mut server_response_headers = server_response.headers().clone();
    upstream::strip_hop_by_hop(&mut server_response_headers);

    let server_response_body_stream = server_response.bytes_stream();
    let proxy_response_body_stream = Body::from_stream(server_response_body_stream);

    (
        server_response_status,
        server_response_headers,
        proxy_response_body_stream,
    )
        .into_response()
}
