//! In-process upstream used by the forwarder's end-to-end tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use axum::{
    body::Bytes,
    extract::{Path, Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};

#[derive(Default)]
pub(crate) struct Recorded {
    hits: AtomicUsize,
    paths: Mutex<Vec<String>>,
}

pub(crate) struct FakeUpstream {
    pub(crate) addr: SocketAddr,
    recorded: Arc<Recorded>,
}

impl FakeUpstream {
    pub(crate) async fn spawn() -> Result<Self> {
        let recorded = Arc::new(Recorded::default());
        let app = Router::new()
            .route("/ok", get(ok))
            .route("/other", get(|| async { "other" }))
            .route("/relative", get(|| async { redirect(StatusCode::FOUND, "/other") }))
            .route("/hop/{remaining}", any(hop))
            .route("/no-location", get(|| async { StatusCode::FOUND }))
            .route(
                "/offsite",
                get(|| async { redirect(StatusCode::MOVED_PERMANENTLY, "https://evil.example/ok") }),
            )
            .route("/see-other", any(|| async { redirect(StatusCode::SEE_OTHER, "/method") }))
            .route("/method", any(|method: Method| async move { method.to_string() }))
            .route("/echo", any(echo))
            .route("/user-agent", get(user_agent))
            .route("/teapot", get(|| async { (StatusCode::IM_A_TEAPOT, "short and stout") }))
            .route("/slow", get(slow))
            .layer(middleware::from_fn_with_state(recorded.clone(), record))
            .with_state(recorded.clone());

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(FakeUpstream { addr, recorded })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub(crate) fn hits(&self) -> usize {
        self.recorded.hits.load(Ordering::SeqCst)
    }

    pub(crate) fn paths(&self) -> Vec<String> {
        self.recorded.paths.lock().unwrap().clone()
    }
}

async fn record(State(recorded): State<Arc<Recorded>>, request: Request, next: Next) -> Response {
    recorded.hits.fetch_add(1, Ordering::SeqCst);
    recorded
        .paths
        .lock()
        .unwrap()
        .push(request.uri().path().to_string());
    next.run(request).await
}

fn redirect(status: StatusCode, location: &'static str) -> Response {
    (status, [(header::LOCATION, location)]).into_response()
}

async fn ok() -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::CACHE_CONTROL, "max-age=60"),
        ],
        r#"{"ok":true}"#,
    )
        .into_response()
}

async fn hop(Path(remaining): Path<u32>) -> Response {
    match remaining {
        0 => "landed".into_response(),
        n => (
            StatusCode::TEMPORARY_REDIRECT,
            [(header::LOCATION, format!("/hop/{}", n - 1))],
        )
            .into_response(),
    }
}

async fn echo(method: Method, headers: HeaderMap, body: Bytes) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("none")
        .to_string();
    (
        [("x-echo-method", method.to_string()), ("x-echo-content-type", content_type)],
        body,
    )
        .into_response()
}

async fn user_agent(headers: HeaderMap) -> String {
    headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("none")
        .to_string()
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(5)).await;
    "too late"
}
