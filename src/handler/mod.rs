pub(crate) mod allowlist;
pub(crate) mod cors;
pub(crate) mod errors;
pub(crate) mod middleware;
pub(crate) mod proxy;
pub(crate) mod state;
pub(crate) mod upstream;

#[cfg(test)]
mod fake_upstream;

use axum::{middleware as axum_middleware, Router};

use self::state::ProxyState;

/// Every path and method is handed to the forwarder; the target comes from
/// the `url` query parameter.
pub(crate) fn router(state: ProxyState) -> Router {
    Router::new()
        .fallback(proxy::proxy)
        .layer(axum_middleware::from_fn(cors::cors))
        .layer(axum_middleware::from_fn(middleware::metrics))
        .with_state(state)
}
