//! Operational HTTP endpoints.
//!
//! - `/healthz` : liveness
//! - `/readyz`  : readiness (503 when draining)
//! - `/metrics` : Prometheus text format

use std::time::{Instant, SystemTime};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use promstats_core::{Field, Measure};

use crate::app_state::AppState;
use crate::obs::exposition::CONTENT_TYPE;

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    if state.is_draining() {
        (StatusCode::SERVICE_UNAVAILABLE, "draining")
    } else {
        (StatusCode::OK, "ready")
    }
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let started = Instant::now();
    let body = state.prometheus().render(SystemTime::now());

    // reported after rendering, so visible from the next scrape on
    state.engine().report(
        Measure::new("scrape")
            .field(Field::counter("count", 1.0))
            .field(Field::histogram("duration.seconds", started.elapsed().as_secs_f64())),
    );

    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, CONTENT_TYPE)],
        body,
    )
        .into_response()
}
