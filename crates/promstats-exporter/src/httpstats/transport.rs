use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use axum::http::{header, Request, Response, StatusCode};
use futures_util::future::BoxFuture;
use promstats_core::{Engine, Field, Measure};
use tower::{Layer, Service};

pub const MEASURE_NAME: &str = "http";

/// Status class label: `"2xx"` for 200..=299 and so on.
pub fn status_bucket(status: StatusCode) -> String {
    format!("{}xx", status.as_u16() / 100)
}

#[derive(Clone)]
pub struct TransportLayer {
    engine: Arc<Engine>,
}

impl TransportLayer {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }
}

impl<S> Layer<S> for TransportLayer {
    type Service = Transport<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Transport::new(Arc::clone(&self.engine), inner)
    }
}

/// Instrumented client service. Inner errors are returned untouched after the
/// measure for the failed attempt has been reported.
#[derive(Clone)]
pub struct Transport<S> {
    inner: S,
    engine: Arc<Engine>,
}

impl<S> Transport<S> {
    pub fn new(engine: Arc<Engine>, inner: S) -> Self {
        Self { inner, engine }
    }
}

/// Request attributes captured before the request is handed to the inner
/// service.
struct RequestInfo {
    method: String,
    host: Option<String>,
    body_bytes: Option<u64>,
}

impl RequestInfo {
    fn of<B>(req: &Request<B>) -> Self {
        let host = req
            .uri()
            .host()
            .map(str::to_string)
            .or_else(|| {
                req.headers()
                    .get(header::HOST)
                    .and_then(|h| h.to_str().ok())
                    .map(str::to_string)
            });
        Self {
            method: req.method().as_str().to_string(),
            host,
            body_bytes: content_length(req.headers()),
        }
    }
}

fn content_length(headers: &header::HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

fn round_trip_measure<B>(info: &RequestInfo, res: Option<&Response<B>>, rtt: Duration) -> Measure {
    let mut m = Measure::new(MEASURE_NAME)
        .field(Field::counter("req.count", 1.0))
        .field(Field::histogram("rtt.seconds", rtt.as_secs_f64()))
        .tag("http_req_method", info.method.as_str());

    if let Some(host) = &info.host {
        m = m.tag("http_req_host", host.as_str());
    }
    if let Some(n) = info.body_bytes {
        m = m.field(Field::histogram("req.body.bytes", n as f64));
    }

    match res {
        Some(res) => {
            if let Some(n) = content_length(res.headers()) {
                m = m.field(Field::histogram("res.body.bytes", n as f64));
            }
            m.tag("http_res_status", res.status().as_str())
                .tag("bucket", status_bucket(res.status()))
                .tag("error", "false")
        }
        None => m.tag("bucket", "").tag("error", "true"),
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for Transport<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: 'static,
    ResBody: 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let info = RequestInfo::of(&req);
        let engine = Arc::clone(&self.engine);
        let started = Instant::now();
        let fut = self.inner.call(req);

        Box::pin(async move {
            let res = fut.await;
            let rtt = started.elapsed();
            match &res {
                Ok(r) => engine.report(round_trip_measure(&info, Some(r), rtt)),
                Err(_) => {
                    tracing::debug!(method = %info.method, host = ?info.host, "http round trip failed");
                    engine.report(round_trip_measure::<ResBody>(&info, None, rtt));
                }
            }
            res
        })
    }
}
