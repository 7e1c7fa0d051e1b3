//! HTTP client instrumentation.
//!
//! Wrap any `tower::Service<http::Request<_>>` client with `TransportLayer`
//! to report one `http` measure per round trip:
//!
//! | field          | kind      | value                         |
//! |----------------|-----------|-------------------------------|
//! | `req.count`    | counter   | 1                             |
//! | `rtt.seconds`  | histogram | time until the response head  |
//! | `req.body.bytes` / `res.body.bytes` | histogram | `Content-Length`, when present |
//!
//! Tags: `http_req_method`, `http_req_host`, `http_res_status`, `bucket`
//! (`"2xx"`, `"4xx"`… or empty when no response was received) and `error`.

mod transport;

pub use transport::{status_bucket, Transport, TransportLayer, MEASURE_NAME};
