//! Request routing and handlers.

use crate::metrics::text::CONTENT_TYPE as METRICS_CONTENT_TYPE;
use crate::state::AppState;
use crate::util::{REQUEST_ID_HEADER, RequestId};
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::{Method, Request, Response, StatusCode};
use serde_json::json;
use std::convert::Infallible;
use tracing::debug;

/// Path of the instrumented event endpoint.
pub const EVENT_PATH: &str = "/api/v1/event";

/// Built-in routes; the metrics path may not reuse any of these.
pub const RESERVED_PATHS: [&str; 4] = ["/", EVENT_PATH, "/health", "/healthz"];

const JSON: &str = "application/json";
const PLAIN: &str = "text/plain; charset=utf-8";

/// Handle one HTTP request.
///
/// Scrapes of the metrics path are served straight from the registry and are
/// not counted. Every other request is counted and timed from entry to exit.
pub async fn handle_request<B>(
    req: Request<B>,
    state: &AppState,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let metrics_config = &state.config().metrics;
    if metrics_config.enabled && path == metrics_config.path {
        debug!(method = %method, path = %path, "metrics scrape");
        return Ok(scrape(&method, state));
    }

    let request_id = RequestId::from_headers(req.headers());
    let timer = state.request_metrics().start_timer();

    let mut response = route(&method, &path, state).await;

    let duration = timer.finish();

    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        duration_ms = duration.as_millis() as u64,
        "request handled"
    );

    Ok(response)
}

async fn route(method: &Method, path: &str, state: &AppState) -> Response<Full<Bytes>> {
    if method != Method::GET {
        return response(StatusCode::METHOD_NOT_ALLOWED, PLAIN, "Method not allowed\n");
    }

    match path {
        "/" => json_response(StatusCode::OK, json!({ "status": "ok" })),
        EVENT_PATH => {
            let delay = state.config().server.event_delay;
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            json_response(StatusCode::OK, json!({ "message": "event generated" }))
        }
        "/health" | "/healthz" => response(StatusCode::OK, PLAIN, "OK\n"),
        _ => response(StatusCode::NOT_FOUND, PLAIN, "Not found\n"),
    }
}

fn scrape(method: &Method, state: &AppState) -> Response<Full<Bytes>> {
    if method != Method::GET {
        return response(StatusCode::METHOD_NOT_ALLOWED, PLAIN, "Method not allowed\n");
    }
    response(
        StatusCode::OK,
        METRICS_CONTENT_TYPE,
        state.registry().render(),
    )
}

fn json_response(status: StatusCode, body: serde_json::Value) -> Response<Full<Bytes>> {
    response(status, JSON, body.to_string())
}

fn response(
    status: StatusCode,
    content_type: &'static str,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}
