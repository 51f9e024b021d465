// Connection handling module
// Serves one TCP connection over HTTP/1.1 and adapts each hyper request for the dispatcher

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body as _, Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{HeaderMap, Request, Response, Version};
use hyper_util::rt::TokioIo;

use super::ServerState;
use crate::handler;
use crate::http;
use crate::logger::{self, AccessLogEntry};

/// Serve a connection in a spawned task.
///
/// Keep-alive follows `http.keep_alive`; the whole connection is bounded by
/// `http.connection_timeout` seconds unless that is 0.
pub fn handle_connection(stream: tokio::net::TcpStream, peer_addr: SocketAddr, state: Arc<ServerState>) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let timeout_secs = state.config.http.connection_timeout;

        let mut builder = http1::Builder::new();
        builder.keep_alive(state.config.http.keep_alive);

        let conn = builder.serve_connection(
            io,
            service_fn(move |req| handle_request(req, peer_addr, Arc::clone(&state))),
        );

        if timeout_secs == 0 {
            if let Err(err) = conn.await {
                logger::log_connection_error(&err);
            }
            return;
        }

        match tokio::time::timeout(Duration::from_secs(timeout_secs), conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => logger::log_warning(&format!(
                "Connection from {peer_addr} timed out after {timeout_secs} seconds"
            )),
        }
    });
}

/// Read the body, hand the request to the dispatcher and write the access log line
pub async fn handle_request(
    req: Request<Incoming>,
    peer_addr: SocketAddr,
    state: Arc<ServerState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let (parts, body) = req.into_parts();
    let target = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path().to_string(), ToString::to_string);

    let response = match read_body(&parts.headers, body, state.config.http.max_body_size).await {
        Ok(bytes) => {
            handler::dispatch(&state.app, &parts.method, &target, &parts.headers, bytes).await
        }
        Err(resp) => resp,
    };

    if state.config.logging.access_log {
        let mut entry = AccessLogEntry::new(
            peer_addr.to_string(),
            parts.method.to_string(),
            parts.uri.path().to_string(),
        );
        entry.query = parts.uri.query().map(ToString::to_string);
        entry.http_version = version_label(parts.version).to_string();
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        entry.referer = header_string(&parts.headers, "referer");
        entry.user_agent = header_string(&parts.headers, "user-agent");
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Collect the request body, refusing anything over `max_body_size`
async fn read_body(
    headers: &HeaderMap,
    body: Incoming,
    max_body_size: u64,
) -> Result<Bytes, Response<Full<Bytes>>> {
    if let Some(size) = declared_length(headers) {
        if size > max_body_size {
            logger::log_error(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            return Err(http::build_413_response());
        }
    }

    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            logger::log_error(&format!("Request body exceeded {max_body_size} bytes"));
            Err(http::build_413_response())
        }
        Err(e) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            Err(http::build_400_response("unreadable request body"))
        }
    }
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    let value = headers.get(hyper::header::CONTENT_LENGTH)?;
    match value.to_str().ok().and_then(|s| s.parse::<u64>().ok()) {
        Some(size) => Some(size),
        None => {
            logger::log_warning("Invalid Content-Length value, skipping size check");
            None
        }
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2.0",
        Version::HTTP_3 => "3.0",
        _ => "1.1",
    }
}
