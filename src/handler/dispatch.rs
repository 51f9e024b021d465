//! Request dispatch
//!
//! Classifies each request as static fallback, registered route, or an error
//! status, decodes its query, and runs the matched handler. Every
//! request-time failure is turned into a response here.

use super::compose::ServerConfiguration;
use super::static_files::{self, StaticRequest};
use crate::http::{self, Reply};
use crate::logger;
use crate::routing::{cast_params, parse_query, CastError, MalformedQuery, RawQuery, RouteEntry};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{HeaderMap, Method, Response, StatusCode};
use thiserror::Error;

/// Request-time failures, each recovered as an HTTP status
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("bad query: {0}")]
    Malformed(#[from] MalformedQuery),
    #[error(transparent)]
    Cast(#[from] CastError),
    #[error("no route for {method} {path}")]
    NotFound { method: Method, path: String },
    #[error("method {0} not implemented")]
    Unsupported(Method),
}

impl DispatchError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Malformed(_) | Self::Cast(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
        }
    }

    pub fn into_response(self) -> Response<Full<Bytes>> {
        match self {
            Self::Malformed(_) | Self::Cast(_) => http::build_400_response(&self.to_string()),
            Self::NotFound { .. } => http::build_404_response(),
            Self::Unsupported(_) => http::build_501_response(),
        }
    }
}

/// Request target split into path and raw query; the fragment is dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTarget<'a> {
    pub path: &'a str,
    pub query: &'a str,
}

impl<'a> RequestTarget<'a> {
    pub fn parse(raw: &'a str) -> Self {
        let without_fragment = raw.split_once('#').map_or(raw, |(before, _)| before);
        match without_fragment.split_once('?') {
            Some((path, query)) => Self { path, query },
            None => Self {
                path: without_fragment,
                query: "",
            },
        }
    }
}

/// A request that matched a registered route, with its query decoded
#[derive(Debug)]
pub struct ParsedRequest<'a> {
    pub method: &'a Method,
    pub path: &'a str,
    pub query: RawQuery,
}

/// Where a request goes before any query decoding
#[derive(Debug)]
pub enum Route<'c> {
    /// Under the static prefix; carries the path with the prefix removed
    Static { relative_path: String },
    Handler(&'c RouteEntry),
}

/// Classify a request against the configuration.
///
/// Static fallback wins over route lookup. GET is always supported; POST
/// only when at least one POST route exists; other methods never are.
pub fn classify<'c>(
    config: &'c ServerConfiguration,
    method: &Method,
    path: &str,
) -> Result<Route<'c>, DispatchError> {
    if *method == Method::GET {
        if let Some(rest) = config.static_prefix().and_then(|p| path.strip_prefix(p)) {
            // The bare prefix keeps an empty remainder so static serving redirects it to `prefix/`
            let relative_path = if rest.is_empty() || rest.starts_with('/') {
                rest.to_string()
            } else {
                format!("/{rest}")
            };
            return Ok(Route::Static { relative_path });
        }
    }

    let supported = *method == Method::GET
        || (*method == Method::POST && config.table().has_routes(method));
    if !supported {
        return Err(DispatchError::Unsupported(method.clone()));
    }

    config
        .table()
        .lookup(method, path)
        .map(Route::Handler)
        .ok_or_else(|| DispatchError::NotFound {
            method: method.clone(),
            path: path.to_string(),
        })
}

/// Decode the query against `entry` and run its handler
pub fn invoke(
    entry: &RouteEntry,
    request: &ParsedRequest<'_>,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Reply, DispatchError> {
    let params = cast_params(entry, &request.query).map_err(|e| {
        logger::log_warning(&format!("{} {}: {e}", request.method, request.path));
        DispatchError::from(e)
    })?;
    Ok(entry.invoke(&params, headers, body))
}

/// Per-request entry point
pub async fn dispatch(
    config: &ServerConfiguration,
    method: &Method,
    raw_target: &str,
    headers: &HeaderMap,
    body: Bytes,
) -> Response<Full<Bytes>> {
    let target = RequestTarget::parse(raw_target);

    let result = match classify(config, method, target.path) {
        Ok(Route::Static { relative_path }) => {
            let req = StaticRequest {
                request_path: target.path,
                relative_path: &relative_path,
                if_none_match: headers.get("if-none-match").and_then(|v| v.to_str().ok()),
            };
            return static_files::serve(&req, config.static_root(), config.index_files()).await;
        }
        Ok(Route::Handler(entry)) => parse_query(target.query)
            .map_err(|e| {
                logger::log_warning(&format!("{method} {raw_target}: {e}"));
                DispatchError::from(e)
            })
            .and_then(|query| {
                let request = ParsedRequest {
                    method,
                    path: target.path,
                    query,
                };
                invoke(entry, &request, headers, body)
            }),
        Err(e) => Err(e),
    };

    match result {
        Ok(reply) => reply.into_response(),
        Err(e) => e.into_response(),
    }
}
