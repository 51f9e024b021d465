//! Route handler replies
//!
//! A [`Reply`] is what a registered handler returns: a status code, headers in
//! the order they should be written, and the body bytes.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use serde::Serialize;

use super::response::build_500_response;
use crate::logger;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Reply {
    /// Empty reply with the given status
    pub const fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// Body only, no headers
    pub fn text(status: u16, body: impl Into<Bytes>) -> Self {
        Self::new(status).body(body)
    }

    /// Serialize `value` as JSON with a matching `Content-Type`
    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(json) => Self::new(status)
                .header("Content-Type", "application/json")
                .body(json),
            Err(e) => {
                logger::log_error(&format!("Failed to serialize reply: {e}"));
                Self::new(500)
            }
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Convert to a hyper response without adding any header of our own.
    ///
    /// An invalid status code or header turns into a 500.
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let mut builder = Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder.body(Full::new(self.body)).unwrap_or_else(|e| {
            logger::log_error(&format!("Handler produced an invalid reply: {e}"));
            build_500_response()
        })
    }
}

impl From<(u16, Vec<(String, String)>, Bytes)> for Reply {
    fn from((status, headers, body): (u16, Vec<(String, String)>, Bytes)) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }
}
