//! Route table
//!
//! Registry of `(method, path)` routes built before serving starts. Paths are
//! matched exactly; for one method no registered path may be a prefix of
//! another, so dispatch never depends on registration order.

use super::param::{check_name, NameError, ParamDescriptor, Params};
use crate::http::Reply;
use hyper::body::Bytes;
use hyper::{HeaderMap, Method};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Route handler: casted parameters, request headers and body in, reply out
pub type HandlerFn = dyn Fn(&Params, &HeaderMap, Bytes) -> Reply + Send + Sync;

/// Configuration-time registration failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("method {0} cannot carry routes (only GET and POST)")]
    UnsupportedMethod(Method),
    #[error("invalid route path '{0}': must start with '/' and contain no '?' or '#'")]
    InvalidPath(String),
    #[error("route {path}: {source}")]
    InvalidParamName {
        path: String,
        #[source]
        source: NameError,
    },
    #[error("route {path}: parameter '{name}' declared twice")]
    DuplicateParam { path: String, name: String },
    #[error("route {method} {path} already registered")]
    DuplicateRoute { method: Method, path: String },
    #[error("route {method} {path} overlaps registered path {existing}")]
    AmbiguousPrefix {
        method: Method,
        path: String,
        existing: String,
    },
}

/// One registered route
pub struct RouteEntry {
    method: Method,
    path: String,
    params: Vec<ParamDescriptor>,
    handler: Arc<HandlerFn>,
}

impl RouteEntry {
    pub const fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    pub fn descriptor(&self, name: &str) -> Option<&ParamDescriptor> {
        self.params.iter().find(|d| d.name() == name)
    }

    pub fn invoke(&self, params: &Params, headers: &HeaderMap, body: Bytes) -> Reply {
        (self.handler)(params, headers, body)
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Registry of routes, keyed by method then exact path
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: HashMap<Method, HashMap<String, RouteEntry>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route.
    ///
    /// Rejects methods other than GET/POST, malformed paths and parameter
    /// names, an existing `(method, path)`, and any path standing in a
    /// prefix relation with another path of the same method.
    pub fn register<H>(
        &mut self,
        method: Method,
        path: impl Into<String>,
        params: Vec<ParamDescriptor>,
        handler: H,
    ) -> Result<(), RegistrationError>
    where
        H: Fn(&Params, &HeaderMap, Bytes) -> Reply + Send + Sync + 'static,
    {
        let path = path.into();

        if method != Method::GET && method != Method::POST {
            return Err(RegistrationError::UnsupportedMethod(method));
        }
        if !path.starts_with('/') || path.contains(['?', '#']) {
            return Err(RegistrationError::InvalidPath(path));
        }
        check_params(&path, &params)?;

        let routes = self.routes.entry(method.clone()).or_default();
        if routes.contains_key(&path) {
            return Err(RegistrationError::DuplicateRoute { method, path });
        }
        if let Some(existing) = routes
            .keys()
            .find(|existing| existing.starts_with(path.as_str()) || path.starts_with(existing.as_str()))
        {
            return Err(RegistrationError::AmbiguousPrefix {
                existing: existing.clone(),
                method,
                path,
            });
        }

        routes.insert(
            path.clone(),
            RouteEntry {
                method,
                path,
                params,
                handler: Arc::new(handler),
            },
        );
        Ok(())
    }

    pub fn get<H>(
        &mut self,
        path: impl Into<String>,
        params: Vec<ParamDescriptor>,
        handler: H,
    ) -> Result<(), RegistrationError>
    where
        H: Fn(&Params, &HeaderMap, Bytes) -> Reply + Send + Sync + 'static,
    {
        self.register(Method::GET, path, params, handler)
    }

    pub fn post<H>(
        &mut self,
        path: impl Into<String>,
        params: Vec<ParamDescriptor>,
        handler: H,
    ) -> Result<(), RegistrationError>
    where
        H: Fn(&Params, &HeaderMap, Bytes) -> Reply + Send + Sync + 'static,
    {
        self.register(Method::POST, path, params, handler)
    }

    /// Exact-match lookup
    pub fn lookup(&self, method: &Method, path: &str) -> Option<&RouteEntry> {
        self.routes.get(method)?.get(path)
    }

    pub fn has_routes(&self, method: &Method) -> bool {
        self.routes.get(method).is_some_and(|r| !r.is_empty())
    }

    pub fn entries(&self) -> impl Iterator<Item = &RouteEntry> {
        self.routes.values().flat_map(HashMap::values)
    }

    pub fn len(&self) -> usize {
        self.routes.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn check_params(path: &str, params: &[ParamDescriptor]) -> Result<(), RegistrationError> {
    for (i, descriptor) in params.iter().enumerate() {
        check_name(descriptor.name()).map_err(|source| RegistrationError::InvalidParamName {
            path: path.to_string(),
            source,
        })?;
        if params[..i].iter().any(|d| d.name() == descriptor.name()) {
            return Err(RegistrationError::DuplicateParam {
                path: path.to_string(),
                name: descriptor.name().to_string(),
            });
        }
    }
    Ok(())
}
