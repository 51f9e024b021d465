//! Handler composition
//!
//! Turns a finished [`RouteTable`] plus an optional static-file mount into the
//! immutable [`ServerConfiguration`] every request is dispatched against.
//! Moving the table in here is what freezes it.

use crate::logger;
use crate::routing::RouteTable;
use hyper::Method;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration-time failures while composing the server configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("static prefix must not be empty")]
    EmptyPrefix,
    #[error("static prefix '{0}' must start with '/'")]
    InvalidPrefix(String),
    #[error("static prefix '{prefix}' collides with route {method} {path}")]
    PrefixCollision {
        prefix: String,
        method: Method,
        path: String,
    },
}

/// Frozen routing configuration, shared read-only by all requests
#[derive(Debug)]
pub struct ServerConfiguration {
    table: RouteTable,
    static_root: Option<PathBuf>,
    static_prefix: Option<String>,
    index_files: Vec<String>,
}

impl ServerConfiguration {
    pub const fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn static_prefix(&self) -> Option<&str> {
        self.static_prefix.as_deref()
    }

    /// Directory static requests are served from; the working directory when unset
    pub fn static_root(&self) -> &Path {
        self.static_root.as_deref().unwrap_or_else(|| Path::new("."))
    }

    pub fn index_files(&self) -> &[String] {
        &self.index_files
    }
}

/// Builder for [`ServerConfiguration`]
#[derive(Debug)]
pub struct HandlerComposer {
    table: RouteTable,
    static_root: Option<PathBuf>,
    static_prefix: Option<String>,
    index_files: Vec<String>,
}

impl HandlerComposer {
    pub fn new(table: RouteTable) -> Self {
        Self {
            table,
            static_root: None,
            static_prefix: None,
            index_files: vec!["index.html".to_string(), "index.htm".to_string()],
        }
    }

    #[must_use]
    pub fn static_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.static_root = Some(root.into());
        self
    }

    #[must_use]
    pub fn static_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.static_prefix = Some(prefix.into());
        self
    }

    #[must_use]
    pub fn index_files(mut self, index_files: Vec<String>) -> Self {
        self.index_files = index_files;
        self
    }

    /// Validate the static prefix against every registered route and freeze
    pub fn build(self) -> Result<ServerConfiguration, BuildError> {
        if let Some(prefix) = &self.static_prefix {
            check_prefix(prefix, &self.table)?;
        }

        let config = ServerConfiguration {
            table: self.table,
            static_root: self.static_root,
            static_prefix: self.static_prefix,
            index_files: self.index_files,
        };

        logger::log_info(&format!(
            "[Routes] {} route(s) registered, static prefix: {}, static root: {}",
            config.table.len(),
            config.static_prefix().unwrap_or("-"),
            config.static_root().display(),
        ));
        Ok(config)
    }
}

/// Build a [`ServerConfiguration`] in one call
pub fn compose(
    table: RouteTable,
    static_root: Option<PathBuf>,
    static_prefix: Option<String>,
) -> Result<ServerConfiguration, BuildError> {
    let mut composer = HandlerComposer::new(table);
    composer.static_root = static_root;
    composer.static_prefix = static_prefix;
    composer.build()
}

fn check_prefix(prefix: &str, table: &RouteTable) -> Result<(), BuildError> {
    if prefix.is_empty() {
        return Err(BuildError::EmptyPrefix);
    }
    if !prefix.starts_with('/') {
        return Err(BuildError::InvalidPrefix(prefix.to_string()));
    }

    match table
        .entries()
        .find(|e| e.path().starts_with(prefix) || prefix.starts_with(e.path()))
    {
        Some(entry) => Err(BuildError::PrefixCollision {
            prefix: prefix.to_string(),
            method: entry.method().clone(),
            path: entry.path().to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Reply;

    fn table_with(paths: &[(Method, &str)]) -> RouteTable {
        let mut table = RouteTable::new();
        for (method, path) in paths {
            table
                .register(method.clone(), *path, vec![], |_, _, _| Reply::new(200))
                .unwrap();
        }
        table
    }

    #[test]
    fn test_build_without_static() {
        let config = compose(table_with(&[(Method::GET, "/ping")]), None, None).unwrap();
        assert!(config.static_prefix().is_none());
        assert_eq!(config.static_root(), Path::new("."));
        assert!(config.table().lookup(&Method::GET, "/ping").is_some());
    }

    #[test]
    fn test_build_with_static_mount() {
        let config = HandlerComposer::new(table_with(&[(Method::GET, "/ping")]))
            .static_root("/srv/www")
            .static_prefix("/files")
            .index_files(vec!["default.html".to_string()])
            .build()
            .unwrap();
        assert_eq!(config.static_prefix(), Some("/files"));
        assert_eq!(config.static_root(), Path::new("/srv/www"));
        assert_eq!(config.index_files(), ["default.html".to_string()]);
    }

    #[test]
    fn test_prefix_collisions() {
        let cases = [
            ("/files", "/files"),
            ("/files", "/files/a.txt"),
            ("/files/sub", "/files"),
        ];
        for (prefix, path) in cases {
            let err = compose(
                table_with(&[(Method::POST, path)]),
                None,
                Some(prefix.to_string()),
            )
            .unwrap_err();
            assert_eq!(
                err,
                BuildError::PrefixCollision {
                    prefix: prefix.to_string(),
                    method: Method::POST,
                    path: path.to_string(),
                }
            );
        }
    }

    #[test]
    fn test_invalid_prefixes() {
        assert_eq!(
            compose(RouteTable::new(), None, Some(String::new())).unwrap_err(),
            BuildError::EmptyPrefix
        );
        assert_eq!(
            compose(RouteTable::new(), None, Some("files".to_string())).unwrap_err(),
            BuildError::InvalidPrefix("files".to_string())
        );
    }

    #[test]
    fn test_disjoint_prefix_accepted() {
        let table = table_with(&[(Method::GET, "/ping"), (Method::GET, "/square")]);
        assert!(compose(table, None, Some("/browse".to_string())).is_ok());
    }
}
