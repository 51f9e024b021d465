//! Query string codec
//!
//! Splits a raw query into ordered key/value pairs and casts the declared
//! parameters of a matched route.

use super::param::{check_name, NameError, ParamValue, Params};
use super::table::RouteEntry;
use std::collections::HashMap;
use thiserror::Error;

/// Query string that does not follow the `key=value&key=value` grammar
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedQuery {
    #[error("query segment '{0}' has no '='")]
    MissingDelimiter(String),
    #[error("invalid query key: {0}")]
    InvalidKey(#[from] NameError),
}

/// A declared parameter whose raw value was rejected by its cast function
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("query parameter '{key}' is invalid: {reason}")]
pub struct CastError {
    pub key: String,
    pub reason: String,
}

/// Raw query pairs in the order they first appeared
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawQuery {
    pairs: Vec<(String, String)>,
    /// Key -> position in `pairs`
    index: HashMap<String, usize>,
}

impl RawQuery {
    /// Later duplicates overwrite the value but keep the first position
    fn insert(&mut self, key: &str, value: &str) {
        if let Some(&pos) = self.index.get(key) {
            value.clone_into(&mut self.pairs[pos].1);
        } else {
            self.index.insert(key.to_string(), self.pairs.len());
            self.pairs.push((key.to_string(), value.to_string()));
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.index.get(key).map(|&pos| self.pairs[pos].1.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Re-join the pairs as `key=value&key=value`
    pub fn to_query_string(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Parse a raw query string (without the leading `?`).
///
/// Only the first `=` of a segment is a delimiter; values are kept verbatim.
pub fn parse_query(raw: &str) -> Result<RawQuery, MalformedQuery> {
    let mut query = RawQuery::default();
    if raw.is_empty() {
        return Ok(query);
    }

    for segment in raw.split('&') {
        let Some((key, value)) = segment.split_once('=') else {
            return Err(MalformedQuery::MissingDelimiter(segment.to_string()));
        };
        check_name(key)?;
        query.insert(key, value);
    }

    Ok(query)
}

/// Cast the declared parameters of `entry`; undeclared keys pass through as strings
pub fn cast_params(entry: &RouteEntry, raw: &RawQuery) -> Result<Params, CastError> {
    let mut params = Params::new();
    for (key, value) in raw.iter() {
        let casted = match entry.descriptor(key) {
            Some(descriptor) => descriptor.cast(value).map_err(|reason| CastError {
                key: key.to_string(),
                reason,
            })?,
            None => ParamValue::Str(value.to_string()),
        };
        params.insert(key, casted);
    }
    Ok(params)
}
