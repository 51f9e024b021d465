//! Query parameter descriptors
//!
//! A descriptor pairs a parameter name with the function that turns its raw
//! query-string value into a typed [`ParamValue`].

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Typed value produced by a cast function
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Integers widen to floats
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Reason a parameter or query key name was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("parameter name must not be empty")]
    Empty,
    #[error("parameter name '{0}' must not start with a digit")]
    LeadingDigit(String),
}

/// Check a parameter name: non-empty and not starting with a numeric character.
///
/// Digit-leading names are reserved for positional-style parameters.
pub fn check_name(name: &str) -> Result<(), NameError> {
    match name.chars().next() {
        None => Err(NameError::Empty),
        Some(c) if c.is_numeric() => Err(NameError::LeadingDigit(name.to_string())),
        Some(_) => Ok(()),
    }
}

type CastFn = dyn Fn(&str) -> Result<ParamValue, String> + Send + Sync;

/// Named query parameter plus its cast function
#[derive(Clone)]
pub struct ParamDescriptor {
    name: String,
    cast: Arc<CastFn>,
}

impl ParamDescriptor {
    /// Descriptor with a custom cast; the `Err` string becomes the 400 message detail
    pub fn new<F>(name: impl Into<String>, cast: F) -> Self
    where
        F: Fn(&str) -> Result<ParamValue, String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            cast: Arc::new(cast),
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, |raw| Ok(ParamValue::Str(raw.to_string())))
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, |raw| {
            raw.parse::<i64>()
                .map(ParamValue::Int)
                .map_err(|e| format!("'{raw}' is not an integer ({e})"))
        })
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, |raw| {
            raw.parse::<f64>()
                .map(ParamValue::Float)
                .map_err(|e| format!("'{raw}' is not a number ({e})"))
        })
    }

    /// Accepts `true`/`false`/`1`/`0`, ignoring ASCII case
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, |raw| {
            if raw.eq_ignore_ascii_case("true") || raw == "1" {
                Ok(ParamValue::Bool(true))
            } else if raw.eq_ignore_ascii_case("false") || raw == "0" {
                Ok(ParamValue::Bool(false))
            } else {
                Err(format!("'{raw}' is not a boolean"))
            }
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cast(&self, raw: &str) -> Result<ParamValue, String> {
        (self.cast)(raw)
    }
}

impl fmt::Debug for ParamDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamDescriptor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Casted parameters handed to a route handler, in query order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, ParamValue)>,
    /// Name -> position in `entries`
    index: HashMap<String, usize>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; a replaced key keeps its position
    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        let name = name.into();
        if let Some(&pos) = self.index.get(&name) {
            self.entries[pos].1 = value;
        } else {
            self.index.insert(name.clone(), self.entries.len());
            self.entries.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.index.get(name).map(|&pos| &self.entries[pos].1)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParamValue::as_str)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ParamValue::as_int)
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ParamValue::as_float)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(ParamValue::as_bool)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_name() {
        assert!(check_name("n").is_ok());
        assert!(check_name("page_2").is_ok());
        assert_eq!(check_name(""), Err(NameError::Empty));
        assert_eq!(
            check_name("1bad"),
            Err(NameError::LeadingDigit("1bad".to_string()))
        );
    }

    #[test]
    fn test_builtin_casts() {
        assert_eq!(ParamDescriptor::int("n").cast("4"), Ok(ParamValue::Int(4)));
        assert_eq!(ParamDescriptor::int("n").cast("-12"), Ok(ParamValue::Int(-12)));
        assert!(ParamDescriptor::int("n").cast("abc").is_err());
        assert_eq!(
            ParamDescriptor::float("x").cast("2.5"),
            Ok(ParamValue::Float(2.5))
        );
        assert_eq!(
            ParamDescriptor::boolean("b").cast("TRUE"),
            Ok(ParamValue::Bool(true))
        );
        assert_eq!(
            ParamDescriptor::boolean("b").cast("0"),
            Ok(ParamValue::Bool(false))
        );
        assert!(ParamDescriptor::boolean("b").cast("yes").is_err());
        assert_eq!(
            ParamDescriptor::string("s").cast("a=b"),
            Ok(ParamValue::Str("a=b".to_string()))
        );
    }

    #[test]
    fn test_custom_cast() {
        let even = ParamDescriptor::new("even", |raw| match raw.parse::<i64>() {
            Ok(n) if n % 2 == 0 => Ok(ParamValue::Int(n)),
            _ => Err("expected an even integer".to_string()),
        });
        assert_eq!(even.name(), "even");
        assert_eq!(even.cast("8"), Ok(ParamValue::Int(8)));
        assert_eq!(even.cast("7"), Err("expected an even integer".to_string()));
    }

    #[test]
    fn test_params_accessors() {
        let mut params = Params::new();
        params.insert("n", ParamValue::Int(3));
        params.insert("name", ParamValue::Str("bob".to_string()));
        params.insert("n", ParamValue::Int(5));

        assert_eq!(params.len(), 2);
        assert_eq!(params.get_int("n"), Some(5));
        assert_eq!(params.get_float("n"), Some(5.0));
        assert_eq!(params.get_str("name"), Some("bob"));
        assert_eq!(params.get_str("n"), None);
        assert!(!params.contains_key("missing"));

        let order: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(order, vec!["n", "name"]);
    }

    #[test]
    fn test_value_serializes_untagged() {
        let json = serde_json::to_string(&ParamValue::Int(16)).unwrap();
        assert_eq!(json, "16");
        let json = serde_json::to_string(&ParamValue::Str("x".to_string())).unwrap();
        assert_eq!(json, "\"x\"");
    }
}
