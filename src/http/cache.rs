//! `ETag` generation and `If-None-Match` handling for static files

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Quoted strong `ETag` derived from the content hash
pub fn generate_etag(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("\"{:x}\"", hasher.finish())
}

/// True when the client's `If-None-Match` lists `etag` or `*`
pub fn etag_matches(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|header| {
        header
            .split(',')
            .map(str::trim)
            .any(|candidate| candidate == etag || candidate == "*")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_etag_is_stable_and_quoted() {
        let etag = generate_etag(b"same content");
        assert_eq!(etag, generate_etag(b"same content"));
        assert_ne!(etag, generate_etag(b"other content"));
        assert!(etag.starts_with('"') && etag.ends_with('"'));
    }

    #[test]
    fn test_etag_matches() {
        let etag = "\"abc123\"";
        assert!(etag_matches(Some("\"abc123\""), etag));
        assert!(etag_matches(Some("\"xyz\", \"abc123\""), etag));
        assert!(etag_matches(Some("*"), etag));
        assert!(!etag_matches(Some("\"different\""), etag));
        assert!(!etag_matches(None, etag));
    }
}
