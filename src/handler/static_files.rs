//! Static file serving module
//!
//! Serves files below a root directory for requests under the static prefix:
//! index files, generated directory listings, and `ETag` revalidation.

use crate::http::{self, cache, mime, response};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fmt::Write as _;
use std::path::Path;
use tokio::fs;

/// Bytes left unescaped in listing links: unreserved characters and `/`
const HREF: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Static request after the mount prefix has been stripped
#[derive(Debug, Clone, Copy)]
pub struct StaticRequest<'a> {
    /// Path as the client sent it, e.g. `/files/docs`
    pub request_path: &'a str,
    /// Remainder after the prefix, still percent-encoded; empty for the bare prefix
    pub relative_path: &'a str,
    pub if_none_match: Option<&'a str>,
}

/// Serve `req.relative_path` from `root`
pub async fn serve(
    req: &StaticRequest<'_>,
    root: &Path,
    index_files: &[String],
) -> Response<Full<Bytes>> {
    let root_canonical = match fs::canonicalize(root).await {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Static directory not found or inaccessible '{}': {e}",
                root.display()
            ));
            return http::build_404_response();
        }
    };

    let decoded = percent_decode_str(req.relative_path).decode_utf8_lossy();
    let candidate = root.join(decoded.trim_start_matches('/'));
    // Not found is common (404), no need to log
    let Ok(target) = fs::canonicalize(&candidate).await else {
        return http::build_404_response();
    };
    if !target.starts_with(&root_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            req.relative_path,
            target.display()
        ));
        return http::build_404_response();
    }

    let Ok(metadata) = fs::metadata(&target).await else {
        return http::build_404_response();
    };
    if !metadata.is_dir() {
        return serve_file(&target, req.if_none_match).await;
    }

    if !req.relative_path.ends_with('/') {
        return http::build_301_response(&format!("{}/", req.request_path));
    }

    for index_file in index_files {
        let index_path = target.join(index_file);
        if fs::metadata(&index_path).await.is_ok_and(|m| m.is_file()) {
            return serve_file(&index_path, req.if_none_match).await;
        }
    }

    let display_path = percent_decode_str(req.request_path).decode_utf8_lossy();
    list_directory(&target, &display_path).await
}

async fn serve_file(path: &Path, if_none_match: Option<&str>) -> Response<Full<Bytes>> {
    let data = match fs::read(path).await {
        Ok(d) => d,
        Err(e) => {
            logger::log_error(&format!("Failed to read file '{}': {e}", path.display()));
            return http::build_404_response();
        }
    };

    let etag = cache::generate_etag(&data);
    if cache::etag_matches(if_none_match, &etag) {
        return http::build_304_response(&etag);
    }

    response::build_file_response(Bytes::from(data), mime::content_type_for(path), &etag)
}

/// HTML listing of a directory, entries sorted by name, directories suffixed with `/`
async fn list_directory(dir: &Path, public_path: &str) -> Response<Full<Bytes>> {
    let mut reader = match fs::read_dir(dir).await {
        Ok(r) => r,
        Err(e) => {
            logger::log_error(&format!("Failed to list '{}': {e}", dir.display()));
            return http::build_404_response();
        }
    };

    let mut names = Vec::new();
    while let Ok(Some(entry)) = reader.next_entry().await {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
            name.push('/');
        }
        names.push(name);
    }
    names.sort();

    let title = escape_html(public_path);
    let mut html = format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Directory listing for {title}</title></head>\n<body>\n<h1>Directory listing for {title}</h1>\n<hr>\n<ul>\n"
    );
    for name in &names {
        let href = utf8_percent_encode(name, HREF);
        let text = escape_html(name);
        let _ = writeln!(html, "<li><a href=\"{href}\">{text}</a></li>");
    }
    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");

    response::build_html_response(html)
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "http_packet_static_{name}_{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("docs")).unwrap();
        std::fs::create_dir_all(dir.join("site")).unwrap();
        std::fs::write(dir.join("a.txt"), "alpha").unwrap();
        std::fs::write(dir.join("docs/readme.md"), "# docs").unwrap();
        std::fs::write(dir.join("site/index.html"), "<h1>home</h1>").unwrap();
        dir
    }

    /// Request for a path under the `/files` mount
    fn request(path: &str) -> StaticRequest<'_> {
        StaticRequest {
            request_path: path,
            relative_path: path.strip_prefix("/files").unwrap_or(path),
            if_none_match: None,
        }
    }

    async fn body_string(resp: Response<Full<Bytes>>) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn index_files() -> Vec<String> {
        vec!["index.html".to_string()]
    }

    #[tokio::test]
    async fn test_serve_file() {
        let root = scratch_dir("file");
        let resp = serve(&request("/files/a.txt"), &root, &index_files()).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-type"], "text/plain; charset=utf-8");
        assert_eq!(body_string(resp).await, "alpha");
    }

    #[tokio::test]
    async fn test_etag_revalidation() {
        let root = scratch_dir("etag");
        let resp = serve(&request("/files/a.txt"), &root, &index_files()).await;
        let etag = resp.headers()["etag"].to_str().unwrap().to_string();

        let req = StaticRequest {
            if_none_match: Some(&etag),
            ..request("/files/a.txt")
        };
        let resp = serve(&req, &root, &index_files()).await;
        assert_eq!(resp.status(), 304);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let root = scratch_dir("missing");
        let resp = serve(&request("/files/nope.txt"), &root, &index_files()).await;
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_traversal_blocked() {
        let root = scratch_dir("traversal");
        let outside = root.parent().unwrap().join(format!(
            "http_packet_outside_{}.txt",
            std::process::id()
        ));
        std::fs::write(&outside, "secret").unwrap();
        let name = outside.file_name().unwrap().to_str().unwrap();

        let relative = format!("/files/../{name}");
        let resp = serve(&request(&relative), &root, &index_files()).await;
        assert_eq!(resp.status(), 404);
        let _ = std::fs::remove_file(outside);
    }

    #[tokio::test]
    async fn test_directory_redirect() {
        let root = scratch_dir("redirect");
        let resp = serve(&request("/files/docs"), &root, &index_files()).await;
        assert_eq!(resp.status(), 301);
        assert_eq!(resp.headers()["location"], "/files/docs/");
    }

    #[tokio::test]
    async fn test_index_file() {
        let root = scratch_dir("index");
        let resp = serve(&request("/files/site/"), &root, &index_files()).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(body_string(resp).await, "<h1>home</h1>");
    }

    #[tokio::test]
    async fn test_directory_listing() {
        let root = scratch_dir("listing");
        let resp = serve(&request("/files/"), &root, &index_files()).await;
        assert_eq!(resp.status(), 200);
        let html = body_string(resp).await;
        assert!(html.contains("Directory listing for /files/"));
        let a = html.find("a.txt").unwrap();
        let docs = html.find("docs/").unwrap();
        let site = html.find("site/").unwrap();
        assert!(a < docs && docs < site);
    }

    #[tokio::test]
    async fn test_bare_prefix_redirects() {
        let root = scratch_dir("bare");
        let req = StaticRequest {
            request_path: "/files",
            relative_path: "",
            if_none_match: None,
        };
        let resp = serve(&req, &root, &index_files()).await;
        assert_eq!(resp.status(), 301);
        assert_eq!(resp.headers()["location"], "/files/");
    }

    #[tokio::test]
    async fn test_redirect_keeps_requested_path() {
        let root = scratch_dir("requested");
        let req = StaticRequest {
            request_path: "/filesdocs",
            relative_path: "docs",
            if_none_match: None,
        };
        let resp = serve(&req, &root, &index_files()).await;
        assert_eq!(resp.status(), 301);
        assert_eq!(resp.headers()["location"], "/filesdocs/");
    }

    #[tokio::test]
    async fn test_encoded_names() {
        let root = scratch_dir("encoded");
        std::fs::write(root.join("my file.txt"), "spaced").unwrap();
        std::fs::write(root.join("café.txt"), "accent").unwrap();

        let resp = serve(&request("/files/my%20file.txt"), &root, &index_files()).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(body_string(resp).await, "spaced");

        let resp = serve(&request("/files/caf%C3%A9.txt"), &root, &index_files()).await;
        assert_eq!(body_string(resp).await, "accent");

        let html = body_string(serve(&request("/files/"), &root, &index_files()).await).await;
        assert!(html.contains("<li><a href=\"my%20file.txt\">my file.txt</a></li>"));
        assert!(html.contains("<li><a href=\"caf%C3%A9.txt\">café.txt</a></li>"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a&\"b\">"), "&lt;a&amp;&quot;b&quot;&gt;");
    }
}
