//! Request dispatch module
//!
//! Entry point for HTTP request processing. Every request walks the same
//! path: decode, compute headers, resolve, read. Each step can end the
//! request with its own status, always carrying the computed headers.

use crate::config::AppState;
use crate::handler::static_files;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::http::uri::PathAndQuery;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Pattern whose headers are used when the request path cannot be decoded
const FALLBACK_HEADER_PATH: &str = "/";

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    /// Raw request target: path plus optional query, still percent-encoded
    pub target: &'a str,
    pub is_head: bool,
}

/// Main entry point for HTTP request handling
///
/// Any method is answered with GET semantics; HEAD omits the body.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: Option<SocketAddr>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let mut entry = state
        .access_log_enabled()
        .then(|| AccessLogEntry::from_request(&req, peer_addr));

    let target = req
        .uri()
        .path_and_query()
        .map_or("/", PathAndQuery::as_str)
        .to_string();
    let ctx = RequestContext {
        target: &target,
        is_head: req.method() == Method::HEAD,
    };
    let response = serve(&ctx, &state).await;

    if let Some(entry) = entry.as_mut() {
        let body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or_default();
        entry.finish(response.status().as_u16(), body_bytes, started.elapsed());
        logger::log_access(entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Produce the response for a request
pub async fn serve(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    // 1. Decode
    let request_path = match state.resolver.request_path(ctx.target) {
        Ok(path) => path,
        Err(e) => {
            logger::log_warning(&format!("Bad request path '{}': {e}", ctx.target));
            let headers = state.rules.headers_for_path(FALLBACK_HEADER_PATH);
            return http::build_400_response(&headers, ctx.is_head);
        }
    };

    // 2. Headers for the decoded path
    let headers = state.rules.headers_for_path(&request_path);

    // 3. Confine to the serve root
    let file_path = match state.resolver.resolve_decoded(&request_path).await {
        Ok(path) => path,
        Err(e) => {
            logger::log_warning(&format!(
                "Path traversal attempt blocked: {request_path} ({e})"
            ));
            return http::build_403_response(&headers, ctx.is_head);
        }
    };

    // 4. Read
    static_files::serve_file(ctx, &file_path, &headers).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::handler::PathResolver;
    use crate::headers::HeaderRuleStore;
    use http_body_util::BodyExt;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const RULES: &str = r#"
[[headers]]
  for = "/*"
  [headers.values]
    X-Frame-Options = "DENY"
    X-Content-Type-Options = "nosniff"

[[headers]]
  for = "/api/*"
  [headers.values]
    X-Frame-Options = "SAMEORIGIN"
"#;

    fn site() -> (TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("app");
        fs::create_dir_all(root.join("api")).unwrap();
        fs::write(root.join("index.html"), "<h1>home</h1>").unwrap();
        fs::write(root.join("api/widgets"), "[]").unwrap();
        fs::write(root.join("app.js"), "console.log(1)").unwrap();
        fs::write(dir.path().join("secret"), "do not serve").unwrap();

        let state = state_for(&root, RULES);
        (dir, state)
    }

    fn state_for(root: &Path, rules: &str) -> AppState {
        let mut config = Config::load_from("definitely-missing-config-file").unwrap();
        config.logging.access_log = false;
        AppState::from_parts(
            config,
            HeaderRuleStore::parse(rules),
            PathResolver::new(root, "index.html"),
        )
    }

    async fn get(state: &AppState, target: &str) -> Response<Full<Bytes>> {
        let ctx = RequestContext {
            target,
            is_head: false,
        };
        serve(&ctx, state).await
    }

    async fn body_of(response: Response<Full<Bytes>>) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_root_serves_index_with_wildcard_headers() {
        let (_dir, state) = site();
        let response = get(&state, "/").await;

        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers()["content-type"],
            "text/html; charset=utf-8"
        );
        assert_eq!(response.headers()["x-frame-options"], "DENY");
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        assert_eq!(body_of(response).await, "<h1>home</h1>");
    }

    #[tokio::test]
    async fn test_prefix_rule_overrides_wildcard() {
        let (_dir, state) = site();

        let api = get(&state, "/api/widgets").await;
        assert_eq!(api.status(), 200);
        assert_eq!(api.headers()["x-frame-options"], "SAMEORIGIN");
        assert_eq!(api.headers()["content-type"], "application/octet-stream");

        let home = get(&state, "/home").await;
        assert_eq!(home.headers()["x-frame-options"], "DENY");
    }

    #[tokio::test]
    async fn test_encoded_traversal_is_forbidden() {
        let (_dir, state) = site();
        let response = get(&state, "/%2e%2e%2fsecret").await;

        assert_eq!(response.status(), 403);
        assert_eq!(response.headers()["x-frame-options"], "DENY");
        let body = body_of(response).await;
        assert_eq!(body, "Forbidden");
    }

    #[tokio::test]
    async fn test_missing_file_is_404_with_headers() {
        let (_dir, state) = site();
        let response = get(&state, "/api/missing.json").await;

        assert_eq!(response.status(), 404);
        assert_eq!(response.headers()["x-frame-options"], "SAMEORIGIN");
        assert_eq!(
            response.headers()["content-type"],
            "text/html; charset=utf-8"
        );
        assert_eq!(body_of(response).await, "<h1>404 Not Found</h1>");
    }

    #[tokio::test]
    async fn test_malformed_escape_is_400_with_baseline_headers() {
        let (_dir, state) = site();
        let response = get(&state, "/api/%zz").await;

        assert_eq!(response.status(), 400);
        // Decoding failed, so the `/` headers apply rather than `/api/*`
        assert_eq!(response.headers()["x-frame-options"], "DENY");
        assert_eq!(body_of(response).await, "Bad Request");
    }

    #[tokio::test]
    async fn test_unreadable_target_is_500() {
        let (dir, state) = site();
        fs::create_dir(dir.path().join("app/nested")).unwrap();
        fs::create_dir(dir.path().join("app/nested/index.html")).unwrap();

        let response = get(&state, "/nested/").await;
        assert_eq!(response.status(), 500);
        assert_eq!(response.headers()["x-frame-options"], "DENY");
        assert_eq!(body_of(response).await, "Internal Server Error");
    }

    #[tokio::test]
    async fn test_query_string_is_ignored() {
        let (_dir, state) = site();
        let response = get(&state, "/app.js?cache=bust").await;

        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()["content-type"], "application/javascript");
    }

    #[tokio::test]
    async fn test_no_rules_still_serves() {
        let (dir, _) = site();
        let state = state_for(&dir.path().join("app"), "");
        let response = get(&state, "/app.js").await;

        assert_eq!(response.status(), 200);
        assert!(response.headers().get("x-frame-options").is_none());
    }

    #[tokio::test]
    async fn test_directory_headers_follow_served_index() {
        let (dir, _) = site();
        fs::create_dir(dir.path().join("app/docs")).unwrap();
        fs::write(dir.path().join("app/docs/index.html"), "<h1>docs</h1>").unwrap();
        let rules = format!(
            "{RULES}\n[[headers]]\n  for = \"/docs/index.html\"\n  [headers.values]\n    X-Exact = \"1\"\n"
        );
        let state = state_for(&dir.path().join("app"), &rules);

        for target in ["/docs/index.html", "/docs/", "/docs/?page=2"] {
            let response = get(&state, target).await;
            assert_eq!(response.status(), 200, "{target}");
            assert_eq!(response.headers()["x-exact"], "1", "{target}");
            assert_eq!(body_of(response).await, "<h1>docs</h1>", "{target}");
        }

        // Without the trailing slash the directory itself is read
        let bare = get(&state, "/docs").await;
        assert_eq!(bare.status(), 500);
        assert!(bare.headers().get("x-exact").is_none());
        assert_eq!(bare.headers()["x-frame-options"], "DENY");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_out_of_root_is_forbidden() {
        let (dir, state) = site();
        std::os::unix::fs::symlink(dir.path().join("secret"), dir.path().join("app/link"))
            .unwrap();

        let response = get(&state, "/link").await;
        assert_eq!(response.status(), 403);
        assert_eq!(response.headers()["x-frame-options"], "DENY");
    }

    #[tokio::test]
    async fn test_head_request_and_access_log() {
        let (dir, _) = site();
        let mut state = state_for(&dir.path().join("app"), RULES);
        state.config.logging.access_log = true;
        let state = Arc::new(state);

        let req = Request::builder()
            .method("HEAD")
            .uri("/index.html")
            .body(())
            .unwrap();
        let response = handle_request(req, state, None).await.unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()["content-length"], "13");
        assert_eq!(response.headers()["x-frame-options"], "DENY");
        assert!(body_of(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_any_method_gets_read_semantics() {
        let (_dir, state) = site();
        let state = Arc::new(state);

        let req = Request::builder()
            .method("POST")
            .uri("/app.js")
            .body(())
            .unwrap();
        let response = handle_request(req, state, None).await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(body_of(response).await, "console.log(1)");
    }
}
