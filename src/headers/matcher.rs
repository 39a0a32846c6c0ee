//! Header rule pattern matching
//!
//! Patterns follow the Netlify `for` syntax subset:
//! - `/*` matches every path
//! - `/prefix/*` matches any path starting with `/prefix`
//! - anything else must equal the path exactly

const WILDCARD: &str = "/*";

/// Check if a rule pattern applies to a request path
///
/// Prefix comparison is a plain string test, not a segment match:
/// `/ab/*` matches `/ab/c`, `/ab/` and also `/abc`.
pub fn matches_pattern(pattern: &str, path: &str) -> bool {
    if pattern == WILDCARD {
        return true;
    }

    match pattern.strip_suffix(WILDCARD) {
        Some(prefix) => path.starts_with(prefix),
        None => pattern == path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_matches_everything() {
        for path in ["/", "/index.html", "/api/widgets", "", "/a/b/c"] {
            assert!(matches_pattern("/*", path), "{path}");
        }
    }

    #[test]
    fn test_prefix_pattern() {
        assert!(matches_pattern("/assets/*", "/assets/x"));
        assert!(matches_pattern("/assets/*", "/assets/"));
        assert!(matches_pattern("/assets/*", "/assets/css/site.css"));
        assert!(!matches_pattern("/assets/*", "/asset"));
        assert!(!matches_pattern("/assets/*", "/other/assets/x"));
    }

    #[test]
    fn test_prefix_is_not_segment_aware() {
        assert!(matches_pattern("/ab/*", "/abc"));
        assert!(matches_pattern("/ab/*", "/ab"));
        assert!(!matches_pattern("/ab/*", "/a"));
    }

    #[test]
    fn test_exact_pattern() {
        assert!(matches_pattern("/index.html", "/index.html"));
        assert!(!matches_pattern("/index.html", "/index.htm"));
        assert!(!matches_pattern("/index.html", "/index.html/"));
    }

    #[test]
    fn test_star_without_slash_is_exact() {
        assert!(matches_pattern("/file*", "/file*"));
        assert!(!matches_pattern("/file*", "/file.txt"));
    }
}
