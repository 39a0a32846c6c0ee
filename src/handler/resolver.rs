//! Safe path resolution module
//!
//! Maps untrusted request paths onto files below the serve root. Confinement
//! is checked twice: once on the lexically joined path, and again after
//! symlinks have been followed.

use crate::error::{DecodeError, ResolveError};
use crate::logger;
use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

/// Resolves request paths to files inside a fixed root directory
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    index_document: String,
}

impl PathResolver {
    /// Create a resolver for `root`
    ///
    /// The root is canonicalized so that symlinked roots compare correctly
    /// against canonicalized file paths. A missing root is kept as an
    /// absolute path; every request will then end in 404.
    pub fn new(root: &Path, index_document: &str) -> Self {
        let root = match std::fs::canonicalize(root) {
            Ok(canonical) => canonical,
            Err(e) => {
                logger::log_warning(&format!(
                    "Serve root '{}' is not accessible: {e}",
                    root.display()
                ));
                std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf())
            }
        };

        Self {
            root,
            index_document: index_document.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Turn the raw request target into a decoded URL path
    ///
    /// Drops the query string, percent-decodes, and appends the index
    /// document to `/` and to any path ending in `/`. Header rules are
    /// matched against this path, so it names the file actually read. No
    /// filesystem access happens here.
    pub fn request_path(&self, raw: &str) -> Result<String, DecodeError> {
        let path = raw.split_once('?').map_or(raw, |(path, _)| path);
        let mut decoded = decode_path(path)?;

        if decoded.is_empty() {
            decoded.push('/');
        }
        if decoded.ends_with('/') {
            decoded.push_str(&self.index_document);
        }
        Ok(decoded)
    }

    /// Resolve an already decoded URL path to a file inside the root
    ///
    /// A directory without a trailing `/` resolves to the directory itself;
    /// reading it fails later.
    pub async fn resolve_decoded(&self, request_path: &str) -> Result<PathBuf, ResolveError> {
        let joined = lexical_join(&self.root, request_path);
        let joined = self.confine(joined)?;

        self.confine(canonicalize_or_lexical(joined).await)
    }

    /// Decode and resolve a raw request target
    pub async fn resolve(&self, raw: &str) -> Result<PathBuf, ResolveError> {
        let request_path = self.request_path(raw)?;
        self.resolve_decoded(&request_path).await
    }

    fn confine(&self, candidate: PathBuf) -> Result<PathBuf, ResolveError> {
        if is_confined(&self.root, &candidate) {
            Ok(candidate)
        } else {
            Err(ResolveError::Forbidden)
        }
    }
}

/// Percent-decode a URL path
///
/// Every `%` must start a two hex digit escape, and the decoded bytes must be
/// UTF-8. `+` is left as is.
pub fn decode_path(path: &str) -> Result<String, DecodeError> {
    let bytes = path.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = matches!(
                (bytes.get(i + 1), bytes.get(i + 2)),
                (Some(hi), Some(lo)) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit()
            );
            if !valid {
                return Err(DecodeError::MalformedEscape(i));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    urlencoding::decode(path)
        .map(Cow::into_owned)
        .map_err(|_| DecodeError::InvalidUtf8)
}

/// Join a URL path onto `root` without touching the filesystem
///
/// `.` segments are dropped and `..` removes the previous segment, so the
/// result may end up above `root`; callers must check it with
/// [`is_confined`].
pub fn lexical_join(root: &Path, request_path: &str) -> PathBuf {
    let mut joined = root.to_path_buf();
    for component in Path::new(request_path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => joined.push(part),
            Component::ParentDir => {
                joined.pop();
            }
            Component::CurDir => {}
            // An absolute component replaces everything before it
            Component::RootDir | Component::Prefix(_) => joined.push(component.as_os_str()),
        }
    }
    joined
}

/// Follow symlinks, falling back to the unresolved path if that fails
///
/// A missing target is not an error here; the later read reports it.
pub async fn canonicalize_or_lexical(path: PathBuf) -> PathBuf {
    match tokio::fs::canonicalize(&path).await {
        Ok(canonical) => canonical,
        Err(_) => path,
    }
}

/// Check that `candidate` is `root` itself or lies below it
///
/// Comparison is per path component, so `/srv/app2` is not inside
/// `/srv/app`.
pub fn is_confined(root: &Path, candidate: &Path) -> bool {
    candidate.starts_with(root)
}
