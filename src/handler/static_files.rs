//! Static file serving module
//!
//! Reads a resolved file and builds the terminal response for it.

use crate::error::ServeError;
use crate::handler::router::RequestContext;
use crate::headers::HeaderSet;
use crate::http::{self, mime};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::Path;
use tokio::fs;

/// Serve a file that has already passed path confinement
pub async fn serve_file(
    ctx: &RequestContext<'_>,
    file_path: &Path,
    headers: &HeaderSet,
) -> Response<Full<Bytes>> {
    match load_file(file_path).await {
        Ok((content, content_type)) => {
            http::build_file_response(Bytes::from(content), content_type, headers, ctx.is_head)
        }
        Err(ServeError::NotFound) => http::build_404_response(headers, ctx.is_head),
        Err(ServeError::Io(e)) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {e}",
                file_path.display()
            ));
            http::build_500_response(headers, ctx.is_head)
        }
    }
}

/// Read a file and determine its content type
pub async fn load_file(file_path: &Path) -> Result<(Vec<u8>, &'static str), ServeError> {
    let content = fs::read(file_path).await.map_err(ServeError::from_read)?;
    Ok((content, mime::content_type_for(file_path)))
}
