//! HTTP protocol layer module
//!
//! Content-type lookup and response builders, decoupled from request handling.

pub mod mime;
pub mod response;

// Re-export commonly used types
pub use response::{
    apply_headers, build_400_response, build_403_response, build_404_response,
    build_500_response, build_file_response,
};
