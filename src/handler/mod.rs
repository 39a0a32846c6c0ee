//! Request handler module
//!
//! Turns requests into responses: safe path resolution, file reading, and
//! the dispatch that ties them to the header rules.

pub mod resolver;
pub mod router;
pub mod static_files;

// Re-export main entry points
pub use resolver::PathResolver;
pub use router::{handle_request, serve, RequestContext};
