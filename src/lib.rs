//! Static file server whose response headers come from `[[headers]]` rules
//! in a `netlify.toml`-style deployment file.
//!
//! Files are served from a single root directory. Request paths are decoded,
//! joined onto the root and checked for confinement both before and after
//! symlinks are followed.

pub mod config;
pub mod error;
pub mod handler;
pub mod headers;
pub mod http;
pub mod logger;
pub mod server;
