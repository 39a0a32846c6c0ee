// Application state module
// Immutable state shared by every connection

use std::path::Path;

use super::types::Config;
use crate::handler::PathResolver;
use crate::headers::HeaderRuleStore;

/// Application state
///
/// Built once at startup and shared through `Arc`; nothing in it changes
/// while the server runs, so requests read it without locking.
pub struct AppState {
    pub config: Config,
    pub rules: HeaderRuleStore,
    pub resolver: PathResolver,
}

impl AppState {
    /// Load header rules and set up the serve root from configuration
    pub fn new(config: Config) -> Self {
        let rules = HeaderRuleStore::load(Path::new(&config.site.headers_file));
        let resolver = PathResolver::new(
            Path::new(&config.site.root),
            &config.site.index_document,
        );
        Self::from_parts(config, rules, resolver)
    }

    /// Assemble state from already built parts
    pub const fn from_parts(config: Config, rules: HeaderRuleStore, resolver: PathResolver) -> Self {
        Self {
            config,
            rules,
            resolver,
        }
    }

    pub const fn access_log_enabled(&self) -> bool {
        self.config.logging.access_log
    }
}
