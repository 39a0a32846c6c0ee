//! Header rules module
//!
//! Loads `[[headers]]` rules from the deployment configuration and answers
//! which response headers apply to a request path.

mod matcher;
mod parser;

pub use matcher::matches_pattern;
pub use parser::{parse_key_value, parse_rules};

use crate::logger;
use hyper::header::{HeaderName, HeaderValue};
use std::io;
use std::path::Path;

/// Ordered header name/value mapping
///
/// Names compare ASCII case-insensitively. Inserting a name that is already
/// present replaces its value and keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(String, String)>,
}

impl HeaderSet {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn insert(&mut self, name: &str, value: &str) {
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some(entry) => value.clone_into(&mut entry.1),
            None => self.entries.push((name.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Overlay another set on top of this one
    pub fn merge(&mut self, other: &Self) {
        for (name, value) in other.iter() {
            self.insert(name, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A single `[[headers]]` rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRule {
    pattern: String,
    values: HeaderSet,
}

impl HeaderRule {
    pub const fn new(pattern: String, values: HeaderSet) -> Self {
        Self { pattern, values }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub const fn values(&self) -> &HeaderSet {
        &self.values
    }

    pub fn matches(&self, path: &str) -> bool {
        matches_pattern(&self.pattern, path)
    }
}

/// Immutable, ordered collection of header rules
///
/// Built once at startup and shared read-only between requests.
#[derive(Debug, Clone, Default)]
pub struct HeaderRuleStore {
    rules: Vec<HeaderRule>,
}

impl HeaderRuleStore {
    pub const fn new(rules: Vec<HeaderRule>) -> Self {
        Self { rules }
    }

    /// Build a store from configuration text
    pub fn parse(content: &str) -> Self {
        Self::new(parse_rules(content))
    }

    /// Load rules from a configuration file
    ///
    /// An unreadable file is not fatal: a warning is logged and the store is
    /// empty, so files are still served, just without extra headers.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(store) => store,
            Err(e) => {
                logger::log_warning(&unreadable_file_warning(path, &e));
                Self::default()
            }
        }
    }

    /// Load rules from a configuration file, failing if it cannot be read
    pub fn try_load(path: &Path) -> io::Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let store = Self::parse(&content);
        store.report_invalid_headers();
        logger::log_rules_loaded(store.len(), path);
        Ok(store)
    }

    /// Merge the values of every rule matching `path`, in declaration order
    pub fn headers_for_path(&self, path: &str) -> HeaderSet {
        let mut result = HeaderSet::new();
        for rule in self.rules.iter().filter(|rule| rule.matches(path)) {
            result.merge(rule.values());
        }
        result
    }

    pub fn rules(&self) -> &[HeaderRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Warn about pairs that cannot be sent as HTTP headers
    fn report_invalid_headers(&self) {
        for rule in &self.rules {
            for (name, value) in rule.values().iter() {
                if HeaderName::from_bytes(name.as_bytes()).is_err()
                    || HeaderValue::from_str(value).is_err()
                {
                    logger::log_warning(&format!(
                        "Header '{name}' for '{}' is not a valid HTTP header and will be skipped",
                        rule.pattern()
                    ));
                }
            }
        }
    }
}

fn unreadable_file_warning(path: &Path, err: &io::Error) -> String {
    format!(
        "Could not read {} ({err}), no headers will be applied",
        path.display()
    )
}
