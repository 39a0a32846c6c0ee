//! `[[headers]]` section parser
//!
//! Line-oriented reader for the header rules of a `netlify.toml` file.
//! Only the subset needed for header rules is understood; everything else
//! in the document is skipped.

use super::{HeaderRule, HeaderSet};

const RULE_MARKER: &str = "[[headers]]";
const VALUES_MARKER: &str = "[headers.values]";
const PATTERN_KEY: &str = "for";

/// Rule being assembled while the parser walks the document
struct PendingRule {
    pattern: Option<String>,
    values: HeaderSet,
}

/// Parse all `[[headers]]` rules from a configuration document
///
/// Rules keep their declaration order. A rule that never declares `for`
/// is dropped. Lines that are not `key = "value"` pairs or section markers
/// are ignored.
pub fn parse_rules(content: &str) -> Vec<HeaderRule> {
    let mut pending: Vec<PendingRule> = Vec::new();
    let mut in_values = false;

    for raw in content.split('\n') {
        let line = raw.trim();

        if line == RULE_MARKER {
            pending.push(PendingRule {
                pattern: None,
                values: HeaderSet::new(),
            });
            in_values = false;
            continue;
        }

        let Some(current) = pending.last_mut() else {
            continue;
        };

        if line == VALUES_MARKER {
            in_values = true;
            continue;
        }

        // Any other section closes the values block, not the rule
        if line.starts_with('[') {
            in_values = false;
            continue;
        }

        let Some((key, value)) = parse_key_value(line) else {
            continue;
        };

        if in_values {
            current.values.insert(key, value);
        } else if key == PATTERN_KEY {
            current.pattern = Some(value.to_string());
        }
    }

    pending
        .into_iter()
        .filter_map(|rule| {
            rule.pattern
                .map(|pattern| HeaderRule::new(pattern, rule.values))
        })
        .collect()
}

/// Split a trimmed `key = "value"` line
///
/// The key runs up to the first `=` and loses its trailing whitespace. The
/// value must be double-quoted and may contain backslash escapes, but no
/// bare quote; it is returned verbatim without the surrounding quotes.
pub fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq = line.find('=')?;
    let key = line[..eq].trim_end();
    if key.is_empty() {
        return None;
    }

    let quoted = line[eq + 1..].trim_start();
    let inner = quoted.strip_prefix('"')?.strip_suffix('"')?;
    is_quoted_body(inner).then_some((key, inner))
}

/// Check that a string body has no unescaped quote and no dangling backslash
fn is_quoted_body(body: &str) -> bool {
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => return false,
            '\\' => {
                if chars.next().is_none() {
                    return false;
                }
            }
            _ => {}
        }
    }
    true
}
