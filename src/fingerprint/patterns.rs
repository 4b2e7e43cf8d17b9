//! Pattern matching for technology detection.
//!
//! Supports Wappalyzer pattern syntax:
//! - Simple substring matching
//! - Regex matching (case-insensitive)
//! - `\;version:...` and other `\;` directives, which are stripped
//! - Meta tag keys with `property:` / `http-equiv:` prefixes

use std::collections::HashMap;

use regex::{Regex, RegexBuilder};

/// A pattern compiled once at load time.
#[derive(Debug, Clone)]
pub(crate) enum Pattern {
    /// Empty pattern: presence is enough
    Any,
    Substring(String),
    Regex(Regex),
}

impl Pattern {
    /// Compiles a raw pattern.
    ///
    /// Patterns containing regex syntax are compiled as regexes; if that
    /// fails they fall back to a substring match on the raw text.
    pub(crate) fn compile(raw: &str) -> Pattern {
        // Drop "\;version:\1" and "\;confidence:50" directives
        let pattern = raw.split("\\;").next().unwrap_or(raw).trim();
        if pattern.is_empty() {
            return Pattern::Any;
        }

        let is_regex = pattern.starts_with('^')
            || pattern.contains('$')
            || pattern.contains('\\')
            || pattern.contains('[')
            || pattern.contains('(')
            || pattern.contains('*')
            || pattern.contains('+')
            || pattern.contains('?');

        if !is_regex {
            return Pattern::Substring(pattern.to_lowercase());
        }

        match RegexBuilder::new(pattern)
            .case_insensitive(true)
            .size_limit(1 << 20)
            .build()
        {
            Ok(re) => Pattern::Regex(re),
            Err(e) => {
                log::trace!("Pattern {pattern:?} is not a valid regex ({e}), using substring match");
                Pattern::Substring(pattern.to_lowercase())
            }
        }
    }

    pub(crate) fn is_match(&self, text: &str) -> bool {
        match self {
            Pattern::Any => true,
            Pattern::Substring(needle) => text.to_lowercase().contains(needle.as_str()),
            Pattern::Regex(re) => re.is_match(text),
        }
    }
}

/// Checks if meta tag patterns match any meta tag values.
///
/// Keys may be:
/// - Simple name: "generator" -> matches meta name="generator" (or property/http-equiv)
/// - Prefixed: "property:og:title" -> matches meta property="og:title"
/// - Prefixed: "http-equiv:content-type" -> matches meta http-equiv="content-type"
///
/// `meta_tags` is keyed `prefix:name` with lowercased names.
pub(crate) fn check_meta_patterns(
    meta_key: &str,
    patterns: &[Pattern],
    meta_tags: &HashMap<String, String>,
) -> bool {
    let meta_key_lower = meta_key.to_lowercase();

    let check_patterns =
        |meta_value: &str| -> bool { patterns.iter().any(|pattern| pattern.is_match(meta_value)) };

    if meta_key_lower.starts_with("property:") || meta_key_lower.starts_with("http-equiv:") {
        return meta_tags
            .get(&meta_key_lower)
            .is_some_and(|value| check_patterns(value));
    }

    ["name", "property", "http-equiv"].iter().any(|prefix| {
        meta_tags
            .get(&format!("{prefix}:{meta_key_lower}"))
            .is_some_and(|value| check_patterns(value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pattern_matches_anything() {
        assert!(Pattern::compile("").is_match("whatever"));
        assert!(Pattern::compile("\\;confidence:50").is_match(""));
    }

    #[test]
    fn test_substring_is_case_insensitive() {
        let p = Pattern::compile("nginx");
        assert!(matches!(p, Pattern::Substring(_)));
        assert!(p.is_match("NGINX/1.25.3"));
        assert!(!p.is_match("Apache"));
    }

    #[test]
    fn test_regex_with_version_directive() {
        let p = Pattern::compile("^WordPress\\s+([\\d.]+)?\\;version:\\1");
        assert!(matches!(p, Pattern::Regex(_)));
        assert!(p.is_match("WordPress 6.4.2"));
        assert!(!p.is_match("Joomla! 4"));
    }

    #[test]
    fn test_invalid_regex_falls_back_to_substring() {
        let p = Pattern::compile("foo(bar");
        assert!(matches!(p, Pattern::Substring(_)));
        assert!(p.is_match("xx foo(bar yy"));
    }

    #[test]
    fn test_meta_simple_key_tries_all_prefixes() {
        let mut tags = HashMap::new();
        tags.insert("property:generator".to_string(), "Hugo 0.120".to_string());
        let patterns = vec![Pattern::compile("Hugo")];
        assert!(check_meta_patterns("generator", &patterns, &tags));
        assert!(!check_meta_patterns("application-name", &patterns, &tags));
    }

    #[test]
    fn test_meta_prefixed_key() {
        let mut tags = HashMap::new();
        tags.insert("property:og:site_name".to_string(), "Ghost".to_string());
        tags.insert("name:og:site_name".to_string(), "Other".to_string());
        let patterns = vec![Pattern::compile("^Ghost$")];
        assert!(check_meta_patterns("property:og:site_name", &patterns, &tags));
        assert!(!check_meta_patterns("http-equiv:og:site_name", &patterns, &tags));
    }
}
