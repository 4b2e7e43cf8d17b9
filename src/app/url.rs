//! Target list parsing and URL normalization.

use std::collections::HashSet;

use log::warn;

/// Longest URL accepted from the input list.
const MAX_URL_LENGTH: usize = 2048;

/// One line of input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// Bare host name or IP address; its ports get scanned.
    Host(String),
    /// Full URL; fetched directly.
    Url(String),
}

/// Validates and normalizes an `http`/`https` URL.
///
/// Returns `None` (with a warning) for URLs that are too long, do not parse,
/// use another scheme or have no host.
pub fn validate_and_normalize_url(url: &str) -> Option<String> {
    if url.len() > MAX_URL_LENGTH {
        warn!(
            "Skipping URL exceeding maximum length ({} > {}): {}...",
            url.len(),
            MAX_URL_LENGTH,
            url.chars().take(50).collect::<String>()
        );
        return None;
    }

    match url::Url::parse(url) {
        Ok(parsed) => match parsed.scheme() {
            "http" | "https" if parsed.host_str().is_some_and(|h| !h.is_empty()) => {
                Some(parsed.to_string())
            }
            "http" | "https" => {
                warn!("Skipping URL without host: {url}");
                None
            }
            _ => {
                warn!("Skipping unsupported scheme for URL: {url}");
                None
            }
        },
        Err(_) => {
            warn!("Skipping invalid URL: {url}");
            None
        }
    }
}

/// Normalizes a bare host: lowercase, no trailing root label, IPv6 brackets
/// removed.
fn normalize_host(host: &str) -> Option<String> {
    let host = host
        .trim_end_matches('.')
        .trim_start_matches('[')
        .trim_end_matches(']')
        .to_ascii_lowercase();
    if host.is_empty() || host.contains(char::is_whitespace) || host.contains('/') {
        warn!("Skipping invalid host: {host:?}");
        return None;
    }
    Some(host)
}

/// Parses a newline-separated target list.
///
/// Blank lines and `#` comments are skipped. Lines with an `http://` or
/// `https://` scheme become [`Target::Url`], everything else
/// [`Target::Host`]. Duplicates are dropped, first occurrence wins.
pub fn parse_targets(text: &str) -> Vec<Target> {
    let mut seen = HashSet::new();
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let lower = line.to_ascii_lowercase();
            if lower.starts_with("http://") || lower.starts_with("https://") {
                validate_and_normalize_url(line).map(Target::Url)
            } else {
                normalize_host(line).map(Target::Host)
            }
        })
        .filter(|target| seen.insert(target.clone()))
        .collect()
}
