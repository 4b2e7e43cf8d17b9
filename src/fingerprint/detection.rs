//! Evidence extraction and matching.

use std::collections::{BTreeMap, HashMap};

use scraper::{Html, Selector};

use super::patterns::{check_meta_patterns, Pattern};
use crate::engine::Header;

/// Everything a page offers for matching.
#[derive(Debug, Default)]
pub(crate) struct Evidence {
    /// Lowercased header name -> values joined with ", "
    pub(crate) headers: HashMap<String, String>,
    /// Cookie name -> value, from `Set-Cookie`
    pub(crate) cookies: HashMap<String, String>,
    /// `prefix:name` (lowercased) -> content
    pub(crate) meta: HashMap<String, String>,
    /// `<script src>` values
    pub(crate) scripts: Vec<String>,
    pub(crate) html: String,
}

impl Evidence {
    pub(crate) fn new(headers: &[Header], body: &str) -> Self {
        let mut evidence = Evidence {
            html: body.to_string(),
            ..Default::default()
        };

        for header in headers {
            let name = header.name.to_lowercase();
            if name == "set-cookie" {
                if let Some((cookie, value)) = header
                    .value
                    .split(';')
                    .next()
                    .and_then(|pair| pair.split_once('='))
                {
                    evidence
                        .cookies
                        .insert(cookie.trim().to_string(), value.trim().to_string());
                }
            }
            evidence
                .headers
                .entry(name)
                .and_modify(|existing: &mut String| {
                    existing.push_str(", ");
                    existing.push_str(&header.value);
                })
                .or_insert_with(|| header.value.clone());
        }

        if !body.is_empty() {
            let document = Html::parse_document(body);
            if let Ok(selector) = Selector::parse("meta") {
                for element in document.select(&selector) {
                    let attrs = element.value();
                    let Some(content) = attrs.attr("content") else {
                        continue;
                    };
                    for prefix in ["name", "property", "http-equiv"] {
                        if let Some(key) = attrs.attr(prefix) {
                            evidence
                                .meta
                                .insert(format!("{prefix}:{}", key.to_lowercase()), content.to_string());
                        }
                    }
                }
            }
            if let Ok(selector) = Selector::parse("script[src]") {
                evidence.scripts = document
                    .select(&selector)
                    .filter_map(|el| el.value().attr("src").map(str::to_string))
                    .collect();
            }
        }

        evidence
    }
}

/// A technology with its patterns compiled.
#[derive(Debug)]
pub(crate) struct CompiledTechnology {
    pub(crate) name: String,
    pub(crate) website: String,
    pub(crate) headers: Vec<(String, Pattern)>,
    pub(crate) cookies: Vec<(String, Pattern)>,
    pub(crate) meta: Vec<(String, Vec<Pattern>)>,
    pub(crate) scripts: Vec<Pattern>,
    pub(crate) html: Vec<Pattern>,
    pub(crate) implies: Vec<String>,
}

impl CompiledTechnology {
    pub(crate) fn matches(&self, evidence: &Evidence) -> bool {
        self.headers.iter().any(|(name, pattern)| {
            evidence
                .headers
                .get(name)
                .is_some_and(|value| pattern.is_match(value))
        }) || self.cookies.iter().any(|(name, pattern)| {
            cookie_value(&evidence.cookies, name).is_some_and(|value| pattern.is_match(value))
        }) || self
            .meta
            .iter()
            .any(|(key, patterns)| check_meta_patterns(key, patterns, &evidence.meta))
            || self
                .scripts
                .iter()
                .any(|pattern| evidence.scripts.iter().any(|src| pattern.is_match(src)))
            || (!evidence.html.is_empty()
                && self.html.iter().any(|pattern| pattern.is_match(&evidence.html)))
    }
}

/// Cookie lookup supporting `*` wildcards in the rule's cookie name.
fn cookie_value<'a>(cookies: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    if !name.contains('*') {
        return cookies.get(name).map(String::as_str);
    }
    let wildcard = format!("^{}$", regex::escape(name).replace("\\*", ".*"));
    let re = regex::Regex::new(&wildcard).ok()?;
    cookies
        .iter()
        .find(|(cookie, _)| re.is_match(cookie))
        .map(|(_, value)| value.as_str())
}

/// Matches every technology and follows `implies` transitively.
///
/// Returns name -> website, ordered by name.
pub(crate) fn detect(
    technologies: &[CompiledTechnology],
    evidence: &Evidence,
) -> BTreeMap<String, String> {
    let by_name: HashMap<&str, &CompiledTechnology> =
        technologies.iter().map(|t| (t.name.as_str(), t)).collect();

    let mut found = BTreeMap::new();
    let mut queue: Vec<&CompiledTechnology> =
        technologies.iter().filter(|t| t.matches(evidence)).collect();

    while let Some(tech) = queue.pop() {
        if found.contains_key(&tech.name) {
            continue;
        }
        found.insert(tech.name.clone(), tech.website.clone());
        for implied in &tech.implies {
            // Implies may carry directives too, e.g. "PHP\;confidence:50"
            let implied = implied.split("\\;").next().unwrap_or(implied).trim();
            match by_name.get(implied) {
                Some(next) => queue.push(next),
                None => {
                    found
                        .entry(implied.to_string())
                        .or_insert_with(String::new);
                }
            }
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(name: &str, value: &str) -> Header {
        Header {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_evidence_from_headers_and_body() {
        let headers = vec![
            header("Server", "nginx"),
            header("Set-Cookie", "PHPSESSID=abc; path=/"),
            header("Set-Cookie", "_ga_XYZ=1"),
        ];
        let body = r#"<html><head>
            <meta name="Generator" content="WordPress 6.4">
            <meta property="og:site_name" content="Blog">
            <script src="/wp-includes/js/jquery.min.js"></script>
        </head></html>"#;

        let evidence = Evidence::new(&headers, body);
        assert_eq!(evidence.headers.get("server").map(String::as_str), Some("nginx"));
        assert_eq!(evidence.cookies.get("PHPSESSID").map(String::as_str), Some("abc"));
        assert_eq!(
            evidence.meta.get("name:generator").map(String::as_str),
            Some("WordPress 6.4")
        );
        assert!(evidence.meta.contains_key("property:og:site_name"));
        assert_eq!(evidence.scripts, vec!["/wp-includes/js/jquery.min.js"]);
        assert!(evidence.headers.get("set-cookie").unwrap().contains(", "));
    }

    #[test]
    fn test_cookie_wildcard() {
        let mut cookies = HashMap::new();
        cookies.insert("_ga_ABC123".to_string(), "GS1".to_string());
        assert_eq!(cookie_value(&cookies, "_ga_*"), Some("GS1"));
        assert_eq!(cookie_value(&cookies, "_gid"), None);
    }
}
