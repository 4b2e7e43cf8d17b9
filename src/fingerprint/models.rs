//! Data structures for the technology database.
//!
//! The JSON schema is Wappalyzer's: an object keyed by technology name whose
//! values carry the patterns below. Fields this crate does not match on are
//! ignored.

use serde::Deserialize;
use std::collections::HashMap;

/// Technology fingerprint rule.
/// Note: The technology name is the key in the JSON, not a field
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Technology {
    /// Category IDs
    #[serde(default)]
    pub cats: Vec<u32>,
    /// Website URL
    #[serde(default)]
    pub website: String,
    /// Header patterns: header_name -> pattern
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Cookie patterns: cookie_name -> pattern
    #[serde(default)]
    pub cookies: HashMap<String, String>,
    /// Meta tag patterns: meta_name -> pattern(s)
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_meta_map")]
    pub meta: HashMap<String, Vec<String>>,
    /// Script source patterns (Wappalyzer uses "scriptSrc")
    #[serde(default)]
    #[serde(alias = "scriptSrc")]
    #[serde(deserialize_with = "deserialize_string_or_array")]
    pub script: Vec<String>,
    /// HTML text patterns
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_string_or_array")]
    pub html: Vec<String>,
    /// Technologies implied by this one
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_string_or_array")]
    pub implies: Vec<String>,
}

/// Deserializes a field that can be either a string or an array of strings
fn deserialize_string_or_array<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct StringOrArrayVisitor;

    impl<'de> Visitor<'de> for StringOrArrayVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or an array of strings")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(elem) = seq.next_element::<String>()? {
                vec.push(elem);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrArrayVisitor)
}

/// Deserializes a meta map where values can be either strings or arrays of strings
fn deserialize_meta_map<'de, D>(deserializer: D) -> Result<HashMap<String, Vec<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, MapAccess, Visitor};
    use std::fmt;

    struct MetaMapVisitor;

    impl<'de> Visitor<'de> for MetaMapVisitor {
        type Value = HashMap<String, Vec<String>>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map of string to string or array of strings")
        }

        fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
        where
            M: MapAccess<'de>,
        {
            let mut result = HashMap::new();
            while let Some((key, value)) = map.next_entry::<String, serde_json::Value>()? {
                let patterns = match value {
                    serde_json::Value::String(s) => vec![s],
                    serde_json::Value::Array(arr) => arr
                        .into_iter()
                        .filter_map(|v| v.as_str().map(|s| s.to_string()))
                        .collect(),
                    _ => {
                        return Err(de::Error::invalid_type(
                            de::Unexpected::Other("expected string or array"),
                            &self,
                        ));
                    }
                };
                result.insert(key, patterns);
            }
            Ok(result)
        }
    }

    deserializer.deserialize_map(MetaMapVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_technology_deserialize_string_and_array_fields() {
        let json = r#"{
            "cats": [1, 11],
            "website": "https://wordpress.org",
            "html": "<link[^>]+/wp-(?:content|includes)/",
            "scriptSrc": ["wp-(?:content|includes)/", "wp-embed"],
            "implies": "PHP"
        }"#;

        let tech: Technology = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(tech.cats, vec![1, 11]);
        assert_eq!(tech.html.len(), 1);
        assert_eq!(tech.script.len(), 2);
        assert_eq!(tech.implies, vec!["PHP"]);
    }

    #[test]
    fn test_technology_deserialize_meta_mixed() {
        let json = r#"{
            "meta": {
                "generator": "WordPress",
                "author": ["John", "Jane"]
            }
        }"#;

        let tech: Technology = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(
            tech.meta.get("generator"),
            Some(&vec!["WordPress".to_string()])
        );
        assert_eq!(tech.meta.get("author").map(Vec::len), Some(2));
    }

    #[test]
    fn test_technology_deserialize_ignores_unknown_fields() {
        let json = r#"{
            "js": {"jQuery.fn.jquery": "\\;version:\\1"},
            "excludes": "Drupal",
            "headers": {"X-Powered-By": "PHP"}
        }"#;

        let tech: Technology = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(tech.headers.get("X-Powered-By"), Some(&"PHP".to_string()));
    }

    #[test]
    fn test_technology_deserialize_wrong_types() {
        let result: Result<Technology, _> = serde_json::from_str(r#"{"html": [123]}"#);
        assert!(result.is_err(), "html entries must be strings");

        let result: Result<Technology, _> =
            serde_json::from_str(r#"{"meta": {"generator": 123}}"#);
        assert!(result.is_err(), "meta values must be strings or arrays");
    }
}
