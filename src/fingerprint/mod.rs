//! Technology fingerprinting.
//!
//! Matches stored response headers and bodies against a Wappalyzer-format
//! technology database. A small database ships with the crate; `--fingerprints`
//! replaces it with a file or a directory of JSON files.

mod detection;
mod models;
mod patterns;

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use tokio::fs;

use crate::engine::Header;
use crate::error_handling::InitializationError;

use detection::{CompiledTechnology, Evidence};
use patterns::Pattern;

pub use models::Technology;

const BUNDLED_TECHNOLOGIES: &str = include_str!("technologies.json");

/// A detected technology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub name: String,
    /// Vendor website, empty when unknown
    pub website: String,
}

/// Compiled technology database.
#[derive(Debug)]
pub struct FingerprintDb {
    technologies: Vec<CompiledTechnology>,
}

impl FingerprintDb {
    /// Database shipped with the crate.
    pub fn bundled() -> Result<Self, InitializationError> {
        let technologies: HashMap<String, Technology> =
            serde_json::from_str(BUNDLED_TECHNOLOGIES).map_err(|e| {
                InitializationError::FingerprintError(format!("bundled database: {e}"))
            })?;
        Ok(Self::from_technologies(technologies))
    }

    /// Loads the override at `path` when given, the bundled database otherwise.
    pub async fn load(path: Option<&Path>) -> Result<Self, InitializationError> {
        match path {
            Some(path) => {
                let technologies = load_from_path(path).await.map_err(|e| {
                    InitializationError::FingerprintError(format!("{}: {e:#}", path.display()))
                })?;
                log::info!(
                    "Loaded {} technologies from {}",
                    technologies.len(),
                    path.display()
                );
                Ok(Self::from_technologies(technologies))
            }
            None => Self::bundled(),
        }
    }

    pub fn from_technologies(technologies: HashMap<String, Technology>) -> Self {
        let mut compiled: Vec<CompiledTechnology> = technologies
            .into_iter()
            .map(|(name, tech)| compile(name, tech))
            .collect();
        compiled.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            technologies: compiled,
        }
    }

    pub fn len(&self) -> usize {
        self.technologies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.technologies.is_empty()
    }

    /// Technologies evidenced by a response, implied ones included, sorted by name.
    pub fn detect(&self, headers: &[Header], body: &str) -> Vec<Detection> {
        let evidence = Evidence::new(headers, body);
        detection::detect(&self.technologies, &evidence)
            .into_iter()
            .map(|(name, website)| Detection { name, website })
            .collect()
    }
}

fn compile(name: String, tech: Technology) -> CompiledTechnology {
    CompiledTechnology {
        name,
        website: tech.website,
        headers: tech
            .headers
            .iter()
            .map(|(header, pattern)| (header.to_lowercase(), Pattern::compile(pattern)))
            .collect(),
        cookies: tech
            .cookies
            .iter()
            .map(|(cookie, pattern)| (cookie.clone(), Pattern::compile(pattern)))
            .collect(),
        meta: tech
            .meta
            .iter()
            .map(|(key, patterns)| {
                (
                    key.clone(),
                    patterns.iter().map(|p| Pattern::compile(p)).collect(),
                )
            })
            .collect(),
        scripts: tech.script.iter().map(|p| Pattern::compile(p)).collect(),
        html: tech.html.iter().map(|p| Pattern::compile(p)).collect(),
        implies: tech.implies,
    }
}

/// Loads technologies from a local path (handles both single file and directory)
async fn load_from_path(path: &Path) -> Result<HashMap<String, Technology>> {
    if path.is_dir() {
        let mut all_technologies = HashMap::new();
        let mut entries = fs::read_dir(path).await?;

        while let Some(entry) = entries.next_entry().await? {
            let file_path = entry.path();
            if file_path.extension().and_then(|s| s.to_str()) == Some("json") {
                match fs::read_to_string(&file_path).await {
                    Ok(content) => match serde_json::from_str::<HashMap<String, Technology>>(&content) {
                        Ok(techs) => all_technologies.extend(techs),
                        Err(e) => log::warn!("Failed to parse {}: {}", file_path.display(), e),
                    },
                    Err(e) => log::warn!("Failed to read {}: {}", file_path.display(), e),
                }
            }
        }

        Ok(all_technologies)
    } else {
        let content = fs::read_to_string(path).await?;
        let technologies: HashMap<String, Technology> =
            serde_json::from_str(&content).context("Failed to parse technologies JSON")?;
        Ok(technologies)
    }
}
