/*
 * config.rs
 * Copyright (c) 2025 Austrian Centre for Digital Humanities
 *
 * Service configuration
 */

//! Service configuration.
//!
//! A YAML file lists the metadata formats the service offers, keyed by
//! `metadataPrefix`, together with the settings shared by every render:
//!
//! ```yaml
//! base-url: https://arche.acdh.oeaw.ac.at/oai
//! cache:
//!   max-statements: 100000
//! vocabulary:
//!   timeout-secs: 10
//! formats:
//!   cmdi:
//!     template: templates/cmdi.xml
//!     prefixes:
//!       acdh: https://vocabs.acdh.oeaw.ac.at/schema#
//! ```
//!
//! Relative paths in format descriptors resolve against the directory of the
//! configuration file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use oaipmh_graph::CachePolicy;
use oaipmh_template::{
    FormatDescriptor, HttpFetcher, MetadataFormat, NullFetcher, VocabularyFetcher,
    VocabularyMapper,
};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ServiceConfig {
    /// Base URL of the OAI-PMH endpoint, used by `OAIURL`.
    #[serde(default)]
    pub base_url: String,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub vocabulary: VocabularyConfig,

    /// Metadata formats by `metadataPrefix`.
    #[serde(default)]
    pub formats: BTreeMap<String, FormatDescriptor>,

    /// Directory of the configuration file.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct CacheConfig {
    /// Empty the graph cache between records once it holds more statements
    /// than this.
    #[serde(default)]
    pub max_statements: Option<usize>,
}

impl CacheConfig {
    pub fn policy(&self) -> CachePolicy {
        match self.max_statements {
            Some(max) => CachePolicy::bounded(max),
            None => CachePolicy::unbounded(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct VocabularyConfig {
    /// Fetch remote vocabularies for `map="/predicate"`.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl VocabularyConfig {
    /// A mapper backed by HTTP, or by a fetcher that always fails when
    /// lookups are disabled.
    pub fn mapper(&self) -> Result<VocabularyMapper> {
        let fetcher: Arc<dyn VocabularyFetcher> = if self.enabled {
            Arc::new(
                HttpFetcher::new(Duration::from_secs(self.timeout_secs))
                    .context("Failed to create HTTP client for vocabulary lookups")?,
            )
        } else {
            Arc::new(NullFetcher)
        };
        Ok(VocabularyMapper::new(fetcher))
    }
}

impl ServiceConfig {
    /// Parse a configuration document. `base_dir` is where relative paths
    /// resolve.
    pub fn parse(content: &str, base_dir: &Path) -> Result<Self> {
        let mut config: ServiceConfig =
            serde_yaml::from_str(content).context("Invalid service configuration")?;
        for (prefix, descriptor) in &mut config.formats {
            if descriptor.metadata_prefix.is_empty() {
                descriptor.metadata_prefix = prefix.clone();
            }
        }
        config.base_dir = base_dir.to_path_buf();
        Ok(config)
    }

    /// Read a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration {}", path.display()))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let config = Self::parse(&content, base_dir)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?;
        debug!(
            path = %path.display(),
            formats = config.formats.len(),
            "loaded configuration"
        );
        Ok(config)
    }

    /// Descriptor of one format.
    pub fn descriptor(&self, prefix: &str) -> Result<&FormatDescriptor> {
        self.formats.get(prefix).with_context(|| {
            let known: Vec<&str> = self.formats.keys().map(String::as_str).collect();
            format!(
                "Unknown metadata format '{}' (configured: {})",
                prefix,
                if known.is_empty() {
                    "none".to_string()
                } else {
                    known.join(", ")
                }
            )
        })
    }

    /// Load a format's template and components.
    pub fn load_format(&self, prefix: &str) -> Result<MetadataFormat> {
        let descriptor = self.descriptor(prefix)?.clone();
        MetadataFormat::load(descriptor, &self.base_dir)
            .with_context(|| format!("Failed to load metadata format '{}'", prefix))
    }
}
