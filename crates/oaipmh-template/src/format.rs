/*
 * format.rs
 * Copyright (c) 2025 Austrian Centre for Digital Humanities
 */

//! Metadata format descriptors and format dispatch.

use crate::context::RecordContext;
use crate::error::TemplateResult;
use crate::processor::TemplateProcessor;
use crate::template::Template;
use crate::vocabulary::VocabularyMapper;
use oaipmh_graph::GraphCache;
use oaipmh_xml::XmlElement;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Static value tables, by name: table name -> source value -> target value.
pub type ValueMaps = BTreeMap<String, BTreeMap<String, String>>;

/// How a format produces its metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatKind {
    /// Rendered from an XML template with control attributes.
    #[default]
    Template,
}

/// Read-only description of one metadata format.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FormatDescriptor {
    /// The OAI-PMH `metadataPrefix`. Filled from the configuration key when
    /// formats are read from a map.
    #[serde(default)]
    pub metadata_prefix: String,

    /// XML schema location advertised for the format.
    #[serde(default)]
    pub schema: Option<String>,

    /// Namespace of the metadata root element.
    #[serde(default)]
    pub metadata_namespace: Option<String>,

    #[serde(default)]
    pub kind: FormatKind,

    /// Template file, relative to the configuration file.
    #[serde(default)]
    pub template: PathBuf,

    /// Where `ComponentId` sub-templates live. Defaults to the template's
    /// directory.
    #[serde(default)]
    pub component_dir: Option<PathBuf>,

    /// Namespace prefixes usable in paths and conditions.
    #[serde(default)]
    pub prefixes: BTreeMap<String, String>,

    /// Static tables for `map="name"`.
    #[serde(default)]
    pub value_maps: ValueMaps,

    /// Keep template comments in the output.
    #[serde(default)]
    pub preserve_comments: bool,

    /// Render failures as an `<error>` document instead of failing.
    #[serde(default)]
    pub xml_errors: bool,

    /// Attribute receiving value languages.
    #[serde(default = "default_lang_attribute")]
    pub lang_attribute: String,
}

fn default_lang_attribute() -> String {
    "xml:lang".to_string()
}

impl FormatDescriptor {
    /// A template format with no prefixes or value maps.
    pub fn new(metadata_prefix: impl Into<String>) -> Self {
        Self {
            metadata_prefix: metadata_prefix.into(),
            schema: None,
            metadata_namespace: None,
            kind: FormatKind::Template,
            template: PathBuf::new(),
            component_dir: None,
            prefixes: BTreeMap::new(),
            value_maps: BTreeMap::new(),
            preserve_comments: false,
            xml_errors: false,
            lang_attribute: default_lang_attribute(),
        }
    }

    /// Builder-style prefix registration.
    pub fn with_prefix(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.prefixes.insert(prefix.into(), namespace.into());
        self
    }
}

/// A loaded metadata format, ready to render records.
#[derive(Debug, Clone)]
pub enum MetadataFormat {
    Template {
        descriptor: FormatDescriptor,
        template: Template,
    },
}

impl MetadataFormat {
    /// Load the format's resources. Relative paths in the descriptor are
    /// resolved against `base_dir`.
    pub fn load(descriptor: FormatDescriptor, base_dir: &Path) -> TemplateResult<Self> {
        match descriptor.kind {
            FormatKind::Template => {
                let path = base_dir.join(&descriptor.template);
                let component_dir = descriptor.component_dir.as_ref().map(|d| base_dir.join(d));
                let template = Template::from_file(&path, component_dir.as_deref())?;
                info!(
                    format = %descriptor.metadata_prefix,
                    template = %path.display(),
                    "loaded metadata format"
                );
                Ok(MetadataFormat::Template {
                    descriptor,
                    template,
                })
            }
        }
    }

    pub fn descriptor(&self) -> &FormatDescriptor {
        match self {
            MetadataFormat::Template { descriptor, .. } => descriptor,
        }
    }

    /// Render one record, then let the graph cache apply its eviction policy.
    pub fn render(
        &self,
        record: &RecordContext,
        graph: &GraphCache,
        vocabulary: &VocabularyMapper,
    ) -> TemplateResult<XmlElement> {
        let result = match self {
            MetadataFormat::Template {
                descriptor,
                template,
            } => TemplateProcessor::new(template, descriptor, graph, vocabulary).get_xml(record),
        };
        if graph.end_record() {
            debug!("graph cache pruned after record");
        }
        result
    }
}
