/*
 * render.rs
 * Copyright (c) 2025 Austrian Centre for Digital Humanities
 *
 * Render command implementation
 */

//! Render the metadata of one record from an RDF data file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use oaipmh_graph::{GraphCache, MemorySource};
use oaipmh_template::RecordContext;
use oaipmh_xml::{WriteOptions, to_xml_string};
use tracing::info;

use crate::config::ServiceConfig;

/// Arguments for the render command
#[derive(Debug)]
pub struct RenderArgs {
    /// Service configuration file
    pub config: PathBuf,
    /// Metadata prefix of the format to render
    pub format: String,
    /// RDF file describing the repository resources
    pub data: PathBuf,
    /// URI of the resource to render
    pub subject: String,
    /// OAI-PMH identifier; defaults to the subject
    pub oai_id: Option<String>,
    /// Output file (stdout when absent)
    pub output: Option<PathBuf>,
    /// Write everything on one line
    pub compact: bool,
}

/// Execute the render command
pub fn execute(args: RenderArgs) -> Result<()> {
    let xml = render_to_string(&args)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, xml)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(output = %path.display(), "metadata written");
        }
        None => println!("{}", xml),
    }
    Ok(())
}

/// Render the requested record and serialize it.
pub fn render_to_string(args: &RenderArgs) -> Result<String> {
    let config = ServiceConfig::load(&args.config)?;
    let format = config.load_format(&args.format)?;

    let data = oaipmh_graph::rdf::load_file(&args.data)
        .with_context(|| format!("Failed to load RDF data {}", args.data.display()))?;
    let graph = GraphCache::new(Arc::new(MemorySource::new(data)), config.cache.policy());
    let vocabulary = config.vocabulary.mapper()?;

    let mut record = RecordContext::new(args.subject.as_str())
        .with_base_url(config.base_url.as_str())
        .with_metadata_prefix(format.descriptor().metadata_prefix.as_str());
    if let Some(oai_id) = &args.oai_id {
        record = record.with_oai_id(oai_id.as_str());
    }

    let xml = format
        .render(&record, &graph, &vocabulary)
        .with_context(|| format!("Failed to render {}", args.subject))?;
    let options = if args.compact {
        WriteOptions::compact()
    } else {
        WriteOptions::pretty()
    };
    to_xml_string(&xml, &options).context("Failed to serialize metadata")
}
