/*
 * formats.rs
 * Copyright (c) 2025 Austrian Centre for Digital Humanities
 *
 * Formats command implementation
 */

//! List the configured metadata formats, as `ListMetadataFormats` would.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::ServiceConfig;

/// Arguments for the formats command
#[derive(Debug)]
pub struct FormatsArgs {
    /// Service configuration file
    pub config: PathBuf,
    /// Print JSON instead of a table
    pub json: bool,
}

/// One advertised format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatSummary {
    pub metadata_prefix: String,
    pub schema: Option<String>,
    pub metadata_namespace: Option<String>,
    pub template: String,
}

/// Execute the formats command
pub fn execute(args: FormatsArgs) -> Result<()> {
    let config = ServiceConfig::load(&args.config)?;
    let summaries = summarize(&config);
    if args.json {
        let json = serde_json::to_string_pretty(&summaries).context("Failed to serialize formats")?;
        println!("{}", json);
    } else {
        for summary in &summaries {
            println!(
                "{}\t{}\t{}\t{}",
                summary.metadata_prefix,
                summary.metadata_namespace.as_deref().unwrap_or("-"),
                summary.schema.as_deref().unwrap_or("-"),
                summary.template
            );
        }
    }
    Ok(())
}

pub fn summarize(config: &ServiceConfig) -> Vec<FormatSummary> {
    config
        .formats
        .values()
        .map(|descriptor| FormatSummary {
            metadata_prefix: descriptor.metadata_prefix.clone(),
            schema: descriptor.schema.clone(),
            metadata_namespace: descriptor.metadata_namespace.clone(),
            template: config.base_dir.join(&descriptor.template).display().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    #[test]
    fn test_summaries() {
        let config = ServiceConfig::parse(
            concat!(
                "formats:\n",
                "  oai_dc:\n",
                "    template: dc.xml\n",
                "    schema: http://www.openarchives.org/OAI/2.0/oai_dc.xsd\n",
                "    metadata-namespace: http://www.openarchives.org/OAI/2.0/oai_dc/\n",
                "  cmdi:\n",
                "    template: cmdi.xml\n",
            ),
            Path::new("/srv/oai"),
        )
        .unwrap();

        let summaries = summarize(&config);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].metadata_prefix, "cmdi");
        assert_eq!(summaries[0].schema, None);
        assert_eq!(
            summaries[1].metadata_namespace.as_deref(),
            Some("http://www.openarchives.org/OAI/2.0/oai_dc/")
        );

        let json = serde_json::to_value(&summaries[1]).unwrap();
        assert_eq!(json["metadataPrefix"], "oai_dc");
        assert_eq!(
            json["template"],
            Path::new("/srv/oai").join("dc.xml").display().to_string()
        );
    }
}
