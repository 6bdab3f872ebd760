/*
 * check.rs
 * Copyright (c) 2025 Austrian Centre for Digital Humanities
 *
 * Check command implementation
 */

//! Compile the templates of the configured formats without rendering.

use std::path::PathBuf;

use anyhow::Result;
use tracing::{error, info};

use crate::config::ServiceConfig;

/// Arguments for the check command
#[derive(Debug)]
pub struct CheckArgs {
    /// Service configuration file
    pub config: PathBuf,
    /// Only check this format
    pub format: Option<String>,
}

/// Execute the check command
pub fn execute(args: CheckArgs) -> Result<()> {
    let config = ServiceConfig::load(&args.config)?;
    let prefixes: Vec<String> = match &args.format {
        Some(prefix) => {
            config.descriptor(prefix)?;
            vec![prefix.clone()]
        }
        None => config.formats.keys().cloned().collect(),
    };

    let mut failed = 0;
    for prefix in &prefixes {
        match config.load_format(prefix) {
            Ok(_) => info!(format = %prefix, "template ok"),
            Err(e) => {
                error!(format = %prefix, "{:#}", e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} format(s) failed to compile", failed, prefixes.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &std::path::Path) -> PathBuf {
        std::fs::write(dir.join("good.xml"), "<record><title val=\"/dc:title\"/></record>").unwrap();
        std::fs::write(dir.join("broken.xml"), "<record><title></record>").unwrap();
        let path = dir.join("config.yaml");
        std::fs::write(
            &path,
            concat!(
                "formats:\n",
                "  good:\n    template: good.xml\n",
                "  broken:\n    template: broken.xml\n",
                "  missing:\n    template: missing.xml\n",
            ),
        )
        .unwrap();
        path
    }

    #[test]
    fn test_check_single_format() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path());
        let args = CheckArgs {
            config,
            format: Some("good".to_string()),
        };
        assert!(execute(args).is_ok());
    }

    #[test]
    fn test_check_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path());
        let err = execute(CheckArgs {
            config,
            format: None,
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "2 of 3 format(s) failed to compile");
    }

    #[test]
    fn test_check_unknown_format() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path());
        assert!(
            execute(CheckArgs {
                config,
                format: Some("marc".to_string()),
            })
            .is_err()
        );
    }
}
