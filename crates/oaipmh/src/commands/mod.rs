//! Command implementations for the oaipmh CLI
//!
//! Each command module handles the CLI interface and delegates to
//! oaipmh-template for the actual work.

pub mod check;
pub mod formats;
pub mod render;
