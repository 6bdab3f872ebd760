//! Mutable XML trees for OAI-PMH metadata templates.
//!
//! This crate wraps [`quick-xml`] to provide an owned tree of [`XmlElement`]s
//! that can be freely cloned, rewritten and serialized again. It is the
//! document model the template engine rewrites: elements keep their qualified
//! names (`cmd:Title`), attributes keep their document order, and comments are
//! retained so callers can decide whether to keep them in the output.
//!
//! # Overview
//!
//! The main types are:
//! - [`XmlElement`]: An element with a qualified name, ordered attributes and children
//! - [`XmlAttribute`]: A name/value pair (value already unescaped)
//! - [`XmlNode`]: A child node (element, text, CDATA or comment)
//!
//! # Example
//!
//! ```rust
//! use oaipmh_xml::{parse, to_xml_string, WriteOptions};
//!
//! let mut root = parse(r#"<cmd:CMD xmlns:cmd="http://www.clarin.eu/cmd/">
//!   <cmd:Title lang="en">A title</cmd:Title>
//! </cmd:CMD>"#).unwrap();
//!
//! assert_eq!(root.name, "cmd:CMD");
//! assert_eq!(root.local_name(), "CMD");
//!
//! let title = root.get_children("cmd:Title")[0];
//! assert_eq!(title.get_attribute("lang"), Some("en"));
//! assert_eq!(title.text(), "A title");
//!
//! root.remove_attribute("xmlns:cmd");
//! let xml = to_xml_string(&root, &WriteOptions::compact()).unwrap();
//! assert_eq!(xml, r#"<cmd:CMD><cmd:Title lang="en">A title</cmd:Title></cmd:CMD>"#);
//! ```
//!
//! # Whitespace
//!
//! Whitespace-only text between elements is formatting, not content, and is
//! dropped while parsing. Serializing with [`WriteOptions::pretty`] puts the
//! indentation back.

pub mod error;
pub mod parser;
pub mod types;
pub mod writer;

// Re-export main types
pub use error::{Error, Result};
pub use parser::{parse, parse_fragment};
pub use types::{XmlAttribute, XmlElement, XmlNode};
pub use writer::{WriteOptions, to_xml_string};
