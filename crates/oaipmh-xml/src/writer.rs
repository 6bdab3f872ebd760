//! Serialization of `XmlElement` trees.

use crate::{Error, Result, XmlElement, XmlNode};
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};

/// Options controlling serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Indentation width in spaces; `None` writes everything on one line.
    pub indent: Option<usize>,

    /// Emit an `<?xml version="1.0" encoding="UTF-8"?>` declaration.
    pub declaration: bool,
}

impl WriteOptions {
    /// Single-line output without a declaration.
    pub fn compact() -> Self {
        Self {
            indent: None,
            declaration: false,
        }
    }

    /// Indented output with a declaration.
    pub fn pretty() -> Self {
        Self {
            indent: Some(2),
            declaration: true,
        }
    }
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self::pretty()
    }
}

/// Serialize an element tree to a string.
///
/// ```rust
/// use oaipmh_xml::{XmlElement, to_xml_string, WriteOptions};
///
/// let root = XmlElement::new("title")
///     .with_attribute("xml:lang", "en")
///     .with_text("Fish & Chips");
/// let xml = to_xml_string(&root, &WriteOptions::compact()).unwrap();
/// assert_eq!(xml, r#"<title xml:lang="en">Fish &amp; Chips</title>"#);
/// ```
pub fn to_xml_string(root: &XmlElement, options: &WriteOptions) -> Result<String> {
    let mut writer = match options.indent {
        Some(width) => Writer::new_with_indent(Vec::new(), b' ', width),
        None => Writer::new(Vec::new()),
    };

    if options.declaration {
        write(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    }
    write_element(&mut writer, root)?;

    String::from_utf8(writer.into_inner()).map_err(|e| Error::Write {
        message: e.to_string(),
    })
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for attr in &element.attributes {
        start.push_attribute((attr.name.as_str(), attr.value.as_str()));
    }

    if element.children.is_empty() {
        return write(writer, Event::Empty(start));
    }

    write(writer, Event::Start(start))?;
    for child in &element.children {
        match child {
            XmlNode::Element(e) => write_element(writer, e)?,
            XmlNode::Text(text) => write(writer, Event::Text(BytesText::new(text)))?,
            XmlNode::CData(text) => write(writer, Event::CData(BytesCData::new(text.as_str())))?,
            XmlNode::Comment(text) => {
                write(writer, Event::Comment(BytesText::from_escaped(text.as_str())))?
            }
        }
    }
    write(writer, Event::End(BytesEnd::new(element.name.as_str())))
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer.write_event(event).map_err(|e| Error::Write {
        message: e.to_string(),
    })
}
