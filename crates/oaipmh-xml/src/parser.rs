//! XML parser that builds owned `XmlElement` trees.

use crate::{Error, Result, XmlAttribute, XmlElement, XmlNode};
use quick_xml::Reader;
use quick_xml::events::{BytesCData, BytesStart, BytesText, Event};

/// Parse an XML document, returning its root element.
///
/// # Example
///
/// ```rust
/// use oaipmh_xml::parse;
///
/// let root = parse("<root><child/></root>").unwrap();
/// assert_eq!(root.name, "root");
/// ```
///
/// # Errors
///
/// Returns an error if the XML is malformed, empty or has more than one root.
pub fn parse(content: &str) -> Result<XmlElement> {
    let mut parser = XmlParser::new(content);
    let nodes = parser.parse()?;

    let mut root: Option<XmlElement> = None;
    for node in nodes {
        match node {
            XmlNode::Element(element) => {
                if root.is_some() {
                    return Err(Error::MultipleRoots);
                }
                root = Some(element);
            }
            XmlNode::Text(_) | XmlNode::CData(_) => {
                return Err(Error::InvalidStructure {
                    message: "Text content outside of the root element".to_string(),
                });
            }
            XmlNode::Comment(_) => {}
        }
    }

    root.ok_or(Error::EmptyDocument)
}

/// Parse an XML fragment: any sequence of elements, text and comments.
///
/// Used when a value has to be spliced into a tree as markup rather than as
/// text. An empty string is a valid, empty fragment.
///
/// ```rust
/// use oaipmh_xml::{parse_fragment, XmlNode};
///
/// let nodes = parse_fragment("Some <b>bold</b> text").unwrap();
/// assert_eq!(nodes.len(), 3);
/// assert!(matches!(&nodes[1], XmlNode::Element(e) if e.name == "b"));
/// ```
pub fn parse_fragment(content: &str) -> Result<Vec<XmlNode>> {
    let mut parser = XmlParser::new(content);
    parser.keep_top_level_whitespace = true;
    parser.parse()
}

/// Internal parser state.
struct XmlParser<'a> {
    /// The quick-xml reader.
    reader: Reader<&'a [u8]>,

    /// Stack of elements being built.
    stack: Vec<XmlElement>,

    /// Nodes outside of any element.
    top_level: Vec<XmlNode>,

    /// Keep whitespace-only text at the top level (fragments only).
    keep_top_level_whitespace: bool,
}

impl<'a> XmlParser<'a> {
    fn new(source: &'a str) -> Self {
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;

        Self {
            reader,
            stack: Vec::new(),
            top_level: Vec::new(),
            keep_top_level_whitespace: false,
        }
    }

    fn parse(&mut self) -> Result<Vec<XmlNode>> {
        loop {
            match self.reader.read_event() {
                Ok(Event::Start(e)) => {
                    let element = self.start_element(&e)?;
                    self.stack.push(element);
                }
                Ok(Event::End(e)) => {
                    let end_name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    let element = self.stack.pop().ok_or_else(|| Error::InvalidStructure {
                        message: format!("Unexpected closing tag </{}>", end_name),
                    })?;

                    // Verify tag names match
                    if element.name != end_name {
                        return Err(Error::MismatchedEndTag {
                            expected: element.name,
                            found: end_name,
                        });
                    }
                    self.push_node(XmlNode::Element(element));
                }
                Ok(Event::Empty(e)) => {
                    let element = self.start_element(&e)?;
                    self.push_node(XmlNode::Element(element));
                }
                Ok(Event::Text(e)) => {
                    self.handle_text(&e)?;
                }
                Ok(Event::CData(e)) => {
                    self.handle_cdata(&e);
                }
                Ok(Event::Comment(e)) => {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    self.push_node(XmlNode::Comment(text));
                }
                Ok(Event::PI(_) | Event::Decl(_) | Event::DocType(_)) => {
                    // Processing instructions, declarations and DOCTYPEs are not kept
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlSyntax {
                        message: e.to_string(),
                        position: Some(self.reader.error_position()),
                    });
                }
            }
        }

        // Check for unclosed elements
        if let Some(node) = self.stack.last() {
            return Err(Error::UnexpectedEof {
                expected: format!("closing tag </{}>", node.name),
            });
        }

        Ok(std::mem::take(&mut self.top_level))
    }

    fn push_node(&mut self, node: XmlNode) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.top_level.push(node),
        }
    }

    fn start_element(&self, e: &BytesStart<'_>) -> Result<XmlElement> {
        let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
        let mut element = XmlElement::new(name);

        for attr_result in e.attributes() {
            let attr = attr_result?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr.unescape_value().map_err(|err| Error::XmlSyntax {
                message: format!("Invalid attribute value: {}", err),
                position: Some(self.reader.buffer_position()),
            })?;

            if element.has_attribute(&key) {
                return Err(Error::InvalidStructure {
                    message: format!("Duplicate attribute '{}' on <{}>", key, element.name),
                });
            }
            element.attributes.push(XmlAttribute {
                name: key,
                value: value.into_owned(),
            });
        }

        Ok(element)
    }

    fn handle_text(&mut self, e: &BytesText<'_>) -> Result<()> {
        let text = e.unescape().map_err(|err| Error::XmlSyntax {
            message: format!("Invalid text content: {}", err),
            position: Some(self.reader.buffer_position()),
        })?;

        // Whitespace-only text is formatting, except at the top of a fragment
        if text.trim().is_empty() && !(self.stack.is_empty() && self.keep_top_level_whitespace) {
            return Ok(());
        }
        if self.stack.is_empty() && !self.keep_top_level_whitespace {
            return Err(Error::InvalidStructure {
                message: "Text content outside of the root element".to_string(),
            });
        }

        self.push_node(XmlNode::Text(text.into_owned()));
        Ok(())
    }

    fn handle_cdata(&mut self, e: &BytesCData<'_>) {
        let text = String::from_utf8_lossy(e.as_ref()).to_string();
        self.push_node(XmlNode::CData(text));
    }
}
