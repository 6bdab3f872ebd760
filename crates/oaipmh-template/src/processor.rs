/*
 * processor.rs
 * Copyright (c) 2025 Austrian Centre for Digital Humanities
 */

//! Template processing.
//!
//! The processor walks a copy of the template top-down. Each element is
//! replaced by zero or more nodes:
//!
//! 1. `if` false: the element is dropped.
//! 2. `if` true with `remove`: the element is replaced by its children.
//! 3. `foreach`: one copy per resolved node, processed with that node as
//!    the current node; with `remove`, each copy is replaced by its children.
//! 4. `val*`: one copy per value of the fanning descriptor, or none when all
//!    descriptors are optional and empty.
//!
//! Children of surviving elements are processed the same way.

use crate::condition::evaluate_condition;
use crate::context::{EvalContext, RecordContext};
use crate::error::{TemplateError, TemplateResult, ValueError};
use crate::format::FormatDescriptor;
use crate::path::PathExpr;
use crate::template::Template;
use crate::value::{
    Action, InsertMode, LangPolicy, LangValue, ValueDescriptor, strip_slot_attributes, value_slots,
};
use crate::vocabulary::VocabularyMapper;
use oaipmh_graph::GraphCache;
use oaipmh_xml::{XmlElement, XmlNode};
use std::time::Instant;
use tracing::{debug, info, trace, warn};

const IF: &str = "if";
const FOREACH: &str = "foreach";
const REMOVE: &str = "remove";

/// Renders records with one template and format.
pub struct TemplateProcessor<'a> {
    template: &'a Template,
    format: &'a FormatDescriptor,
    graph: &'a GraphCache,
    vocabulary: &'a VocabularyMapper,
    sequence: u64,
}

impl<'a> TemplateProcessor<'a> {
    pub fn new(
        template: &'a Template,
        format: &'a FormatDescriptor,
        graph: &'a GraphCache,
        vocabulary: &'a VocabularyMapper,
    ) -> Self {
        Self {
            template,
            format,
            graph,
            vocabulary,
            sequence: 0,
        }
    }

    /// Render the metadata of one record.
    ///
    /// Errors are wrapped in [`TemplateError::Render`] with the tag path of
    /// the element being processed when they happened.
    pub fn process(&mut self, record: &RecordContext) -> TemplateResult<XmlElement> {
        let started = Instant::now();
        let mut ctx = EvalContext::new(self.graph, self.vocabulary, self.format, record);
        ctx.sequence = self.sequence;

        let result = process_element(self.template.root().clone(), &mut ctx);
        self.sequence = ctx.sequence;
        let nodes = result.map_err(|e| TemplateError::Render {
            location: ctx.location(),
            source: Box::new(e),
        })?;

        let mut roots: Vec<XmlElement> = nodes
            .into_iter()
            .filter_map(|node| match node {
                XmlNode::Element(e) => Some(e),
                _ => None,
            })
            .collect();
        if roots.len() != 1 {
            return Err(TemplateError::RootCount { count: roots.len() });
        }
        let root = roots.remove(0);

        info!(
            subject = %record.subject,
            format = %self.format.metadata_prefix,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "rendered metadata"
        );
        Ok(root)
    }

    /// Render the metadata of one record, turning failures into an `<error>`
    /// document when the format asks for it.
    pub fn get_xml(&mut self, record: &RecordContext) -> TemplateResult<XmlElement> {
        match self.process(record) {
            Err(e) if self.format.xml_errors => {
                warn!(
                    subject = %record.subject,
                    format = %self.format.metadata_prefix,
                    error = %e,
                    "metadata generation failed"
                );
                Ok(error_document(&e))
            }
            result => result,
        }
    }
}

/// Describe a render failure as XML:
///
/// ```xml
/// <error>
///   <message>...</message>
///   <trace>...</trace>
///   <location>/cmd:CMD/cmd:Components</location>
/// </error>
/// ```
pub fn error_document(error: &TemplateError) -> XmlElement {
    let root = error.root();
    let mut chain = Vec::new();
    let mut source = std::error::Error::source(root);
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }

    let mut trace = XmlElement::new("trace");
    if !chain.is_empty() {
        trace.set_text(chain.join("\n"));
    }
    XmlElement::new("error")
        .with_child(XmlElement::new("message").with_text(root.to_string()))
        .with_child(trace)
        .with_child(XmlElement::new("location").with_text(error.location().unwrap_or("/")))
}

/// Process one element, returning what replaces it.
///
/// The location is only left on success, so after a failure the context
/// still points at the failing element.
fn process_element(element: XmlElement, ctx: &mut EvalContext) -> TemplateResult<Vec<XmlNode>> {
    ctx.enter(&element.name);
    let nodes = process_entered(element, ctx)?;
    ctx.leave();
    Ok(nodes)
}

fn process_entered(mut element: XmlElement, ctx: &mut EvalContext) -> TemplateResult<Vec<XmlNode>> {
    let condition = element.remove_attribute(IF);
    let remove = match element.remove_attribute(REMOVE).as_deref() {
        None => false,
        Some(REMOVE) => true,
        Some(other) => {
            return Err(TemplateError::InvalidAttribute {
                attribute: REMOVE.to_string(),
                value: other.to_string(),
            });
        }
    };

    if let Some(condition) = &condition
        && !evaluate_condition(condition, ctx)?
    {
        trace!(element = %element.name, condition = %condition, "condition false, dropping element");
        return Ok(Vec::new());
    }

    if let Some(path) = element.remove_attribute(FOREACH) {
        return expand_foreach(element, &path, remove, ctx);
    }

    if condition.is_some() && remove && value_slots(&element).is_empty() {
        return process_children(element.children, ctx);
    }

    insert_values(element, remove, ctx)
}

fn expand_foreach(
    element: XmlElement,
    path: &str,
    remove: bool,
    ctx: &mut EvalContext,
) -> TemplateResult<Vec<XmlNode>> {
    let path = PathExpr::parse(path, &ctx.format.prefixes)?;
    let nodes = path.resolve(ctx)?;
    debug!(element = %element.name, path = %path, iterations = nodes.len(), "foreach");

    let mut output = Vec::new();
    for node in nodes {
        ctx.push_node(node);
        let processed = insert_values(element.clone(), remove, ctx)?;
        ctx.pop_node();
        if remove {
            output.extend(processed.into_iter().flat_map(splice));
        } else {
            output.extend(processed);
        }
    }
    Ok(output)
}

/// Replace an element by its children.
fn splice(node: XmlNode) -> Vec<XmlNode> {
    match node {
        XmlNode::Element(e) => e.children,
        other => vec![other],
    }
}

fn process_children(children: Vec<XmlNode>, ctx: &mut EvalContext) -> TemplateResult<Vec<XmlNode>> {
    let mut output = Vec::with_capacity(children.len());
    for child in children {
        match child {
            XmlNode::Element(e) => output.extend(process_element(e, ctx)?),
            XmlNode::Comment(_) if !ctx.format.preserve_comments => {}
            other => output.push(other),
        }
    }
    Ok(output)
}

/// The value pass: resolve the element's value slots and emit one copy per
/// value of the fanning slot.
fn insert_values(
    mut element: XmlElement,
    remove: bool,
    ctx: &mut EvalContext,
) -> TemplateResult<Vec<XmlNode>> {
    let slots = value_slots(&element);
    if slots.is_empty() {
        strip_slot_attributes(&mut element);
        element.children = process_children(std::mem::take(&mut element.children), ctx)?;
        return Ok(vec![XmlNode::Element(element)]);
    }

    let mut descriptors = slots
        .iter()
        .map(|slot| ValueDescriptor::from_element(&mut element, slot, ctx.format))
        .collect::<Result<Vec<_>, _>>()?;
    let orphans = strip_slot_attributes(&mut element);
    if orphans > 0 {
        trace!(element = %element.name, orphans, "dropped slot attributes without a value");
    }
    for descriptor in &mut descriptors {
        descriptor.resolve(ctx)?;
    }

    let fanning: Vec<String> = descriptors
        .iter()
        .filter(|d| d.count() > 1)
        .map(|d| format!("val{}", d.slot))
        .collect();
    if fanning.len() > 1 {
        return Err(ValueError::AmbiguousFanOut {
            element: element.name.clone(),
            slots: fanning.join(", "),
        }
        .into());
    }

    if !descriptors.iter().all(ValueDescriptor::is_valid) {
        if remove {
            debug!(element = %element.name, "required value missing, removing element");
            return Ok(Vec::new());
        }
        debug!(element = %element.name, "required value missing, keeping template content");
        element.children = process_children(std::mem::take(&mut element.children), ctx)?;
        return Ok(vec![XmlNode::Element(element)]);
    }

    let copies = descriptors.iter().map(ValueDescriptor::count).max().unwrap_or(0);
    let children = std::mem::take(&mut element.children);
    let mut output = Vec::with_capacity(copies);
    for position in 0..copies {
        let mut copy = element.clone();
        copy.children = process_children(children.clone(), ctx)?;
        for descriptor in &descriptors {
            let index = if descriptor.count() > 1 { position } else { 0 };
            if let Some(value) = descriptor.values.get(index) {
                insert_value(&mut copy, descriptor, value, &ctx.format.lang_attribute);
            }
        }
        output.push(XmlNode::Element(copy));
    }
    trace!(element = %element.name, copies, "inserted values");
    Ok(output)
}

fn insert_value(
    element: &mut XmlElement,
    descriptor: &ValueDescriptor,
    value: &LangValue,
    lang_attribute: &str,
) {
    let overwrite = descriptor.action == Action::Overwrite;
    match &descriptor.mode {
        InsertMode::Text => insert_text(element, &value.value, overwrite),
        InsertMode::Xml => match oaipmh_xml::parse_fragment(&value.value) {
            Ok(nodes) if overwrite => element.children = nodes,
            Ok(nodes) => element.children.extend(nodes),
            Err(e) => {
                warn!(
                    element = %element.name,
                    error = %e,
                    "value is not well-formed XML, inserting it as text"
                );
                insert_text(element, &value.value, overwrite);
            }
        },
        InsertMode::Attribute(name) if overwrite => {
            element.set_attribute(name.as_str(), value.value.as_str())
        }
        InsertMode::Attribute(name) => element.append_attribute(name.as_str(), &value.value),
    }

    match (descriptor.lang, &value.lang) {
        (LangPolicy::Skip, _) => {}
        (LangPolicy::IfEmpty, Some(lang)) => {
            if !element.has_attribute(lang_attribute) {
                element.set_attribute(lang_attribute, lang.as_str());
            }
        }
        (LangPolicy::IfEmpty, None) => {}
        (LangPolicy::Overwrite, Some(lang)) => element.set_attribute(lang_attribute, lang.as_str()),
        (LangPolicy::Overwrite, None) => {
            element.remove_attribute(lang_attribute);
        }
    }
}

fn insert_text(element: &mut XmlElement, text: &str, overwrite: bool) {
    if overwrite {
        element.set_text(text);
    } else {
        element.append_text(text);
    }
}
