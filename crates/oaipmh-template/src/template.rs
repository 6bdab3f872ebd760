/*
 * template.rs
 * Copyright (c) 2025 Austrian Centre for Digital Humanities
 */

//! Compiled templates.

use crate::component::{ComponentResolver, FileSystemResolver, NullResolver};
use crate::error::{TemplateError, TemplateResult};
use oaipmh_xml::XmlElement;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Attribute marking a component placeholder.
pub const COMPONENT_ATTRIBUTE: &str = "ComponentId";

/// Maximum component nesting depth.
pub const MAX_COMPONENT_DEPTH: usize = 50;

/// A parsed template with all components spliced in.
///
/// Templates are immutable; every render works on a deep copy of
/// [`root`](Self::root).
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    root: XmlElement,
    path: Option<PathBuf>,
}

impl Template {
    /// Compile a template that uses no components.
    pub fn compile(source: &str) -> TemplateResult<Self> {
        Self::compile_with_resolver(source, Path::new("<template>"), &NullResolver, 0)
    }

    /// Compile a template file, loading components from `component_dir` or,
    /// without one, from the template's directory.
    pub fn from_file(path: &Path, component_dir: Option<&Path>) -> TemplateResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| TemplateError::TemplateFile {
            path: path.to_path_buf(),
            source,
        })?;
        let resolver = FileSystemResolver::new(component_dir.map(Path::to_path_buf));
        let mut template = Self::compile_with_resolver(&source, path, &resolver, 0)?;
        template.path = Some(path.to_path_buf());
        Ok(template)
    }

    /// Compile a template with a custom component resolver.
    ///
    /// # Arguments
    /// * `source` - The template source text
    /// * `template_path` - Path used for resolving relative component references
    /// * `resolver` - The component resolver to use
    /// * `depth` - Current nesting depth (for recursion protection)
    pub fn compile_with_resolver(
        source: &str,
        template_path: &Path,
        resolver: &dyn ComponentResolver,
        depth: usize,
    ) -> TemplateResult<Self> {
        let mut root = oaipmh_xml::parse(source)?;
        resolve_components(&mut root, template_path, resolver, depth, MAX_COMPONENT_DEPTH)?;
        Ok(Self { root, path: None })
    }

    /// The template tree.
    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// The file the template was loaded from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Replace every `ComponentId` placeholder below (and including) `element`
/// with the root of the named component.
///
/// Attributes of the placeholder are carried over to the component root
/// unless the component sets them itself.
fn resolve_components(
    element: &mut XmlElement,
    template_path: &Path,
    resolver: &dyn ComponentResolver,
    depth: usize,
    max_depth: usize,
) -> TemplateResult<()> {
    if let Some(name) = element.remove_attribute(COMPONENT_ATTRIBUTE) {
        if depth >= max_depth {
            return Err(TemplateError::RecursiveComponent { name, max_depth });
        }
        let source = resolver
            .get_component(&name, template_path)
            .ok_or_else(|| TemplateError::ComponentNotFound { name: name.clone() })?;
        let component = Template::compile_with_resolver(&source, template_path, resolver, depth + 1)?;

        let mut root = component.root;
        for attr in std::mem::take(&mut element.attributes) {
            if !root.has_attribute(&attr.name) {
                root.attributes.push(attr);
            }
        }
        debug!(component = %name, depth, "resolved component");
        *element = root;
        return Ok(());
    }

    for child in element.elements_mut() {
        resolve_components(child, template_path, resolver, depth, max_depth)?;
    }
    Ok(())
}
