/*
 * component.rs
 * Copyright (c) 2025 Austrian Centre for Digital Humanities
 */

//! Component resolution.
//!
//! An element carrying `ComponentId="name"` is a placeholder for a separately
//! maintained sub-template. Resolvers find the component's source text.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Trait for loading component templates.
pub trait ComponentResolver {
    /// Load a component by name.
    ///
    /// # Arguments
    /// * `name` - The component identifier (e.g., `clarin.eu:cr1:c_1271859438125`)
    /// * `base_path` - The path of the template that references the component
    ///
    /// # Returns
    /// The component source text, or `None` if not found.
    fn get_component(&self, name: &str, base_path: &Path) -> Option<String>;
}

/// Resolver that loads components from `<dir>/<name>.xml`.
///
/// Without an explicit directory, components are looked up next to the
/// referencing template.
#[derive(Debug, Clone, Default)]
pub struct FileSystemResolver {
    dir: Option<PathBuf>,
}

impl FileSystemResolver {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }
}

impl ComponentResolver for FileSystemResolver {
    fn get_component(&self, name: &str, base_path: &Path) -> Option<String> {
        let path = component_path(name, base_path, self.dir.as_deref());
        std::fs::read_to_string(path).ok()
    }
}

/// Resolver for formats without components. Any `ComponentId` placeholder
/// then fails to compile with [`TemplateError::ComponentNotFound`].
///
/// [`TemplateError::ComponentNotFound`]: crate::TemplateError::ComponentNotFound
#[derive(Debug, Clone, Default)]
pub struct NullResolver;

impl ComponentResolver for NullResolver {
    fn get_component(&self, _name: &str, _base_path: &Path) -> Option<String> {
        None
    }
}

/// Component sources held in memory, keyed by `ComponentId`. The lookup
/// ignores the referencing template's path.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    components: BTreeMap<String, String>,
}

impl MemoryResolver {
    /// Register the source of component `id`, returning the source it replaces.
    pub fn insert(&mut self, id: impl Into<String>, source: impl Into<String>) -> Option<String> {
        self.components.insert(id.into(), source.into())
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemoryResolver {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut resolver = Self::default();
        for (id, source) in iter {
            resolver.insert(id, source);
        }
        resolver
    }
}

impl ComponentResolver for MemoryResolver {
    fn get_component(&self, name: &str, _base_path: &Path) -> Option<String> {
        self.components.get(name).cloned()
    }
}

/// File a component is read from.
///
/// Characters that cannot appear in portable file names (`:`, `/`, `\`) are
/// replaced with `_`, so `clarin.eu:cr1:c_123` maps to `clarin.eu_cr1_c_123.xml`.
pub fn component_path(name: &str, base_path: &Path, dir: Option<&Path>) -> PathBuf {
    let dir = dir.unwrap_or_else(|| base_path.parent().unwrap_or(Path::new(".")));
    let file: String = name
        .chars()
        .map(|c| if matches!(c, ':' | '/' | '\\') { '_' } else { c })
        .collect();
    dir.join(format!("{}.xml", file))
}
