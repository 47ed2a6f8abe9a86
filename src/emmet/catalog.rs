//! Per-syntax snippet catalogs
//!
//! Named snippet definitions are registered per syntax, pre-expanded through
//! the adapter, and cached for the process lifetime. Building a catalog costs
//! one expansion per definition, so it must happen at most once per syntax;
//! every later lookup returns the cached sequence.

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::emmet::adapter::ExpansionAdapter;

/// Raw named snippet definition as registered for a syntax. The value is
/// itself an abbreviation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SnippetDefinition {
    pub key: String,
    pub value: String,
}

/// Source of raw snippet definitions. The definitions are configuration, not
/// logic; the shipped implementation reads files embedded at compile time.
pub trait SnippetRegistry: Send + Sync {
    /// Ordered definitions registered for `syntax`; empty when none are.
    fn definitions_for(&self, syntax: &str) -> &[SnippetDefinition];
}

/// Registry over the per-syntax definition files embedded in the binary.
#[derive(Debug)]
pub struct BuiltinRegistry {
    by_syntax: FxHashMap<String, Vec<SnippetDefinition>>,
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        let mut by_syntax = FxHashMap::default();
        for (syntax, source) in [("html", include_str!("../../snippets/html.json"))] {
            match serde_json::from_str::<Vec<SnippetDefinition>>(source) {
                Ok(definitions) => {
                    by_syntax.insert(syntax.to_string(), definitions);
                }
                Err(err) => warn!("Skipping built-in snippets for {}: {}", syntax, err),
            }
        }
        Self { by_syntax }
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SnippetRegistry for BuiltinRegistry {
    fn definitions_for(&self, syntax: &str) -> &[SnippetDefinition] {
        self.by_syntax
            .get(syntax)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// One pre-expanded catalog entry. Immutable after catalog construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetEntry {
    pub key: String,
    pub raw_value: String,
    /// The raw value passed through the expansion adapter.
    pub expanded_value: String,
    /// `expanded_value` with the tab-stop markers stripped for display.
    pub documentation: String,
}

/// Ordered snippet entries for one syntax, in registry order. Duplicate keys
/// pass through unchanged.
pub type SnippetCatalog = Vec<SnippetEntry>;

static BARE_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{\d+\}").expect("failed to compile field regex"));
static PLACEHOLDER_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{\d+:([^}]+)\}").expect("failed to compile field regex"));

/// Strip tab-stop markers for display: `${n}` is removed entirely,
/// `${n:text}` keeps only `text`.
pub fn strip_fields(template: &str) -> String {
    let without_bare = BARE_FIELD.replace_all(template, "");
    PLACEHOLDER_FIELD
        .replace_all(&without_bare, "$1")
        .into_owned()
}

/// Process-wide cache of snippet catalogs, keyed by syntax.
///
/// Owned by the backend and passed by reference to whoever needs catalog
/// access; populated on demand, torn down with the backend.
pub struct SnippetCatalogCache {
    registry: Arc<dyn SnippetRegistry>,
    adapter: ExpansionAdapter,
    catalogs: DashMap<String, Arc<SnippetCatalog>>,
}

impl SnippetCatalogCache {
    pub fn new(registry: Arc<dyn SnippetRegistry>, adapter: ExpansionAdapter) -> Self {
        Self {
            registry,
            adapter,
            catalogs: DashMap::new(),
        }
    }

    /// Catalog for `syntax`, building it on first access.
    ///
    /// Construction cost is proportional to the number of definitions and is
    /// paid at most once per syntax per process lifetime; later calls return
    /// the cached sequence without re-invoking the adapter. A syntax with no
    /// registered definitions caches an empty catalog.
    pub fn get(&self, syntax: &str) -> Arc<SnippetCatalog> {
        if let Some(catalog) = self.catalogs.get(syntax) {
            return Arc::clone(&catalog);
        }
        self.catalogs
            .entry(syntax.to_string())
            .or_insert_with(|| Arc::new(self.build(syntax)))
            .clone()
    }

    fn build(&self, syntax: &str) -> SnippetCatalog {
        let definitions = self.registry.definitions_for(syntax);
        debug!(
            "Building snippet catalog for {} ({} definitions)",
            syntax,
            definitions.len()
        );
        definitions
            .iter()
            .map(|definition| {
                let expanded_value = self.adapter.expand(&definition.value, syntax);
                SnippetEntry {
                    key: definition.key.clone(),
                    raw_value: definition.value.clone(),
                    documentation: strip_fields(&expanded_value),
                    expanded_value,
                }
            })
            .collect()
    }
}
