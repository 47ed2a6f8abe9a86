//! Abbreviation-driven completion core
//!
//! This module provides:
//! - Extraction of the abbreviation ending at the cursor
//! - Expansion of abbreviations into tab-stop templates via a narrow engine seam
//! - Per-syntax snippet catalogs, built once and cached for the process lifetime
//! - Assembly of the final completion list from both candidate sources

pub mod adapter;
pub mod catalog;
pub mod completions;
pub mod engine;
pub mod extract;

pub use adapter::{ExpansionAdapter, snippet_field};
pub use catalog::{
    BuiltinRegistry, SnippetCatalog, SnippetCatalogCache, SnippetDefinition, SnippetEntry,
    SnippetRegistry, strip_fields,
};
pub use completions::{assemble_completions, explicit_candidate};
pub use engine::{EmmetEngine, ExpandError, ExpandOptions, ExpansionEngine, FieldFormatter};
pub use extract::{AbbreviationMatch, extract_abbreviation, word_prefix};
