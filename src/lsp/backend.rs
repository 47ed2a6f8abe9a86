//! The Emmet language server backend
//!
//! Construction plus the synchronous core shared by the protocol handlers:
//! completion assembly at a cursor position and the expand-command edit
//! computation. The handlers themselves live in `handlers`.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tower_lsp::Client;
use tower_lsp::lsp_types::{CompletionItem, Position, Range, Url};

use crate::config::EmmetSettings;
use crate::emmet::adapter::ExpansionAdapter;
use crate::emmet::catalog::{BuiltinRegistry, SnippetCatalogCache, SnippetRegistry};
use crate::emmet::completions::{assemble_completions, explicit_candidate};
use crate::emmet::engine::{EmmetEngine, ExpansionEngine};
use crate::emmet::extract::{extract_abbreviation, word_prefix};

mod handlers;
mod state;

pub use state::EmmetBackend;

/// Command id for explicit, synchronous expansion of the current selection
/// or the abbreviation at the caret.
pub const EXPAND_COMMAND: &str = "emmet.expand";

impl EmmetBackend {
    /// Creates a backend with the built-in engine and snippet registry.
    pub fn new(client: Client) -> Self {
        Self::with_engine(client, Arc::new(EmmetEngine))
    }

    /// Creates a backend over a specific expansion engine. Tests inject
    /// doubles through this seam.
    pub fn with_engine(client: Client, engine: Arc<dyn ExpansionEngine>) -> Self {
        let adapter = ExpansionAdapter::new(engine);
        let registry: Arc<dyn SnippetRegistry> = Arc::new(BuiltinRegistry::new());
        Self {
            client,
            documents: DashMap::new(),
            settings: RwLock::new(EmmetSettings::default()),
            snippet_catalogs: SnippetCatalogCache::new(registry, adapter.clone()),
            adapter,
        }
    }

    /// Completion candidates at `position`, or `None` when no abbreviation
    /// precedes the cursor or the abbreviation does not expand.
    pub(crate) fn completions_at(
        &self,
        uri: &Url,
        position: Position,
    ) -> Option<Vec<CompletionItem>> {
        let document = self.documents.get(uri)?;
        let line_to_cursor = document.line_to_cursor(position)?;
        let matched = extract_abbreviation(&line_to_cursor)?;

        let template = self.adapter.expand(&matched.text, &document.language_id);
        if template.is_empty() {
            return None;
        }

        let replace = Range::new(Position::new(position.line, matched.start as u32), position);
        let explicit = explicit_candidate(&matched.text, &template, replace);
        let prefix = word_prefix(&line_to_cursor);
        Some(assemble_completions(
            &self.snippet_catalogs,
            &document.language_id,
            &prefix,
            explicit,
        ))
    }

    /// Replacement edit for the expand command. `None` covers every no-op
    /// path: unknown document, multi-line selection, no abbreviation at the
    /// caret, failed expansion.
    pub(crate) fn expand_edit(&self, uri: &Url, selection: Range) -> Option<(Range, String)> {
        let document = self.documents.get(uri)?;
        if selection.start.line != selection.end.line {
            // Multi-line selections are silently left alone.
            return None;
        }

        let (range, abbreviation) = if selection.start == selection.end {
            let line_to_cursor = document.line_to_cursor(selection.start)?;
            let matched = extract_abbreviation(&line_to_cursor)?;
            let start = Position::new(selection.start.line, matched.start as u32);
            (Range::new(start, selection.start), matched.text)
        } else {
            (selection, document.single_line_text(selection)?)
        };

        let template = self.adapter.expand(&abbreviation, &document.language_id);
        if template.is_empty() {
            return None;
        }
        Some((range, template))
    }
}
