//! Backend state management
//!
//! All request handling completes synchronously before its future resolves;
//! the shared mutable state below is written from handler context only.

use dashmap::DashMap;
use parking_lot::RwLock;
use tower_lsp::Client;
use tower_lsp::lsp_types::Url;

use crate::config::EmmetSettings;
use crate::emmet::adapter::ExpansionAdapter;
use crate::emmet::catalog::SnippetCatalogCache;
use crate::lsp::document::Document;

/// The Emmet language server backend.
pub struct EmmetBackend {
    pub(super) client: Client,
    /// Open documents keyed by URI.
    pub(super) documents: DashMap<Url, Document>,
    /// Current `emmet.*` settings, refreshed by the host.
    pub(super) settings: RwLock<EmmetSettings>,
    /// Expansion boundary shared by completion, command handling and catalog
    /// construction.
    pub(super) adapter: ExpansionAdapter,
    /// Per-syntax snippet catalogs, populated on demand and kept for the
    /// backend's lifetime.
    pub(super) snippet_catalogs: SnippetCatalogCache,
}

impl std::fmt::Debug for EmmetBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmmetBackend")
            .field("documents", &self.documents.len())
            .field("settings", &*self.settings.read())
            .finish()
    }
}
