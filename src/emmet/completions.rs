//! Completion list assembly
//!
//! Merges the two candidate sources into one ordered list: prefix-filtered
//! snippet-catalog entries first (in catalog order), then the explicit
//! expand-what-you-typed candidate.

use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, CompletionTextEdit, Documentation, InsertTextFormat, Range,
    TextEdit,
};

use crate::emmet::catalog::{SnippetCatalogCache, strip_fields};

/// Build the candidate for expanding the abbreviation ending at the cursor.
///
/// The template is inserted as an interactive snippet replacing exactly the
/// matched range; the documentation shows the expansion with tab-stop markers
/// stripped.
pub fn explicit_candidate(abbreviation: &str, template: &str, replace: Range) -> CompletionItem {
    CompletionItem {
        label: abbreviation.to_string(),
        kind: Some(CompletionItemKind::SNIPPET),
        documentation: Some(Documentation::String(strip_fields(template))),
        insert_text_format: Some(InsertTextFormat::SNIPPET),
        text_edit: Some(CompletionTextEdit::Edit(TextEdit {
            range: replace,
            new_text: template.to_string(),
        })),
        ..Default::default()
    }
}

/// Combine catalog candidates matching `current_prefix` with the explicit
/// candidate.
///
/// An empty prefix yields only the explicit candidate, so a bare word
/// boundary does not surface the entire catalog on every keystroke. The
/// filter is an exact, case-sensitive prefix comparison on the snippet key.
pub fn assemble_completions(
    catalogs: &SnippetCatalogCache,
    syntax: &str,
    current_prefix: &str,
    explicit: CompletionItem,
) -> Vec<CompletionItem> {
    if current_prefix.is_empty() {
        return vec![explicit];
    }

    let catalog = catalogs.get(syntax);
    let mut items: Vec<CompletionItem> = catalog
        .iter()
        .filter(|entry| entry.key.starts_with(current_prefix))
        .map(|entry| CompletionItem {
            label: entry.key.clone(),
            kind: Some(CompletionItemKind::SNIPPET),
            detail: Some(entry.expanded_value.clone()),
            documentation: Some(Documentation::String(entry.documentation.clone())),
            insert_text: Some(entry.key.clone()),
            ..Default::default()
        })
        .collect();
    items.push(explicit);
    items
}
