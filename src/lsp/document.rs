//! Open-document state for the LSP server
//!
//! Documents are tracked from `didOpen` to `didClose` with their text in a
//! rope, so incremental changes splice without copying the whole buffer.
//! Positions are treated as char columns.

use ropey::Rope;
use tower_lsp::lsp_types::{Position, Range, TextDocumentContentChangeEvent};

/// An open text document. The language id doubles as the syntax key for
/// expansion and catalog lookup.
#[derive(Debug)]
pub struct Document {
    pub language_id: String,
    pub text: Rope,
    pub version: i32,
}

/// Converts an LSP position to a char offset in the rope, clamped to the
/// document bounds.
fn position_to_char(text: &Rope, position: Position) -> usize {
    let line = (position.line as usize).min(text.len_lines().saturating_sub(1));
    let column = (position.character as usize).min(text.line(line).len_chars());
    text.line_to_char(line) + column
}

impl Document {
    pub fn new(language_id: String, text: &str, version: i32) -> Self {
        Self {
            language_id,
            text: Rope::from_str(text),
            version,
        }
    }

    /// Applies content changes in order; a change without a range replaces
    /// the whole document.
    pub fn apply(&mut self, changes: Vec<TextDocumentContentChangeEvent>, version: i32) {
        for change in changes {
            match change.range {
                Some(range) => {
                    let start = position_to_char(&self.text, range.start);
                    let end = position_to_char(&self.text, range.end).max(start);
                    self.text.remove(start..end);
                    self.text.insert(start, &change.text);
                }
                None => self.text = Rope::from_str(&change.text),
            }
        }
        self.version = version;
    }

    /// Text of the line at `position`, truncated at the cursor column and
    /// stripped of the line terminator. `None` when the line does not exist.
    pub fn line_to_cursor(&self, position: Position) -> Option<String> {
        let line_idx = position.line as usize;
        if line_idx >= self.text.len_lines() {
            return None;
        }
        let line: String = self.text.line(line_idx).chars().collect();
        let line = line.trim_end_matches(['\n', '\r']);
        let cursor = (position.character as usize).min(line.chars().count());
        Some(line.chars().take(cursor).collect())
    }

    /// Verbatim text inside `range`, which must not span lines.
    pub fn single_line_text(&self, range: Range) -> Option<String> {
        if range.start.line != range.end.line {
            return None;
        }
        let line_idx = range.start.line as usize;
        if line_idx >= self.text.len_lines() {
            return None;
        }
        let line: String = self.text.line(line_idx).chars().collect();
        let line = line.trim_end_matches(['\n', '\r']);
        let start = (range.start.character as usize).min(line.chars().count());
        let end = (range.end.character as usize).min(line.chars().count());
        if start > end {
            return None;
        }
        Some(line.chars().skip(start).take(end - start).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(range: Option<Range>, text: &str) -> TextDocumentContentChangeEvent {
        TextDocumentContentChangeEvent {
            range,
            range_length: None,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_apply_full_change() {
        let mut doc = Document::new("html".into(), "initial", 0);
        doc.apply(vec![change(None, "replaced")], 1);
        assert_eq!(doc.text.to_string(), "replaced");
        assert_eq!(doc.version, 1);
    }

    #[test]
    fn test_apply_incremental_change() {
        let mut doc = Document::new("html".into(), "hello world", 0);
        let range = Range::new(Position::new(0, 6), Position::new(0, 11));
        doc.apply(vec![change(Some(range), "there")], 1);
        assert_eq!(doc.text.to_string(), "hello there");
    }

    #[test]
    fn test_apply_multiline_change() {
        let mut doc = Document::new("html".into(), "one\ntwo\nthree", 0);
        let range = Range::new(Position::new(0, 3), Position::new(2, 0));
        doc.apply(vec![change(Some(range), " ")], 1);
        assert_eq!(doc.text.to_string(), "one three");
    }

    #[test]
    fn test_line_to_cursor() {
        let doc = Document::new("html".into(), "first\ndiv.cls rest", 0);
        assert_eq!(
            doc.line_to_cursor(Position::new(1, 7)).as_deref(),
            Some("div.cls")
        );
        // Column beyond the line end clamps to the full line
        assert_eq!(
            doc.line_to_cursor(Position::new(0, 99)).as_deref(),
            Some("first")
        );
        assert_eq!(doc.line_to_cursor(Position::new(9, 0)), None);
    }

    #[test]
    fn test_single_line_text() {
        let doc = Document::new("html".into(), "ul>li*3\nsecond", 0);
        let selection = Range::new(Position::new(0, 0), Position::new(0, 7));
        assert_eq!(doc.single_line_text(selection).as_deref(), Some("ul>li*3"));

        let multiline = Range::new(Position::new(0, 0), Position::new(1, 2));
        assert_eq!(doc.single_line_text(multiline), None);
    }
}
