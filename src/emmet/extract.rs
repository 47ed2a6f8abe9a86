//! Abbreviation extraction at a cursor position
//!
//! Walks backward from the cursor over the abbreviation alphabet to find the
//! maximal trailing substring that could be an abbreviation. The scan never
//! leaves the current line; whether the substring actually parses is decided
//! later by the expansion engine.

/// A candidate abbreviation ending at the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbbreviationMatch {
    /// Char column where the abbreviation starts. Always <= the cursor column.
    pub start: usize,
    /// The abbreviation text itself. Never empty.
    pub text: String,
}

/// Check if a character can appear in an abbreviation token.
///
/// Identifier characters plus the abbreviation-language punctuation set.
fn is_abbreviation_char(c: char) -> bool {
    c.is_alphanumeric()
        || matches!(
            c,
            '_' | '.'
                | '#'
                | '['
                | ']'
                | '('
                | ')'
                | '{'
                | '}'
                | '*'
                | '$'
                | ':'
                | '-'
                | '>'
                | '+'
                | '^'
        )
}

/// Extract the abbreviation ending at the cursor.
///
/// # Arguments
/// * `line_to_cursor` - Text of the current line truncated at the cursor column
///
/// # Returns
/// The maximal trailing abbreviation, or `None` when the character before the
/// cursor is not part of the alphabet (not an error condition).
pub fn extract_abbreviation(line_to_cursor: &str) -> Option<AbbreviationMatch> {
    let chars: Vec<char> = line_to_cursor.chars().collect();

    let mut start = chars.len();
    while start > 0 && is_abbreviation_char(chars[start - 1]) {
        start -= 1;
    }

    if start == chars.len() {
        return None;
    }

    Some(AbbreviationMatch {
        start,
        text: chars[start..].iter().collect(),
    })
}

/// The word being typed immediately before the cursor.
///
/// Narrower than [`extract_abbreviation`]: only identifier characters count,
/// so for `div.cls` this is `cls`. Used to filter the snippet catalog.
pub fn word_prefix(line_to_cursor: &str) -> String {
    let chars: Vec<char> = line_to_cursor.chars().collect();

    let mut start = chars.len();
    while start > 0 && (chars[start - 1].is_alphanumeric() || chars[start - 1] == '_') {
        start -= 1;
    }

    chars[start..].iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::quickcheck;

    #[test]
    fn test_extract_simple_element() {
        let matched = extract_abbreviation("div").expect("should match");
        assert_eq!(matched.start, 0);
        assert_eq!(matched.text, "div");
    }

    #[test]
    fn test_extract_stops_at_disallowed_char() {
        // Everything after the space belongs to the abbreviation
        let matched = extract_abbreviation("some text ul>li*3").expect("should match");
        assert_eq!(matched.start, 10);
        assert_eq!(matched.text, "ul>li*3");
    }

    #[test]
    fn test_extract_with_class_and_cursor_offset() {
        let line = "    div.cls";
        let matched = extract_abbreviation(line).expect("should match");
        assert_eq!(matched.text, "div.cls");
        assert_eq!(matched.start, line.chars().count() - 7);
    }

    #[test]
    fn test_extract_empty_line() {
        assert_eq!(extract_abbreviation(""), None);
    }

    #[test]
    fn test_extract_after_space() {
        assert_eq!(extract_abbreviation("div.cls "), None);
    }

    #[test]
    fn test_extract_full_punctuation_set() {
        let abbr = "div#id.cls[a=b]{txt}>(p+span)^ul*2$:x-y";
        let matched = extract_abbreviation(abbr).expect("should match");
        assert_eq!(matched.start, 0);
        assert_eq!(matched.text, abbr);
    }

    #[test]
    fn test_word_prefix() {
        assert_eq!(word_prefix("div.cls"), "cls");
        assert_eq!(word_prefix("some ul"), "ul");
        assert_eq!(word_prefix("ul>"), "");
        assert_eq!(word_prefix(""), "");
    }

    quickcheck! {
        /// Extraction is a pure function: two identical calls agree.
        fn prop_extraction_idempotent(line: String) -> bool {
            extract_abbreviation(&line) == extract_abbreviation(&line)
        }

        /// The match is always a suffix of the input, entirely from the
        /// abbreviation alphabet, and maximal (the preceding char, if any,
        /// is outside the alphabet).
        fn prop_match_is_maximal_suffix(line: String) -> bool {
            match extract_abbreviation(&line) {
                None => true,
                Some(matched) => {
                    let chars: Vec<char> = line.chars().collect();
                    let suffix: String = chars[matched.start..].iter().collect();
                    suffix == matched.text
                        && matched.text.chars().all(is_abbreviation_char)
                        && (matched.start == 0 || !is_abbreviation_char(chars[matched.start - 1]))
                }
            }
        }
    }
}
