//! Built-in abbreviation expansion engine
//!
//! Parses abbreviations such as `ul>li*3` or `div#main.wrap[data-id]` into a
//! small element tree and renders it as an indented markup template. Tab-stop
//! fields are emitted through the formatter supplied by the caller, with
//! 1-based indices assigned in document order.
//!
//! The grammar lives behind the [`ExpansionEngine`] trait so the rest of the
//! crate depends only on the expand contract; unit tests for the caching and
//! assembly layers substitute test doubles here.

use thiserror::Error;

/// Renders one tab-stop field. `index` is 1-based and strictly increasing
/// within one expansion; `placeholder` carries optional default text.
pub type FieldFormatter = fn(index: u32, placeholder: Option<&str>) -> String;

/// Options for a single expansion.
#[derive(Debug, Clone, Copy)]
pub struct ExpandOptions<'a> {
    /// Language mode of the requesting document.
    pub syntax: &'a str,
    /// Formatter for tab-stop fields in the produced template.
    pub field: FieldFormatter,
}

/// Failure to parse an abbreviation. Never propagated past the adapter
/// boundary; callers see an empty template instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpandError {
    #[error("empty abbreviation")]
    EmptyAbbreviation,
    #[error("unexpected end of abbreviation")]
    UnexpectedEnd,
    #[error("unexpected `{found}` at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },
    #[error("unclosed `{open}` starting at offset {offset}")]
    Unclosed { open: char, offset: usize },
    #[error("missing repetition count at offset {offset}")]
    MissingCount { offset: usize },
}

/// The abbreviation grammar behind a narrow, swappable seam.
pub trait ExpansionEngine: Send + Sync {
    /// Expand `abbreviation` into a template containing zero or more tab-stop
    /// fields rendered through `options.field`.
    fn expand(
        &self,
        abbreviation: &str,
        options: &ExpandOptions<'_>,
    ) -> Result<String, ExpandError>;
}

/// Default engine implementing the markup subset of the abbreviation
/// language: element names with implicit resolution from the parent,
/// `.class`, `#id`, `[attr attr=value]`, `{text}`, the `>` `+` `^` operators,
/// `(…)` grouping, `*N` repetition and `$` numbering.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmmetEngine;

impl ExpansionEngine for EmmetEngine {
    fn expand(
        &self,
        abbreviation: &str,
        options: &ExpandOptions<'_>,
    ) -> Result<String, ExpandError> {
        let trimmed = abbreviation.trim();
        if trimmed.is_empty() {
            return Err(ExpandError::EmptyAbbreviation);
        }
        let nodes = Parser::new(trimmed).parse()?;
        let mut renderer = Renderer::new(options);
        Ok(renderer.render(&nodes))
    }
}

#[derive(Debug, Clone)]
struct Attr {
    name: String,
    value: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct Element {
    name: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<Attr>,
    text: Option<String>,
    children: Vec<Node>,
}

impl Element {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && self.text.is_none()
    }
}

#[derive(Debug, Clone)]
enum NodeKind {
    Element(Element),
    Group(Vec<Node>),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    repeat: Option<u32>,
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn at_sequence_end(&self) -> bool {
        matches!(self.peek(), None | Some(')'))
    }

    fn parse(mut self) -> Result<Vec<Node>, ExpandError> {
        let nodes = self.parse_clamped()?;
        if self.peek() == Some(')') {
            return Err(ExpandError::UnexpectedChar {
                found: ')',
                offset: self.pos,
            });
        }
        Ok(nodes)
    }

    /// Parse sibling sequences until end of input or `)`, absorbing any `^`
    /// that would climb past this level.
    fn parse_clamped(&mut self) -> Result<Vec<Node>, ExpandError> {
        let mut nodes = Vec::new();
        loop {
            let (mut sequence, _) = self.parse_sequence()?;
            nodes.append(&mut sequence);
            if self.at_sequence_end() {
                return Ok(nodes);
            }
        }
    }

    /// Parse siblings until the sequence ends or a `^` climbs out of this
    /// level. Returns the nodes plus the number of levels left to climb.
    fn parse_sequence(&mut self) -> Result<(Vec<Node>, usize), ExpandError> {
        let mut nodes = Vec::new();
        loop {
            let mut node = self.parse_item()?;
            if self.peek() == Some('>') {
                let offset = self.pos;
                self.pos += 1;
                let (children, climb) = self.parse_sequence()?;
                match &mut node.kind {
                    NodeKind::Element(element) => element.children = children,
                    NodeKind::Group(_) => {
                        return Err(ExpandError::UnexpectedChar { found: '>', offset });
                    }
                }
                nodes.push(node);
                match climb {
                    0 => return Ok((nodes, 0)),
                    1 => {
                        if self.at_sequence_end() {
                            return Ok((nodes, 0));
                        }
                        continue;
                    }
                    deeper => return Ok((nodes, deeper - 1)),
                }
            }
            nodes.push(node);
            if self.eat('+') {
                if self.at_sequence_end() {
                    // Tolerate a trailing `+`, as in the `ul+` snippet keys.
                    return Ok((nodes, 0));
                }
                continue;
            }
            if self.peek() == Some('^') {
                let mut climb = 0;
                while self.eat('^') {
                    climb += 1;
                }
                if self.at_sequence_end() {
                    return Ok((nodes, 0));
                }
                return Ok((nodes, climb));
            }
            return Ok((nodes, 0));
        }
    }

    fn parse_item(&mut self) -> Result<Node, ExpandError> {
        if self.peek() == Some('(') {
            let open_offset = self.pos;
            self.pos += 1;
            let children = self.parse_clamped()?;
            if !self.eat(')') {
                return Err(ExpandError::Unclosed {
                    open: '(',
                    offset: open_offset,
                });
            }
            let repeat = self.parse_repeat()?;
            return Ok(Node {
                kind: NodeKind::Group(children),
                repeat,
            });
        }
        self.parse_element()
    }

    fn parse_element(&mut self) -> Result<Node, ExpandError> {
        let mut element = Element {
            name: self.take_name(),
            ..Element::default()
        };

        loop {
            match self.peek() {
                Some('.') => {
                    self.pos += 1;
                    match self.take_name() {
                        Some(class) => element.classes.push(class),
                        None => {
                            return Err(ExpandError::UnexpectedChar {
                                found: '.',
                                offset: self.pos - 1,
                            });
                        }
                    }
                }
                Some('#') => {
                    self.pos += 1;
                    match self.take_name() {
                        Some(id) => element.id = Some(id),
                        None => {
                            return Err(ExpandError::UnexpectedChar {
                                found: '#',
                                offset: self.pos - 1,
                            });
                        }
                    }
                }
                Some('[') => self.parse_attributes(&mut element)?,
                Some('{') => element.text = Some(self.parse_text()?),
                _ => break,
            }
        }

        if element.is_empty() {
            return match self.peek() {
                Some(found) => Err(ExpandError::UnexpectedChar {
                    found,
                    offset: self.pos,
                }),
                None => Err(ExpandError::UnexpectedEnd),
            };
        }

        let repeat = self.parse_repeat()?;
        Ok(Node {
            kind: NodeKind::Element(element),
            repeat,
        })
    }

    fn take_name(&mut self) -> Option<String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '$') {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.pos == start {
            None
        } else {
            Some(self.chars[start..self.pos].iter().collect())
        }
    }

    fn take_attr_name(&mut self) -> Option<String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | ':' | '$') {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.pos == start {
            None
        } else {
            Some(self.chars[start..self.pos].iter().collect())
        }
    }

    fn parse_attributes(&mut self, element: &mut Element) -> Result<(), ExpandError> {
        let open_offset = self.pos;
        self.pos += 1; // consume '['
        loop {
            while self.eat(' ') {}
            let next = match self.peek() {
                None => {
                    return Err(ExpandError::Unclosed {
                        open: '[',
                        offset: open_offset,
                    });
                }
                Some(']') => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(c) => c,
            };
            let name = self.take_attr_name().ok_or(ExpandError::UnexpectedChar {
                found: next,
                offset: self.pos,
            })?;
            let value = if self.eat('=') {
                if self.eat('"') {
                    let start = self.pos;
                    while matches!(self.peek(), Some(c) if c != '"') {
                        self.pos += 1;
                    }
                    if !self.eat('"') {
                        return Err(ExpandError::Unclosed {
                            open: '"',
                            offset: start - 1,
                        });
                    }
                    Some(self.chars[start..self.pos - 1].iter().collect())
                } else {
                    let start = self.pos;
                    while matches!(self.peek(), Some(c) if c != ' ' && c != ']') {
                        self.pos += 1;
                    }
                    Some(self.chars[start..self.pos].iter().collect())
                }
            } else {
                None
            };
            element.attrs.push(Attr { name, value });
        }
    }

    fn parse_text(&mut self) -> Result<String, ExpandError> {
        let open_offset = self.pos;
        self.pos += 1; // consume '{'
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '}' {
                let text = self.chars[start..self.pos].iter().collect();
                self.pos += 1;
                return Ok(text);
            }
            self.pos += 1;
        }
        Err(ExpandError::Unclosed {
            open: '{',
            offset: open_offset,
        })
    }

    fn parse_repeat(&mut self) -> Result<Option<u32>, ExpandError> {
        if !self.eat('*') {
            return Ok(None);
        }
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(ExpandError::MissingCount { offset: start });
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        let count = digits
            .parse()
            .map_err(|_| ExpandError::MissingCount { offset: start })?;
        Ok(Some(count))
    }
}

/// Elements that never take content or a content tab stop.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Implicit tag name for an element written without one, resolved from the
/// parent; anything else defaults to `div`.
fn implicit_name(parent: Option<&str>) -> &'static str {
    match parent {
        Some("ul") | Some("ol") => "li",
        Some("table") | Some("thead") | Some("tbody") | Some("tfoot") => "tr",
        Some("tr") => "td",
        Some("select") | Some("optgroup") => "option",
        _ => "div",
    }
}

/// Replace `$` runs with the repetition counter, zero-padded to the run
/// length. Outside repetition the counter is 1.
fn substitute_counter(input: &str, counter: Option<u32>) -> String {
    if !input.contains('$') {
        return input.to_string();
    }
    let value = counter.unwrap_or(1);
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        let mut width = 1;
        while chars.peek() == Some(&'$') {
            chars.next();
            width += 1;
        }
        out.push_str(&format!("{:0width$}", value, width = width));
    }
    out
}

struct Renderer<'a> {
    options: &'a ExpandOptions<'a>,
    next_field: u32,
}

impl<'a> Renderer<'a> {
    fn new(options: &'a ExpandOptions<'a>) -> Self {
        Self {
            options,
            next_field: 1,
        }
    }

    fn field(&mut self, placeholder: Option<&str>) -> String {
        let index = self.next_field;
        self.next_field += 1;
        (self.options.field)(index, placeholder)
    }

    fn render(&mut self, nodes: &[Node]) -> String {
        let mut lines = Vec::new();
        self.render_nodes(nodes, 0, None, None, &mut lines);
        lines.join("\n")
    }

    fn render_nodes(
        &mut self,
        nodes: &[Node],
        depth: usize,
        parent: Option<&str>,
        counter: Option<u32>,
        lines: &mut Vec<String>,
    ) {
        for node in nodes {
            match node.repeat {
                Some(count) => {
                    for iteration in 1..=count {
                        self.render_node(node, depth, parent, Some(iteration), lines);
                    }
                }
                None => self.render_node(node, depth, parent, counter, lines),
            }
        }
    }

    fn render_node(
        &mut self,
        node: &Node,
        depth: usize,
        parent: Option<&str>,
        counter: Option<u32>,
        lines: &mut Vec<String>,
    ) {
        match &node.kind {
            NodeKind::Group(children) => self.render_nodes(children, depth, parent, counter, lines),
            NodeKind::Element(element) => {
                self.render_element(element, depth, parent, counter, lines);
            }
        }
    }

    fn render_element(
        &mut self,
        element: &Element,
        depth: usize,
        parent: Option<&str>,
        counter: Option<u32>,
        lines: &mut Vec<String>,
    ) {
        let indent = "\t".repeat(depth);

        // A bare `{text}` item renders its text without any tag.
        if element.name.is_none()
            && element.id.is_none()
            && element.classes.is_empty()
            && element.attrs.is_empty()
        {
            if let Some(text) = &element.text {
                lines.push(format!("{}{}", indent, substitute_counter(text, counter)));
                self.render_nodes(&element.children, depth, parent, counter, lines);
                return;
            }
        }

        let name = match &element.name {
            Some(name) => substitute_counter(name, counter),
            None => implicit_name(parent).to_string(),
        };

        let mut open_tag = format!("<{}", name);
        if let Some(id) = &element.id {
            open_tag.push_str(&format!(" id=\"{}\"", substitute_counter(id, counter)));
        }
        if !element.classes.is_empty() {
            let classes: Vec<String> = element
                .classes
                .iter()
                .map(|class| substitute_counter(class, counter))
                .collect();
            open_tag.push_str(&format!(" class=\"{}\"", classes.join(" ")));
        }
        for attr in &element.attrs {
            let value = match &attr.value {
                Some(value) => substitute_counter(value, counter),
                None => self.field(None),
            };
            open_tag.push_str(&format!(" {}=\"{}\"", attr.name, value));
        }

        if VOID_ELEMENTS.contains(&name.as_str()) {
            open_tag.push_str("/>");
            lines.push(format!("{}{}", indent, open_tag));
            return;
        }
        open_tag.push('>');

        let text = element
            .text
            .as_ref()
            .map(|text| substitute_counter(text, counter));

        if element.children.is_empty() {
            let content = match text {
                Some(text) => text,
                None => self.field(None),
            };
            lines.push(format!("{}{}{}</{}>", indent, open_tag, content, name));
            return;
        }

        lines.push(format!("{}{}", indent, open_tag));
        if let Some(text) = text {
            lines.push(format!("{}\t{}", indent, text));
        }
        self.render_nodes(&element.children, depth + 1, Some(&name), counter, lines);
        lines.push(format!("{}</{}>", indent, name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::quickcheck;
    use regex::Regex;

    fn field(index: u32, placeholder: Option<&str>) -> String {
        match placeholder {
            Some(text) => format!("${{{}:{}}}", index, text),
            None => format!("${{{}}}", index),
        }
    }

    fn expand(abbreviation: &str) -> Result<String, ExpandError> {
        EmmetEngine.expand(
            abbreviation,
            &ExpandOptions {
                syntax: "html",
                field,
            },
        )
    }

    fn field_indices(template: &str) -> Vec<u32> {
        let re = Regex::new(r"\$\{(\d+)").expect("valid regex");
        re.captures_iter(template)
            .map(|captures| captures[1].parse().expect("numeric field index"))
            .collect()
    }

    #[test]
    fn test_element_with_class() {
        assert_eq!(
            expand("div.cls").expect("should expand"),
            "<div class=\"cls\">${1}</div>"
        );
    }

    #[test]
    fn test_child_with_repetition() {
        assert_eq!(
            expand("ul>li*3").expect("should expand"),
            "<ul>\n\t<li>${1}</li>\n\t<li>${2}</li>\n\t<li>${3}</li>\n</ul>"
        );
    }

    #[test]
    fn test_bare_attribute_becomes_field() {
        assert_eq!(
            expand("a[href]").expect("should expand"),
            "<a href=\"${1}\">${2}</a>"
        );
    }

    #[test]
    fn test_attribute_values() {
        assert_eq!(
            expand("link[rel=stylesheet href=\"style.css\"]").expect("should expand"),
            "<link rel=\"stylesheet\" href=\"style.css\"/>"
        );
    }

    #[test]
    fn test_id_and_text() {
        assert_eq!(
            expand("p#intro{hello}").expect("should expand"),
            "<p id=\"intro\">hello</p>"
        );
    }

    #[test]
    fn test_bare_text_node() {
        assert_eq!(
            expand("{<!DOCTYPE html>}").expect("should expand"),
            "<!DOCTYPE html>"
        );
    }

    #[test]
    fn test_sibling_operator() {
        assert_eq!(
            expand("p+p").expect("should expand"),
            "<p>${1}</p>\n<p>${2}</p>"
        );
    }

    #[test]
    fn test_climb_up() {
        assert_eq!(
            expand("div>p^span").expect("should expand"),
            "<div>\n\t<p>${1}</p>\n</div>\n<span>${2}</span>"
        );
    }

    #[test]
    fn test_group_repetition() {
        assert_eq!(
            expand("(dt+dd)*2").expect("should expand"),
            "<dt>${1}</dt>\n<dd>${2}</dd>\n<dt>${3}</dt>\n<dd>${4}</dd>"
        );
    }

    #[test]
    fn test_implicit_names() {
        assert_eq!(
            expand("ul>.item*2").expect("should expand"),
            "<ul>\n\t<li class=\"item\">${1}</li>\n\t<li class=\"item\">${2}</li>\n</ul>"
        );
        assert_eq!(expand(".wrap").expect("should expand"), "<div class=\"wrap\">${1}</div>");
    }

    #[test]
    fn test_counter_numbering() {
        assert_eq!(
            expand("ul>li.item$*3").expect("should expand"),
            "<ul>\n\t<li class=\"item1\">${1}</li>\n\t<li class=\"item2\">${2}</li>\n\t<li class=\"item3\">${3}</li>\n</ul>"
        );
    }

    #[test]
    fn test_counter_zero_padding() {
        let expanded = expand("li.item$$*2").expect("should expand");
        assert!(expanded.contains("item01"), "got {expanded}");
        assert!(expanded.contains("item02"), "got {expanded}");
    }

    #[test]
    fn test_void_element() {
        assert_eq!(expand("br").expect("should expand"), "<br/>");
        assert_eq!(
            expand("img[src alt]").expect("should expand"),
            "<img src=\"${1}\" alt=\"${2}\"/>"
        );
    }

    #[test]
    fn test_empty_abbreviation() {
        assert_eq!(expand(""), Err(ExpandError::EmptyAbbreviation));
        assert_eq!(expand("   "), Err(ExpandError::EmptyAbbreviation));
    }

    #[test]
    fn test_malformed_abbreviations() {
        assert!(matches!(expand("hello world"), Err(ExpandError::UnexpectedChar { .. })));
        assert!(matches!(expand("div>"), Err(ExpandError::UnexpectedEnd)));
        assert!(matches!(expand("(dt+dd"), Err(ExpandError::Unclosed { open: '(', .. })));
        assert!(matches!(expand("a[href"), Err(ExpandError::Unclosed { open: '[', .. })));
        assert!(matches!(expand("p{oops"), Err(ExpandError::Unclosed { open: '{', .. })));
        assert!(matches!(expand("li*"), Err(ExpandError::MissingCount { .. })));
        assert!(matches!(expand("a)b"), Err(ExpandError::UnexpectedChar { found: ')', .. })));
    }

    #[test]
    fn test_field_indices_strictly_increase_from_one() {
        for abbreviation in ["ul>li*3", "a[href]+a[href]", "(dt+dd)*3", "div>p>a[href title]"] {
            let indices = field_indices(&expand(abbreviation).expect("should expand"));
            assert!(!indices.is_empty(), "{abbreviation} should contain fields");
            assert_eq!(indices[0], 1, "{abbreviation} should start at 1");
            assert!(
                indices.windows(2).all(|pair| pair[1] > pair[0]),
                "{abbreviation} indices should strictly increase: {indices:?}"
            );
        }
    }

    quickcheck! {
        /// Expansion is a pure function of its inputs, field indices included.
        fn prop_expansion_deterministic(abbreviation: String) -> bool {
            expand(&abbreviation) == expand(&abbreviation)
        }
    }
}
