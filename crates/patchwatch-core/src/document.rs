//! Patch document reader and writer.
//!
//! A Pd patch file is a sequence of statements terminated by an unescaped `;`.
//! Each statement starts with a record type (`#N`, `#X`, `#A`) and an action
//! keyword, followed by atoms. This module only splits and tokenizes; what the
//! atoms mean is decided by the [`loader`](crate::loader).
//!
//! # Example
//!
//! ```rust
//! use patchwatch_core::document::{parse_document, ElementFilter};
//!
//! let text = "#N canvas 0 50 450 300 10;\n#X obj 10 10 adc~ 1;\n#X connect 0 0 1 0;\n";
//! let elements = parse_document(text).unwrap();
//! let adc = ElementFilter::objects().with_object("adc~");
//! assert_eq!(elements.iter().filter(|e| adc.matches(e)).count(), 1);
//! ```

use std::fmt;
use std::path::Path;

use crate::error::DocumentError;

/// One statement of a patch document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Canvas nesting: 0 for the top-level canvas and its contents.
    pub depth: usize,
    /// Record type, e.g. `#X`.
    pub kind: String,
    /// Action keyword, e.g. `obj` or `connect`.
    pub action: String,
    /// Remaining atoms, escapes preserved.
    pub args: Vec<String>,
}

impl Element {
    /// Creates a top-level element.
    pub fn new(kind: &str, action: &str, args: Vec<String>) -> Self {
        Self {
            depth: 0,
            kind: kind.to_string(),
            action: action.to_string(),
            args,
        }
    }

    /// Class name of an object statement (`#X obj x y class ...`).
    pub fn object_class(&self) -> Option<&str> {
        if self.kind == "#X" && self.action == "obj" {
            self.args.get(2).map(String::as_str)
        } else {
            None
        }
    }

    /// Canvas position carried by the first two atoms, if they parse.
    pub fn position(&self) -> Option<(i32, i32)> {
        let x = self.args.first()?.parse().ok()?;
        let y = self.args.get(1)?.parse().ok()?;
        Some((x, y))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.action)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        write!(f, ";")
    }
}

/// Selects elements by record type, action, and object class.
///
/// Unset fields match anything. The object field only matches `#X obj`
/// statements whose class atom equals it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElementFilter {
    /// Record type to match.
    pub kind: Option<&'static str>,
    /// Action keyword to match.
    pub action: Option<&'static str>,
    /// Object class to match.
    pub object: Option<&'static str>,
}

impl ElementFilter {
    /// Matches every element.
    pub const fn any() -> Self {
        Self {
            kind: None,
            action: None,
            object: None,
        }
    }

    /// Matches `#X obj` statements.
    pub const fn objects() -> Self {
        Self {
            kind: Some("#X"),
            action: Some("obj"),
            object: None,
        }
    }

    /// Matches `#X <action>` statements.
    pub const fn action(action: &'static str) -> Self {
        Self {
            kind: Some("#X"),
            action: Some(action),
            object: None,
        }
    }

    /// Narrows the filter to one object class.
    pub const fn with_object(self, object: &'static str) -> Self {
        Self {
            object: Some(object),
            ..self
        }
    }

    /// Returns true if `element` passes the filter.
    pub fn matches(&self, element: &Element) -> bool {
        self.kind.is_none_or(|k| element.kind == k)
            && self.action.is_none_or(|a| element.action == a)
            && self
                .object
                .is_none_or(|o| element.object_class() == Some(o))
    }
}

/// Splits patch text into tokenized statements.
///
/// `\`-escaped characters (including `\;`, `\,` and `\ `) stay inside their
/// atom with the backslash kept, so writing the elements back reproduces them.
pub fn parse_document(text: &str) -> Result<Vec<Element>, DocumentError> {
    let mut elements = Vec::new();
    let mut open_canvases = 0usize;

    for (index, tokens) in split_statements(text).into_iter().enumerate() {
        if tokens.is_empty() {
            continue;
        }
        if tokens.len() < 2 {
            return Err(DocumentError::Malformed {
                index,
                statement: tokens.join(" "),
                reason: "missing action keyword".to_string(),
            });
        }
        let mut tokens = tokens.into_iter();
        let kind = tokens.next().unwrap_or_default();
        let action = tokens.next().unwrap_or_default();
        let args: Vec<String> = tokens.collect();

        let depth = if kind == "#N" && action == "canvas" {
            let depth = open_canvases;
            open_canvases += 1;
            depth
        } else if kind == "#X" && action == "restore" {
            open_canvases = open_canvases.saturating_sub(1);
            open_canvases.saturating_sub(1)
        } else {
            open_canvases.saturating_sub(1)
        };

        elements.push(Element {
            depth,
            kind,
            action,
            args,
        });
    }

    Ok(elements)
}

/// Tokenizes `text` into statements of atoms.
fn split_statements(text: &str) -> Vec<Vec<String>> {
    let mut statements = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut atom = String::new();
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                atom.push(c);
                if let Some(escaped) = chars.next() {
                    atom.push(escaped);
                }
            }
            ';' => {
                if !atom.is_empty() {
                    current.push(std::mem::take(&mut atom));
                }
                statements.push(std::mem::take(&mut current));
            }
            c if c.is_whitespace() => {
                if !atom.is_empty() {
                    current.push(std::mem::take(&mut atom));
                }
            }
            c => atom.push(c),
        }
    }

    // A trailing statement without its `;` is still kept.
    if !atom.is_empty() {
        current.push(atom);
    }
    if !current.is_empty() {
        statements.push(current);
    }
    statements
}

/// Reads and parses a patch file.
pub fn read_document(path: &Path) -> Result<Vec<Element>, DocumentError> {
    let text = std::fs::read_to_string(path).map_err(|e| DocumentError::read_file(path, e))?;
    parse_document(&text)
}

/// Renders elements one statement per line.
pub fn render_document(elements: &[Element]) -> String {
    let mut text = String::new();
    for element in elements {
        text.push_str(&element.to_string());
        text.push('\n');
    }
    text
}

/// Writes elements to a patch file.
pub fn write_document(path: &Path, elements: &[Element]) -> Result<(), DocumentError> {
    std::fs::write(path, render_document(elements)).map_err(|e| DocumentError::write_file(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NESTED: &str = "#N canvas 0 50 450 300 10;
#X obj 10 10 osc~ 440;
#N canvas 0 0 200 200 inner 0;
#X obj 5 5 inlet~;
#X restore 10 40 pd inner;
#X msg 10 80 \\; pd dsp 1;
#X connect 0 0 1 0;
";

    #[test]
    fn parses_statements_and_depth() {
        let elements = parse_document(NESTED).unwrap();
        let summary: Vec<(usize, &str, &str)> = elements
            .iter()
            .map(|e| (e.depth, e.kind.as_str(), e.action.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (0, "#N", "canvas"),
                (0, "#X", "obj"),
                (1, "#N", "canvas"),
                (1, "#X", "obj"),
                (0, "#X", "restore"),
                (0, "#X", "msg"),
                (0, "#X", "connect"),
            ]
        );
    }

    #[test]
    fn escaped_semicolon_stays_in_atom() {
        let elements = parse_document(NESTED).unwrap();
        let msg = &elements[5];
        assert_eq!(msg.args, vec!["10", "80", "\\;", "pd", "dsp", "1"]);
        assert_eq!(msg.to_string(), "#X msg 10 80 \\; pd dsp 1;");
    }

    #[test]
    fn filter_matches_object_class() {
        let elements = parse_document(NESTED).unwrap();
        let osc = ElementFilter::objects().with_object("osc~");
        let connects = ElementFilter::action("connect");

        assert!(osc.matches(&elements[1]));
        assert!(!osc.matches(&elements[3]));
        assert!(connects.matches(&elements[6]));
        assert!(!connects.matches(&elements[1]));
        assert!(elements.iter().all(|e| ElementFilter::any().matches(e)));
    }

    #[test]
    fn missing_action_is_malformed() {
        let err = parse_document("#X;").unwrap_err();
        assert!(matches!(err, DocumentError::Malformed { index: 0, .. }));
    }

    #[test]
    fn position_parses_leading_atoms() {
        let element = Element::new("#X", "obj", vec!["12".into(), "-4".into(), "f".into()]);
        assert_eq!(element.position(), Some((12, -4)));
        assert_eq!(element.object_class(), Some("f"));
        assert_eq!(Element::new("#X", "connect", vec![]).position(), None);
    }

    #[test]
    fn render_then_parse_is_stable() {
        let elements = parse_document(NESTED).unwrap();
        let again = parse_document(&render_document(&elements)).unwrap();
        assert_eq!(elements, again);
    }
}
