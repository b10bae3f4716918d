//! FUDI command lines.

use std::fmt;

/// One FUDI message addressed to a named receiver.
///
/// Rendered as `receiver selector atoms...;`. The engine's router patch strips
/// the receiver atom and forwards the rest to the matching `send` object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    /// Receiver name: `pd` or a canvas receiver such as `pd-rack.pd`.
    pub receiver: String,
    /// Message selector, e.g. `obj`, `connect`, `find`.
    pub selector: String,
    /// Remaining atoms.
    pub atoms: Vec<String>,
}

impl EngineCommand {
    /// Creates a command with no atoms.
    pub fn new(receiver: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            receiver: receiver.into(),
            selector: selector.into(),
            atoms: Vec::new(),
        }
    }

    /// Appends an atom.
    pub fn arg(mut self, atom: impl ToString) -> Self {
        self.atoms.push(atom.to_string());
        self
    }

    /// Appends several atoms.
    pub fn args<I, T>(mut self, atoms: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        self.atoms.extend(atoms.into_iter().map(|a| a.to_string()));
        self
    }
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.receiver, self.selector)?;
        for atom in &self.atoms {
            write!(f, " {atom}")?;
        }
        write!(f, ";")
    }
}

/// Escapes FUDI separators so `text` travels as one atom.
pub fn escape_atom(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, ' ' | ';' | ',' | '\\' | '$') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
