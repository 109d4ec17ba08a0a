//! Per-file diagnostic lists.
//!
//! Each file owns one [`Diagnostics`] list. Entries keep the order in which
//! they were reported, and every entry carries zero or more [`Note`]s that
//! add context such as the position of a previous declaration or the call
//! site that triggered a specialization.

use std::fmt;

use crate::{CheckError, Span};

/// Additional context attached to a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    /// The note text.
    pub message: String,
    /// Where the note points, if anywhere.
    pub span: Option<Span>,
}

impl Note {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span: None,
        }
    }

    pub fn at(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span: Some(span),
        }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.span {
            Some(span) => write!(f, "note: {}: {}", self.message, span),
            None => write!(f, "note: {}", self.message),
        }
    }
}

/// A single error reported while checking.
///
/// The message text is not a stable surface; the structure is. A diagnostic
/// is one primary message at a position plus any number of notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The primary message.
    pub message: String,
    /// Where the error occurred.
    pub span: Span,
    /// Attached notes, in the order they were added.
    pub notes: Vec<Note>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: Note) -> Self {
        self.notes.push(note);
        self
    }
}

impl From<CheckError> for Diagnostic {
    fn from(error: CheckError) -> Self {
        let span = error.span();
        let notes = error.notes();
        Self {
            message: error.to_string(),
            span,
            notes,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: error: {}", self.span, self.message)?;
        for note in &self.notes {
            write!(f, "\n    {}", note)?;
        }
        Ok(())
    }
}

/// Ordered diagnostics of one file.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    /// Attach a note to the most recently reported diagnostic.
    ///
    /// Returns `false` when there is nothing to attach to.
    pub fn attach_note(&mut self, note: Note) -> bool {
        match self.entries.last_mut() {
            Some(last) => {
                last.notes.push(note);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Primary messages only, in report order.
    pub fn messages(&self) -> Vec<&str> {
        self.entries.iter().map(|d| d.message.as_str()).collect()
    }

    /// Whether any primary message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|d| d.message.contains(needle))
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FileId;

    fn span(line: u32, col: u32) -> Span {
        Span::new(FileId(0), line, col, 1)
    }

    #[test]
    fn entries_keep_report_order() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::new("second line", span(2, 1)));
        diagnostics.push(Diagnostic::new("first line", span(1, 1)));
        assert_eq!(diagnostics.messages(), vec!["second line", "first line"]);
    }

    #[test]
    fn notes_attach_to_last_entry() {
        let mut diagnostics = Diagnostics::new();
        assert!(!diagnostics.attach_note(Note::new("orphan")));

        diagnostics.push(Diagnostic::new("a", span(1, 1)));
        diagnostics.push(Diagnostic::new("b", span(2, 1)));
        assert!(diagnostics.attach_note(Note::at("called from", span(9, 4))));

        let entries = diagnostics.as_slice();
        assert!(entries[0].notes.is_empty());
        assert_eq!(entries[1].notes.len(), 1);
    }

    #[test]
    fn error_converts_with_notes() {
        let error = CheckError::Redeclaration {
            name: "foo".into(),
            span: span(4, 1),
            previous: span(2, 1),
        };
        let diagnostic = Diagnostic::from(error);
        assert_eq!(diagnostic.span, span(4, 1));
        assert_eq!(diagnostic.notes.len(), 1);
        assert_eq!(diagnostic.notes[0].span, Some(span(2, 1)));
    }

    #[test]
    fn display_includes_notes() {
        let diagnostic = Diagnostic::new("bad", span(3, 7)).with_note(Note::new("context"));
        assert_eq!(diagnostic.to_string(), "3:7: error: bad\n    note: context");
    }
}
