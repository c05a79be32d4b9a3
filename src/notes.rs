use serde::Serialize;

/// Free-text notes collected during one run.
///
/// Every repair action, category-consistency warning or discrepancy found
/// while processing a race is recorded here, one line each, for a human
/// reviewer. A `Notes` value lives for exactly one pipeline invocation.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Notes {
    lines: Vec<String>,
}

impl Notes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a note line.
    pub fn add(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::debug!(note = %line, "note recorded");
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether any note contains `fragment` (used mainly in tests).
    pub fn contains(&self, fragment: &str) -> bool {
        self.lines.iter().any(|l| l.contains(fragment))
    }
}

/// `format!`-style shorthand for [`Notes::add`].
#[macro_export]
macro_rules! note {
    ($notes:expr, $($arg:tt)*) => {
        $notes.add(format!($($arg)*))
    };
}
