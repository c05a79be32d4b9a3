use chrono::Duration;
use serde::Serialize;

use crate::time::serialize_optional_time;

/// One finish-line observation, as recorded.
///
/// Identity is positional: an observation's index in the arrival-ordered
/// sequence is what later inference relies on, even when its bib number or
/// time is corrected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawObservation {
    /// `None` when the bib number was not recorded
    pub bib: Option<u32>,
    #[serde(serialize_with = "serialize_optional_time")]
    pub finish_time: Option<Duration>,
    pub explicit_leg: Option<usize>,
    pub comment: String,
    pub from_paper: bool,
}

impl RawObservation {
    pub fn new(bib: Option<u32>, finish_time: Option<Duration>) -> Self {
        Self {
            bib,
            finish_time,
            explicit_leg: None,
            comment: String::new(),
            from_paper: false,
        }
    }

    pub fn with_leg(mut self, leg: usize) -> Self {
        self.explicit_leg = Some(leg);
        self
    }

    /// Append a sentence to the free-text comment.
    pub fn append_comment(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if !self.comment.is_empty() {
            self.comment.push(' ');
        }
        self.comment.push_str(text);
    }

    /// Short label for notes, e.g. "bib 17" or "unknown bib".
    pub fn bib_label(&self) -> String {
        match self.bib {
            Some(bib) => format!("bib {}", bib),
            None => "unknown bib".to_string(),
        }
    }
}
