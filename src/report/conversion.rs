//! Conversion Report
//!
//! Records what happened to every document in a run and every warning
//! raised along the way, for the summary printed at the end.

use std::time::{Duration, Instant};

use log::warn;

/// Final state of one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Dummy written.
    Converted,
    /// Dummy already existed and was left alone.
    Kept,
    /// Converted without writing (`--dry-run`).
    Previewed,
    /// Embedded process converted inside its parent.
    Embedded,
    /// Conversion failed; nothing emitted.
    Failed,
}

/// One document's entry in the report.
#[derive(Debug, Clone)]
pub struct DocumentOutcome {
    /// Path or inline key of the document
    pub document: String,
    pub outcome: Outcome,
    /// Output path, or the error for failures
    pub detail: Option<String>,
}

/// A non-fatal finding about a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub document: String,
    pub message: String,
}

/// Everything a conversion run produced.
#[derive(Debug, Clone)]
pub struct ConversionReport {
    outcomes: Vec<DocumentOutcome>,
    warnings: Vec<Warning>,
    start_time: Instant,
}

impl Default for ConversionReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionReport {
    /// Creates an empty report starting now.
    pub fn new() -> Self {
        Self {
            outcomes: Vec::new(),
            warnings: Vec::new(),
            start_time: Instant::now(),
        }
    }

    pub fn add_outcome(&mut self, document: impl Into<String>, outcome: Outcome, detail: Option<String>) {
        self.outcomes.push(DocumentOutcome {
            document: document.into(),
            outcome,
            detail,
        });
    }

    /// Records and logs a warning.
    pub fn add_warning(&mut self, document: impl Into<String>, message: impl Into<String>) {
        let warning = Warning {
            document: document.into(),
            message: message.into(),
        };
        warn!("{}: {}", warning.document, warning.message);
        self.warnings.push(warning);
    }

    pub fn get_outcomes(&self) -> &[DocumentOutcome] {
        &self.outcomes
    }

    pub fn get_warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Number of documents that ended with `outcome`.
    pub fn count(&self, outcome: Outcome) -> usize {
        self.outcomes.iter().filter(|o| o.outcome == outcome).count()
    }

    pub fn has_failures(&self) -> bool {
        self.count(Outcome::Failed) > 0
    }

    /// Returns the time elapsed since the report was created.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// One-line totals, e.g. `3 converted, 1 failed, 2 warning(s)`.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        for (outcome, label) in [
            (Outcome::Converted, "converted"),
            (Outcome::Previewed, "previewed"),
            (Outcome::Embedded, "embedded"),
            (Outcome::Kept, "kept"),
            (Outcome::Failed, "failed"),
        ] {
            let count = self.count(outcome);
            if count > 0 {
                parts.push(format!("{} {}", count, label));
            }
        }
        if parts.is_empty() {
            parts.push("nothing converted".to_string());
        }
        parts.push(format!("{} warning(s)", self.warnings.len()));
        format!("{} in {} ms", parts.join(", "), self.elapsed().as_millis())
    }
}
