//! Diagnostics sink threaded through the rules.
//!
//! Notes are for humans reading logs. No rule reads them back.

#[derive(Debug, Default)]
pub struct AnalyzerState {
    debug: bool,
    notes: Vec<String>,
}

impl AnalyzerState {
    /// With `debug` set, notes are also kept in memory for later inspection.
    pub fn new(debug: bool) -> Self {
        Self {
            debug,
            notes: Vec::new(),
        }
    }

    pub fn log(&mut self, note: impl Into<String>) {
        let note = note.into();
        tracing::debug!(note = %note, "analyzer");
        if self.debug {
            self.notes.push(note);
        }
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }
}
