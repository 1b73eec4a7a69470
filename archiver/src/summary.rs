use archive_core::RunCounters;
use std::fmt;

/// Counters for both export sources of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub plurks: RunCounters,
    pub responses: RunCounters,
    /// Whether capture times were reconciled during the run.
    pub metadata_enabled: bool,
}

impl RunSummary {
    pub fn total(&self) -> RunCounters {
        self.plurks + self.responses
    }

    pub fn report_lines(&self) -> Vec<String> {
        let total = self.total();
        let mut lines = vec![
            format!("New images downloaded: {}", total.downloaded),
            format!("Existing images skipped: {}", total.skipped_existing),
        ];
        if self.metadata_enabled {
            lines.push(format!("Capture times updated: {}", total.metadata_updated));
        }
        lines
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.report_lines().join("\n"))
    }
}
