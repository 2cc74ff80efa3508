//! Markdown summary of completion statistics.
//!
//! The summary has a metrics table followed by one row per completed level:
//!
//! ```rust
//! use roboyard_stats::{MarkdownSummary, StatsSnapshot};
//!
//! let markdown = MarkdownSummary::new(&StatsSnapshot::default()).generate();
//! assert!(markdown.contains("*No levels completed yet.*"));
//! ```

use std::fmt::Write;

use roboyard_core::{CompletionRecord, MAX_STARS};

use crate::StatsSnapshot;

/// Generates a Markdown summary from a [`StatsSnapshot`].
pub struct MarkdownSummary<'a> {
    stats: &'a StatsSnapshot,
}

impl<'a> MarkdownSummary<'a> {
    /// Creates a generator for `stats`.
    #[must_use]
    pub const fn new(stats: &'a StatsSnapshot) -> Self {
        Self { stats }
    }

    /// Renders the summary.
    #[must_use]
    pub fn generate(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "# Roboyard Statistics\n");
        self.write_totals(&mut output);
        self.write_levels(&mut output);
        output
    }

    fn write_totals(&self, output: &mut String) {
        let _ = writeln!(output, "| Metric | Value |");
        let _ = writeln!(output, "|--------|-------|");
        let _ = writeln!(output, "| Levels completed | {} |", self.stats.levels.len());
        let _ = writeln!(
            output,
            "| Total stars | {} of {} |",
            self.stats.total_stars(),
            self.stats.levels.len() * usize::from(MAX_STARS)
        );
        let _ = writeln!(
            output,
            "| Random games completed | {} |",
            self.stats.random_completions
        );
        let _ = writeln!(
            output,
            "| Games completed | {} |",
            self.stats.total_completions
        );
        let _ = writeln!(output);
    }

    fn write_levels(&self, output: &mut String) {
        let _ = writeln!(output, "## Best Results\n");

        if self.stats.levels.is_empty() {
            let _ = writeln!(output, "*No levels completed yet.*");
            return;
        }

        let _ = writeln!(output, "| Level | Stars | Moves | Optimal | Hints | Time |");
        let _ = writeln!(output, "|-------|-------|-------|---------|-------|------|");
        for (level, record) in &self.stats.levels {
            write_level_row(output, *level, record);
        }
    }
}

fn write_level_row(output: &mut String, level: u32, record: &CompletionRecord) {
    let _ = writeln!(
        output,
        "| {level} | {} | {} | {} | {} | {} |",
        format_stars(record.stars),
        record.moves_used,
        record.optimal_moves,
        record.hints_used,
        format_duration(record.time_ms / 1000)
    );
}

/// Filled stars then empty ones, four in total.
fn format_stars(stars: u8) -> String {
    let filled = stars.min(MAX_STARS);
    let mut out = "★".repeat(usize::from(filled));
    out.push_str(&"☆".repeat(usize::from(MAX_STARS - filled)));
    out
}

/// Formats a duration in seconds to a human-readable string.
///
/// Examples: "45s", "2m 30s", "1h 5m 30s"
fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    let mut parts = Vec::new();

    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if secs > 0 || parts.is_empty() {
        parts.push(format!("{secs}s"));
    }

    parts.join(" ")
}
