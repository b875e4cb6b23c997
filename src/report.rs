/*!
 * Reporting functionality for FlatFS
 *
 * Renders the outcome of a run as console tables using the tabled library.
 */

use tabled::{
    settings::{object::Columns, Alignment, Modify, Padding, Style},
    Table, Tabled,
};

use crate::engine::FlattenSummary;
use crate::utils::format_file_size;

/// Maximum number of skipped entries listed on the console
const MAX_SKIPPED_ROWS: usize = 15;

/// Format of the report output
pub enum ReportFormat {
    /// Console table output
    ConsoleTable,
}

/// Report generator for flatten results
pub struct Reporter {
    format: ReportFormat,
}

impl Reporter {
    /// Create a new reporter
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    /// Generate a report string for a completed run
    pub fn generate_report(&self, summary: &FlattenSummary) -> String {
        match self.format {
            ReportFormat::ConsoleTable => self.generate_console_report(summary),
        }
    }

    /// Print the report to stdout
    pub fn print_report(&self, summary: &FlattenSummary) {
        println!("\n{}", self.generate_report(summary));
    }

    // Truncate long paths from the left, keeping the file name visible
    fn format_path(&self, path: &str, max_len: usize) -> String {
        if path.chars().count() <= max_len {
            return path.to_string();
        }
        let keep = max_len.saturating_sub(3);
        let tail: String = path
            .chars()
            .rev()
            .take(keep)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("...{}", tail)
    }

    fn styled(mut table: Table) -> String {
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));
        table.to_string()
    }

    fn create_summary_table(&self, summary: &FlattenSummary) -> String {
        #[derive(Tabled)]
        struct SummaryRow {
            #[tabled(rename = "Metric")]
            key: &'static str,

            #[tabled(rename = "Value")]
            value: String,
        }

        let report = &summary.report;
        let rows = vec![
            SummaryRow {
                key: "Output Directory",
                value: summary.output_dir.display().to_string(),
            },
            SummaryRow {
                key: "Process Time",
                value: format!("{:.4?}", summary.duration),
            },
            SummaryRow {
                key: "Files Included",
                value: report.files_included.to_string(),
            },
            SummaryRow {
                key: "Bytes Copied",
                value: format_file_size(report.bytes_included),
            },
            SummaryRow {
                key: "Excluded by Rules",
                value: report.files_excluded.to_string(),
            },
            SummaryRow {
                key: "Binary Skipped",
                value: report.binary_excluded.to_string(),
            },
            SummaryRow {
                key: "Oversized Skipped",
                value: report.oversized_excluded.to_string(),
            },
            SummaryRow {
                key: "Unreadable",
                value: report.access_errors.to_string(),
            },
            SummaryRow {
                key: "Collisions Resolved",
                value: report.collisions_resolved.to_string(),
            },
        ];

        Self::styled(Table::new(rows))
    }

    fn create_skipped_table(&self, summary: &FlattenSummary) -> String {
        #[derive(Tabled)]
        struct SkippedRow {
            #[tabled(rename = "Path")]
            path: String,

            #[tabled(rename = "Reason")]
            reason: String,
        }

        let rows: Vec<SkippedRow> = summary
            .report
            .skipped
            .iter()
            .take(MAX_SKIPPED_ROWS)
            .map(|entry| SkippedRow {
                path: self.format_path(&entry.path, 60),
                reason: entry.reason.to_string(),
            })
            .collect();

        Self::styled(Table::new(rows))
    }

    fn generate_console_report(&self, summary: &FlattenSummary) -> String {
        let summary_table = self.create_summary_table(summary);
        let skipped = summary.report.skipped.len();

        if skipped == 0 {
            return format!("FLATTEN COMPLETE\n{}", summary_table);
        }

        let skipped_title = if skipped > MAX_SKIPPED_ROWS {
            format!(
                "SKIPPED ENTRIES (first {} of {}, see the exclusions file)",
                MAX_SKIPPED_ROWS, skipped
            )
        } else {
            "SKIPPED ENTRIES".to_string()
        };

        format!(
            "{}\n{}\n\nFLATTEN COMPLETE\n{}",
            skipped_title,
            self.create_skipped_table(summary),
            summary_table
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContextReport, SkipReason, SkippedEntry};
    use std::path::PathBuf;
    use std::time::Duration;

    fn summary_with_skips(count: usize) -> FlattenSummary {
        let skipped = (0..count)
            .map(|i| SkippedEntry {
                path: format!("file{}.bin", i),
                is_dir: false,
                reason: SkipReason::Binary,
            })
            .collect();
        FlattenSummary {
            output_dir: PathBuf::from("/tmp/out"),
            report: ContextReport {
                files_included: 3,
                binary_excluded: count,
                skipped,
                ..Default::default()
            },
            mappings: Vec::new(),
            duration: Duration::from_millis(12),
        }
    }

    #[test]
    fn test_report_without_skips() {
        let text = Reporter::new(ReportFormat::ConsoleTable).generate_report(&summary_with_skips(0));
        assert!(text.starts_with("FLATTEN COMPLETE"));
        assert!(text.contains("Files Included"));
        assert!(!text.contains("SKIPPED ENTRIES"));
    }

    #[test]
    fn test_report_truncates_skipped_list() {
        let text =
            Reporter::new(ReportFormat::ConsoleTable).generate_report(&summary_with_skips(20));
        assert!(text.contains("first 15 of 20"));
        assert!(text.contains("file14.bin"));
        assert!(!text.contains("file15.bin"));
    }

    #[test]
    fn test_format_path_truncation() {
        let reporter = Reporter::new(ReportFormat::ConsoleTable);
        assert_eq!(reporter.format_path("short.rs", 60), "short.rs");
        assert_eq!(reporter.format_path("abcdefghij", 8), "...fghij");
    }
}
