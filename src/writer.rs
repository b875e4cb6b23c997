/*!
 * Output writing for FlatFS: atomic file copies and the context documents
 */

use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use filetime::FileTime;
use tempfile::NamedTempFile;

use crate::types::{ContextReport, IgnoreRule, RuleOrigin, SkipReason};
use crate::utils::format_file_size;

/// Rendered tree of the accepted files
pub const TREE_FILE: &str = "00_directory_structure.txt";
/// Summary of the run
pub const CONTEXT_FILE: &str = "00_project_context.md";
/// Exclusion patterns and skipped entries
pub const EXCLUDED_FILE: &str = "00_excluded.md";
/// Names reserved for generated documents
pub const REPORT_FILES: [&str; 3] = [TREE_FILE, CONTEXT_FILE, EXCLUDED_FILE];

/// Writes into a single flat output directory
pub struct OutputWriter {
    output_dir: PathBuf,
}

impl OutputWriter {
    /// Create a writer for `output_dir`, which must already exist
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Copy `source` to `name` inside the output directory.
    ///
    /// Bytes go to a temporary file that is renamed into place, so a failed
    /// copy never leaves a partial file under the final name. Permissions
    /// and modification time are carried over.
    pub fn copy_file(&self, source: &Path, name: &str) -> io::Result<u64> {
        let metadata = fs::metadata(source)?;
        let mut input = File::open(source)?;

        let mut temp = NamedTempFile::new_in(&self.output_dir)?;
        let bytes = io::copy(&mut input, temp.as_file_mut())?;
        temp.as_file_mut().flush()?;
        temp.as_file().set_permissions(metadata.permissions())?;

        let dest = self.output_dir.join(name);
        temp.persist(&dest).map_err(|e| e.error)?;

        let mtime = FileTime::from_last_modification_time(&metadata);
        filetime::set_file_mtime(&dest, mtime)?;

        Ok(bytes)
    }

    /// Atomically write a text document named `name`
    pub fn write_text(&self, name: &str, content: &str) -> io::Result<()> {
        let mut temp = NamedTempFile::new_in(&self.output_dir)?;
        temp.write_all(content.as_bytes())?;
        temp.flush()?;
        temp.persist(self.output_dir.join(name)).map_err(|e| e.error)?;
        Ok(())
    }

    /// Write the tree, context, and exclusion documents
    pub fn write_reports(
        &self,
        report: &ContextReport,
        rules: &[IgnoreRule],
        separator: &str,
    ) -> io::Result<()> {
        self.write_text(TREE_FILE, &report.tree)?;
        self.write_text(CONTEXT_FILE, &render_context(report, separator))?;
        self.write_text(EXCLUDED_FILE, &render_exclusions(report, rules))?;
        Ok(())
    }
}

/// Markdown summary of a run
pub fn render_context(report: &ContextReport, separator: &str) -> String {
    let hostname = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    let timestamp = Local::now().to_rfc3339();

    let mut out = String::new();
    let _ = writeln!(out, "# Project Context Information\n");
    let _ = writeln!(
        out,
        "Generated by flatfs {} on {} at {}\n",
        env!("CARGO_PKG_VERSION"),
        hostname,
        timestamp
    );

    let _ = writeln!(out, "## System Information");
    let _ = writeln!(
        out,
        "- OS: {} ({})\n",
        std::env::consts::OS,
        std::env::consts::FAMILY
    );

    let _ = writeln!(out, "## Project Information");
    let _ = writeln!(out, "- Project: {}", report.project_name);
    let _ = writeln!(out, "- Source Directory: {}", report.source_dir.display());
    let _ = writeln!(
        out,
        "- Files Included: {} ({})",
        report.files_included,
        format_file_size(report.bytes_included)
    );
    let _ = writeln!(out, "- Entries Excluded by Rules: {}", report.files_excluded);
    let _ = writeln!(out, "- Binary Files Skipped: {}", report.binary_excluded);
    let _ = writeln!(out, "- Oversized Files Skipped: {}", report.oversized_excluded);
    let _ = writeln!(out, "- Unreadable Entries: {}", report.access_errors);
    let _ = writeln!(
        out,
        "- Filename Collisions Resolved: {}\n",
        report.collisions_resolved
    );

    let _ = writeln!(out, "## Directory Structure\n");
    let _ = writeln!(out, "```text\n{}```\n", report.tree);

    let _ = writeln!(out, "## Note");
    let _ = writeln!(
        out,
        "- Every file name encodes its original path with `{}` in place of `/`.",
        separator
    );
    let _ = writeln!(
        out,
        "- Names that clashed carry a short hash suffix before the extension."
    );
    let _ = writeln!(
        out,
        "- Detailed exclusion information and skipped files are listed in {}",
        EXCLUDED_FILE
    );
    out
}

/// Markdown listing of exclusion rules and skipped entries
pub fn render_exclusions(report: &ContextReport, rules: &[IgnoreRule]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Exclusion Information\n");
    let _ = writeln!(
        out,
        "Generated by flatfs for project at {}\n",
        report.source_dir.display()
    );

    let defaults: Vec<String> = rules
        .iter()
        .filter(|r| r.origin == RuleOrigin::Default)
        .map(IgnoreRule::as_line)
        .collect();
    let user: Vec<String> = rules
        .iter()
        .filter(|r| r.origin == RuleOrigin::User)
        .map(IgnoreRule::as_line)
        .collect();
    let from_files: Vec<&IgnoreRule> = rules
        .iter()
        .filter(|r| matches!(r.origin, RuleOrigin::IgnoreFile(_)))
        .collect();

    let _ = writeln!(out, "## Exclusion Patterns");
    let _ = writeln!(
        out,
        "- Default Patterns: {}",
        if defaults.is_empty() {
            "disabled".to_string()
        } else {
            defaults.join(", ")
        }
    );
    let _ = writeln!(
        out,
        "- Custom Exclude Patterns: {}",
        if user.is_empty() {
            "None".to_string()
        } else {
            user.join(", ")
        }
    );
    let _ = writeln!(out, "- Ignore File Patterns: {} found", from_files.len());

    if !from_files.is_empty() {
        let _ = writeln!(out, "\n### Ignore File Patterns\n");
        for rule in from_files {
            let _ = writeln!(out, "- `{}` ({})", rule.as_line(), rule.origin);
        }
    }

    if !report.skipped.is_empty() {
        let _ = writeln!(out, "\n## Skipped Entries\n");
        for entry in &report.skipped {
            let suffix = if entry.is_dir { "/" } else { "" };
            let _ = writeln!(out, "- `{}{}`: {}", entry.path, suffix, entry.reason);
        }
    }

    let pruned = report
        .skipped
        .iter()
        .filter(|e| e.is_dir && matches!(e.reason, SkipReason::Ignored { .. }))
        .count();
    if pruned > 0 {
        let _ = writeln!(
            out,
            "\n{} excluded {} not traversed; negations inside them have no effect.",
            pruned,
            if pruned == 1 { "directory was" } else { "directories were" }
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SkippedEntry;
    use tempfile::tempdir;

    #[test]
    fn test_copy_file_preserves_bytes_and_mtime() {
        let src_dir = tempdir().unwrap();
        let out_dir = tempdir().unwrap();
        let source = src_dir.path().join("data.bin");
        fs::write(&source, [0u8, 159, 146, 150, 10]).unwrap();
        let old = FileTime::from_unix_time(1_600_000_000, 0);
        filetime::set_file_mtime(&source, old).unwrap();

        let writer = OutputWriter::new(out_dir.path());
        let bytes = writer.copy_file(&source, "x_data.bin").unwrap();

        let dest = out_dir.path().join("x_data.bin");
        assert_eq!(bytes, 5);
        assert_eq!(fs::read(&dest).unwrap(), fs::read(&source).unwrap());
        let copied = FileTime::from_last_modification_time(&fs::metadata(&dest).unwrap());
        assert_eq!(copied.unix_seconds(), 1_600_000_000);
    }

    #[test]
    fn test_missing_source_leaves_nothing_behind() {
        let out_dir = tempdir().unwrap();
        let writer = OutputWriter::new(out_dir.path());

        let result = writer.copy_file(&out_dir.path().join("missing.txt"), "missing.txt");
        assert!(result.is_err());
        assert_eq!(fs::read_dir(out_dir.path()).unwrap().count(), 0);
    }

    // Opening a directory succeeds on Linux and reading it fails, so the
    // temporary file already exists when the copy errors out
    #[cfg(target_os = "linux")]
    #[test]
    fn test_failed_copy_removes_temp_file() {
        let src_dir = tempdir().unwrap();
        let out_dir = tempdir().unwrap();
        let writer = OutputWriter::new(out_dir.path());

        let result = writer.copy_file(src_dir.path(), "dir.txt");
        assert!(result.is_err());
        assert_eq!(fs::read_dir(out_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_exclusions_document() {
        let report = ContextReport {
            project_name: "demo".to_string(),
            source_dir: PathBuf::from("/tmp/demo"),
            skipped: vec![
                SkippedEntry {
                    path: "build".to_string(),
                    is_dir: true,
                    reason: SkipReason::Ignored {
                        rule: "build/".to_string(),
                        origin: ".gitignore".to_string(),
                    },
                },
                SkippedEntry {
                    path: "logo.png".to_string(),
                    is_dir: false,
                    reason: SkipReason::Binary,
                },
            ],
            ..Default::default()
        };
        let rules = vec![
            IgnoreRule::parse("*.pyc", RuleOrigin::Default).unwrap(),
            IgnoreRule::parse("!keep.log", RuleOrigin::IgnoreFile(".gitignore".into())).unwrap(),
        ];

        let text = render_exclusions(&report, &rules);
        assert!(text.contains("- Default Patterns: *.pyc"));
        assert!(text.contains("- Custom Exclude Patterns: None"));
        assert!(text.contains("- `!keep.log` (.gitignore)"));
        assert!(text.contains("- `build/`: Matched pattern `build/` (.gitignore)"));
        assert!(text.contains("- `logo.png`: Binary file"));
        assert!(text.contains("1 excluded directory was not traversed"));
    }

    #[test]
    fn test_context_document_counts() {
        let report = ContextReport {
            project_name: "demo".to_string(),
            files_included: 7,
            collisions_resolved: 2,
            tree: "demo\n└── a.txt\n".to_string(),
            ..Default::default()
        };

        let text = render_context(&report, "_");
        assert!(text.contains("- Files Included: 7 (0 bytes)"));
        assert!(text.contains("- Filename Collisions Resolved: 2"));
        assert!(text.contains("└── a.txt"));
        assert!(text.contains(EXCLUDED_FILE));
    }
}
