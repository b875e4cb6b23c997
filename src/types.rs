/*!
 * Core types and data structures for the FlatFS application
 */

use std::fmt;
use std::path::{Path, PathBuf};

/// A filesystem entry discovered during traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Path relative to the project root, exactly as on disk
    pub path: PathBuf,
    /// Lossy UTF-8 path segments used for naming and reporting
    pub segments: Vec<String>,
    /// Whether the entry is a directory
    pub is_dir: bool,
    /// Size in bytes (0 for directories)
    pub size: u64,
    /// Whether the binary heuristic classified the file as binary
    pub is_binary: bool,
}

impl SourceEntry {
    /// Relative path joined with `/`, independent of the host separator
    pub fn rel_path(&self) -> String {
        self.segments.join("/")
    }
}

/// Where an ignore rule came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOrigin {
    /// Built-in default exclude table
    Default,
    /// An ignore file found during traversal
    IgnoreFile(PathBuf),
    /// A `--exclude` pattern
    User,
}

impl fmt::Display for RuleOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleOrigin::Default => write!(f, "default"),
            RuleOrigin::IgnoreFile(path) => write!(f, "{}", path.display()),
            RuleOrigin::User => write!(f, "--exclude"),
        }
    }
}

/// A single ignore pattern with its origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreRule {
    /// Pattern text without the leading `!`
    pub pattern: String,
    /// Source of the pattern
    pub origin: RuleOrigin,
    /// Whether the pattern re-includes matching paths
    pub negated: bool,
}

impl IgnoreRule {
    /// Parse one ignore-file line. Blank lines and comments yield `None`.
    pub fn parse(line: &str, origin: RuleOrigin) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }

        let (negated, pattern) = match trimmed.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        if pattern.is_empty() {
            return None;
        }

        Some(Self {
            pattern: pattern.to_string(),
            origin,
            negated,
        })
    }

    /// The rule as it would appear in an ignore file
    pub fn as_line(&self) -> String {
        if self.negated {
            format!("!{}", self.pattern)
        } else {
            self.pattern.clone()
        }
    }
}

/// Relation from a source path to its flat output name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatMapping {
    /// Relative path in the source tree (`/`-separated)
    pub source: String,
    /// File name inside the output directory
    pub output: String,
    /// Whether the baseline name collided and had to be disambiguated
    pub collided: bool,
}

/// Why an entry was left out of the output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Matched an exclude rule
    Ignored { rule: String, origin: String },
    /// Detected as binary
    Binary,
    /// Exceeded the size limit
    TooLarge { size: u64, limit: u64 },
    /// Could not be read or written
    Access(String),
    /// Not a regular file or directory we follow
    Unsupported(&'static str),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Ignored { rule, origin } => {
                write!(f, "Matched pattern `{}` ({})", rule, origin)
            }
            SkipReason::Binary => write!(f, "Binary file (use --include-binary to include)"),
            SkipReason::TooLarge { size, limit } => write!(
                f,
                "File too large ({:.1} KB > {} KB)",
                *size as f64 / 1024.0,
                limit / 1024
            ),
            SkipReason::Access(message) => write!(f, "Unreadable: {}", message),
            SkipReason::Unsupported(kind) => write!(f, "Skipped {}", kind),
        }
    }
}

/// An entry that did not make it into the output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// Relative path (`/`-separated)
    pub path: String,
    /// Whether the entry is a directory (its subtree was pruned)
    pub is_dir: bool,
    /// Reason for skipping
    pub reason: SkipReason,
}

/// Aggregate counts and structure for one run
#[derive(Debug, Clone, Default)]
pub struct ContextReport {
    /// Project name the tree is rooted at
    pub project_name: String,
    /// Absolute source directory
    pub source_dir: PathBuf,
    /// Files copied into the output
    pub files_included: usize,
    /// Total size of the copied files
    pub bytes_included: u64,
    /// Entries excluded by ignore rules (pruned directories count once)
    pub files_excluded: usize,
    /// Files skipped as binary
    pub binary_excluded: usize,
    /// Files skipped for exceeding the size limit
    pub oversized_excluded: usize,
    /// Entries skipped because of read or write failures
    pub access_errors: usize,
    /// Baseline names that had to be disambiguated
    pub collisions_resolved: usize,
    /// Rendered tree of accepted files
    pub tree: String,
    /// Every skipped entry, in traversal order
    pub skipped: Vec<SkippedEntry>,
}

/// Split a relative path into its normal components
pub fn path_segments(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            std::path::Component::Normal(s) => Some(s.to_string_lossy().to_string()),
            _ => None,
        })
        .collect()
}
