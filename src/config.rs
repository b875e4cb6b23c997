/*!
 * Configuration handling for FlatFS
 */

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use clap_complete::Shell;

use crate::encoder::is_valid_separator;
use crate::ensure;
use crate::error::Result;

/// Default name of the output folder created inside the source directory
pub const DEFAULT_OUTPUT_DIR: &str = "flatfs_output";

/// Tunables for the binary heuristic
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryThresholds {
    /// Number of leading bytes inspected
    pub sample_size: usize,
    /// Fraction of control bytes above which a sample counts as binary
    pub max_non_text_ratio: f32,
}

impl Default for BinaryThresholds {
    fn default() -> Self {
        Self {
            sample_size: 8192,
            max_non_text_ratio: 0.3,
        }
    }
}

/// Command-line arguments for FlatFS
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "flatfs",
    version = env!("CARGO_PKG_VERSION"),
    about = "Flatten a project directory into uniquely named copies",
    long_about = "Copies every file of a project into a single flat folder, encoding the original path in each file name, so the project can be bulk-uploaded to chat tools without folder-upload support."
)]
pub struct Args {
    /// Source directory to flatten
    #[clap(required_unless_present = "generate")]
    pub source_dir: Option<String>,

    /// Output directory (defaults to "flatfs_output" inside the source directory)
    #[clap(short = 'o', long = "output")]
    pub output_dir: Option<String>,

    /// Additional patterns to exclude (can be used multiple times)
    #[clap(short = 'e', long = "exclude")]
    pub exclude_patterns: Vec<String>,

    /// Maximum file size in KB (0 disables the limit)
    #[clap(short = 'm', long = "max-size", default_value = "1024")]
    pub max_size_kb: u64,

    /// Include binary files
    #[clap(short = 'b', long)]
    pub include_binary: bool,

    /// Separator for path components in file names
    #[clap(short = 's', long, default_value = "_")]
    pub separator: String,

    /// Ignore .gitignore and .flatfsignore files
    #[clap(long)]
    pub no_gitignore: bool,

    /// Disable the built-in exclude list (VCS, virtual envs, IDE folders)
    #[clap(long)]
    pub no_default_excludes: bool,

    /// Remove existing files in the output directory before writing
    #[clap(long)]
    pub clean: bool,

    /// Number of leading bytes sampled by the binary detector
    #[clap(long, default_value = "8192", hide = true)]
    pub binary_sample_size: usize,

    /// Control-byte ratio above which a file counts as binary
    #[clap(long, default_value = "0.3", hide = true)]
    pub binary_ratio: f32,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[clap(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress output and logging
    #[clap(short = 'q', long)]
    pub quiet: bool,

    /// Generate shell completions
    #[clap(long = "generate", value_enum)]
    pub generate: Option<Shell>,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Directory to flatten
    pub source_dir: PathBuf,

    /// Directory receiving the flat copies and reports
    pub output_dir: PathBuf,

    /// User exclude patterns
    pub exclude_patterns: Vec<String>,

    /// Size limit in bytes; `None` means unlimited
    pub max_file_size: Option<u64>,

    /// Copy binary files instead of skipping them
    pub include_binary: bool,

    /// Replacement for path separators in encoded names
    pub separator: String,

    /// Whether to honour .gitignore/.flatfsignore files
    pub respect_gitignore: bool,

    /// Whether to apply the built-in exclude table
    pub use_default_excludes: bool,

    /// Clear existing output files before writing
    pub clean: bool,

    /// Binary heuristic tunables
    pub binary: BinaryThresholds,
}

impl Config {
    /// Create a configuration with defaults for `source_dir`
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        let source_dir = source_dir.into();
        Self {
            output_dir: source_dir.join(DEFAULT_OUTPUT_DIR),
            source_dir,
            exclude_patterns: Vec::new(),
            max_file_size: Some(1024 * 1024),
            include_binary: false,
            separator: "_".to_string(),
            respect_gitignore: true,
            use_default_excludes: true,
            clean: false,
            binary: BinaryThresholds::default(),
        }
    }

    /// Create configuration from command-line arguments
    pub fn from_args(args: Args) -> Self {
        let source_dir = PathBuf::from(args.source_dir.unwrap_or_else(|| ".".to_string()));
        let output_dir = match args.output_dir {
            Some(dir) => PathBuf::from(dir),
            None => source_dir.join(DEFAULT_OUTPUT_DIR),
        };

        Self {
            source_dir,
            output_dir,
            exclude_patterns: args.exclude_patterns,
            max_file_size: (args.max_size_kb > 0)
                .then(|| args.max_size_kb.saturating_mul(1024)),
            include_binary: args.include_binary,
            separator: args.separator,
            respect_gitignore: !args.no_gitignore,
            use_default_excludes: !args.no_default_excludes,
            clean: args.clean,
            binary: BinaryThresholds {
                sample_size: args.binary_sample_size,
                max_non_text_ratio: args.binary_ratio,
            },
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.source_dir.is_dir(),
            Config,
            "Source directory not found: {}",
            self.source_dir.display()
        );

        // A source that exists but cannot be listed is just as fatal
        fs::read_dir(&self.source_dir).map_err(|e| {
            crate::error!(
                Config,
                "Cannot read source directory {}: {}",
                self.source_dir.display(),
                e
            )
        })?;

        ensure!(
            !self.output_dir.exists() || self.output_dir.is_dir(),
            Config,
            "Output path exists and is not a directory: {}",
            self.output_dir.display()
        );

        ensure!(
            !same_path(&self.source_dir, &self.output_dir),
            Config,
            "Output directory must differ from the source directory: {}",
            self.output_dir.display()
        );

        ensure!(
            is_valid_separator(&self.separator),
            Config,
            "Invalid separator {:?}: must be non-empty and contain no path separators or characters invalid in file names",
            self.separator
        );

        ensure!(
            self.binary.sample_size > 0,
            Config,
            "Binary sample size must be greater than zero"
        );

        ensure!(
            self.binary.max_non_text_ratio > 0.0 && self.binary.max_non_text_ratio <= 1.0,
            Config,
            "Binary ratio must be in (0, 1], got {}",
            self.binary.max_non_text_ratio
        );

        Ok(())
    }
}

/// Compare two paths after resolving them as far as the filesystem allows
pub(crate) fn same_path(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_from_args_defaults() {
        let args = Args::parse_from(["flatfs", "project"]);
        let config = Config::from_args(args);

        assert_eq!(config.source_dir, PathBuf::from("project"));
        assert_eq!(
            config.output_dir,
            PathBuf::from("project").join(DEFAULT_OUTPUT_DIR)
        );
        assert_eq!(config.max_file_size, Some(1024 * 1024));
        assert_eq!(config.separator, "_");
        assert!(config.respect_gitignore);
        assert!(config.use_default_excludes);
        assert!(!config.include_binary);
    }

    #[test]
    fn test_from_args_flags() {
        let args = Args::parse_from([
            "flatfs",
            "src",
            "-o",
            "out",
            "--exclude",
            "*.log",
            "-e",
            "tmp/",
            "--include-binary",
            "--no-gitignore",
            "--max-size",
            "0",
        ]);
        let config = Config::from_args(args);

        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.exclude_patterns, vec!["*.log", "tmp/"]);
        assert!(config.include_binary);
        assert!(!config.respect_gitignore);
        assert_eq!(config.max_file_size, None);
    }

    #[test]
    fn test_huge_max_size_saturates() {
        let huge = (1u64 << 54).to_string();
        let args = Args::parse_from(["flatfs", "src", "--max-size", huge.as_str()]);
        let config = Config::from_args(args);

        assert_eq!(config.max_file_size, Some(u64::MAX));
    }

    #[test]
    fn test_validate_rejects_missing_source() {
        let dir = tempdir().unwrap();
        let config = Config::new(dir.path().join("missing"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_output_equal_to_source() {
        let dir = tempdir().unwrap();
        let mut config = Config::new(dir.path());
        config.output_dir = dir.path().to_path_buf();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_separator() {
        let dir = tempdir().unwrap();
        let mut config = Config::new(dir.path());
        config.separator = "/".to_string();
        assert!(config.validate().is_err());

        config.separator = String::new();
        assert!(config.validate().is_err());

        config.separator = ":".to_string();
        assert!(config.validate().is_err());

        config.separator = "|".to_string();
        assert!(config.validate().is_err());

        config.separator = "--".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_accepts_defaults() {
        let dir = tempdir().unwrap();
        assert!(Config::new(dir.path()).validate().is_ok());
    }
}
