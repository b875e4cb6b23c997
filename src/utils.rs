/*!
 * Utility functions for FlatFS
 */

/// Format a human-readable file size
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

/// Built-in exclude patterns, applied unless disabled in the configuration.
/// Written in ignore-file syntax; none of them can be re-included by negations.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    // Version Control
    ".git",
    ".svn",
    ".hg",
    ".bzr",
    // Python
    "__pycache__",
    "*.pyc",
    "*.pyo",
    ".pytest_cache",
    ".mypy_cache",
    ".ruff_cache",
    ".tox",
    ".nox",
    "venv/",
    ".venv/",
    "env/",
    ".env",
    "virtualenv/",
    ".ipynb_checkpoints",
    // Dependencies
    "node_modules/",
    "bower_components/",
    ".pnpm-store/",
    // IDEs & Editors
    ".idea/",
    ".vscode/",
    ".vs/",
    ".fleet/",
    "*.swp",
    "*.swo",
    "*~",
    // OS Files
    ".DS_Store",
    "Thumbs.db",
    "desktop.ini",
    "ehthumbs.db",
    ".directory",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(512), "512 bytes");
        assert_eq!(format_file_size(2048), "2.00 KB");
        assert_eq!(format_file_size(3 * 1024 * 1024), "3.00 MB");
    }
}
