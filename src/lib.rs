/*!
 * FlatFS - Flatten a project directory for bulk upload to LLM chat tools
 *
 * This library copies every accepted file of a project into one flat folder,
 * encoding the original relative path in each file name, and writes a tree
 * and context documents describing what was included.
 */

pub mod binary;
pub mod config;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod report;
pub mod tree;
pub mod types;
pub mod utils;
pub mod writer;


// Re-export main components for easier access
pub use binary::BinaryDetector;
pub use config::{BinaryThresholds, Config};
pub use encoder::PathEncoder;
pub use engine::{flatten, FlattenSummary, Flattener, Phase};
pub use error::{FlatFsError, Result};
pub use matcher::IgnoreMatcher;
pub use report::{ReportFormat, Reporter};
pub use tree::TreeRenderer;
pub use types::{ContextReport, FlatMapping, IgnoreRule, SkipReason, SkippedEntry, SourceEntry};
pub use utils::format_file_size;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
