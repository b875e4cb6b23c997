/*!
 * Flattening engine: traversal, filtering, naming, copying, and reporting
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use indicatif::ProgressBar;
use log::{debug, info, warn};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::binary::BinaryDetector;
use crate::config::Config;
use crate::encoder::PathEncoder;
use crate::error::{Result, ResultExt};
use crate::matcher::IgnoreMatcher;
use crate::tree::TreeRenderer;
use crate::types::{
    path_segments, ContextReport, FlatMapping, SkipReason, SkippedEntry, SourceEntry,
};
use crate::writer::{OutputWriter, REPORT_FILES};
use crate::{ensure, error};

/// Lifecycle of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Scanning,
    Writing,
    ReportGenerated,
    Done,
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct FlattenSummary {
    /// Absolute output directory
    pub output_dir: PathBuf,
    /// Counts, tree, and skipped entries
    pub report: ContextReport,
    /// Every file written, in traversal order
    pub mappings: Vec<FlatMapping>,
    /// Wall time of the whole run
    pub duration: Duration,
}

/// Entries gathered while walking the source tree
#[derive(Debug, Default)]
struct ScanState {
    accepted: Vec<SourceEntry>,
    skipped: Vec<SkippedEntry>,
}

impl ScanState {
    fn skip(&mut self, path: String, is_dir: bool, reason: SkipReason) {
        match &reason {
            SkipReason::Access(_) => warn!("Skipping {}: {}", path, reason),
            _ => debug!("Skipping {}: {}", path, reason),
        }
        self.skipped.push(SkippedEntry {
            path,
            is_dir,
            reason,
        });
    }
}

/// Flattens one source directory into one output directory
pub struct Flattener {
    /// Run configuration
    config: Config,
    /// Progress bar
    pub progress: Arc<ProgressBar>,
    detector: BinaryDetector,
    phase: Phase,
}

impl Flattener {
    /// Create a new flattener
    pub fn new(config: Config, progress: Arc<ProgressBar>) -> Self {
        let detector = BinaryDetector::new(config.binary);
        Self {
            config,
            progress,
            detector,
            phase: Phase::Init,
        }
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Run all phases and return the summary.
    ///
    /// Setup failures abort before anything is written. Once scanning has
    /// started, unreadable or uncopyable entries are recorded in the report
    /// and the run continues.
    pub fn run(&mut self) -> Result<FlattenSummary> {
        let start = Instant::now();
        self.phase = Phase::Init;
        let (root, output_dir) = self.init()?;

        self.transition(Phase::Scanning);
        let mut matcher = IgnoreMatcher::new(&root, &self.config)?;
        if output_dir.starts_with(&root) {
            matcher.reserve(output_dir.clone());
        }
        let mut state = ScanState::default();
        self.scan_dir(&root, &root, &[], &mut matcher, &mut state);
        info!(
            "Scanned {}: {} accepted, {} skipped",
            root.display(),
            state.accepted.len(),
            state.skipped.len()
        );

        self.transition(Phase::Writing);
        let writer = OutputWriter::new(&output_dir);
        let mut encoder = self.prepare_encoder(&output_dir)?;
        let accepted = std::mem::take(&mut state.accepted);
        let (mappings, written) =
            self.write_entries(&root, &accepted, &mut encoder, &writer, &mut state)?;
        info!(
            "Wrote {} files ({} name collisions resolved)",
            mappings.len(),
            encoder.collisions()
        );

        self.transition(Phase::ReportGenerated);
        let project_name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| root.display().to_string());
        let tree = TreeRenderer::new(project_name.as_str())
            .render(written.iter().map(|e| e.segments.as_slice()));
        let mut report = build_report(project_name, root, tree, &mappings, state.skipped);
        report.bytes_included = written.iter().map(|e| e.size).sum();
        writer
            .write_reports(&report, matcher.rules(), &self.config.separator)
            .with_path(&output_dir)?;

        self.transition(Phase::Done);
        Ok(FlattenSummary {
            output_dir,
            report,
            mappings,
            duration: start.elapsed(),
        })
    }

    fn transition(&mut self, next: Phase) {
        debug!("Phase {:?} -> {:?}", self.phase, next);
        self.phase = next;
    }

    /// Validate paths and prepare the output directory
    fn init(&self) -> Result<(PathBuf, PathBuf)> {
        self.config.validate()?;

        let root = fs::canonicalize(&self.config.source_dir).map_err(|e| {
            error!(
                Config,
                "Cannot resolve source directory {}: {}",
                self.config.source_dir.display(),
                e
            )
        })?;

        fs::create_dir_all(&self.config.output_dir).with_path(&self.config.output_dir)?;
        let output_dir =
            fs::canonicalize(&self.config.output_dir).with_path(&self.config.output_dir)?;
        ensure!(
            output_dir != root,
            Config,
            "Output directory must differ from the source directory: {}",
            output_dir.display()
        );

        if self.config.clean {
            self.clean_output(&output_dir)?;
        }

        // Fail now rather than after scanning if nothing can be written
        NamedTempFile::new_in(&output_dir).with_path(&output_dir)?;

        debug!(
            "Flattening {} into {}",
            root.display(),
            output_dir.display()
        );
        Ok((root, output_dir))
    }

    /// Remove regular files directly inside the output directory
    fn clean_output(&self, output_dir: &Path) -> Result<()> {
        for entry in fs::read_dir(output_dir).with_path(output_dir)? {
            let entry = entry.with_path(output_dir)?;
            if entry.file_type().with_path(entry.path())?.is_file() {
                fs::remove_file(entry.path()).with_path(entry.path())?;
            }
        }
        info!("Cleared existing files in {}", output_dir.display());
        Ok(())
    }

    /// Encoder with report names and pre-existing output entries already taken
    fn prepare_encoder(&self, output_dir: &Path) -> Result<PathEncoder> {
        let mut encoder = PathEncoder::new(self.config.separator.as_str());
        for name in REPORT_FILES {
            encoder.occupy(name);
        }
        for entry in fs::read_dir(output_dir).with_path(output_dir)? {
            let entry = entry.with_path(output_dir)?;
            encoder.occupy(&entry.file_name().to_string_lossy());
        }
        Ok(encoder)
    }

    /// Visit one directory: classify its entries, then descend into the
    /// accepted subdirectories (sorted), then queue its accepted files.
    fn scan_dir(
        &self,
        root: &Path,
        dir: &Path,
        rel: &[String],
        matcher: &mut IgnoreMatcher,
        state: &mut ScanState,
    ) {
        matcher.enter_dir(dir, rel.len());
        if !rel.is_empty() {
            self.progress
                .set_message(format!("Scanning {}", rel.join("/")));
        }

        let mut subdirs = Vec::new();
        let mut files = Vec::new();

        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map(|p| relative_display(root, p))
                        .unwrap_or_else(|| rel.join("/"));
                    state.skip(path, true, SkipReason::Access(e.to_string()));
                    continue;
                }
            };

            let mut segments = rel.to_vec();
            segments.push(entry.file_name().to_string_lossy().to_string());
            let rel_path = entry
                .path()
                .strip_prefix(root)
                .unwrap_or_else(|_| entry.path())
                .to_path_buf();
            let display = segments.join("/");

            let file_type = entry.file_type();
            let (is_dir, is_file) = if file_type.is_symlink() {
                match fs::metadata(entry.path()) {
                    Ok(target) => (target.is_dir(), target.is_file()),
                    Err(e) => {
                        state.skip(
                            display,
                            false,
                            SkipReason::Access(format!("broken symbolic link: {}", e)),
                        );
                        continue;
                    }
                }
            } else {
                (file_type.is_dir(), file_type.is_file())
            };

            if let Some(reason) = matcher.check(&rel_path, is_dir) {
                state.skip(display, is_dir, reason);
                continue;
            }

            if is_dir {
                if file_type.is_symlink() {
                    state.skip(
                        display,
                        true,
                        SkipReason::Unsupported("symbolic link to a directory"),
                    );
                } else {
                    subdirs.push((entry.into_path(), segments));
                }
            } else if is_file {
                match self.classify_file(entry.path(), rel_path, segments) {
                    Ok(source) => files.push(source),
                    Err(reason) => state.skip(display, false, reason),
                }
            } else {
                state.skip(display, false, SkipReason::Unsupported("special file"));
            }
        }

        for (path, segments) in subdirs {
            self.scan_dir(root, &path, &segments, matcher, state);
        }

        state.accepted.extend(files);
    }

    /// Apply the size limit and binary heuristic to a file
    fn classify_file(
        &self,
        path: &Path,
        rel_path: PathBuf,
        segments: Vec<String>,
    ) -> std::result::Result<SourceEntry, SkipReason> {
        let metadata = fs::metadata(path).map_err(|e| SkipReason::Access(e.to_string()))?;
        let size = metadata.len();

        if let Some(limit) = self.config.max_file_size {
            if size > limit {
                return Err(SkipReason::TooLarge { size, limit });
            }
        }

        let is_binary = self
            .detector
            .is_binary_file(path)
            .map_err(|e| SkipReason::Access(e.to_string()))?;
        if is_binary && !self.config.include_binary {
            return Err(SkipReason::Binary);
        }

        Ok(SourceEntry {
            path: rel_path,
            segments,
            is_dir: false,
            size,
            is_binary,
        })
    }

    /// Name and copy accepted entries in traversal order
    fn write_entries<'a>(
        &self,
        root: &Path,
        accepted: &'a [SourceEntry],
        encoder: &mut PathEncoder,
        writer: &OutputWriter,
        state: &mut ScanState,
    ) -> Result<(Vec<FlatMapping>, Vec<&'a SourceEntry>)> {
        self.progress.set_length(accepted.len() as u64);
        self.progress.set_position(0);

        let mut mappings = Vec::with_capacity(accepted.len());
        let mut written = Vec::with_capacity(accepted.len());

        for entry in accepted {
            let mapping = encoder.encode(&entry.segments)?;
            self.progress.set_message(mapping.output.clone());

            match writer.copy_file(&root.join(&entry.path), &mapping.output) {
                Ok(_) => {
                    debug!("{} -> {}", mapping.source, mapping.output);
                    mappings.push(mapping);
                    written.push(entry);
                }
                Err(e) => state.skip(entry.rel_path(), false, SkipReason::Access(e.to_string())),
            }
            self.progress.inc(1);
        }

        Ok((mappings, written))
    }
}

fn relative_display(root: &Path, path: &Path) -> String {
    path_segments(path.strip_prefix(root).unwrap_or(path)).join("/")
}

fn build_report(
    project_name: String,
    source_dir: PathBuf,
    tree: String,
    mappings: &[FlatMapping],
    skipped: Vec<SkippedEntry>,
) -> ContextReport {
    let mut report = ContextReport {
        project_name,
        source_dir,
        files_included: mappings.len(),
        collisions_resolved: mappings.iter().filter(|m| m.collided).count(),
        tree,
        ..Default::default()
    };

    for entry in &skipped {
        match entry.reason {
            SkipReason::Ignored { .. } | SkipReason::Unsupported(_) => report.files_excluded += 1,
            SkipReason::Binary => report.binary_excluded += 1,
            SkipReason::TooLarge { .. } => report.oversized_excluded += 1,
            SkipReason::Access(_) => report.access_errors += 1,
        }
    }
    report.skipped = skipped;
    report
}

/// Flatten with a hidden progress bar; convenient for library callers
pub fn flatten(config: Config) -> Result<FlattenSummary> {
    Flattener::new(config, Arc::new(ProgressBar::hidden())).run()
}

