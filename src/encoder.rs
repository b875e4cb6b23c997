/*!
 * Path-to-filename encoding with run-scoped collision resolution
 */

use std::collections::HashSet;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::bail;
use crate::error::Result;
use crate::types::FlatMapping;

/// Characters that are invalid in file names on at least one common platform
static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"|?*\\\x00-\x1f]"#).expect("valid regex"));

/// Whether `separator` can appear verbatim between path segments
pub fn is_valid_separator(separator: &str) -> bool {
    !separator.is_empty() && !separator.contains('/') && !UNSAFE_CHARS.is_match(separator)
}

/// Hash prefix lengths tried in order when a baseline name is taken
const HASH_WIDTHS: [usize; 3] = [6, 10, 16];

/// Assigns unique flat file names for one run.
///
/// Names are compared case-insensitively so the output stays unique on
/// case-insensitive filesystems and upload targets.
#[derive(Debug, Clone)]
pub struct PathEncoder {
    separator: String,
    occupied: HashSet<String>,
    collisions: usize,
}

impl PathEncoder {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
            occupied: HashSet::new(),
            collisions: 0,
        }
    }

    /// Mark a name as taken, e.g. a file already present in the output directory
    pub fn occupy(&mut self, name: &str) {
        self.occupied.insert(name.to_lowercase());
    }

    /// Number of baseline names that had to be disambiguated
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    /// Name derived purely from the path, before collision handling
    pub fn baseline(&self, segments: &[String]) -> String {
        segments
            .iter()
            .map(|s| UNSAFE_CHARS.replace_all(s, "_"))
            .collect::<Vec<_>>()
            .join(self.separator.as_str())
    }

    /// Encode a relative path into a name not used before in this run
    pub fn encode(&mut self, segments: &[String]) -> Result<FlatMapping> {
        let source = segments.join("/");
        let base = self.baseline(segments);

        if self.claim(&base) {
            return Ok(FlatMapping {
                source,
                output: base,
                collided: false,
            });
        }

        self.collisions += 1;
        let last = self.baseline(&segments[segments.len().saturating_sub(1)..]);
        let ext = extension(&last);
        let stem = match ext {
            Some(ext) => &base[..base.len() - ext.len() - 1],
            None => base.as_str(),
        };
        let hash = path_hash(&source);

        for width in HASH_WIDTHS {
            let candidate = with_suffix(stem, &hash[..width], ext);
            if self.claim(&candidate) {
                debug!("Collision on {}: {} -> {}", source, base, candidate);
                return Ok(FlatMapping {
                    source,
                    output: candidate,
                    collided: true,
                });
            }
        }

        // At most `occupied.len()` of these distinct candidates can be taken
        let limit = self.occupied.len() + 1;
        for n in 1..=limit {
            let suffix = format!("{}_{}", &hash[..HASH_WIDTHS[0]], n);
            let candidate = with_suffix(stem, &suffix, ext);
            if self.claim(&candidate) {
                debug!("Collision on {}: {} -> {}", source, base, candidate);
                return Ok(FlatMapping {
                    source,
                    output: candidate,
                    collided: true,
                });
            }
        }

        bail!(Conflict, "no free name for {} after {} attempts", source, limit)
    }

    fn claim(&mut self, name: &str) -> bool {
        self.occupied.insert(name.to_lowercase())
    }
}

/// Hex SHA-256 of a `/`-separated relative path
pub fn path_hash(rel_path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(rel_path.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Extension of a file name the way `Path::extension` sees it:
/// a leading dot does not start an extension.
fn extension(name: &str) -> Option<&str> {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => Some(&name[idx + 1..]),
        _ => None,
    }
}

fn with_suffix(stem: &str, suffix: &str, ext: Option<&str>) -> String {
    match ext {
        Some(ext) => format!("{}_{}.{}", stem, suffix, ext),
        None => format!("{}_{}", stem, suffix),
    }
}
