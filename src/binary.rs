/*!
 * Binary vs. text classification
 */

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::config::BinaryThresholds;

/// Sample-based binary detector
#[derive(Debug, Clone, Copy)]
pub struct BinaryDetector {
    thresholds: BinaryThresholds,
}

impl BinaryDetector {
    pub fn new(thresholds: BinaryThresholds) -> Self {
        Self { thresholds }
    }

    /// Classify a file by reading at most `sample_size` leading bytes
    pub fn is_binary_file(&self, path: &Path) -> io::Result<bool> {
        let file = File::open(path)?;
        let mut buffer = Vec::with_capacity(self.thresholds.sample_size);
        file.take(self.thresholds.sample_size as u64)
            .read_to_end(&mut buffer)?;
        Ok(self.is_binary(&buffer))
    }

    /// Classify a byte sample. Any NUL byte means binary; otherwise the
    /// sample must be UTF-8 (a sequence cut off at the end is fine) with few
    /// control characters.
    pub fn is_binary(&self, bytes: &[u8]) -> bool {
        let sample = &bytes[..bytes.len().min(self.thresholds.sample_size)];
        if sample.is_empty() {
            return false;
        }

        if sample.contains(&0) {
            return true;
        }

        if let Err(e) = std::str::from_utf8(sample) {
            if e.error_len().is_some() {
                return true;
            }
        }

        // Control characters other than \t \n \v \f \r and ESC
        let control = sample
            .iter()
            .filter(|&&b| b < 9 || (b > 13 && b < 32 && b != 27) || b == 127)
            .count();
        let ratio = control as f32 / sample.len() as f32;

        ratio > self.thresholds.max_non_text_ratio
    }
}

impl Default for BinaryDetector {
    fn default() -> Self {
        Self::new(BinaryThresholds::default())
    }
}
