//! Sequential file name allocation.
//!
//! Augmented images are named `<prefix><zero-padded number>.<extension>`,
//! e.g. `IMG0000042.jpg`. The allocator learns which numbers are taken from
//! one directory scan (plus any names reserved explicitly) and hands out the
//! lowest free numbers first, so gaps are filled before the sequence grows.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::AugmentError;

/// The naming scheme for allocated files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilenamePattern {
    pub prefix: String,
    pub digits: u32,
    /// Extension of allocated names, without the dot.
    pub extension: String,
}

impl Default for FilenamePattern {
    fn default() -> Self {
        Self {
            prefix: "IMG".to_string(),
            digits: 7,
            extension: "jpg".to_string(),
        }
    }
}

impl FilenamePattern {
    /// Largest number the pattern can express.
    pub fn max_number(&self) -> u64 {
        10u64.saturating_pow(self.digits).saturating_sub(1)
    }

    /// Formats number `n` as a file name.
    pub fn format(&self, n: u64) -> String {
        format!(
            "{}{:0width$}.{}",
            self.prefix,
            n,
            self.extension,
            width = self.digits as usize
        )
    }

    /// Extracts the number from a name matching the pattern, whatever its
    /// extension.
    ///
    /// ```
    /// use augsync::naming::FilenamePattern;
    ///
    /// let pattern = FilenamePattern::default();
    /// assert_eq!(pattern.parse_number("IMG0000012.png"), Some(12));
    /// assert_eq!(pattern.parse_number("IMG12.jpg"), None);
    /// ```
    pub fn parse_number(&self, name: &str) -> Option<u64> {
        let stem = match name.rsplit_once('.') {
            Some((stem, _ext)) => stem,
            None => name,
        };
        let digits = stem.strip_prefix(self.prefix.as_str())?;
        if digits.len() != self.digits as usize || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    pub fn validate(&self) -> Result<(), AugmentError> {
        if !(1..=18).contains(&self.digits) {
            return Err(AugmentError::InvalidConfig {
                message: format!("naming digits must be between 1 and 18, got {}", self.digits),
            });
        }
        let bad_char = |c: char| matches!(c, '.' | '/' | '\\');
        if self.extension.is_empty() || self.extension.contains(bad_char) {
            return Err(AugmentError::InvalidConfig {
                message: format!("invalid naming extension '{}'", self.extension),
            });
        }
        if self.prefix.contains(|c: char| c != '.' && bad_char(c)) {
            return Err(AugmentError::InvalidConfig {
                message: format!("invalid naming prefix '{}'", self.prefix),
            });
        }
        Ok(())
    }
}

impl fmt::Display for FilenamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}.{}",
            self.prefix,
            "#".repeat(self.digits as usize),
            self.extension
        )
    }
}

/// Hands out unused file names in increasing order.
#[derive(Clone, Debug)]
pub struct FilenameAllocator {
    pattern: FilenamePattern,
    dir: PathBuf,
    used: BTreeSet<u64>,
}

impl FilenameAllocator {
    /// Creates an allocator with no numbers taken. `dir` is only used in
    /// error messages.
    pub fn new(pattern: FilenamePattern, dir: impl Into<PathBuf>) -> Self {
        Self {
            pattern,
            dir: dir.into(),
            used: BTreeSet::new(),
        }
    }

    /// Scans the top level of `dir` once and marks every matching file's
    /// number as taken.
    pub fn scan_dir(pattern: FilenamePattern, dir: &Path) -> Result<Self, AugmentError> {
        let mut allocator = Self::new(pattern, dir);

        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|source| AugmentError::ImageDirInvalid {
                path: dir.to_path_buf(),
                message: format!("failed while scanning directory: {source}"),
            })?;
            if let Some(name) = entry.file_name().to_str() {
                allocator.reserve(name);
            }
        }

        Ok(allocator)
    }

    /// Marks the number in `name` as taken. Returns `false` if the name does
    /// not follow the pattern.
    pub fn reserve(&mut self, name: &str) -> bool {
        match self.pattern.parse_number(name) {
            Some(n) => {
                self.used.insert(n);
                true
            }
            None => false,
        }
    }

    /// How many names can still be allocated.
    pub fn available(&self) -> u64 {
        let max = self.pattern.max_number();
        let taken = self.used.range(1..=max).count() as u64;
        max - taken
    }

    /// Allocates `count` fresh names, lowest free numbers first.
    ///
    /// Numbering starts at 1. The returned names are strictly increasing and
    /// are marked as taken.
    ///
    /// # Errors
    ///
    /// [`AugmentError::AllocationExhausted`] if fewer than `count` numbers
    /// are free; nothing is allocated in that case.
    pub fn allocate(&mut self, count: usize) -> Result<Vec<String>, AugmentError> {
        let available = self.available();
        if (count as u64) > available {
            return Err(AugmentError::AllocationExhausted {
                path: self.dir.clone(),
                requested: count,
                available: available as usize,
            });
        }

        let mut numbers = Vec::with_capacity(count);
        let mut candidate = 1u64;
        while numbers.len() < count {
            if !self.used.contains(&candidate) {
                numbers.push(candidate);
            }
            candidate += 1;
        }

        self.used.extend(numbers.iter().copied());
        Ok(numbers.into_iter().map(|n| self.pattern.format(n)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn fills_gaps_before_extending() {
        let mut alloc = FilenameAllocator::new(FilenamePattern::default(), "images");
        alloc.reserve("IMG0000001.jpg");
        alloc.reserve("IMG0000003.jpg");
        assert_eq!(
            alloc.allocate(2).unwrap(),
            vec!["IMG0000002.jpg", "IMG0000004.jpg"]
        );
        assert_eq!(alloc.allocate(1).unwrap(), vec!["IMG0000005.jpg"]);
    }

    #[test]
    fn scan_counts_any_extension_and_ignores_other_names() {
        let dir = tempfile::tempdir().expect("create temp dir");
        for name in ["IMG0000001.png", "IMG0000002.jpg", "notes.txt", "IMG42.jpg"] {
            fs::write(dir.path().join(name), b"x").expect("write file");
        }
        fs::create_dir(dir.path().join("IMG0000003.jpg")).expect("create dir");
        fs::write(dir.path().join("IMG0000003.jpg").join("IMG0000004.jpg"), b"x")
            .expect("write nested file");

        let mut alloc =
            FilenameAllocator::scan_dir(FilenamePattern::default(), dir.path()).unwrap();
        // Top-level directory entries count, nested files do not.
        assert_eq!(
            alloc.allocate(2).unwrap(),
            vec!["IMG0000004.jpg", "IMG0000005.jpg"]
        );
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let err = FilenameAllocator::scan_dir(FilenamePattern::default(), &dir.path().join("nope"))
            .unwrap_err();
        assert!(matches!(err, AugmentError::ImageDirInvalid { .. }));
    }

    #[test]
    fn exhaustion_is_reported_up_front() {
        let pattern = FilenamePattern {
            prefix: "A".into(),
            digits: 1,
            extension: "png".into(),
        };
        let mut alloc = FilenameAllocator::new(pattern, "d");
        alloc.reserve("A3.png");
        assert_eq!(alloc.available(), 8);

        let err = alloc.allocate(9).unwrap_err();
        assert!(matches!(
            err,
            AugmentError::AllocationExhausted {
                requested: 9,
                available: 8,
                ..
            }
        ));
        // Nothing was consumed by the failed request.
        assert_eq!(alloc.allocate(8).unwrap().len(), 8);
        assert_eq!(alloc.available(), 0);
    }

    #[test]
    fn zero_is_never_allocated() {
        let mut alloc = FilenameAllocator::new(FilenamePattern::default(), "d");
        alloc.reserve("IMG0000000.jpg");
        assert_eq!(alloc.allocate(1).unwrap(), vec!["IMG0000001.jpg"]);
    }

    #[test]
    fn pattern_validation() {
        assert!(FilenamePattern::default().validate().is_ok());
        let bad = FilenamePattern {
            digits: 0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let bad = FilenamePattern {
            extension: ".jpg".into(),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
