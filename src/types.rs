use serde::Deserialize;
use std::collections::HashSet;

// Number of colour channels written to every record
pub const IMAGE_DEPTH: u32 = 3;

// Placeholder for record fields the CSV cannot provide
pub const UNDEFINED: &str = "UNDEFINED";

pub const DATABASE_NAME: &str = "GTRSB";

// Columns of a GT-<class>.csv file, in order
pub const CSV_COLUMNS: usize = 8;

/// One data row of a GTSRB ground-truth CSV, decoded by position.
///
/// Geometry stays as the CSV text so records repeat it unchanged.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct GtsrbRow {
    pub filename: String,
    pub width: String,
    pub height: String,
    pub roi_x1: String,
    pub roi_y1: String,
    pub roi_x2: String,
    pub roi_y2: String,
    pub class_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundingBox {
    pub xmin: String,
    pub ymin: String,
    pub xmax: String,
    pub ymax: String,
}

/// The annotation of a single image, built from one CSV row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRecord {
    pub original_file_name: String,
    pub class_label: String,
    pub width: String,
    pub height: String,
    pub bndbox: BoundingBox,
    /// `<class>_<originalFileName>`, unique across one conversion run
    pub image_name: String,
}

// Struct to hold the split identifiers for training, validation, and testing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitData {
    pub train: Vec<String>,
    pub val: Vec<String>,
    pub test: Vec<String>,
}

impl SplitData {
    pub fn len(&self) -> usize {
        self.train.len() + self.val.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check that the three sets are pairwise disjoint and together hold `total` identifiers.
    pub fn verify(&self, total: usize) -> crate::error::Result<()> {
        use crate::error::DevkitError;

        if self.len() != total {
            return Err(DevkitError::SplitInvariant(format!(
                "train ({}) + val ({}) + test ({}) != {}",
                self.train.len(),
                self.val.len(),
                self.test.len(),
                total
            )));
        }

        let train: HashSet<&str> = self.train.iter().map(String::as_str).collect();
        let val: HashSet<&str> = self.val.iter().map(String::as_str).collect();
        let test: HashSet<&str> = self.test.iter().map(String::as_str).collect();
        if train.len() + val.len() + test.len() != total {
            return Err(DevkitError::SplitInvariant(
                "duplicate identifier within a set".to_string(),
            ));
        }

        for (name, a, b) in [
            ("train/val", &train, &val),
            ("train/test", &train, &test),
            ("val/test", &val, &test),
        ] {
            if let Some(shared) = a.intersection(b).next() {
                return Err(DevkitError::SplitInvariant(format!(
                    "{} sets share identifier {}",
                    name, shared
                )));
            }
        }
        Ok(())
    }
}

/// Outcome of converting one class directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryOutcome {
    Completed,
    /// The directory was abandoned; rows converted before the failure are kept.
    Aborted(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryStats {
    pub class_label: String,
    pub converted: usize,
    pub outcome: DirectoryOutcome,
}

// Struct to hold processing statistics for a whole conversion run
#[derive(Debug, Default, Clone)]
pub struct ProcessingStats {
    pub directories: Vec<DirectoryStats>,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, stats: DirectoryStats) {
        self.directories.push(stats);
    }

    pub fn images_converted(&self) -> usize {
        self.directories.iter().map(|d| d.converted).sum()
    }

    pub fn directories_completed(&self) -> usize {
        self.directories
            .iter()
            .filter(|d| d.outcome == DirectoryOutcome::Completed)
            .count()
    }

    pub fn directories_aborted(&self) -> usize {
        self.directories.len() - self.directories_completed()
    }

    pub fn print_summary(&self) {
        log::info!("=== Processing Summary ===");
        for dir in &self.directories {
            match &dir.outcome {
                DirectoryOutcome::Completed => {
                    log::info!("{}: {} images converted", dir.class_label, dir.converted)
                }
                DirectoryOutcome::Aborted(reason) => log::warn!(
                    "{}: aborted after {} images ({})",
                    dir.class_label,
                    dir.converted,
                    reason
                ),
            }
        }
        log::info!("Class directories completed: {}", self.directories_completed());
        log::info!("Total images converted: {}", self.images_converted());
        if self.directories_aborted() > 0 {
            log::warn!("Class directories aborted: {}", self.directories_aborted());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_verify_accepts_partition() {
        let split = SplitData {
            train: ids(&["a", "b", "c"]),
            val: ids(&["d"]),
            test: ids(&["e"]),
        };
        assert!(split.verify(5).is_ok());
    }

    #[test]
    fn test_verify_rejects_overlap_and_size_mismatch() {
        let overlapping = SplitData {
            train: ids(&["a", "b"]),
            val: ids(&["c"]),
            test: ids(&["a"]),
        };
        assert!(overlapping.verify(4).is_err());
        assert!(overlapping.verify(3).is_err());
    }

    #[test]
    fn test_stats_counts() {
        let mut stats = ProcessingStats::new();
        stats.record(DirectoryStats {
            class_label: "00000".to_string(),
            converted: 3,
            outcome: DirectoryOutcome::Completed,
        });
        stats.record(DirectoryStats {
            class_label: "00001".to_string(),
            converted: 1,
            outcome: DirectoryOutcome::Aborted("missing image".to_string()),
        });
        assert_eq!(stats.images_converted(), 4);
        assert_eq!(stats.directories_completed(), 1);
        assert_eq!(stats.directories_aborted(), 1);
    }
}
