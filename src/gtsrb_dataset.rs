use log::{debug, error, info, warn};
use std::fs;
use std::path::Path;

use crate::config::DatasetLayout;
use crate::conversion::{copy_image, decode_row, gtsrb_csv_path, open_gtsrb_csv, write_annotation};
use crate::error::{DevkitError, Result};
use crate::io::{setup_output_directories, ImageIndex};
use crate::types::{AnnotationRecord, DirectoryOutcome, DirectoryStats, ProcessingStats};
use crate::utils::create_progress_bar;

/// Names of the class subdirectories of `root_dir`, sorted
pub fn list_class_directories(root_dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(root_dir).map_err(|e| DevkitError::io(root_dir, e))?;
    let mut classes = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| DevkitError::io(root_dir, e))?;
        if !entry.path().is_dir() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => classes.push(name),
            Err(name) => warn!("Skipping non UTF-8 directory name: {:?}", name),
        }
    }
    classes.sort();
    Ok(classes)
}

/// Convert the rows of one class directory, stopping at the first failure.
///
/// Returns the number of images converted alongside the first error, if any.
fn convert_rows(
    layout: &DatasetLayout,
    class_label: &str,
    index: &mut ImageIndex,
) -> (usize, Option<DevkitError>) {
    let csv_path = gtsrb_csv_path(&layout.root_dir, class_label);
    let mut reader = match open_gtsrb_csv(&csv_path) {
        Ok(reader) => reader,
        Err(e) => return (0, Some(e)),
    };

    let mut converted = 0;
    for (idx, result) in reader.records().enumerate() {
        let outcome = result
            .map_err(|source| DevkitError::Csv {
                file: csv_path.clone(),
                source,
            })
            .and_then(|record| decode_row(&csv_path, idx + 1, &record))
            .and_then(|row| {
                let record = AnnotationRecord::from_row(class_label, &row);
                copy_image(&record, &layout.root_dir, &layout.images_dir)?;
                index.push(&record.image_name)?;
                write_annotation(&record, &layout.annotations_dir)?;
                debug!("Converted {}", record.image_name);
                Ok(())
            });
        if let Err(e) = outcome {
            return (converted, Some(e));
        }
        converted += 1;
    }
    (converted, None)
}

/// Convert one class directory.
///
/// Errors local to the directory (a missing CSV or image) are folded into the
/// returned stats; every other error aborts the run.
pub fn process_class_directory(
    layout: &DatasetLayout,
    class_label: &str,
    index: &mut ImageIndex,
) -> Result<DirectoryStats> {
    let (converted, failure) = convert_rows(layout, class_label, index);
    let outcome = match failure {
        None => DirectoryOutcome::Completed,
        Some(e) if e.is_directory_local() => {
            error!("Directory {} skipped: {}", class_label, e);
            DirectoryOutcome::Aborted(e.to_string())
        }
        Some(e) => return Err(e),
    };
    Ok(DirectoryStats {
        class_label: class_label.to_string(),
        converted,
        outcome,
    })
}

/// Main conversion pipeline: every class directory under `layout.root_dir`
/// becomes XML records in Annotations/, renamed images in Images/ and lines
/// in ImageSets/train.txt.
pub fn process_dataset(layout: &DatasetLayout, append_index: bool) -> Result<ProcessingStats> {
    if !layout.root_dir.is_dir() {
        return Err(DevkitError::MissingInputFile {
            path: layout.root_dir.clone(),
        });
    }

    setup_output_directories(layout)?;
    let mut index = ImageIndex::open(&layout.image_sets_dir, append_index)?;

    let classes = list_class_directories(&layout.root_dir)?;
    info!(
        "Found {} class directories in {}",
        classes.len(),
        layout.root_dir.display()
    );

    let mut stats = ProcessingStats::new();
    let pb = create_progress_bar(classes.len() as u64, "Classes");
    for class_label in &classes {
        let dir_stats = process_class_directory(layout, class_label, &mut index)?;
        stats.record(dir_stats);
        pb.inc(1);
    }
    pb.finish_with_message("Conversion complete");

    info!(
        "Wrote {} index entries to {}",
        index.entries(),
        index.path().display()
    );
    index.finish()?;
    Ok(stats)
}
