use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{DevkitError, Result};

/// Build the globally unique image name `<class>_<originalFileName>`
pub fn synthesize_image_name(class_label: &str, file_name: &str) -> String {
    format!("{}_{}", class_label, file_name)
}

/// Strip the final extension from a file name, e.g. `00000_00001.ppm` -> `00000_00001`.
///
/// Names without an extension (or dot-files like `.hidden`) are returned unchanged.
pub fn strip_image_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

/// File name of the XML record describing `image_name`
pub fn annotation_file_name(image_name: &str) -> String {
    format!("{}.xml", strip_image_extension(image_name))
}

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template(&format!(
            "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
            label
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

/// Create an output directory if it does not exist yet and return its path.
///
/// Existing directories are left untouched.
pub fn create_output_directory(path: &Path) -> Result<PathBuf> {
    if path.is_dir() {
        log::debug!("Directory {:?} already exists.", path);
    } else {
        fs::create_dir_all(path).map_err(|source| DevkitError::DirectoryCreation {
            path: path.to_path_buf(),
            source,
        })?;
    }
    Ok(path.to_path_buf())
}
