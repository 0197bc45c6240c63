use glob::{glob, Pattern};
use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::DatasetLayout;
use crate::error::{DevkitError, Result};
use crate::types::SplitData;
use crate::utils::{create_output_directory, strip_image_extension};

/// `ImageSets/train.txt`: written as the full image index by the converter,
/// then overwritten with the training split by the splitter.
pub const TRAIN_FILE: &str = "train.txt";
pub const VAL_FILE: &str = "val.txt";
pub const TEST_FILE: &str = "test.txt";

/// Set up the Annotations/, Images/ and ImageSets/ directories of a layout
pub fn setup_output_directories(layout: &DatasetLayout) -> Result<()> {
    create_output_directory(&layout.annotations_dir)?;
    create_output_directory(&layout.images_dir)?;
    create_output_directory(&layout.image_sets_dir)?;
    Ok(())
}

/// Running list of every converted image, one identifier per line.
pub struct ImageIndex {
    path: PathBuf,
    writer: BufWriter<File>,
    entries: usize,
}

impl ImageIndex {
    /// Open `ImageSets/train.txt`, truncating it unless `append` is set
    pub fn open(image_sets_dir: &Path, append: bool) -> Result<Self> {
        let path = image_sets_dir.join(TRAIN_FILE);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(&path)
            .map_err(|e| DevkitError::io(&path, e))?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            entries: 0,
        })
    }

    /// Append `image_name` with its image extension stripped
    pub fn push(&mut self, image_name: &str) -> Result<()> {
        writeln!(self.writer, "{}", strip_image_extension(image_name))
            .map_err(|e| DevkitError::io(&self.path, e))?;
        self.entries += 1;
        Ok(())
    }

    pub fn entries(&self) -> usize {
        self.entries
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn finish(mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| DevkitError::io(&self.path, e))
    }
}

/// Collect the distinct identifiers of all `*<ext>` files in `annotations_dir`, sorted
pub fn collect_identifiers(annotations_dir: &Path, ext: &str) -> Result<Vec<String>> {
    if !annotations_dir.is_dir() {
        return Err(DevkitError::MissingInputFile {
            path: annotations_dir.to_path_buf(),
        });
    }

    let pattern = format!(
        "{}/*{}",
        Pattern::escape(&annotations_dir.to_string_lossy()),
        Pattern::escape(ext)
    );

    let mut identifiers = BTreeSet::new();
    for entry in glob(&pattern)? {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            DevkitError::io(path, e.into_error())
        })?;
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            log::warn!("Skipping non UTF-8 file name: {:?}", path);
            continue;
        };
        if let Some(identifier) = name.strip_suffix(ext) {
            if !identifier.is_empty() {
                identifiers.insert(identifier.to_string());
            }
        }
    }
    Ok(identifiers.into_iter().collect())
}

/// Overwrite `path` with one identifier per line
pub fn write_identifier_list(path: &Path, identifiers: &[String]) -> Result<()> {
    let file = File::create(path).map_err(|e| DevkitError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    for identifier in identifiers {
        writeln!(writer, "{}", identifier).map_err(|e| DevkitError::io(path, e))?;
    }
    writer.flush().map_err(|e| DevkitError::io(path, e))
}

/// Write train.txt, val.txt and test.txt into `image_sets_dir`
pub fn write_split_files(image_sets_dir: &Path, split: &SplitData) -> Result<()> {
    create_output_directory(image_sets_dir)?;
    write_identifier_list(&image_sets_dir.join(TRAIN_FILE), &split.train)?;
    write_identifier_list(&image_sets_dir.join(VAL_FILE), &split.val)?;
    write_identifier_list(&image_sets_dir.join(TEST_FILE), &split.test)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_image_index_truncates_or_appends() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path();

        let mut index = ImageIndex::open(dir, false).unwrap();
        index.push("00000_00000_00000.ppm").unwrap();
        assert_eq!(index.entries(), 1);
        index.finish().unwrap();

        let mut index = ImageIndex::open(dir, true).unwrap();
        index.push("00001_00000_00000.ppm").unwrap();
        index.finish().unwrap();
        assert_eq!(
            fs::read_to_string(dir.join(TRAIN_FILE)).unwrap(),
            "00000_00000_00000\n00001_00000_00000\n"
        );

        let index = ImageIndex::open(dir, false).unwrap();
        index.finish().unwrap();
        assert_eq!(fs::read_to_string(dir.join(TRAIN_FILE)).unwrap(), "");
    }

    #[test]
    fn test_collect_identifiers_filters_and_dedups() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path();
        for name in ["b.xml", "a.xml", "notes.txt", "c.xml.bak"] {
            fs::write(dir.join(name), "").unwrap();
        }
        fs::create_dir(dir.join("nested.xml")).unwrap();

        let ids = collect_identifiers(dir, ".xml").unwrap();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_collect_identifiers_missing_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("Annotations");
        assert!(matches!(
            collect_identifiers(&missing, ".xml"),
            Err(DevkitError::MissingInputFile { .. })
        ));
    }
}
