use clap::Parser;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default location of the devkit data tree, relative to the invocation directory.
pub const DEFAULT_DATA_DIR: &str = "../../data/traffic_devkit/data";

pub const ANNOTATIONS_DIR: &str = "Annotations";
pub const IMAGES_DIR: &str = "Images";
pub const IMAGE_SETS_DIR: &str = "ImageSets";

/// Command-line arguments for converting GTSRB CSV annotations to XML records.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct ConvertArgs {
    /// Directory containing one subdirectory per class
    pub input_dir: PathBuf,

    /// Directory under which Annotations/, Images/ and ImageSets/ are created
    #[arg(short = 'o', long = "output_dir", default_value = ".")]
    pub output_dir: PathBuf,

    /// Append to an existing ImageSets/train.txt instead of truncating it
    #[arg(long = "append_index")]
    pub append_index: bool,
}

impl ConvertArgs {
    pub fn layout(&self) -> DatasetLayout {
        DatasetLayout::new(&self.input_dir, &self.output_dir)
    }
}

/// Command-line arguments for splitting annotation identifiers into train/val/test sets.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct SplitArgs {
    /// Devkit data directory holding Annotations/ and ImageSets/
    #[arg(short = 'd', long = "data_dir", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Proportion of the dataset kept in the intermediate training pool
    #[arg(long = "train_size", default_value_t = 0.8, value_parser = validate_size)]
    pub train_size: f64,

    /// Proportion of the training pool moved to the validation set
    #[arg(long = "val_size", default_value_t = 0.2, value_parser = validate_size)]
    pub val_size: f64,

    /// Annotation file extension stripped to obtain identifiers
    #[arg(long = "annotation_ext", default_value = ".xml")]
    pub annotation_ext: String,

    /// Seed for random shuffling; omit for a fresh random split
    #[arg(long = "seed")]
    pub seed: Option<u64>,
}

impl SplitArgs {
    pub fn layout(&self) -> DatasetLayout {
        DatasetLayout::new(&self.data_dir, &self.data_dir)
    }

    pub fn split_config(&self) -> SplitConfig {
        SplitConfig {
            train_fraction: self.train_size,
            val_fraction: self.val_size,
            annotation_ext: self.annotation_ext.clone(),
            seed: self.seed,
        }
    }
}

/// Directory tree shared by the converter and the splitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLayout {
    pub root_dir: PathBuf,
    pub annotations_dir: PathBuf,
    pub images_dir: PathBuf,
    pub image_sets_dir: PathBuf,
}

impl DatasetLayout {
    /// `root_dir` is the input tree, `output_dir` receives the three output directories.
    pub fn new(root_dir: &Path, output_dir: &Path) -> Self {
        Self {
            root_dir: root_dir.to_path_buf(),
            annotations_dir: output_dir.join(ANNOTATIONS_DIR),
            images_dir: output_dir.join(IMAGES_DIR),
            image_sets_dir: output_dir.join(IMAGE_SETS_DIR),
        }
    }
}

/// Options of the two-stage split.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitConfig {
    pub train_fraction: f64,
    pub val_fraction: f64,
    pub annotation_ext: String,
    pub seed: Option<u64>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_fraction: 0.8,
            val_fraction: 0.2,
            annotation_ext: ".xml".to_string(),
            seed: None,
        }
    }
}

// Validate that the size is between 0.0 and 1.0
pub fn validate_size(s: &str) -> Result<f64, String> {
    match f64::from_str(s) {
        Ok(val) if (0.0..=1.0).contains(&val) => Ok(val),
        _ => Err("SIZE must be between 0.0 and 1.0".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_size() {
        assert!(validate_size("0.5").is_ok());
        assert!(validate_size("1.0").is_ok());
        assert!(validate_size("0.0").is_ok());
        assert!(validate_size("-0.1").is_err());
        assert!(validate_size("1.1").is_err());
        assert!(validate_size("abc").is_err());
    }

    #[test]
    fn test_layout_places_outputs_under_output_dir() {
        let layout = DatasetLayout::new(Path::new("in"), Path::new("out"));
        assert_eq!(layout.root_dir, PathBuf::from("in"));
        assert_eq!(layout.annotations_dir, PathBuf::from("out/Annotations"));
        assert_eq!(layout.images_dir, PathBuf::from("out/Images"));
        assert_eq!(layout.image_sets_dir, PathBuf::from("out/ImageSets"));
    }

    #[test]
    fn test_split_args_defaults() {
        let args = SplitArgs::parse_from(["split_dataset"]);
        assert_eq!(args.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(args.split_config(), SplitConfig::default());
    }

    #[test]
    fn test_convert_args_require_input_dir() {
        assert!(ConvertArgs::try_parse_from(["csv2xml"]).is_err());
        let args = ConvertArgs::try_parse_from(["csv2xml", "GTSRB/Images"]).unwrap();
        assert_eq!(args.output_dir, PathBuf::from("."));
        assert!(!args.append_index);
    }
}
