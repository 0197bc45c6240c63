use std::path::PathBuf;

/// Errors raised while converting or splitting the dataset.
#[derive(Debug, thiserror::Error)]
pub enum DevkitError {
    #[error("Missing input file: {}", path.display())]
    MissingInputFile { path: PathBuf },

    #[error("Couldn't create directory {}: {source}", path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed row {row} in {}: {reason}", file.display())]
    MalformedRow {
        file: PathBuf,
        row: usize,
        reason: String,
    },

    #[error("Failed to read CSV {}: {source}", file.display())]
    Csv {
        file: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Split invariant violated: {0}")]
    SplitInvariant(String),
}

impl DevkitError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error only invalidates the current class directory.
    pub fn is_directory_local(&self) -> bool {
        matches!(self, Self::MissingInputFile { .. })
    }
}

pub type Result<T> = std::result::Result<T, DevkitError>;
