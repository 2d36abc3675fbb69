use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum FromfileError {
    #[error("cannot derive an identifier from filename: {0}")]
    #[diagnostic(help("expected at least two '_'-separated fields, e.g. GCF_003317655.1_genomic.fna.gz"))]
    MalformedFilename(String),

    #[error("identity mismatch for {identprefix}: existing {existing}, new {incoming}")]
    IdentityMismatch {
        identprefix: String,
        existing: String,
        incoming: String,
    },

    #[error("no taxonomy name for identifier: {0}")]
    UnresolvedName(String),

    #[error("empty sequence header in {0}")]
    MalformedHeader(String),

    #[error("no sequences in {0}")]
    NoSequences(String),

    #[error("no input filenames and no --file-list provided")]
    NoInputs,

    #[error("at least one --taxonomy-db is required")]
    MissingTaxonomy,

    #[error("invalid picklist: {0}")]
    InvalidPicklist(String),

    #[error("invalid moltype: {0}")]
    InvalidMoltype(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid taxonomy source {path}: {message}")]
    Taxonomy { path: String, message: String },

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl FromfileError {
    /// Configuration problems are detected before any input is touched.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            FromfileError::NoInputs
                | FromfileError::MissingTaxonomy
                | FromfileError::InvalidPicklist(_)
                | FromfileError::InvalidMoltype(_)
                | FromfileError::ConfigRead(_)
                | FromfileError::ConfigParse(_)
                | FromfileError::Taxonomy { .. }
        )
    }
}
