use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use camino::Utf8Path;
use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::FromfileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Moltype {
    Genome,
    Protein,
}

impl Moltype {
    /// Slot implied by a sequence file extension, if any.
    pub fn from_filename(filename: &str) -> Option<Self> {
        if filename.ends_with(".fna.gz") || filename.ends_with(".fna") {
            Some(Moltype::Genome)
        } else if filename.ends_with(".faa.gz") || filename.ends_with(".faa") {
            Some(Moltype::Protein)
        } else {
            None
        }
    }
}

impl fmt::Display for Moltype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Moltype::Genome => write!(f, "genome"),
            Moltype::Protein => write!(f, "protein"),
        }
    }
}

impl FromStr for Moltype {
    type Err = FromfileError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "genome" | "dna" => Ok(Moltype::Genome),
            "protein" => Ok(Moltype::Protein),
            _ => Err(FromfileError::InvalidMoltype(value.to_string())),
        }
    }
}

/// How a file is attributed to an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentMode {
    /// `GCF_003317655.1_genomic.fna.gz` -> `GCF_003317655.1`; name from taxonomy.
    Accession,
    /// First token of the first sequence header; name is the whole header.
    Header,
    /// Base name with sequence extensions stripped, used for every field.
    FilenameStem,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifiers {
    pub identprefix: String,
    pub ident: String,
}

impl Identifiers {
    pub fn from_ident(ident: &str) -> Self {
        Self {
            identprefix: identprefix_of(ident).to_string(),
            ident: ident.to_string(),
        }
    }

    /// Splits the base name on `_` and keeps the first two fields.
    pub fn from_filename(filename: &str) -> Result<Self, FromfileError> {
        let basename = basename(filename);
        let fields = basename.split('_').collect::<Vec<_>>();
        if fields.len() < 2 {
            return Err(FromfileError::MalformedFilename(filename.to_string()));
        }
        let ident = fields[..2].join("_");
        Ok(Self::from_ident(&ident))
    }
}

/// Drops a version suffix: everything from the first `.` on.
pub fn identprefix_of(ident: &str) -> &str {
    match ident.split_once('.') {
        Some((prefix, _)) => prefix,
        None => ident,
    }
}

pub fn basename(filename: &str) -> &str {
    Utf8Path::new(filename).file_name().unwrap_or(filename)
}

pub fn remove_extension(basename: &str) -> &str {
    const EXTENSIONS: [&str; 4] = [".fa", ".gz", ".faa", ".fna"];
    let mut stem = basename;
    while let Some(stripped) = EXTENSIONS.iter().find_map(|ext| stem.strip_suffix(ext)) {
        if stripped.is_empty() {
            break;
        }
        stem = stripped;
    }
    stem
}

pub fn looks_like_accession(ident: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^GC[AF]_\d+(\.\d+)?$").expect("valid accession regex"))
        .is_match(ident)
}
