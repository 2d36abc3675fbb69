use std::collections::HashMap;
use std::fs::File;

use tracing::{info, warn};

use crate::domain::identprefix_of;
use crate::error::FromfileError;

pub trait NameResolver {
    /// Display name for a version-stripped identifier.
    fn resolve(&self, identprefix: &str) -> Result<String, FromfileError>;
}

const IDENT_COLUMNS: [&str; 2] = ["ident", "accession"];

/// Rank columns from least to most specific; `domain` is the GTDB spelling.
const RANK_COLUMNS: [&[&str]; 8] = [
    &["superkingdom", "domain"],
    &["phylum"],
    &["class"],
    &["order"],
    &["family"],
    &["genus"],
    &["species"],
    &["strain"],
];

/// Lineage spreadsheets keyed by identprefix, consulted in load order.
#[derive(Debug, Clone, Default)]
pub struct LineageDb {
    sources: Vec<HashMap<String, Vec<String>>>,
}

impl LineageDb {
    pub fn load<P: AsRef<str>>(paths: &[P]) -> Result<Self, FromfileError> {
        let mut db = Self::default();
        for path in paths {
            let path = path.as_ref();
            let file = File::open(path).map_err(|err| FromfileError::Taxonomy {
                path: path.to_string(),
                message: err.to_string(),
            })?;
            db.add_source(path, file)?;
        }
        Ok(db)
    }

    pub fn add_source<R: std::io::Read>(
        &mut self,
        label: &str,
        reader: R,
    ) -> Result<usize, FromfileError> {
        let taxonomy_err = |message: String| FromfileError::Taxonomy {
            path: label.to_string(),
            message,
        };

        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader
            .headers()
            .map_err(|err| taxonomy_err(err.to_string()))?
            .clone();
        let ident_column = headers
            .iter()
            .position(|name| IDENT_COLUMNS.contains(&name.trim()))
            .ok_or_else(|| taxonomy_err("no 'ident' or 'accession' column".to_string()))?;
        let rank_columns = RANK_COLUMNS
            .iter()
            .filter_map(|names| headers.iter().position(|name| names.contains(&name.trim())))
            .collect::<Vec<_>>();
        if rank_columns.is_empty() {
            return Err(taxonomy_err("no lineage rank columns".to_string()));
        }

        let mut lineages = HashMap::new();
        for row in reader.records() {
            let row = row.map_err(|err| taxonomy_err(err.to_string()))?;
            let Some(ident) = row.get(ident_column).map(str::trim) else {
                continue;
            };
            if ident.is_empty() {
                continue;
            }
            let lineage = rank_columns
                .iter()
                .map(|idx| row.get(*idx).unwrap_or("").trim().to_string())
                .collect::<Vec<_>>();
            let key = identprefix_of(ident).to_string();
            if lineages.insert(key, lineage).is_some() {
                warn!("duplicate lineage for '{ident}' in {label}; keeping the last one");
            }
        }

        let count = lineages.len();
        info!("loaded {count} lineages from '{label}'");
        self.sources.push(lineages);
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.sources.iter().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn lineage(&self, identprefix: &str) -> Option<&[String]> {
        self.sources
            .iter()
            .find_map(|source| source.get(identprefix))
            .map(Vec::as_slice)
    }
}

impl NameResolver for LineageDb {
    fn resolve(&self, identprefix: &str) -> Result<String, FromfileError> {
        let lineage = self
            .lineage(identprefix)
            .ok_or_else(|| FromfileError::UnresolvedName(identprefix.to_string()))?;
        lineage
            .iter()
            .rev()
            .find(|name| !name.is_empty())
            .cloned()
            .ok_or_else(|| FromfileError::UnresolvedName(identprefix.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const LINEAGES: &str = "\
ident,superkingdom,phylum,class,order,family,genus,species,strain
GCF_000001.1,d__Bacteria,p__Pseudomonadota,c__Gammaproteobacteria,o__Enterobacterales,f__Enterobacteriaceae,g__Escherichia,s__Escherichia coli,
GCA_000002.2,d__Bacteria,p__Bacillota,,,,,,
";

    #[test]
    fn most_specific_rank_wins() {
        let mut db = LineageDb::default();
        db.add_source("inline", LINEAGES.as_bytes()).unwrap();
        assert_eq!(db.resolve("GCF_000001").unwrap(), "s__Escherichia coli");
        assert_eq!(db.resolve("GCA_000002").unwrap(), "p__Bacillota");
    }

    #[test]
    fn unknown_identifier_is_unresolved() {
        let mut db = LineageDb::default();
        db.add_source("inline", LINEAGES.as_bytes()).unwrap();
        let err = db.resolve("GCF_999999").unwrap_err();
        assert_matches!(err, FromfileError::UnresolvedName(_));
    }
}
