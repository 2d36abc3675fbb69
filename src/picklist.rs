use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::str::FromStr;

use serde::Serialize;
use tracing::info;

use crate::domain::identprefix_of;
use crate::error::FromfileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PickStyle {
    Include,
    Exclude,
}

/// Which form of the identifier the picklist values are matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Ident,
    IdentPrefix,
}

impl ColumnKind {
    pub fn normalize<'a>(&self, value: &'a str) -> &'a str {
        let value = value.trim();
        match self {
            ColumnKind::Ident => value.split_whitespace().next().unwrap_or(""),
            ColumnKind::IdentPrefix => identprefix_of(value),
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Ident => write!(f, "ident"),
            ColumnKind::IdentPrefix => write!(f, "identprefix"),
        }
    }
}

/// Parsed `FILE:COLUMN:KIND[:STYLE]` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PicklistSpec {
    pub path: String,
    pub column: String,
    pub kind: ColumnKind,
    pub style: PickStyle,
}

impl FromStr for PicklistSpec {
    type Err = FromfileError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parts = value.trim().split(':').collect::<Vec<_>>();
        if parts.len() != 3 && parts.len() != 4 {
            return Err(FromfileError::InvalidPicklist(format!(
                "'{value}' must be FILE:COLUMN:KIND[:STYLE]"
            )));
        }
        if parts[0].is_empty() || parts[1].is_empty() {
            return Err(FromfileError::InvalidPicklist(format!(
                "'{value}' is missing a file or column name"
            )));
        }
        let kind = match parts[2] {
            "ident" => ColumnKind::Ident,
            "identprefix" => ColumnKind::IdentPrefix,
            other => {
                return Err(FromfileError::InvalidPicklist(format!(
                    "column kind '{other}' is not supported; use ident or identprefix"
                )));
            }
        };
        let style = match parts.get(3).copied() {
            None | Some("include") => PickStyle::Include,
            Some("exclude") => PickStyle::Exclude,
            Some(other) => {
                return Err(FromfileError::InvalidPicklist(format!(
                    "pick style '{other}' is not supported; use include or exclude"
                )));
            }
        };
        Ok(Self {
            path: parts[0].to_string(),
            column: parts[1].to_string(),
            kind,
            style,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Picklist {
    pub kind: ColumnKind,
    pub style: PickStyle,
    pickset: HashSet<String>,
    found: HashSet<String>,
    n_queries: usize,
}

impl Picklist {
    pub fn new(
        kind: ColumnKind,
        style: PickStyle,
        values: impl IntoIterator<Item = String>,
    ) -> Self {
        let pickset = values
            .into_iter()
            .map(|value| kind.normalize(&value).to_string())
            .filter(|value| !value.is_empty())
            .collect();
        Self {
            kind,
            style,
            pickset,
            found: HashSet::new(),
            n_queries: 0,
        }
    }

    pub fn load(spec: &PicklistSpec) -> Result<Self, FromfileError> {
        let file = File::open(&spec.path)
            .map_err(|err| FromfileError::InvalidPicklist(format!("open {}: {err}", spec.path)))?;
        let mut reader = csv::Reader::from_reader(file);
        let headers = reader
            .headers()
            .map_err(|err| FromfileError::Csv(err.to_string()))?;
        let column = headers
            .iter()
            .position(|name| name == spec.column)
            .ok_or_else(|| {
                FromfileError::InvalidPicklist(format!(
                    "column '{}' not found in {}",
                    spec.column, spec.path
                ))
            })?;

        let mut values = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|err| FromfileError::Csv(err.to_string()))?;
            if let Some(value) = row.get(column) {
                values.push(value.to_string());
            }
        }

        let picklist = Self::new(spec.kind, spec.style, values);
        info!(
            "loaded {} distinct {} values from picklist '{}'",
            picklist.len(),
            spec.kind,
            spec.path
        );
        Ok(picklist)
    }

    pub fn len(&self) -> usize {
        self.pickset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pickset.is_empty()
    }

    pub fn n_queries(&self) -> usize {
        self.n_queries
    }

    pub fn found(&self) -> &HashSet<String> {
        &self.found
    }

    fn query(&mut self, ident: &str) -> bool {
        self.n_queries += 1;
        let key = self.kind.normalize(ident);
        let present = self.pickset.contains(key);
        let passes = match self.style {
            PickStyle::Include => present,
            PickStyle::Exclude => !present,
        };
        if passes {
            self.found.insert(key.to_string());
        }
        passes
    }

    /// Include-mode values that no queried identifier ever matched, sorted.
    pub fn unmatched(&self) -> Vec<&str> {
        if self.style == PickStyle::Exclude {
            return Vec::new();
        }
        let mut missing = self
            .pickset
            .iter()
            .filter(|value| !self.found.contains(*value))
            .map(String::as_str)
            .collect::<Vec<_>>();
        missing.sort_unstable();
        missing
    }
}

/// Gate applied to every full identifier before it reaches the merger.
#[derive(Debug, Clone, Default)]
pub struct InclusionFilter {
    picklist: Option<Picklist>,
}

impl InclusionFilter {
    pub fn new(picklist: Option<Picklist>) -> Self {
        Self { picklist }
    }

    pub fn include(&mut self, ident: &str) -> bool {
        match self.picklist.as_mut() {
            Some(picklist) => picklist.query(ident),
            None => true,
        }
    }

    pub fn picklist(&self) -> Option<&Picklist> {
        self.picklist.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_spec_defaults_to_include() {
        let spec: PicklistSpec = "picks.csv:ident:ident".parse().unwrap();
        assert_eq!(spec.kind, ColumnKind::Ident);
        assert_eq!(spec.style, PickStyle::Include);
    }

    #[test]
    fn parse_spec_rejects_other_kinds() {
        let err = "picks.csv:md5:md5".parse::<PicklistSpec>().unwrap_err();
        assert_matches!(err, FromfileError::InvalidPicklist(_));
    }

    #[test]
    fn identprefix_values_are_version_stripped() {
        let mut picklist = Picklist::new(
            ColumnKind::IdentPrefix,
            PickStyle::Include,
            vec!["GCF_000001.3".to_string()],
        );
        assert!(picklist.query("GCF_000001.1"));
        assert!(picklist.unmatched().is_empty());
    }
}
