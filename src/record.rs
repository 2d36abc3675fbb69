use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::Serialize;

use crate::domain::{Identifiers, Moltype};
use crate::error::FromfileError;

/// One consolidated output row, keyed by identprefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub identprefix: String,
    pub ident: String,
    pub name: String,
    pub genome_filename: Option<String>,
    pub protein_filename: Option<String>,
}

impl FileRecord {
    pub fn new(ids: &Identifiers, name: &str) -> Self {
        Self {
            identprefix: ids.identprefix.clone(),
            ident: ids.ident.clone(),
            name: name.to_string(),
            genome_filename: None,
            protein_filename: None,
        }
    }

    pub fn slot(&self, moltype: Moltype) -> Option<&str> {
        match moltype {
            Moltype::Genome => self.genome_filename.as_deref(),
            Moltype::Protein => self.protein_filename.as_deref(),
        }
    }

    fn slot_mut(&mut self, moltype: Moltype) -> &mut Option<String> {
        match moltype {
            Moltype::Genome => &mut self.genome_filename,
            Moltype::Protein => &mut self.protein_filename,
        }
    }

    /// True when the record cannot be emitted: missing identity or no file at all.
    pub fn is_empty(&self) -> bool {
        self.identprefix.is_empty()
            || self.ident.is_empty()
            || self.name.is_empty()
            || (self.genome_filename.is_none() && self.protein_filename.is_none())
    }

    pub fn missing(&self) -> Vec<Moltype> {
        [Moltype::Genome, Moltype::Protein]
            .into_iter()
            .filter(|moltype| self.slot(*moltype).is_none())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    Created,
    Merged,
    /// Existing record, no slot to fill; identity was still checked.
    Unchanged,
    /// The target slot is already taken; nothing was modified.
    Duplicate { moltype: Moltype, existing: String },
}

/// identprefix -> record, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ConsolidationIndex {
    records: IndexMap<String, FileRecord>,
}

impl ConsolidationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(
        &mut self,
        ids: &Identifiers,
        name: &str,
        moltype: Option<Moltype>,
        filename: &str,
    ) -> Result<MergeOutcome, FromfileError> {
        let record = match self.records.entry(ids.identprefix.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let mut record = FileRecord::new(ids, name);
                if let Some(moltype) = moltype {
                    *record.slot_mut(moltype) = Some(filename.to_string());
                }
                entry.insert(record);
                return Ok(MergeOutcome::Created);
            }
        };

        if record.ident != ids.ident || record.name != name {
            return Err(FromfileError::IdentityMismatch {
                identprefix: ids.identprefix.clone(),
                existing: format!("{} ({})", record.ident, record.name),
                incoming: format!("{} ({})", ids.ident, name),
            });
        }

        let Some(moltype) = moltype else {
            return Ok(MergeOutcome::Unchanged);
        };
        let slot = record.slot_mut(moltype);
        if let Some(existing) = slot.as_ref() {
            return Ok(MergeOutcome::Duplicate {
                moltype,
                existing: existing.clone(),
            });
        }
        *slot = Some(filename.to_string());
        Ok(MergeOutcome::Merged)
    }

    pub fn get(&self, identprefix: &str) -> Option<&FileRecord> {
        self.records.get(identprefix)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.values()
    }
}
