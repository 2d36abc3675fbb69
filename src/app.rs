use std::collections::BTreeMap;
use std::path::Path;
use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{self, IdentMode, Identifiers, Moltype};
use crate::error::FromfileError;
use crate::fs_util;
use crate::output::RecordSink;
use crate::picklist::{ColumnKind, InclusionFilter, PickStyle};
use crate::record::{ConsolidationIndex, MergeOutcome};
use crate::report::{AnomalyKind, ErrorReporter};
use crate::taxonomy::NameResolver;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub mode: IdentMode,
    pub strict: bool,
    pub ident_in_name: bool,
    pub default_moltype: Option<Moltype>,
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            mode: IdentMode::Accession,
            strict: false,
            ident_in_name: false,
            default_moltype: None,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Inputs {
    pub filenames: Vec<String>,
    pub file_lists: Vec<Utf8PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunPhase {
    Init,
    Loading,
    PerFileProcessing,
    Finalizing,
    Reporting,
    Done,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub phase: RunPhase,
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Debug, Clone, Serialize)]
pub struct PicklistCoverage {
    pub style: PickStyle,
    pub kind: ColumnKind,
    pub requested: usize,
    pub found: usize,
    pub queries: usize,
    pub unmatched: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub processed: usize,
    pub records: usize,
    pub emitted: usize,
    pub written: usize,
    pub skipped_by_picklist: usize,
    pub strict: bool,
    pub dry_run: bool,
    pub is_problem: bool,
    pub anomalies: BTreeMap<AnomalyKind, usize>,
    pub picklist: Option<PicklistCoverage>,
    pub generated_at: String,
}

impl RunSummary {
    /// Recoverable anomalies only change the exit status in strict mode.
    pub fn failed(&self) -> bool {
        self.is_problem && self.strict
    }

    pub fn anomaly_count(&self, kind: AnomalyKind) -> usize {
        self.anomalies.get(&kind).copied().unwrap_or(0)
    }
}

#[derive(Debug, Default)]
struct Counters {
    processed: usize,
    skipped_by_picklist: usize,
    emitted: usize,
}

/// Drives one consolidation run. Everything it owns is scoped to that run.
pub struct App<R: NameResolver> {
    resolver: R,
    filter: InclusionFilter,
    options: RunOptions,
    phase: RunPhase,
}

impl<R: NameResolver> App<R> {
    pub fn new(resolver: R, filter: InclusionFilter, options: RunOptions) -> Self {
        Self {
            resolver,
            filter,
            options,
            phase: RunPhase::Init,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn filter(&self) -> &InclusionFilter {
        &self.filter
    }

    pub fn run(
        &mut self,
        inputs: &Inputs,
        output: &mut dyn RecordSink,
        reporter: &mut ErrorReporter,
        sink: &dyn ProgressSink,
    ) -> Result<RunSummary, FromfileError> {
        let started = Instant::now();

        self.enter(RunPhase::Loading, sink, "collecting input filenames");
        let filenames = load_filenames(inputs)?;

        self.enter(
            RunPhase::PerFileProcessing,
            sink,
            &format!("processing {} files", filenames.len()),
        );
        let mut index = ConsolidationIndex::new();
        let mut counters = Counters::default();
        for filename in &filenames {
            self.process_file(filename, &mut index, reporter, sink, &mut counters)?;
        }

        self.enter(
            RunPhase::Finalizing,
            sink,
            &format!("finalizing {} records", index.len()),
        );
        for record in index.iter() {
            for moltype in record.missing() {
                let kind = match moltype {
                    Moltype::Genome => AnomalyKind::MissingGenome,
                    Moltype::Protein => AnomalyKind::MissingProtein,
                };
                reporter.record(kind, &record.identprefix)?;
            }
            if record.is_empty() {
                debug!("not writing '{}': no files attached", record.identprefix);
                continue;
            }
            output.write_record(record)?;
            counters.emitted += 1;
        }

        self.enter(RunPhase::Reporting, sink, "summarizing anomalies");
        let picklist = self.picklist_coverage(reporter)?;
        let anomalies = reporter.summarize(self.options.strict);

        let summary = RunSummary {
            processed: counters.processed,
            records: index.len(),
            emitted: counters.emitted,
            written: if self.options.dry_run {
                0
            } else {
                counters.emitted
            },
            skipped_by_picklist: counters.skipped_by_picklist,
            strict: self.options.strict,
            dry_run: self.options.dry_run,
            is_problem: anomalies.is_problem,
            anomalies: anomalies.counts,
            picklist,
            generated_at: chrono::Utc::now().to_rfc3339(),
        };

        self.phase = RunPhase::Done;
        sink.event(ProgressEvent {
            phase: RunPhase::Done,
            message: format!(
                "processed {} files into {} records",
                summary.processed, summary.emitted
            ),
            elapsed: Some(started.elapsed()),
        });
        Ok(summary)
    }

    fn enter(&mut self, phase: RunPhase, sink: &dyn ProgressSink, message: &str) {
        self.phase = phase;
        sink.event(ProgressEvent {
            phase,
            message: message.to_string(),
            elapsed: None,
        });
    }

    fn narrate(&self, sink: &dyn ProgressSink, message: String) {
        sink.event(ProgressEvent {
            phase: self.phase,
            message,
            elapsed: None,
        });
    }

    fn process_file(
        &mut self,
        filename: &str,
        index: &mut ConsolidationIndex,
        reporter: &mut ErrorReporter,
        sink: &dyn ProgressSink,
        counters: &mut Counters,
    ) -> Result<(), FromfileError> {
        self.narrate(sink, format!("processing file '{filename}'"));
        counters.processed += 1;

        if fs_util::file_size(Path::new(filename))? == 0 {
            reporter.record(AnomalyKind::ZeroSize, filename)?;
            return Ok(());
        }

        let (ids, derived_name) = self.identify(filename)?;

        if !self.filter.include(&ids.ident) {
            self.narrate(sink, format!("(skipping '{}': not selected by picklist)", ids.ident));
            counters.skipped_by_picklist += 1;
            return Ok(());
        }

        let name = match derived_name {
            Some(name) => name,
            None => self.resolve_name(&ids)?,
        };

        let moltype = Moltype::from_filename(filename).or(self.options.default_moltype);
        if moltype.is_none() {
            warn!("'{filename}' has no genome/protein extension; recording identity only");
        }

        match index.upsert(&ids, &name, moltype, filename)? {
            MergeOutcome::Created => {
                self.narrate(sink, format!("(new record for name '{name}')"));
            }
            MergeOutcome::Merged => {
                let moltype = moltype.map(|m| m.to_string()).unwrap_or_default();
                self.narrate(
                    sink,
                    format!(
                        "(merging into existing record '{}' moltype={moltype})",
                        ids.identprefix
                    ),
                );
            }
            MergeOutcome::Unchanged => {
                self.narrate(sink, format!("(existing record '{}' unchanged)", ids.identprefix));
            }
            MergeOutcome::Duplicate { moltype, existing } => {
                let kind = match moltype {
                    Moltype::Genome => AnomalyKind::DuplicateGenome,
                    Moltype::Protein => AnomalyKind::DuplicateProtein,
                };
                debug!("'{filename}' conflicts with '{existing}'");
                reporter.record(kind, filename)?;
            }
        }
        Ok(())
    }

    /// Identifiers plus, for modes that carry their own name, that name.
    fn identify(&self, filename: &str) -> Result<(Identifiers, Option<String>), FromfileError> {
        match self.options.mode {
            IdentMode::Accession => {
                let ids = Identifiers::from_filename(filename)?;
                if !domain::looks_like_accession(&ids.ident) {
                    warn!("'{}' does not look like a GCA_/GCF_ accession", ids.ident);
                }
                Ok((ids, None))
            }
            IdentMode::Header => {
                let header = fs_util::first_header(Path::new(filename))?
                    .ok_or_else(|| FromfileError::NoSequences(filename.to_string()))?;
                let ids = match header.split_whitespace().next() {
                    Some(ident) => Identifiers::from_ident(ident),
                    None => return Err(FromfileError::MalformedHeader(filename.to_string())),
                };
                Ok((ids, Some(header)))
            }
            IdentMode::FilenameStem => {
                let stem = domain::remove_extension(domain::basename(filename));
                let ids = Identifiers {
                    identprefix: stem.to_string(),
                    ident: stem.to_string(),
                };
                Ok((ids, Some(stem.to_string())))
            }
        }
    }

    fn resolve_name(&self, ids: &Identifiers) -> Result<String, FromfileError> {
        let name = self.resolver.resolve(&ids.identprefix)?;
        if self.options.ident_in_name {
            Ok(format!("{} {name}", ids.ident))
        } else {
            Ok(name)
        }
    }

    fn picklist_coverage(
        &self,
        reporter: &mut ErrorReporter,
    ) -> Result<Option<PicklistCoverage>, FromfileError> {
        let Some(picklist) = self.filter.picklist() else {
            return Ok(None);
        };
        let unmatched = picklist
            .unmatched()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        for value in &unmatched {
            reporter.record(AnomalyKind::PicklistMiss, value)?;
        }
        let coverage = PicklistCoverage {
            style: picklist.style,
            kind: picklist.kind,
            requested: picklist.len(),
            found: picklist.found().len(),
            queries: picklist.n_queries(),
            unmatched,
        };
        match coverage.style {
            PickStyle::Include => info!(
                "picklist matched {} of {} requested values ({} queries)",
                coverage.found, coverage.requested, coverage.queries
            ),
            PickStyle::Exclude => info!(
                "picklist excluded against {} values; {} identifiers kept ({} queries)",
                coverage.requested, coverage.found, coverage.queries
            ),
        }
        Ok(Some(coverage))
    }
}

/// Positional filenames first, then each `--file-list` in order.
pub fn load_filenames(inputs: &Inputs) -> Result<Vec<String>, FromfileError> {
    let mut filenames = inputs.filenames.clone();
    for list in &inputs.file_lists {
        let entries = fs_util::read_file_list(list.as_std_path())?;
        info!("loaded {} entries from '{list}'", entries.len());
        filenames.extend(entries);
    }
    if filenames.is_empty() {
        return Err(FromfileError::NoInputs);
    }
    Ok(filenames)
}
