use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;

use serde::Serialize;
use tracing::warn;

use crate::error::FromfileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnomalyKind {
    ZeroSize,
    DuplicateGenome,
    DuplicateProtein,
    MissingGenome,
    MissingProtein,
    PicklistMiss,
}

impl AnomalyKind {
    pub const ALL: [AnomalyKind; 6] = [
        AnomalyKind::ZeroSize,
        AnomalyKind::DuplicateGenome,
        AnomalyKind::DuplicateProtein,
        AnomalyKind::MissingGenome,
        AnomalyKind::MissingProtein,
        AnomalyKind::PicklistMiss,
    ];

    /// Tag written in front of the detail on each report line.
    pub fn label(&self) -> &'static str {
        match self {
            AnomalyKind::ZeroSize => "zero size",
            AnomalyKind::DuplicateGenome => "duplicate genome filename",
            AnomalyKind::DuplicateProtein => "duplicate protein filename",
            AnomalyKind::MissingGenome => "missing genome file",
            AnomalyKind::MissingProtein => "missing protein file",
            AnomalyKind::PicklistMiss => "missing picklist value",
        }
    }

    /// Missing counterparts only fail a run in strict mode.
    pub fn is_problem(&self, strict: bool) -> bool {
        match self {
            AnomalyKind::MissingGenome | AnomalyKind::MissingProtein => strict,
            _ => true,
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnomalySummary {
    pub is_problem: bool,
    pub counts: BTreeMap<AnomalyKind, usize>,
}

impl AnomalySummary {
    pub fn count(&self, kind: AnomalyKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Accumulates recoverable anomalies, writing each line to the sink as it arrives.
pub struct ErrorReporter {
    sink: Box<dyn Write>,
    lines: Vec<String>,
    counts: BTreeMap<AnomalyKind, usize>,
}

impl ErrorReporter {
    pub fn new(sink: Box<dyn Write>) -> Self {
        Self {
            sink,
            lines: Vec::new(),
            counts: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, kind: AnomalyKind, detail: &str) -> Result<(), FromfileError> {
        let line = format!("{}: {detail}", kind.label());
        warn!("{line}");
        writeln!(self.sink, "{line}")
            .and_then(|_| self.sink.flush())
            .map_err(|err| FromfileError::Filesystem(format!("write error report: {err}")))?;
        self.lines.push(line);
        *self.counts.entry(kind).or_insert(0) += 1;
        Ok(())
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Strictness belongs to the run, so the caller supplies it.
    pub fn summarize(&self, strict: bool) -> AnomalySummary {
        let is_problem = self
            .counts
            .iter()
            .any(|(kind, count)| *count > 0 && kind.is_problem(strict));
        let counts = AnomalyKind::ALL
            .into_iter()
            .map(|kind| (kind, self.counts.get(&kind).copied().unwrap_or(0)))
            .collect();
        AnomalySummary { is_problem, counts }
    }
}
