use std::fs::File;
use std::io::{self, Write};

use camino::Utf8Path;
use serde::Serialize;
use tracing::debug;

use crate::app::{ProgressEvent, ProgressSink, RunSummary};
use crate::error::FromfileError;
use crate::record::FileRecord;

pub const CSV_HEADER: [&str; 5] = [
    "identprefix",
    "ident",
    "name",
    "genome_filename",
    "protein_filename",
];

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Human,
    Json,
}

pub trait RecordSink {
    fn write_record(&mut self, record: &FileRecord) -> Result<(), FromfileError>;
}

impl RecordSink for Vec<FileRecord> {
    fn write_record(&mut self, record: &FileRecord) -> Result<(), FromfileError> {
        self.push(record.clone());
        Ok(())
    }
}

/// Used by `--dry-run`: records are counted by the caller and dropped here.
pub struct DiscardRecords;

impl RecordSink for DiscardRecords {
    fn write_record(&mut self, _record: &FileRecord) -> Result<(), FromfileError> {
        Ok(())
    }
}

/// CSV writer that flushes after every row so a crash leaves a well-formed prefix.
pub struct RecordWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl RecordWriter<File> {
    pub fn create(path: &Utf8Path) -> Result<Self, FromfileError> {
        let file = File::create(path.as_std_path())
            .map_err(|err| FromfileError::Filesystem(format!("create {path}: {err}")))?;
        Self::new(file)
    }
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W) -> Result<Self, FromfileError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(inner);
        writer
            .write_record(CSV_HEADER)
            .map_err(|err| FromfileError::Csv(err.to_string()))?;
        writer
            .flush()
            .map_err(|err| FromfileError::Filesystem(err.to_string()))?;
        Ok(Self { writer })
    }

    pub fn into_inner(self) -> Result<W, FromfileError> {
        self.writer
            .into_inner()
            .map_err(|err| FromfileError::Csv(err.to_string()))
    }
}

impl<W: Write> RecordSink for RecordWriter<W> {
    fn write_record(&mut self, record: &FileRecord) -> Result<(), FromfileError> {
        self.writer
            .write_record([
                record.identprefix.as_str(),
                record.ident.as_str(),
                record.name.as_str(),
                record.genome_filename.as_deref().unwrap_or(""),
                record.protein_filename.as_deref().unwrap_or(""),
            ])
            .map_err(|err| FromfileError::Csv(err.to_string()))?;
        self.writer
            .flush()
            .map_err(|err| FromfileError::Filesystem(err.to_string()))
    }
}

/// Forwards per-file narration to the log; visible with `-v`.
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => debug!("[{:?}] {} ({:.2?})", event.phase, event.message, elapsed),
            None => debug!("[{:?}] {}", event.phase, event.message),
        }
    }
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_summary(summary: &RunSummary) -> io::Result<()> {
        Self::print_json(summary)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::app::RunPhase;

    #[test]
    fn log_progress_handles_timed_and_untimed_events() {
        let sink: &dyn ProgressSink = &LogProgress;
        sink.event(ProgressEvent {
            phase: RunPhase::PerFileProcessing,
            message: "processing file 'GCF_000001.1_genomic.fna.gz'".to_string(),
            elapsed: None,
        });
        sink.event(ProgressEvent {
            phase: RunPhase::Done,
            message: "processed 1 files into 1 records".to_string(),
            elapsed: Some(Duration::from_millis(5)),
        });
    }

    #[test]
    fn absent_filenames_are_empty_fields() {
        let mut writer = RecordWriter::new(Vec::new()).unwrap();
        writer
            .write_record(&FileRecord {
                identprefix: "GCF_000001".to_string(),
                ident: "GCF_000001.1".to_string(),
                name: "Example bacterium".to_string(),
                genome_filename: Some("GCF_000001.1_genomic.fna.gz".to_string()),
                protein_filename: None,
            })
            .unwrap();
        let bytes = writer.into_inner().unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "identprefix,ident,name,genome_filename,protein_filename\n\
             GCF_000001,GCF_000001.1,Example bacterium,GCF_000001.1_genomic.fna.gz,\n"
        );
    }
}
