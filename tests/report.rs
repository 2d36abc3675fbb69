use std::fs::{self, File};

use genome_fromfile::report::{AnomalyKind, ErrorReporter};

#[test]
fn lines_are_written_as_recorded() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("out.csv.error-report.txt");
    let mut reporter = ErrorReporter::new(Box::new(File::create(&path).unwrap()));

    reporter
        .record(AnomalyKind::DuplicateGenome, "b/GCF_1.1_genomic.fna")
        .unwrap();
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "duplicate genome filename: b/GCF_1.1_genomic.fna\n"
    );

    reporter.record(AnomalyKind::MissingProtein, "GCF_1").unwrap();
    reporter.record(AnomalyKind::PicklistMiss, "GCF_9.1").unwrap();
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "duplicate genome filename: b/GCF_1.1_genomic.fna\n\
         missing protein file: GCF_1\n\
         missing picklist value: GCF_9.1\n"
    );
}

#[test]
fn summary_counts_every_kind() {
    let mut reporter = ErrorReporter::new(Box::new(std::io::sink()));
    reporter.record(AnomalyKind::MissingGenome, "a").unwrap();
    reporter.record(AnomalyKind::MissingGenome, "b").unwrap();

    let summary = reporter.summarize(false);
    assert_eq!(summary.counts.len(), AnomalyKind::ALL.len());
    assert_eq!(summary.count(AnomalyKind::MissingGenome), 2);
    assert_eq!(summary.count(AnomalyKind::ZeroSize), 0);
    assert_eq!(summary.total(), 2);
    assert!(!summary.is_problem);
}

#[test]
fn duplicates_and_picklist_misses_are_problems_when_lenient() {
    for kind in [
        AnomalyKind::DuplicateGenome,
        AnomalyKind::DuplicateProtein,
        AnomalyKind::PicklistMiss,
    ] {
        let mut reporter = ErrorReporter::new(Box::new(std::io::sink()));
        reporter.record(kind, "x").unwrap();
        assert!(reporter.summarize(false).is_problem, "{kind} should be a problem");
    }
}
