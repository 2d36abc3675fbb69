use assert_matches::assert_matches;

use genome_fromfile::domain::{Identifiers, Moltype};
use genome_fromfile::error::FromfileError;
use genome_fromfile::record::{ConsolidationIndex, MergeOutcome};

const GENOME: &str = "GCF_000001.1_genomic.fna.gz";
const PROTEIN: &str = "GCF_000001.1_protein.faa.gz";

fn ids() -> Identifiers {
    Identifiers::from_ident("GCF_000001.1")
}

#[test]
fn repeated_upsert_is_a_duplicate() {
    let mut index = ConsolidationIndex::new();
    index
        .upsert(&ids(), "Example bacterium", Some(Moltype::Genome), GENOME)
        .unwrap();
    let before = index.get("GCF_000001").unwrap().clone();

    let outcome = index
        .upsert(&ids(), "Example bacterium", Some(Moltype::Genome), GENOME)
        .unwrap();
    assert_eq!(
        outcome,
        MergeOutcome::Duplicate {
            moltype: Moltype::Genome,
            existing: GENOME.to_string(),
        }
    );
    assert_eq!(index.get("GCF_000001").unwrap(), &before);
}

#[test]
fn slots_hold_one_filename_each() {
    let mut index = ConsolidationIndex::new();
    let name = "Example bacterium";
    index.upsert(&ids(), name, Some(Moltype::Genome), GENOME).unwrap();
    index.upsert(&ids(), name, Some(Moltype::Protein), PROTEIN).unwrap();

    let second_genome = index
        .upsert(&ids(), name, Some(Moltype::Genome), "other_genomic.fna")
        .unwrap();
    let second_protein = index
        .upsert(&ids(), name, Some(Moltype::Protein), "other_protein.faa")
        .unwrap();
    assert_matches!(second_genome, MergeOutcome::Duplicate { moltype: Moltype::Genome, .. });
    assert_matches!(second_protein, MergeOutcome::Duplicate { moltype: Moltype::Protein, .. });

    let record = index.get("GCF_000001").unwrap();
    assert_eq!(record.genome_filename.as_deref(), Some(GENOME));
    assert_eq!(record.protein_filename.as_deref(), Some(PROTEIN));
    assert_eq!(index.len(), 1);
}

#[test]
fn arrival_order_does_not_matter() {
    let name = "Example bacterium";
    let mut genome_first = ConsolidationIndex::new();
    genome_first.upsert(&ids(), name, Some(Moltype::Genome), GENOME).unwrap();
    let merged = genome_first
        .upsert(&ids(), name, Some(Moltype::Protein), PROTEIN)
        .unwrap();
    assert_eq!(merged, MergeOutcome::Merged);

    let mut protein_first = ConsolidationIndex::new();
    protein_first.upsert(&ids(), name, Some(Moltype::Protein), PROTEIN).unwrap();
    protein_first.upsert(&ids(), name, Some(Moltype::Genome), GENOME).unwrap();

    assert_eq!(
        genome_first.get("GCF_000001"),
        protein_first.get("GCF_000001")
    );
    assert!(genome_first.get("GCF_000001").unwrap().missing().is_empty());
}

#[test]
fn identity_mismatch_is_fatal() {
    let mut index = ConsolidationIndex::new();
    index
        .upsert(&ids(), "Example bacterium", Some(Moltype::Genome), GENOME)
        .unwrap();

    let other_version = Identifiers::from_ident("GCF_000001.2");
    let err = index
        .upsert(&other_version, "Example bacterium", Some(Moltype::Protein), PROTEIN)
        .unwrap_err();
    assert_matches!(err, FromfileError::IdentityMismatch { .. });

    let err = index
        .upsert(&ids(), "Another name", Some(Moltype::Protein), PROTEIN)
        .unwrap_err();
    assert_matches!(err, FromfileError::IdentityMismatch { .. });
    assert!(index.get("GCF_000001").unwrap().protein_filename.is_none());
}

#[test]
fn insertion_order_is_kept() {
    let mut index = ConsolidationIndex::new();
    for ident in ["GCF_3.1", "GCF_1.1", "GCF_2.1"] {
        let ids = Identifiers::from_ident(ident);
        index.upsert(&ids, ident, Some(Moltype::Genome), "g.fna").unwrap();
    }
    let order = index.iter().map(|r| r.identprefix.as_str()).collect::<Vec<_>>();
    assert_eq!(order, vec!["GCF_3", "GCF_1", "GCF_2"]);
}
