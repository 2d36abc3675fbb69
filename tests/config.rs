use assert_matches::assert_matches;

use genome_fromfile::config::{Config, ConfigLoader};
use genome_fromfile::domain::Moltype;
use genome_fromfile::error::FromfileError;
use genome_fromfile::picklist::{ColumnKind, PickStyle};

#[test]
fn resolve_explicit_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("genome-fromfile.json");
    std::fs::write(
        &path,
        r#"{
            "schema_version": 1,
            "taxonomy_db": ["gtdb.lineages.csv", "ncbi.lineages.csv"],
            "picklist": "picks.csv:ident:ident",
            "strict": true,
            "report_errors_to": "errors.txt",
            "default_moltype": "genome"
        }"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(path.to_str()).unwrap();
    assert_eq!(resolved.taxonomy_db.len(), 2);
    assert!(resolved.strict);
    assert!(!resolved.ident_in_name);
    assert_eq!(resolved.report_errors_to.unwrap().as_str(), "errors.txt");
    assert_eq!(resolved.default_moltype, Some(Moltype::Genome));
    let picklist = resolved.picklist.unwrap();
    assert_eq!(picklist.kind, ColumnKind::Ident);
    assert_eq!(picklist.style, PickStyle::Include);
}

#[test]
fn explicit_file_must_exist() {
    let err = ConfigLoader::resolve(Some("/nonexistent/genome-fromfile.json")).unwrap_err();
    assert_matches!(err, FromfileError::ConfigRead(_));
}

#[test]
fn invalid_json_is_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("bad.json");
    std::fs::write(&path, "{ not json").unwrap();
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, FromfileError::ConfigParse(_));
}

#[test]
fn bad_picklist_kind_is_rejected_up_front() {
    let config = Config {
        picklist: Some("picks.csv:md5:md5short".to_string()),
        ..Config::default()
    };
    let err = ConfigLoader::resolve_config(config).unwrap_err();
    assert_matches!(err, FromfileError::InvalidPicklist(_));
    assert!(err.is_config());
}
