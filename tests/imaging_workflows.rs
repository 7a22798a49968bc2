//
// imaging_workflows.rs
// Imaging-Workflow-rs
//
// Integration-style tests covering worklist authoring, acquisition, metadata mapping, and FHIR export output.
//
// Thales Matheus Mendonça Santos - February 2026

use chrono::{NaiveDateTime, Utc};
use imaging_workflow::acquire;
use imaging_workflow::fhir::{self, DCM_CODING_SYSTEM, DICOM_UID_SYSTEM};
use imaging_workflow::models::StudyMetadataRecord;
use imaging_workflow::qido::{first_match, ExportError};
use imaging_workflow::worklist::{build_entry, create_worklist_file, WorklistEntry};
use tempfile::tempdir;

fn record(json: serde_json::Value) -> StudyMetadataRecord {
    serde_json::from_value(json).expect("study metadata record")
}

#[test]
fn complete_record_maps_to_full_resource() {
    let rec = record(serde_json::json!({
        "0020000D": {"vr": "UI", "Value": ["1.2.3"]},
        "00080020": {"vr": "DA", "Value": ["20260204"]},
        "00080030": {"vr": "TM", "Value": ["132212"]},
        "00080061": {"vr": "CS", "Value": ["CT\\MR"]},
        "00200006": {"vr": "IS", "Value": ["2"]},
        "00200008": {"vr": "IS", "Value": ["340"]},
    }));

    let study = fhir::imaging_study_from_metadata(&rec, "Patient/example-patient");

    assert_eq!(study.resource_type, "ImagingStudy");
    assert_eq!(study.status, "available");
    assert_eq!(study.started, "2026-02-04T13:22:12Z");
    assert_eq!(study.subject.reference, "Patient/example-patient");
    assert_eq!(study.number_of_series, 2);
    assert_eq!(study.number_of_instances, 340);

    let identifier = study.identifier.as_ref().expect("identifier");
    assert_eq!(identifier.len(), 1);
    assert_eq!(identifier[0].use_, "official");
    assert_eq!(identifier[0].system, DICOM_UID_SYSTEM);
    assert_eq!(identifier[0].value, "urn:oid:1.2.3");

    let codes: Vec<&str> = study
        .modality
        .iter()
        .map(|c| c.coding[0].code.as_str())
        .collect();
    assert_eq!(codes, ["CT", "MR"]);
    for concept in &study.modality {
        assert_eq!(concept.coding[0].system.as_deref(), Some(DCM_CODING_SYSTEM));
    }
}

#[test]
fn date_without_time_stays_date_only() {
    let rec = record(serde_json::json!({
        "00080020": {"vr": "DA", "Value": ["20260204"]},
    }));

    let study = fhir::imaging_study_from_metadata(&rec, "Patient/example-patient");
    assert_eq!(study.started, "2026-02-04");
}

#[test]
fn empty_record_falls_back_everywhere() {
    let rec = record(serde_json::json!({}));
    let before = Utc::now().naive_utc();
    let study = fhir::imaging_study_from_metadata(&rec, "Patient/example-patient");
    let after = Utc::now().naive_utc();

    // No date at all: the current UTC instant, whole seconds only.
    let started = NaiveDateTime::parse_from_str(&study.started, "%Y-%m-%dT%H:%M:%SZ")
        .expect("fallback timestamp must be a full UTC instant");
    assert!(started >= before - chrono::Duration::seconds(1));
    assert!(started <= after + chrono::Duration::seconds(1));

    assert!(study.identifier.is_none());
    assert_eq!(study.number_of_series, 0);
    assert_eq!(study.number_of_instances, 0);

    assert_eq!(study.modality.len(), 1);
    assert_eq!(study.modality[0].coding[0].code, "CT");
    assert!(study.modality[0].coding[0].system.is_none());
    assert!(study.modality[0].coding[0].display.is_none());
}

#[test]
fn serialized_resource_matches_the_wire_format() {
    let rec = record(serde_json::json!({
        "0020000D": {"vr": "UI", "Value": ["1.2.3"]},
        "00080020": {"vr": "DA", "Value": ["20260204"]},
    }));

    let study = fhir::imaging_study_from_metadata(&rec, "Patient/example-patient");
    let json = serde_json::to_value(&study).expect("serialize");

    assert_eq!(json["resourceType"], "ImagingStudy");
    assert_eq!(json["status"], "available");
    assert_eq!(json["subject"]["reference"], "Patient/example-patient");
    assert_eq!(json["identifier"][0]["use"], "official");
    assert_eq!(json["numberOfSeries"], 0);
    assert_eq!(json["numberOfInstances"], 0);
    // Optional codings stay off the wire entirely.
    assert!(json["modality"][0]["coding"][0].get("display").is_some());
}

#[test]
fn absent_uid_leaves_identifier_off_the_wire() {
    let rec = record(serde_json::json!({
        "00080020": {"vr": "DA", "Value": ["20260204"]},
    }));

    let study = fhir::imaging_study_from_metadata(&rec, "Patient/example-patient");
    let json = serde_json::to_value(&study).expect("serialize");

    assert!(json.get("identifier").is_none());
}

#[test]
fn export_writes_pretty_json_named_after_the_study() {
    let dir = tempdir().expect("tempdir");
    let rec = record(serde_json::json!({
        "0020000D": {"vr": "UI", "Value": ["1.2.3"]},
        "00080020": {"vr": "DA", "Value": ["20260204"]},
        "00080030": {"vr": "TM", "Value": ["132212"]},
    }));

    let study = fhir::imaging_study_from_metadata(&rec, "Patient/example-patient");
    let path = fhir::write_imaging_study(&study, "1.2.3", dir.path()).expect("write");

    assert_eq!(
        path.file_name().unwrap().to_string_lossy(),
        "1.2.3.ImagingStudy.json"
    );
    let content = std::fs::read_to_string(&path).expect("read back");
    assert!(content.starts_with("{\n  \""), "expected 2-space indentation");

    let parsed: serde_json::Value = serde_json::from_str(&content).expect("valid JSON");
    assert_eq!(parsed["started"], "2026-02-04T13:22:12Z");
}

#[test]
fn empty_query_result_means_no_resource() {
    let err = first_match(Vec::new(), "1.2.840.1").unwrap_err();
    assert!(matches!(err, ExportError::StudyNotFound(uid) if uid == "1.2.840.1"));
}

#[test]
fn worklist_entry_feeds_the_acquisition() {
    let dir = tempdir().expect("tempdir");
    let entry = WorklistEntry {
        patient_name: "ROE^JANE".to_string(),
        patient_id: "PID0002".to_string(),
        modality: "MR".to_string(),
        ..WorklistEntry::default()
    };

    let (path, study_uid) =
        create_worklist_file(&entry, &dir.path().join("worklists")).expect("worklist file");
    let stored = dicom::object::open_file(&path).expect("reopen worklist");

    let step = acquire::scheduled_step(&stored);
    assert_eq!(step.patient_name, "ROE^JANE");
    assert_eq!(step.patient_id, "PID0002");
    assert_eq!(step.modality, "MR");
    assert_eq!(step.study_instance_uid, study_uid);

    let sample = acquire::write_sample(
        acquire::build_ct_image(&step),
        &dir.path().join("samples"),
    )
    .expect("sample");
    let acquired = dicom::object::open_file(&sample).expect("reopen sample");

    use imaging_workflow::dicom_access::ElementAccess;
    assert_eq!(
        acquired
            .element_str(dicom::core::Tag(0x0020, 0x000D))
            .as_deref(),
        Some(study_uid.as_str())
    );
    assert_eq!(
        acquired
            .element_str(dicom::core::Tag(0x0008, 0x0060))
            .as_deref(),
        Some("MR")
    );
}

#[test]
fn build_entry_and_query_identifier_share_the_step_layout() {
    let (obj, _) = build_entry(&WorklistEntry::default());
    let query = imaging_workflow::worklist::query_identifier();

    use imaging_workflow::dicom_access::first_item;
    let tag = dicom::core::Tag(0x0040, 0x0100);
    assert!(first_item(&obj, tag).is_some());
    assert!(first_item(&query, tag).is_some());
}
