//
// fhir.rs
// Imaging-Workflow-rs
//
// Maps DICOMweb study metadata onto a FHIR ImagingStudy wire model and serializes it to disk.
//
// Thales Matheus Mendonça Santos - February 2026

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::models::StudyMetadataRecord;

/// Coding system for modality codes taken from the DICOM ontology.
pub const DCM_CODING_SYSTEM: &str = "http://dicom.nema.org/resources/ontology/DCM";
/// Identifier system for DICOM study instance UIDs.
pub const DICOM_UID_SYSTEM: &str = "urn:dicom:uid";

const TAG_STUDY_INSTANCE_UID: &str = "0020000D";
const TAG_STUDY_DATE: &str = "00080020";
const TAG_STUDY_TIME: &str = "00080030";
const TAG_MODALITIES_IN_STUDY: &str = "00080061";
const TAG_NUMBER_OF_SERIES: &str = "00200006";
const TAG_NUMBER_OF_INSTANCES: &str = "00200008";

/// A coded value: system, code, and optional human-readable display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

/// A concept expressed through one or more codings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeableConcept {
    pub coding: Vec<Coding>,
}

/// A literal reference to another resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub reference: String,
}

/// A business identifier carried by the resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(rename = "use")]
    pub use_: String,
    pub system: String,
    pub value: String,
}

/// Study-level FHIR ImagingStudy resource, limited to the fields this
/// workflow populates. Field names follow the FHIR JSON wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagingStudy {
    pub resource_type: String,
    pub status: String,
    pub modality: Vec<CodeableConcept>,
    pub subject: Reference,
    pub started: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Vec<Identifier>>,
    pub number_of_series: u32,
    pub number_of_instances: u32,
}

/// Build an ImagingStudy from a QIDO study record.
///
/// Pure and total over the record contents: every attribute is optional and
/// missing ones fall back to the documented defaults, so this never fails
/// for a well-shaped record.
pub fn imaging_study_from_metadata(
    record: &StudyMetadataRecord,
    patient_ref: &str,
) -> ImagingStudy {
    let study_uid = record.string_value(TAG_STUDY_INSTANCE_UID);
    let study_date = record.string_value(TAG_STUDY_DATE);
    let study_time = record.string_value(TAG_STUDY_TIME);
    let modalities = record.string_value(TAG_MODALITIES_IN_STUDY);

    let identifier = study_uid.map(|uid| {
        vec![Identifier {
            use_: "official".to_string(),
            system: DICOM_UID_SYSTEM.to_string(),
            value: format!("urn:oid:{}", uid),
        }]
    });

    ImagingStudy {
        resource_type: "ImagingStudy".to_string(),
        status: "available".to_string(),
        modality: modality_concepts(modalities.as_deref()),
        subject: Reference {
            reference: patient_ref.to_string(),
        },
        started: started_timestamp(study_date.as_deref(), study_time.as_deref()),
        identifier,
        number_of_series: record.count_value(TAG_NUMBER_OF_SERIES),
        number_of_instances: record.count_value(TAG_NUMBER_OF_INSTANCES),
    }
}

/// Derive the `started` timestamp from DICOM DA/TM strings.
///
/// A date of at least 8 digits combined with a time of at least 6 digits
/// yields a full UTC instant; a date alone yields a date-only value, with
/// month and day defaulting to `01` when the date string is short. Without
/// any date the current UTC instant is used, truncated to whole seconds.
fn started_timestamp(study_date: Option<&str>, study_time: Option<&str>) -> String {
    // Index by character so malformed multi-byte input cannot panic the export.
    let slice = |s: &str, from: usize, to: usize| -> String {
        s.chars().skip(from).take(to - from).collect()
    };

    match study_date {
        Some(date) if !date.is_empty() => {
            let len = date.chars().count();
            let year = slice(date, 0, 4);
            let month = if len >= 6 {
                slice(date, 4, 6)
            } else {
                "01".to_string()
            };
            let day = if len >= 8 {
                slice(date, 6, 8)
            } else {
                "01".to_string()
            };

            match study_time {
                Some(time) if time.chars().count() >= 6 => {
                    let hour = slice(time, 0, 2);
                    let minute = slice(time, 2, 4);
                    let second = slice(time, 4, 6);
                    format!(
                        "{}-{}-{}T{}:{}:{}Z",
                        year, month, day, hour, minute, second
                    )
                }
                _ => format!("{}-{}-{}", year, month, day),
            }
        }
        _ => Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
    }
}

/// Split a ModalitiesInStudy value into coded concepts.
///
/// The raw attribute is multi-valued with a backslash delimiter. When no
/// usable modality remains, a single bare `CT` concept without a coding
/// system stands in, mirroring the upstream export format.
fn modality_concepts(raw: Option<&str>) -> Vec<CodeableConcept> {
    let mut concepts = Vec::new();
    if let Some(raw) = raw {
        for piece in raw.split('\\') {
            let piece = piece.trim();
            if piece.is_empty() {
                continue;
            }
            concepts.push(CodeableConcept {
                coding: vec![Coding {
                    system: Some(DCM_CODING_SYSTEM.to_string()),
                    code: piece.to_string(),
                    display: Some(piece.to_string()),
                }],
            });
        }
    }

    if concepts.is_empty() {
        concepts.push(CodeableConcept {
            coding: vec![Coding {
                system: None,
                code: "CT".to_string(),
                display: None,
            }],
        });
    }
    concepts
}

/// Serialize the resource as pretty JSON into `<dir>/<study_uid>.ImagingStudy.json`.
pub fn write_imaging_study(
    study: &ImagingStudy,
    study_uid: &str,
    dir: &Path,
) -> Result<PathBuf> {
    fs::create_dir_all(dir).context("Failed to create FHIR output directory")?;
    let path = dir.join(format!("{}.ImagingStudy.json", study_uid));
    let json = serde_json::to_string_pretty(study).context("Failed to serialize ImagingStudy")?;
    fs::write(&path, json).context("Failed to write ImagingStudy file")?;
    Ok(path)
}
