//
// qido.rs
// Imaging-Workflow-rs
//
// Fetches study-level DICOMweb metadata from Orthanc with a single authenticated QIDO query.
//
// Thales Matheus Mendonça Santos - February 2026

use thiserror::Error;
use tracing::debug;

use crate::config::DemoConfig;
use crate::models::StudyMetadataRecord;

/// Failures of the metadata/export path. These are isolated by the caller:
/// a study that is already stored stays stored even when its export fails.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("QIDO request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("QIDO query returned {status}: {body}")]
    Http {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("no study found for UID {0}")]
    StudyNotFound(String),
}

/// Query the DICOMweb endpoint for one study's metadata.
///
/// Issues a single authenticated GET against `<orthanc>/dicom-web/studies`
/// asking for all fields of the given Study Instance UID, limited to one
/// match. No retry: a failed attempt is terminal for this call.
pub fn fetch_study_metadata(
    config: &DemoConfig,
    study_uid: &str,
) -> Result<StudyMetadataRecord, ExportError> {
    let url = format!("{}/dicom-web/studies", config.orthanc_url);
    debug!(%url, study_uid, "querying study metadata");

    let response = reqwest::blocking::Client::new()
        .get(&url)
        .query(&[
            ("StudyInstanceUID", study_uid),
            ("includefield", "all"),
            ("limit", "1"),
        ])
        .basic_auth(&config.orthanc_user, Some(&config.orthanc_password))
        .send()?;

    let status = response.status();
    if !status.is_success() {
        // Keep the response body: Orthanc puts the diagnostic in there.
        let body = response.text().unwrap_or_default();
        return Err(ExportError::Http { status, body });
    }

    let results: Vec<StudyMetadataRecord> = response.json()?;
    first_match(results, study_uid)
}

/// Interpret a QIDO response array: the first record wins, an empty array
/// means the study does not exist on the peer.
pub fn first_match(
    results: Vec<StudyMetadataRecord>,
    study_uid: &str,
) -> Result<StudyMetadataRecord, ExportError> {
    results
        .into_iter()
        .next()
        .ok_or_else(|| ExportError::StudyNotFound(study_uid.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_result_array_is_not_found() {
        let err = first_match(Vec::new(), "1.2.3").unwrap_err();
        match err {
            ExportError::StudyNotFound(uid) => assert_eq!(uid, "1.2.3"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn first_record_wins() {
        let record: StudyMetadataRecord = serde_json::from_value(serde_json::json!({
            "0020000D": {"vr": "UI", "Value": ["1.2.3"]},
        }))
        .unwrap();

        let found = first_match(vec![record], "1.2.3").unwrap();
        assert_eq!(found.string_value("0020000D").as_deref(), Some("1.2.3"));
    }
}
