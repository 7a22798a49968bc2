//
// config.rs
// Imaging-Workflow-rs
//
// Central configuration for the demo environment: PACS endpoints, demo credentials, and data directories.
//
// Thales Matheus Mendonça Santos - February 2026

use std::path::PathBuf;

/// Connection and filesystem settings shared by every workflow step.
///
/// The defaults describe the zero-configuration demo setup: an Orthanc
/// instance on localhost with its DICOM port on 4242, the DICOMweb plugin on
/// 8042, and the stock `orthanc`/`orthanc` account. CLI flags override
/// individual fields per run.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    /// Host of the DICOM peer (Orthanc). Default `127.0.0.1`.
    pub peer_host: String,
    /// DICOM port of the peer. Default `4242`.
    pub peer_port: u16,
    /// Application entity title the peer answers to. Default `ORTHANC`.
    pub called_aet: String,
    /// Application entity title this tool presents. Default `IMAGING-SCU`.
    pub calling_aet: String,
    /// Base URL of the Orthanc HTTP API / DICOMweb plugin. Default `http://localhost:8042`.
    pub orthanc_url: String,
    /// Demo account user name. Default `orthanc`.
    pub orthanc_user: String,
    /// Demo account password. Default `orthanc`.
    pub orthanc_password: String,
    /// Directory watched by the Orthanc worklist plugin. Default `data/worklists`.
    pub worklist_dir: PathBuf,
    /// Directory where acquired sample instances are written. Default `data/samples`.
    pub samples_dir: PathBuf,
    /// Directory where exported FHIR resources are written. Default `data/fhir`.
    pub fhir_dir: PathBuf,
    /// Subject reference attached to exported ImagingStudy resources.
    pub patient_ref: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            peer_host: "127.0.0.1".to_string(),
            peer_port: 4242,
            called_aet: "ORTHANC".to_string(),
            calling_aet: "IMAGING-SCU".to_string(),
            orthanc_url: "http://localhost:8042".to_string(),
            orthanc_user: "orthanc".to_string(),
            orthanc_password: "orthanc".to_string(),
            worklist_dir: PathBuf::from("data/worklists"),
            samples_dir: PathBuf::from("data/samples"),
            fhir_dir: PathBuf::from("data/fhir"),
            patient_ref: "Patient/example-patient".to_string(),
        }
    }
}

impl DemoConfig {
    /// Socket address of the DICOM peer in the `host:port` form expected by
    /// the association layer.
    pub fn dicom_addr(&self) -> String {
        format!("{}:{}", self.peer_host, self.peer_port)
    }
}
