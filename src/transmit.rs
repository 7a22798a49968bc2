//
// transmit.rs
// Imaging-Workflow-rs
//
// Sends an acquired study to the PACS and best-effort exports its metadata as a FHIR resource.
//
// Thales Matheus Mendonça Santos - February 2026

use std::path::Path;

use anyhow::{bail, Context, Result};
use dicom::core::Tag;
use dicom::object::open_file;
use tracing::warn;

use crate::config::DemoConfig;
use crate::dicom_access::ElementAccess;
use crate::fhir;
use crate::qido;
use crate::scu;

/// Transmit one DICOM file: verify connectivity, store the object, then try
/// to export the stored study as FHIR.
///
/// A non-success verification or storage status is fatal to the run. The
/// export step is deliberately not: by the time it runs the study is already
/// durably stored, so any export failure is logged and skipped.
pub fn send_study(config: &DemoConfig, file: &Path) -> Result<()> {
    let addr = config.dicom_addr();

    let echo_status = scu::echo(&addr, &config.calling_aet, &config.called_aet)?;
    if echo_status != scu::SUCCESS {
        bail!("C-ECHO failed with status 0x{:04X}", echo_status);
    }

    let store_status = scu::store(&addr, &config.calling_aet, &config.called_aet, file)?;
    println!("C-STORE status: 0x{:04X}", store_status);
    if store_status != scu::SUCCESS {
        bail!("C-STORE failed with status 0x{:04X}", store_status);
    }

    // FHIR export: best effort only. The transmission above already
    // succeeded, so every failure from here on is logged, not propagated.
    match study_uid_of(file) {
        Ok(study_uid) => {
            println!("Exporting FHIR for StudyInstanceUID: {}", study_uid);
            match export_study(config, &study_uid) {
                Ok(()) => {}
                Err(err) => {
                    warn!(reason = %format_chain(&err), "FHIR export failed; skipping");
                }
            }
        }
        Err(err) => {
            warn!(reason = %format_chain(&err), "FHIR export skipped - could not read StudyInstanceUID");
        }
    }

    Ok(())
}

/// Fetch the study's QIDO metadata, map it, and write the resource file.
pub fn export_study(config: &DemoConfig, study_uid: &str) -> Result<()> {
    let record = qido::fetch_study_metadata(config, study_uid)?;
    let study = fhir::imaging_study_from_metadata(&record, &config.patient_ref);
    let path = fhir::write_imaging_study(&study, study_uid, &config.fhir_dir)?;
    println!("FHIR ImagingStudy saved to {:?}", path);
    Ok(())
}

fn study_uid_of(file: &Path) -> Result<String> {
    let obj = open_file(file).context("Failed to open transmitted file")?;
    obj.element_str(Tag(0x0020, 0x000D))
        .filter(|uid| !uid.is_empty())
        .context("Transmitted object carries no Study Instance UID")
}

// Render an anyhow chain on one line for the skip log.
fn format_chain(err: &anyhow::Error) -> String {
    err.chain()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ")
}
