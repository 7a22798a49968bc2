//
// demo.rs
// Imaging-Workflow-rs
//
// Runs the whole demo workflow end to end: worklist, query, acquisition, transmission, export.
//
// Thales Matheus Mendonça Santos - February 2026

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use dicom::core::Tag;
use tracing::info;
use walkdir::WalkDir;

use crate::acquire;
use crate::config::DemoConfig;
use crate::dicom_access::{first_item, ElementAccess};
use crate::scu::{self, MODALITY_WORKLIST_FIND};
use crate::transmit;
use crate::worklist::{self, WorklistEntry};

/// Run every workflow step in order, stopping at the first failure.
///
/// The steps share no in-process state; they communicate through the peer
/// and the data directories, so each one can also be run on its own via its
/// CLI verb.
pub fn run(config: &DemoConfig) -> Result<()> {
    info!("step 1/4: create worklist entry");
    worklist::create_worklist_file(&WorklistEntry::default(), &config.worklist_dir)
        .context("Worklist creation failed")?;

    info!("step 2/4: query the modality worklist");
    print_worklist(config).context("Worklist query failed")?;

    info!("step 3/4: acquire from the worklist");
    acquire::acquire_from_worklist(config).context("Acquisition failed")?;

    info!("step 4/4: transmit the newest sample");
    let sample = newest_sample(&config.samples_dir)?;
    transmit::send_study(config, &sample).context("Transmission failed")?;

    println!(
        "\nDone. Open {} ({}/{}) to view the study.",
        config.orthanc_url, config.orthanc_user, config.orthanc_password
    );
    Ok(())
}

/// Query the peer's modality worklist and print each scheduled step.
pub fn print_worklist(config: &DemoConfig) -> Result<()> {
    let matches = scu::find(
        &config.dicom_addr(),
        &config.calling_aet,
        &config.called_aet,
        MODALITY_WORKLIST_FIND,
        &worklist::query_identifier(),
    )?;

    println!("Worklist: {} scheduled step(s)", matches.len());
    for (idx, item) in matches.iter().enumerate() {
        let sps = first_item(item, Tag(0x0040, 0x0100));
        let field = |tag| -> String {
            item.element_str(tag).unwrap_or_else(|| "-".to_string())
        };
        let sps_field = |tag| -> String {
            sps.and_then(|s| s.element_str(tag))
                .unwrap_or_else(|| "-".to_string())
        };

        println!(
            "  [{}] {} ({}) | accession {} | study {}",
            idx + 1,
            field(Tag(0x0010, 0x0010)),
            field(Tag(0x0010, 0x0020)),
            field(Tag(0x0008, 0x0050)),
            field(Tag(0x0020, 0x000D)),
        );
        println!(
            "      {} on {} at {} {}",
            sps_field(Tag(0x0008, 0x0060)),
            sps_field(Tag(0x0040, 0x0001)),
            sps_field(Tag(0x0040, 0x0002)),
            sps_field(Tag(0x0040, 0x0003)),
        );
    }
    Ok(())
}

/// Pick the newest acquired sample: `CT_*.dcm` under the samples directory,
/// ordered by modification time and then by name.
pub fn newest_sample(samples_dir: &Path) -> Result<PathBuf> {
    let mut candidates: Vec<(SystemTime, PathBuf)> = WalkDir::new(samples_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_string_lossy();
            name.starts_with("CT_") && name.ends_with(".dcm")
        })
        .filter_map(|e| {
            let modified = e.metadata().ok()?.modified().ok()?;
            Some((modified, e.into_path()))
        })
        .collect();

    candidates.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    candidates
        .pop()
        .map(|(_, path)| path)
        .with_context(|| format!("No CT_*.dcm sample found in {:?}", samples_dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path, when: SystemTime) {
        fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(when)
            .unwrap();
    }

    #[test]
    fn newest_sample_prefers_mtime_then_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let now = SystemTime::now();
        let earlier = now - std::time::Duration::from_secs(60);

        for name in ["CT_older.dcm", "CT_aaa.dcm", "CT_bbb.dcm", "MR_z.dcm", "CT_notes.txt"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        touch(&dir.path().join("CT_older.dcm"), earlier);
        touch(&dir.path().join("CT_aaa.dcm"), now);
        touch(&dir.path().join("CT_bbb.dcm"), now);
        // Newer but not matching the sample pattern, so never eligible.
        touch(&dir.path().join("MR_z.dcm"), now + std::time::Duration::from_secs(60));

        let picked = newest_sample(dir.path()).expect("pick");
        // CT_aaa and CT_bbb share an mtime; the name breaks the tie.
        assert_eq!(
            picked.file_name().unwrap().to_string_lossy(),
            "CT_bbb.dcm"
        );
    }

    #[test]
    fn empty_samples_directory_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = newest_sample(dir.path()).unwrap_err();
        assert!(err.to_string().contains("No CT_*.dcm sample"));
    }
}
