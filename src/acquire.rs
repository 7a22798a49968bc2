//
// acquire.rs
// Imaging-Workflow-rs
//
// Simulates image acquisition: turns the first scheduled worklist step into a synthetic CT instance.
//
// Thales Matheus Mendonça Santos - February 2026

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use dicom::core::{DataElement, PrimitiveValue, Tag, VR};
use dicom::object::{
    FileDicomObject, FileMetaTableBuilder, InMemDicomObject, StandardDataDictionary,
};
use dicom::transfer_syntax::entries::EXPLICIT_VR_LITTLE_ENDIAN;

use crate::config::DemoConfig;
use crate::dicom_access::{first_item, ElementAccess};
use crate::scu::{self, MODALITY_WORKLIST_FIND};
use crate::uid;
use crate::worklist;

const CT_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.2";

const ROWS: u16 = 64;
const COLUMNS: u16 = 64;

/// Patient and study attributes carried over from a scheduled step.
#[derive(Debug, Clone)]
pub struct ScheduledStep {
    pub patient_name: String,
    pub patient_id: String,
    pub accession_number: String,
    pub study_instance_uid: String,
    pub modality: String,
}

/// Read the attributes the acquisition needs out of one worklist match.
pub fn scheduled_step(item: &InMemDicomObject<StandardDataDictionary>) -> ScheduledStep {
    let sps = first_item(item, Tag(0x0040, 0x0100));
    let modality = sps
        .and_then(|step| step.element_str(Tag(0x0008, 0x0060)))
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "CT".to_string());

    ScheduledStep {
        patient_name: item
            .element_str(Tag(0x0010, 0x0010))
            .unwrap_or_else(|| "UNKNOWN^PATIENT".to_string()),
        patient_id: item
            .element_str(Tag(0x0010, 0x0020))
            .unwrap_or_else(|| "UNKNOWN".to_string()),
        accession_number: item.element_str(Tag(0x0008, 0x0050)).unwrap_or_default(),
        study_instance_uid: item
            .element_str(Tag(0x0020, 0x000D))
            .filter(|u| !u.is_empty())
            .unwrap_or_else(uid::new_uid),
        modality,
    }
}

/// Build the synthetic CT instance for a scheduled step.
///
/// The pixel payload is a small 8-bit monochrome gradient; enough for a PACS
/// to index and render the instance without pretending to be clinical data.
pub fn build_ct_image(step: &ScheduledStep) -> InMemDicomObject<StandardDataDictionary> {
    let now = Utc::now();
    let mut obj = InMemDicomObject::new_empty();

    obj.put(DataElement::new(
        Tag(0x0008, 0x0016),
        VR::UI,
        PrimitiveValue::from(CT_IMAGE_STORAGE),
    ));
    obj.put(DataElement::new(
        Tag(0x0008, 0x0018),
        VR::UI,
        PrimitiveValue::from(uid::new_uid()),
    ));
    obj.put(DataElement::new(
        Tag(0x0008, 0x0020),
        VR::DA,
        PrimitiveValue::from(now.format("%Y%m%d").to_string()),
    ));
    obj.put(DataElement::new(
        Tag(0x0008, 0x0030),
        VR::TM,
        PrimitiveValue::from(now.format("%H%M%S").to_string()),
    ));
    obj.put(DataElement::new(
        Tag(0x0008, 0x0050),
        VR::SH,
        PrimitiveValue::from(step.accession_number.clone()),
    ));
    obj.put(DataElement::new(
        Tag(0x0008, 0x0060),
        VR::CS,
        PrimitiveValue::from(step.modality.clone()),
    ));
    obj.put(DataElement::new(
        Tag(0x0010, 0x0010),
        VR::PN,
        PrimitiveValue::from(step.patient_name.clone()),
    ));
    obj.put(DataElement::new(
        Tag(0x0010, 0x0020),
        VR::LO,
        PrimitiveValue::from(step.patient_id.clone()),
    ));
    obj.put(DataElement::new(
        Tag(0x0020, 0x000D),
        VR::UI,
        PrimitiveValue::from(step.study_instance_uid.clone()),
    ));
    obj.put(DataElement::new(
        Tag(0x0020, 0x000E),
        VR::UI,
        PrimitiveValue::from(uid::new_uid()),
    ));
    obj.put(DataElement::new(
        Tag(0x0020, 0x0010),
        VR::SH,
        PrimitiveValue::from("1"),
    ));
    obj.put(DataElement::new(
        Tag(0x0020, 0x0011),
        VR::IS,
        PrimitiveValue::from("1"),
    ));
    obj.put(DataElement::new(
        Tag(0x0020, 0x0013),
        VR::IS,
        PrimitiveValue::from("1"),
    ));

    obj.put(DataElement::new(
        Tag(0x0028, 0x0002),
        VR::US,
        PrimitiveValue::from(1_u16),
    )); // Samples per Pixel
    obj.put(DataElement::new(
        Tag(0x0028, 0x0004),
        VR::CS,
        PrimitiveValue::from("MONOCHROME2"),
    ));
    obj.put(DataElement::new(
        Tag(0x0028, 0x0010),
        VR::US,
        PrimitiveValue::from(ROWS),
    )); // Rows
    obj.put(DataElement::new(
        Tag(0x0028, 0x0011),
        VR::US,
        PrimitiveValue::from(COLUMNS),
    )); // Columns
    obj.put(DataElement::new(
        Tag(0x0028, 0x0100),
        VR::US,
        PrimitiveValue::from(8_u16),
    )); // Bits Allocated
    obj.put(DataElement::new(
        Tag(0x0028, 0x0101),
        VR::US,
        PrimitiveValue::from(8_u16),
    )); // Bits Stored
    obj.put(DataElement::new(
        Tag(0x0028, 0x0102),
        VR::US,
        PrimitiveValue::from(7_u16),
    )); // High Bit
    obj.put(DataElement::new(
        Tag(0x0028, 0x0103),
        VR::US,
        PrimitiveValue::from(0_u16),
    )); // Pixel Representation

    let pixels: Vec<u8> = (0..u32::from(ROWS) * u32::from(COLUMNS))
        .map(|i| {
            let x = i % u32::from(COLUMNS);
            let y = i / u32::from(COLUMNS);
            ((x + y) % 256) as u8
        })
        .collect();
    obj.put(DataElement::new(
        Tag(0x7FE0, 0x0010),
        VR::OB,
        PrimitiveValue::from(pixels),
    ));

    obj
}

/// Write one acquired instance into the samples directory.
pub fn write_sample(
    obj: InMemDicomObject<StandardDataDictionary>,
    samples_dir: &Path,
) -> Result<PathBuf> {
    let patient_id = obj
        .element_str(Tag(0x0010, 0x0020))
        .unwrap_or_else(|| "UNKNOWN".to_string());
    let sop_instance_uid = obj
        .element_str(Tag(0x0008, 0x0018))
        .context("Acquired instance is missing its SOP Instance UID")?;

    fs::create_dir_all(samples_dir).context("Failed to create samples directory")?;
    let filename = format!(
        "CT_{}_{}.dcm",
        patient_id,
        Utc::now().format("%Y%m%d%H%M%S")
    );
    let path = samples_dir.join(filename);

    let file_meta = FileMetaTableBuilder::new()
        .transfer_syntax(EXPLICIT_VR_LITTLE_ENDIAN.uid())
        .media_storage_sop_class_uid(CT_IMAGE_STORAGE)
        .media_storage_sop_instance_uid(sop_instance_uid.as_str())
        .build()
        .context("Failed to build file meta for acquired instance")?;

    let mut file_obj =
        FileDicomObject::new_empty_with_dict_and_meta(StandardDataDictionary::default(), file_meta);
    for elem in obj {
        file_obj.put(elem);
    }
    file_obj
        .write_to_file(&path)
        .context("Failed to write acquired instance")?;

    Ok(path)
}

/// Query the worklist and acquire the first scheduled step.
pub fn acquire_from_worklist(config: &DemoConfig) -> Result<PathBuf> {
    let matches = scu::find(
        &config.dicom_addr(),
        &config.calling_aet,
        &config.called_aet,
        MODALITY_WORKLIST_FIND,
        &worklist::query_identifier(),
    )?;

    if matches.is_empty() {
        bail!("Worklist query returned no scheduled steps; create a worklist entry first");
    }

    let step = scheduled_step(&matches[0]);
    println!(
        "Acquiring {} for {} ({}), study {}",
        step.modality, step.patient_name, step.patient_id, step.study_instance_uid
    );

    let path = write_sample(build_ct_image(&step), &config.samples_dir)?;
    println!("Acquired instance saved to {:?}", path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worklist::{build_entry, WorklistEntry};

    #[test]
    fn scheduled_step_copies_worklist_attributes() {
        let (entry_obj, study_uid) = build_entry(&WorklistEntry::default());
        let step = scheduled_step(&entry_obj);

        assert_eq!(step.patient_name, "DOE^JOHN");
        assert_eq!(step.patient_id, "PID0001");
        assert_eq!(step.study_instance_uid, study_uid);
        assert_eq!(step.modality, "CT");
    }

    #[test]
    fn scheduled_step_survives_sparse_matches() {
        let step = scheduled_step(&InMemDicomObject::new_empty());
        assert_eq!(step.patient_name, "UNKNOWN^PATIENT");
        assert_eq!(step.modality, "CT");
        assert!(step.study_instance_uid.starts_with("2.25."));
    }

    #[test]
    fn acquired_instance_is_a_complete_ct_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (entry_obj, study_uid) = build_entry(&WorklistEntry::default());
        let step = scheduled_step(&entry_obj);

        let path = write_sample(build_ct_image(&step), dir.path()).expect("write sample");
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("CT_PID0001_"));

        let restored = dicom::object::open_file(&path).expect("open sample");
        assert_eq!(
            restored.element_str(Tag(0x0020, 0x000D)).as_deref(),
            Some(study_uid.as_str())
        );
        assert_eq!(
            restored.element_str(Tag(0x0008, 0x0016)).as_deref(),
            Some(CT_IMAGE_STORAGE)
        );
        let pixels = restored
            .element(Tag(0x7FE0, 0x0010))
            .expect("pixels")
            .to_bytes()
            .expect("bytes");
        assert_eq!(pixels.len(), usize::from(ROWS) * usize::from(COLUMNS));
    }
}
