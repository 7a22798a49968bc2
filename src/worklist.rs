//
// worklist.rs
// Imaging-Workflow-rs
//
// Authors Modality Worklist entries as .wl DICOM files consumed by the Orthanc worklist plugin.
//
// Thales Matheus Mendonça Santos - February 2026

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use dicom::core::value::{DataSetSequence, Value};
use dicom::core::{DataElement, PrimitiveValue, Tag, VR};
use dicom::object::{FileDicomObject, FileMetaTableBuilder, InMemDicomObject, StandardDataDictionary};
use dicom::transfer_syntax::entries::EXPLICIT_VR_LITTLE_ENDIAN;

use crate::scu::MODALITY_WORKLIST_FIND;
use crate::uid;

/// Everything that goes into one scheduled procedure step.
#[derive(Debug, Clone)]
pub struct WorklistEntry {
    pub patient_name: String,
    pub patient_id: String,
    pub patient_birth_date: String,
    pub patient_sex: String,
    pub accession_number: String,
    pub modality: String,
    pub scheduled_station_aet: String,
    pub procedure_description: String,
}

impl Default for WorklistEntry {
    fn default() -> Self {
        Self {
            patient_name: "DOE^JOHN".to_string(),
            patient_id: "PID0001".to_string(),
            patient_birth_date: "19700101".to_string(),
            patient_sex: "M".to_string(),
            accession_number: format!("ACC{}", Utc::now().format("%Y%m%d%H%M%S")),
            modality: "CT".to_string(),
            scheduled_station_aet: "CT01".to_string(),
            procedure_description: "CT CHEST WITHOUT CONTRAST".to_string(),
        }
    }
}

/// Build the worklist dataset for one scheduled procedure step.
///
/// The generated Study Instance UID links the eventual acquisition back to
/// this entry, so it is returned alongside the dataset.
pub fn build_entry(entry: &WorklistEntry) -> (InMemDicomObject<StandardDataDictionary>, String) {
    let study_uid = uid::new_uid();
    let now = Utc::now();

    let mut obj = InMemDicomObject::new_empty();
    obj.put(DataElement::new(
        Tag(0x0008, 0x0005),
        VR::CS,
        PrimitiveValue::from("ISO_IR 100"),
    ));
    obj.put(DataElement::new(
        Tag(0x0008, 0x0050),
        VR::SH,
        PrimitiveValue::from(entry.accession_number.clone()),
    ));
    obj.put(DataElement::new(
        Tag(0x0010, 0x0010),
        VR::PN,
        PrimitiveValue::from(entry.patient_name.clone()),
    ));
    obj.put(DataElement::new(
        Tag(0x0010, 0x0020),
        VR::LO,
        PrimitiveValue::from(entry.patient_id.clone()),
    ));
    obj.put(DataElement::new(
        Tag(0x0010, 0x0030),
        VR::DA,
        PrimitiveValue::from(entry.patient_birth_date.clone()),
    ));
    obj.put(DataElement::new(
        Tag(0x0010, 0x0040),
        VR::CS,
        PrimitiveValue::from(entry.patient_sex.clone()),
    ));
    obj.put(DataElement::new(
        Tag(0x0020, 0x000D),
        VR::UI,
        PrimitiveValue::from(study_uid.clone()),
    ));
    obj.put(DataElement::new(
        Tag(0x0032, 0x1060),
        VR::LO,
        PrimitiveValue::from(entry.procedure_description.clone()),
    ));
    obj.put(DataElement::new(
        Tag(0x0040, 0x1001),
        VR::SH,
        PrimitiveValue::from("RP0001"),
    ));

    // Scheduled Procedure Step Sequence with a single item.
    let mut step = InMemDicomObject::new_empty();
    step.put(DataElement::new(
        Tag(0x0008, 0x0060),
        VR::CS,
        PrimitiveValue::from(entry.modality.clone()),
    ));
    step.put(DataElement::new(
        Tag(0x0040, 0x0001),
        VR::AE,
        PrimitiveValue::from(entry.scheduled_station_aet.clone()),
    ));
    step.put(DataElement::new(
        Tag(0x0040, 0x0002),
        VR::DA,
        PrimitiveValue::from(now.format("%Y%m%d").to_string()),
    ));
    step.put(DataElement::new(
        Tag(0x0040, 0x0003),
        VR::TM,
        PrimitiveValue::from(now.format("%H%M%S").to_string()),
    ));
    step.put(DataElement::new(
        Tag(0x0040, 0x0007),
        VR::LO,
        PrimitiveValue::from(entry.procedure_description.clone()),
    ));
    step.put(DataElement::new(
        Tag(0x0040, 0x0009),
        VR::SH,
        PrimitiveValue::from("SPS0001"),
    ));
    obj.put(DataElement::new(
        Tag(0x0040, 0x0100),
        VR::SQ,
        Value::Sequence(DataSetSequence::from(vec![step])),
    ));

    (obj, study_uid)
}

/// Write the entry into the worklist directory as `<accession>.wl`.
pub fn create_worklist_file(entry: &WorklistEntry, worklist_dir: &Path) -> Result<(PathBuf, String)> {
    let (obj, study_uid) = build_entry(entry);

    fs::create_dir_all(worklist_dir).context("Failed to create worklist directory")?;
    let path = worklist_dir.join(format!("{}.wl", entry.accession_number));

    let file_meta = FileMetaTableBuilder::new()
        .transfer_syntax(EXPLICIT_VR_LITTLE_ENDIAN.uid())
        .media_storage_sop_class_uid(MODALITY_WORKLIST_FIND)
        .media_storage_sop_instance_uid(uid::new_uid())
        .build()
        .context("Failed to build worklist file meta")?;

    let mut file_obj =
        FileDicomObject::new_empty_with_dict_and_meta(StandardDataDictionary::default(), file_meta);
    for elem in obj {
        file_obj.put(elem);
    }
    file_obj
        .write_to_file(&path)
        .context("Failed to write worklist file")?;

    println!("Worklist entry saved to {:?} (study {})", path, study_uid);
    Ok((path, study_uid))
}

/// Broad matching identifier for querying every scheduled step.
///
/// Universal matching on the patient name plus empty return keys for the
/// attributes the workflow prints afterwards.
pub fn query_identifier() -> InMemDicomObject<StandardDataDictionary> {
    let mut obj = InMemDicomObject::new_empty();
    obj.put(DataElement::new(
        Tag(0x0008, 0x0050),
        VR::SH,
        PrimitiveValue::Empty,
    ));
    obj.put(DataElement::new(
        Tag(0x0010, 0x0010),
        VR::PN,
        PrimitiveValue::from("*"),
    ));
    obj.put(DataElement::new(
        Tag(0x0010, 0x0020),
        VR::LO,
        PrimitiveValue::Empty,
    ));
    obj.put(DataElement::new(
        Tag(0x0020, 0x000D),
        VR::UI,
        PrimitiveValue::Empty,
    ));

    let mut step = InMemDicomObject::new_empty();
    step.put(DataElement::new(
        Tag(0x0008, 0x0060),
        VR::CS,
        PrimitiveValue::Empty,
    ));
    step.put(DataElement::new(
        Tag(0x0040, 0x0001),
        VR::AE,
        PrimitiveValue::Empty,
    ));
    step.put(DataElement::new(
        Tag(0x0040, 0x0002),
        VR::DA,
        PrimitiveValue::Empty,
    ));
    step.put(DataElement::new(
        Tag(0x0040, 0x0003),
        VR::TM,
        PrimitiveValue::Empty,
    ));
    obj.put(DataElement::new(
        Tag(0x0040, 0x0100),
        VR::SQ,
        Value::Sequence(DataSetSequence::from(vec![step])),
    ));

    obj
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dicom_access::{first_item, ElementAccess};

    #[test]
    fn entry_contains_patient_study_and_step() {
        let entry = WorklistEntry::default();
        let (obj, study_uid) = build_entry(&entry);

        assert_eq!(
            obj.element_str(Tag(0x0010, 0x0010)).as_deref(),
            Some("DOE^JOHN")
        );
        assert_eq!(
            obj.element_str(Tag(0x0020, 0x000D)).as_deref(),
            Some(study_uid.as_str())
        );

        let step = first_item(&obj, Tag(0x0040, 0x0100)).expect("scheduled step");
        assert_eq!(step.element_str(Tag(0x0008, 0x0060)).as_deref(), Some("CT"));
        assert_eq!(
            step.element_str(Tag(0x0040, 0x0001)).as_deref(),
            Some("CT01")
        );
    }

    #[test]
    fn worklist_file_roundtrips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let entry = WorklistEntry::default();

        let (path, study_uid) =
            create_worklist_file(&entry, dir.path()).expect("create worklist");
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("wl"));

        let restored = dicom::object::open_file(&path).expect("open worklist");
        assert_eq!(
            restored.element_str(Tag(0x0010, 0x0020)).as_deref(),
            Some("PID0001")
        );
        assert_eq!(
            restored.element_str(Tag(0x0020, 0x000D)).as_deref(),
            Some(study_uid.as_str())
        );
    }
}
