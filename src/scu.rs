//
// scu.rs
// Imaging-Workflow-rs
//
// Implements blocking C-ECHO, C-STORE, and C-FIND service class user operations for the workflow.
//
// Thales Matheus Mendonça Santos - February 2026

use anyhow::{bail, Context, Result};
use dicom::core::{DataElement, PrimitiveValue, Tag, VR};
use dicom::object::{open_file, InMemDicomObject};
use dicom_ul::association::client::ClientAssociationOptions;
use dicom_ul::pdu::{PDataValue, PDataValueType, Pdu, PresentationContextResultReason};
use std::path::Path;

// Import Registry
use dicom::transfer_syntax::TransferSyntaxRegistry;
// Import Index trait to enable .get().
use dicom::encoding::TransferSyntaxIndex;

/// DIMSE status signalling a fully successful operation.
pub const SUCCESS: u16 = 0x0000;

/// Verification SOP class (C-ECHO).
pub const VERIFICATION_SOP_CLASS: &str = "1.2.840.10008.1.1";
/// Modality Worklist information model (C-FIND).
pub const MODALITY_WORKLIST_FIND: &str = "1.2.840.10008.5.1.4.31";

const IMPLICIT_VR_LE: &str = "1.2.840.10008.1.2";

// C-FIND responses keep coming while the status is pending.
fn is_pending(status: u16) -> bool {
    matches!(status, 0xFF00 | 0xFF01)
}

/// Perform a DICOM C-ECHO against the given AE and return the response status.
pub fn echo(addr: &str, calling_aet: &str, called_aet: &str) -> Result<u16> {
    println!("Sending C-ECHO to {} (AET {})", addr, called_aet);

    let mut association = ClientAssociationOptions::new()
        .with_abstract_syntax(VERIFICATION_SOP_CLASS)
        .calling_ae_title(calling_aet.to_string())
        .called_ae_title(called_aet.to_string())
        .establish(addr)
        .context("Failed to establish association")?;

    let pc_id = association
        .presentation_contexts()
        .iter()
        .find(|pc| pc.reason == PresentationContextResultReason::Acceptance)
        .map(|pc| pc.id)
        .context("No accepted presentation context for Verification")?;

    // Construct C-ECHO-RQ
    // Command set is a tiny DICOM dataset encoded with Implicit VR LE.
    let mut cmd = InMemDicomObject::new_empty();
    cmd.put(DataElement::new(
        Tag(0x0000, 0x0002),
        VR::UI,
        PrimitiveValue::from(VERIFICATION_SOP_CLASS),
    ));
    cmd.put(DataElement::new(
        Tag(0x0000, 0x0100),
        VR::US,
        PrimitiveValue::from(0x0030_u16),
    ));
    cmd.put(DataElement::new(
        Tag(0x0000, 0x0110),
        VR::US,
        PrimitiveValue::from(1_u16),
    ));
    cmd.put(DataElement::new(
        Tag(0x0000, 0x0800),
        VR::US,
        PrimitiveValue::from(0x0101_u16),
    ));

    let ts = TransferSyntaxRegistry
        .get(IMPLICIT_VR_LE)
        .context("Implicit VR Little Endian transfer syntax not found")?;

    let mut command_bytes = Vec::new();
    cmd.write_dataset_with_ts(&mut command_bytes, ts)
        .context("Failed to encode command set")?;

    association
        .send(&Pdu::PData {
            data: vec![PDataValue {
                presentation_context_id: pc_id,
                value_type: PDataValueType::Command,
                is_last: true,
                data: command_bytes,
            }],
        })
        .context("Failed to send C-ECHO-RQ")?;

    let msg = association
        .receive()
        .context("Failed to receive C-ECHO-RSP")?;
    let status = response_status(&msg)?;

    let _ = association.release();
    Ok(status)
}

/// Perform a C-STORE pushing a single object to a remote AE.
///
/// The object's own SOP class is negotiated for the association and the
/// dataset is re-encoded with whichever transfer syntax the peer accepted.
/// Returns the response status; callers decide whether a non-zero status
/// aborts their run.
pub fn store(addr: &str, calling_aet: &str, called_aet: &str, file: &Path) -> Result<u16> {
    println!("Sending C-STORE for {:?} to {}", file, addr);

    let obj = open_file(file).context("Failed to open DICOM file")?;

    let sop_class = obj
        .element(Tag(0x0008, 0x0016))
        .context("Missing SOP Class UID")?
        .to_str()?;
    let sop_instance = obj
        .element(Tag(0x0008, 0x0018))
        .context("Missing SOP Instance UID")?
        .to_str()?;

    let mut association = ClientAssociationOptions::new()
        .with_abstract_syntax(sop_class.to_string())
        .calling_ae_title(calling_aet.to_string())
        .called_ae_title(called_aet.to_string())
        .establish(addr)
        .context("Failed to establish association")?;

    let pc_id = association
        .presentation_contexts()
        .iter()
        .find(|pc| pc.reason == PresentationContextResultReason::Acceptance)
        .map(|pc| pc.id)
        .context("No accepted presentation context for file SOP Class")?;

    // Construct C-STORE-RQ
    // Only the required command elements are included here; dataset follows as its own PDV.
    let mut cmd = InMemDicomObject::new_empty();
    cmd.put(DataElement::new(
        Tag(0x0000, 0x0002),
        VR::UI,
        PrimitiveValue::from(sop_class.to_string()),
    ));
    cmd.put(DataElement::new(
        Tag(0x0000, 0x0100),
        VR::US,
        PrimitiveValue::from(0x0001_u16),
    ));
    cmd.put(DataElement::new(
        Tag(0x0000, 0x0110),
        VR::US,
        PrimitiveValue::from(1_u16),
    ));
    cmd.put(DataElement::new(
        Tag(0x0000, 0x0700),
        VR::US,
        PrimitiveValue::from(0_u16),
    ));
    cmd.put(DataElement::new(
        Tag(0x0000, 0x0800),
        VR::US,
        PrimitiveValue::from(0x0000_u16),
    ));
    cmd.put(DataElement::new(
        Tag(0x0000, 0x1000),
        VR::UI,
        PrimitiveValue::from(sop_instance.to_string()),
    ));

    let ts_ivrle = TransferSyntaxRegistry
        .get(IMPLICIT_VR_LE)
        .context("Implicit VR Little Endian transfer syntax not found")?;

    let mut command_bytes = Vec::new();
    cmd.write_dataset_with_ts(&mut command_bytes, ts_ivrle)
        .context("Failed to encode command set")?;

    let negotiated_ts_uid = association
        .presentation_contexts()
        .iter()
        .find(|pc| pc.id == pc_id)
        .map(|pc| pc.transfer_syntax.clone())
        .context("Accepted presentation context disappeared")?;
    let ts_negotiated = TransferSyntaxRegistry
        .get(&negotiated_ts_uid)
        .context(format!(
            "Negotiated transfer syntax {} not found",
            negotiated_ts_uid
        ))?;

    let mut data_bytes = Vec::new();
    obj.write_dataset_with_ts(&mut data_bytes, ts_negotiated)
        .context("Failed to encode data set")?;

    association.send(&Pdu::PData {
        data: vec![PDataValue {
            presentation_context_id: pc_id,
            value_type: PDataValueType::Command,
            is_last: true,
            data: command_bytes,
        }],
    })?;

    association.send(&Pdu::PData {
        data: vec![PDataValue {
            presentation_context_id: pc_id,
            value_type: PDataValueType::Data,
            is_last: true,
            data: data_bytes,
        }],
    })?;

    let msg = association
        .receive()
        .context("Failed to receive C-STORE-RSP")?;
    let status = response_status(&msg)?;

    let _ = association.release();
    Ok(status)
}

/// Perform a C-FIND with the given information model and identifier,
/// collecting every matching dataset until the peer reports a final status.
pub fn find(
    addr: &str,
    calling_aet: &str,
    called_aet: &str,
    sop_class_uid: &str,
    identifier: &InMemDicomObject,
) -> Result<Vec<InMemDicomObject>> {
    let mut association = ClientAssociationOptions::new()
        .with_abstract_syntax(sop_class_uid.to_string())
        .calling_ae_title(calling_aet.to_string())
        .called_ae_title(called_aet.to_string())
        .establish(addr)
        .context("Failed to establish association")?;

    let pc_id = association
        .presentation_contexts()
        .iter()
        .find(|pc| pc.reason == PresentationContextResultReason::Acceptance)
        .map(|pc| pc.id)
        .context("No accepted presentation context for C-FIND")?;

    // Construct C-FIND-RQ
    let mut cmd = InMemDicomObject::new_empty();
    cmd.put(DataElement::new(
        Tag(0x0000, 0x0002),
        VR::UI,
        PrimitiveValue::from(sop_class_uid),
    ));
    cmd.put(DataElement::new(
        Tag(0x0000, 0x0100),
        VR::US,
        PrimitiveValue::from(0x0020_u16),
    ));
    cmd.put(DataElement::new(
        Tag(0x0000, 0x0110),
        VR::US,
        PrimitiveValue::from(1_u16),
    ));
    cmd.put(DataElement::new(
        Tag(0x0000, 0x0700),
        VR::US,
        PrimitiveValue::from(0_u16),
    ));
    cmd.put(DataElement::new(
        Tag(0x0000, 0x0800),
        VR::US,
        PrimitiveValue::from(0x0000_u16),
    ));

    let ts_ivrle = TransferSyntaxRegistry
        .get(IMPLICIT_VR_LE)
        .context("Implicit VR Little Endian transfer syntax not found")?;

    let mut command_bytes = Vec::new();
    cmd.write_dataset_with_ts(&mut command_bytes, ts_ivrle)
        .context("Failed to encode command set")?;

    let negotiated_ts_uid = association
        .presentation_contexts()
        .iter()
        .find(|pc| pc.id == pc_id)
        .map(|pc| pc.transfer_syntax.clone())
        .context("Accepted presentation context disappeared")?;
    let ts_negotiated = TransferSyntaxRegistry
        .get(&negotiated_ts_uid)
        .context(format!(
            "Negotiated transfer syntax {} not found",
            negotiated_ts_uid
        ))?;

    let mut identifier_bytes = Vec::new();
    identifier
        .write_dataset_with_ts(&mut identifier_bytes, ts_negotiated)
        .context("Failed to encode C-FIND identifier")?;

    association.send(&Pdu::PData {
        data: vec![
            PDataValue {
                presentation_context_id: pc_id,
                value_type: PDataValueType::Command,
                is_last: true,
                data: command_bytes,
            },
            PDataValue {
                presentation_context_id: pc_id,
                value_type: PDataValueType::Data,
                is_last: true,
                data: identifier_bytes,
            },
        ],
    })?;

    // Responses interleave command sets (with a pending status) and match
    // datasets; PDVs for either may be fragmented across PData PDUs.
    let mut results = Vec::new();
    let mut command_buf: Vec<u8> = Vec::new();
    let mut data_buf: Vec<u8> = Vec::new();

    loop {
        let msg = association
            .receive()
            .context("Failed to receive C-FIND-RSP")?;
        let data = match msg {
            Pdu::PData { data } => data,
            other => bail!("Unexpected PDU while waiting for C-FIND-RSP: {:?}", other),
        };

        let mut final_status = None;
        for pdv in data {
            match pdv.value_type {
                PDataValueType::Command => {
                    command_buf.extend(pdv.data);
                    if pdv.is_last {
                        let cmd = InMemDicomObject::read_dataset_with_ts(&command_buf[..], ts_ivrle)
                            .context("Failed to decode C-FIND-RSP command set")?;
                        command_buf.clear();
                        let status = status_of(&cmd)?;
                        if !is_pending(status) {
                            final_status = Some(status);
                        }
                    }
                }
                PDataValueType::Data => {
                    data_buf.extend(pdv.data);
                    if pdv.is_last {
                        let dataset =
                            InMemDicomObject::read_dataset_with_ts(&data_buf[..], ts_negotiated)
                                .context("Failed to decode C-FIND match")?;
                        data_buf.clear();
                        results.push(dataset);
                    }
                }
            }
        }

        if let Some(status) = final_status {
            let _ = association.release();
            if status != SUCCESS {
                bail!("C-FIND failed with status 0x{:04X}", status);
            }
            return Ok(results);
        }
    }
}

/// Pull the DIMSE status out of a response PDU's command set.
fn response_status(msg: &Pdu) -> Result<u16> {
    let data = match msg {
        Pdu::PData { data } => data,
        other => bail!("Unexpected PDU in response: {:?}", other),
    };

    let ts = TransferSyntaxRegistry
        .get(IMPLICIT_VR_LE)
        .context("Implicit VR Little Endian transfer syntax not found")?;

    for pdv in data {
        if matches!(pdv.value_type, PDataValueType::Command) {
            let cmd = InMemDicomObject::read_dataset_with_ts(&pdv.data[..], ts)
                .context("Failed to decode response command set")?;
            return status_of(&cmd);
        }
    }
    bail!("Response contained no command set");
}

fn status_of(cmd: &InMemDicomObject) -> Result<u16> {
    cmd.element(Tag(0x0000, 0x0900))
        .context("Response command set is missing a status")?
        .to_int::<u16>()
        .context("Malformed status in response command set")
}
