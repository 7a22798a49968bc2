use uuid::Uuid;

/// Generate a DICOM UID under the UUID-derived `2.25` root.
///
/// Encoding a random UUID as a decimal integer keeps the UID unique without
/// requiring a registered organizational root.
pub fn new_uid() -> String {
    format!("2.25.{}", Uuid::new_v4().as_u128())
}
