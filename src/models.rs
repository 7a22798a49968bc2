//
// models.rs
// Imaging-Workflow-rs
//
// Defines the deserialized shape of DICOMweb study metadata as returned by QIDO queries.
//
// Thales Matheus Mendonça Santos - February 2026

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One attribute of a DICOM JSON dataset: the value representation plus the
/// ordered list of raw values. Both parts are optional on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagValues {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vr: Option<String>,
    #[serde(rename = "Value", default, skip_serializing_if = "Vec::is_empty")]
    pub value: Vec<serde_json::Value>,
}

/// A single study-level metadata record keyed by 8-digit hexadecimal tag
/// (group + element, e.g. `0020000D`). Read-only once deserialized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudyMetadataRecord(pub BTreeMap<String, TagValues>);

impl StudyMetadataRecord {
    fn first_value(&self, tag: &str) -> Option<&serde_json::Value> {
        self.0.get(tag).and_then(|entry| entry.value.first())
    }

    /// First value of the tag rendered as a trimmed string. Numbers are
    /// rendered in their decimal form; anything else is treated as absent.
    pub fn string_value(&self, tag: &str) -> Option<String> {
        match self.first_value(tag)? {
            serde_json::Value::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    None
                } else {
                    Some(s.to_string())
                }
            }
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// First value of the tag as a non-negative count. Missing, empty, or
    /// unparseable values coerce to zero.
    pub fn count_value(&self, tag: &str) -> u32 {
        match self.first_value(tag) {
            Some(serde_json::Value::Number(n)) => {
                n.as_u64().and_then(|v| u32::try_from(v).ok()).unwrap_or(0)
            }
            Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: serde_json::Value) -> StudyMetadataRecord {
        serde_json::from_value(json).expect("record")
    }

    #[test]
    fn string_and_count_access() {
        let rec = record(serde_json::json!({
            "0020000D": {"vr": "UI", "Value": ["1.2.3"]},
            "00200006": {"vr": "IS", "Value": ["4"]},
            "00200008": {"vr": "IS", "Value": [17]},
        }));

        assert_eq!(rec.string_value("0020000D").as_deref(), Some("1.2.3"));
        assert_eq!(rec.count_value("00200006"), 4);
        assert_eq!(rec.count_value("00200008"), 17);
    }

    #[test]
    fn missing_and_malformed_values_coerce() {
        let rec = record(serde_json::json!({
            "00080020": {"vr": "DA"},
            "00200006": {"vr": "IS", "Value": ["not-a-number"]},
        }));

        assert_eq!(rec.string_value("00080020"), None);
        assert_eq!(rec.string_value("00080061"), None);
        assert_eq!(rec.count_value("00200006"), 0);
        assert_eq!(rec.count_value("00200008"), 0);
    }
}
