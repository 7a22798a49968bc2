use dicom::core::Tag;
use dicom::dictionary_std::StandardDataDictionary;
use dicom::object::{DefaultDicomObject, InMemDicomObject};

/// Small helper trait to pull string values from different DICOM object shapes.
pub trait ElementAccess {
    fn element_str(&self, tag: Tag) -> Option<String>;
    fn has_element(&self, tag: Tag) -> bool;
}

impl ElementAccess for DefaultDicomObject {
    fn element_str(&self, tag: Tag) -> Option<String> {
        self.element(tag)
            .ok()
            .and_then(|e| e.to_str().ok())
            .map(|s| trimmed(&s))
    }

    fn has_element(&self, tag: Tag) -> bool {
        self.element(tag).is_ok()
    }
}

impl ElementAccess for InMemDicomObject<StandardDataDictionary> {
    fn element_str(&self, tag: Tag) -> Option<String> {
        self.element(tag)
            .ok()
            .and_then(|e| e.to_str().ok())
            .map(|s| trimmed(&s))
    }

    fn has_element(&self, tag: Tag) -> bool {
        self.element(tag).is_ok()
    }
}

// DICOM text values are padded to even length with spaces or NULs.
fn trimmed(raw: &str) -> String {
    raw.trim_end_matches(['\0', ' ']).to_string()
}

/// First item of a sequence element, if the tag is present and holds one.
pub fn first_item(
    obj: &InMemDicomObject<StandardDataDictionary>,
    tag: Tag,
) -> Option<&InMemDicomObject<StandardDataDictionary>> {
    obj.element(tag)
        .ok()
        .and_then(|e| e.items())
        .and_then(|items| items.first())
}
