use crate::form::field::{FieldKind, RawField};

const MULTISELECT_CONTAINER: &str = "multiSelectContainer";
const DATE_WRAPPER: &str = "dateInputWrapper";
const FILE_UPLOAD: &str = "attachments-FileUpload";

/// Decide the kind of a scanned control from its tag and attributes.
///
/// Workday composite widgets are recognised by their `data-automation-id`
/// first; plain HTML controls fall through to tag/type rules. Anything left
/// over is `Unsupported` rather than an error.
pub fn classify(raw: &RawField) -> FieldKind {
    let tag = raw.tag.to_ascii_lowercase();
    let input_type = raw.input_type.to_ascii_lowercase();
    let role = raw.role.to_ascii_lowercase();

    match raw.automation_id.as_str() {
        MULTISELECT_CONTAINER => return FieldKind::Multiselect,
        DATE_WRAPPER => return FieldKind::Date,
        FILE_UPLOAD => return FieldKind::File,
        _ => {}
    }

    match tag.as_str() {
        "select" if raw.multiple => FieldKind::Multiselect,
        "select" => FieldKind::Dropdown,
        "textarea" => FieldKind::Text,
        "button" if raw.has_popup.eq_ignore_ascii_case("listbox") => FieldKind::Dropdown,
        "input" => match input_type.as_str() {
            "" | "text" | "email" | "tel" | "url" | "number" | "search" => FieldKind::Text,
            "password" => FieldKind::Password,
            "checkbox" => FieldKind::Checkbox,
            "radio" => FieldKind::Radio,
            "file" => FieldKind::File,
            "date" | "month" => FieldKind::Date,
            _ => FieldKind::Unsupported,
        },
        _ => match role.as_str() {
            "combobox" | "listbox" => FieldKind::Dropdown,
            "radiogroup" => FieldKind::Radio,
            "checkbox" => FieldKind::Checkbox,
            "textbox" => FieldKind::Text,
            _ => FieldKind::Unsupported,
        },
    }
}
