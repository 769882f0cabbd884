use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed set of input kinds the filler knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Password,
    Checkbox,
    Radio,
    Dropdown,
    Multiselect,
    File,
    /// Workday month/year spin-button pickers and native date inputs.
    Date,
    Unsupported,
}

impl FieldKind {
    /// Kinds whose answer must be one of the rendered options.
    pub fn has_options(self) -> bool {
        matches!(self, FieldKind::Radio | FieldKind::Dropdown | FieldKind::Multiselect)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Text => "text",
            FieldKind::Password => "password",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Radio => "radio",
            FieldKind::Dropdown => "dropdown",
            FieldKind::Multiselect => "multiselect",
            FieldKind::File => "file",
            FieldKind::Date => "date",
            FieldKind::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

/// One extracted form input. Serializes to the interchange shape
/// `{label, type, id, options?, required}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(rename = "id")]
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    pub required: bool,
}

/// What the page scan reports for a single control, before label
/// resolution, classification and filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawField {
    pub tag: String,
    #[serde(rename = "type")]
    pub input_type: String,
    pub role: String,
    pub automation_id: String,
    pub has_popup: String,
    pub multiple: bool,
    /// DOM id, or the handle the scan stamped on the element.
    pub id: String,
    pub name: String,
    /// `<label for>`, wrapping label, fieldset legend or form-field caption.
    pub label_text: String,
    pub aria_label: String,
    pub preceding_text: String,
    /// HTML `required` or `aria-required="true"`.
    pub required_attr: bool,
    pub hidden: bool,
    pub disabled: bool,
    pub options: Vec<String>,
    /// Options only render once the control is opened.
    pub needs_options: bool,
}
