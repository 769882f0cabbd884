use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::form::field::{FieldDescriptor, RawField};

/// The live form the engine reads from and writes to.
///
/// Implemented by [`crate::page::Page`]; every call is one blocking round
/// trip, and the engine never issues two at once. Implementations return
/// [`crate::Error::Timeout`] when the page stops responding so the run can
/// abort; any other error is charged to the field being filled.
#[async_trait]
pub trait FormSurface: Send + Sync {
    /// Scan every interactive control in DOM order, options included.
    async fn scan_fields(&self) -> Result<Vec<RawField>>;

    /// Replace the value of a text, password or date control.
    async fn fill_text(&self, field: &FieldDescriptor, value: &str) -> Result<()>;

    /// Bring a checkbox to the requested state.
    async fn set_checked(&self, field: &FieldDescriptor, checked: bool) -> Result<()>;

    /// Select the given option labels, which are taken verbatim from
    /// `field.options`.
    async fn choose_options(&self, field: &FieldDescriptor, choices: &[String]) -> Result<()>;

    /// Attach an existing file to an upload control.
    async fn upload_file(&self, field: &FieldDescriptor, path: &Path) -> Result<()>;

    /// Click the "Add" button of the repeatable section captioned `heading`.
    /// Returns `false` when the section or its button is not on the page.
    async fn add_entry(&self, heading: &str) -> Result<bool>;
}
