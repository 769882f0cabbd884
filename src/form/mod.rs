//! Form extraction and autofill engine.
//!
//! [`extract::extract_fields`] turns whatever form is rendered into
//! [`FieldDescriptor`]s, [`matcher`] resolves each one against the step's
//! profile section, and [`fill::fill_section`] applies the answers (with
//! [`repeat`] handling Work Experience style blocks) and builds the step
//! report. Everything that touches the browser goes through
//! [`FormSurface`], so the engine runs the same against a live page or a test
//! double.

pub mod classify;
pub mod extract;
pub mod field;
pub mod fill;
pub mod matcher;
pub mod normalize;
pub mod repeat;
pub mod surface;
pub mod synonyms;

pub use extract::{extract_fields, Fields};
pub use field::{FieldDescriptor, FieldKind, RawField};
pub use fill::{fill_fields, fill_section, fill_step};
pub use surface::FormSurface;
