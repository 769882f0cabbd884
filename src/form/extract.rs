use std::collections::HashSet;
use std::iter::FusedIterator;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::form::classify::classify;
use crate::form::field::{FieldDescriptor, FieldKind, RawField};
use crate::form::normalize::clean_label;
use crate::form::surface::FormSurface;

/// Descriptors of one page visit, yielded in DOM order.
///
/// Built from a single scan and consumed once; a new page state needs a new
/// extraction. Hidden, disabled and duplicate controls are skipped as the
/// iterator advances.
#[derive(Debug)]
pub struct Fields {
    raw: std::vec::IntoIter<RawField>,
    seen: HashSet<String>,
}

impl Fields {
    pub fn from_raw(raw: Vec<RawField>) -> Self {
        Self {
            raw: raw.into_iter(),
            seen: HashSet::new(),
        }
    }

    pub fn empty() -> Self {
        Self::from_raw(Vec::new())
    }
}

impl Iterator for Fields {
    type Item = FieldDescriptor;

    fn next(&mut self) -> Option<FieldDescriptor> {
        for raw in self.raw.by_ref() {
            let Some(descriptor) = describe(raw) else {
                continue;
            };
            if !descriptor.identifier.is_empty()
                && !self.seen.insert(descriptor.identifier.clone())
            {
                debug!(id = %descriptor.identifier, "skipping duplicate control");
                continue;
            }
            return Some(descriptor);
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.raw.size_hint().1)
    }
}

impl FusedIterator for Fields {}

/// Turn one scanned control into a descriptor, or `None` when it is hidden
/// or disabled.
///
/// The label comes from the explicit label first, then `aria-label`, then
/// the nearest preceding text. An asterisk in whichever text is used marks the
/// field required, as does the HTML/ARIA required flag.
pub fn describe(raw: RawField) -> Option<FieldDescriptor> {
    if raw.hidden || raw.disabled {
        return None;
    }

    let source = [&raw.label_text, &raw.aria_label, &raw.preceding_text]
        .into_iter()
        .find(|text| !clean_label(text).is_empty())
        .map(String::as_str)
        .unwrap_or("");

    let kind = classify(&raw);
    let required = raw.required_attr || source.contains('*');
    let options = if kind.has_options() {
        raw.options
            .iter()
            .map(|o| clean_label(o))
            .filter(|o| !o.is_empty())
            .collect()
    } else {
        Vec::new()
    };

    Some(FieldDescriptor {
        label: clean_label(source),
        kind,
        identifier: raw.id,
        options,
        required,
    })
}

/// Scan the current page and return its fields.
///
/// A page without a recognisable form yields an empty sequence; so does a
/// scan that fails for any reason short of the session itself timing out or
/// dying, which is the only error returned.
pub async fn extract_fields<S: FormSurface + ?Sized>(surface: &S) -> Result<Fields> {
    match surface.scan_fields().await {
        Ok(raw) => {
            if raw.is_empty() {
                info!("no form found on page");
            } else {
                debug!(controls = raw.len(), "page scanned");
            }
            Ok(Fields::from_raw(raw))
        }
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warn!(error = %e, "form scan failed, treating page as form-less");
            Ok(Fields::empty())
        }
    }
}

/// Count of descriptors a scan would produce that the filler can act on.
pub fn actionable(fields: &[FieldDescriptor]) -> usize {
    fields
        .iter()
        .filter(|f| f.kind != FieldKind::Unsupported)
        .count()
}
