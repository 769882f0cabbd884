//! Repeatable blocks: Work Experience, Education, Languages and friends.
//!
//! Workday renders each entry as a block of controls whose ids share a
//! `<prefix>-<n>--` head (`workExperience-2--companyName`). Blocks beyond the
//! ones already on the page appear after clicking the section's "Add" button.
//! Each block is filled from one entry of the matching profile group through
//! the ordinary rule chain.

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::form::extract::extract_fields;
use crate::form::field::FieldDescriptor;
use crate::form::fill::fill_fields;
use crate::form::normalize::normalize_label;
use crate::form::surface::FormSurface;
use crate::profile::Section;
use crate::report::StepReport;
use crate::steps::Step;

/// A kind of repeatable block Workday knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatGroup {
    /// Profile key, singular and snake case.
    pub key: &'static str,
    /// Id head shared by the block's controls.
    pub id_prefix: &'static str,
    /// Caption of the section heading holding the "Add" button.
    pub heading: &'static str,
}

pub const GROUPS: &[RepeatGroup] = &[
    RepeatGroup { key: "work_experience", id_prefix: "workExperience", heading: "Work Experience" },
    RepeatGroup { key: "education", id_prefix: "education", heading: "Education" },
    RepeatGroup { key: "language", id_prefix: "language", heading: "Languages" },
    RepeatGroup { key: "certification", id_prefix: "certification", heading: "Certifications" },
    RepeatGroup { key: "website", id_prefix: "webAddress", heading: "Websites" },
];

impl RepeatGroup {
    /// The group a profile key names; a trailing plural `s` is accepted.
    pub fn for_key(name: &str) -> Option<&'static RepeatGroup> {
        let norm = normalize_label(name);
        let singular = norm.strip_suffix('s').unwrap_or(&norm);
        GROUPS.iter().find(|g| {
            let key = normalize_label(g.key);
            key == norm || key == singular
        })
    }
}

/// Split a block control id into its group prefix and 1-based index.
pub fn block_of(identifier: &str) -> Option<(&str, usize)> {
    let (head, _) = identifier.split_once("--")?;
    let (prefix, index) = head.rsplit_once('-')?;
    let index = index.parse::<usize>().ok().filter(|n| *n > 0)?;
    Some((prefix, index))
}

/// Whether `field` sits in a block of a group that `section` answers.
pub fn owned_by_group(field: &FieldDescriptor, section: &Section) -> bool {
    let Some((prefix, _)) = block_of(&field.identifier) else {
        return false;
    };
    section
        .groups()
        .filter_map(|(name, _)| RepeatGroup::for_key(name))
        .any(|g| g.id_prefix.eq_ignore_ascii_case(prefix))
}

fn block_fields(fields: &[FieldDescriptor], group: &RepeatGroup, index: usize) -> Vec<FieldDescriptor> {
    fields
        .iter()
        .filter(|f| {
            block_of(&f.identifier)
                .is_some_and(|(p, n)| n == index && p.eq_ignore_ascii_case(group.id_prefix))
        })
        .cloned()
        .collect()
}

/// Fill one block per entry of every repeatable group in `section`,
/// clicking "Add" for blocks not yet rendered. `view` is the form as last
/// extracted; outcomes are appended to `report`.
pub async fn fill_repeats<S: FormSurface + ?Sized>(
    surface: &S,
    step: Step,
    section: &Section,
    mut view: Vec<FieldDescriptor>,
    report: &mut StepReport,
) -> Result<()> {
    for (name, entries) in section.groups() {
        let Some(group) = RepeatGroup::for_key(name) else {
            warn!(%step, group = name, "profile group has no known Workday section");
            continue;
        };

        for (i, entry) in entries.iter().enumerate() {
            let index = i + 1;
            let mut block = block_fields(&view, group, index);
            if block.is_empty() {
                if !surface.add_entry(group.heading).await? {
                    warn!(%step, section = group.heading, index, "no Add button for another entry");
                    break;
                }
                view = extract_fields(surface).await?.collect();
                block = block_fields(&view, group, index);
            }
            if block.is_empty() {
                warn!(%step, section = group.heading, index, "Add did not render a new block");
                break;
            }

            debug!(%step, section = group.heading, index, fields = block.len(), "filling block");
            report.absorb(fill_fields(surface, step, block, Some(entry)).await?);
        }
        info!(%step, section = group.heading, entries = entries.len(), "repeatable section filled");
    }
    Ok(())
}
