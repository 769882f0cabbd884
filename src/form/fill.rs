use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::form::extract::extract_fields;
use crate::form::field::{FieldDescriptor, FieldKind};
use crate::form::matcher::{match_option, resolve};
use crate::form::repeat::{fill_repeats, owned_by_group};
use crate::form::surface::FormSurface;
use crate::profile::{ProfileValue, Section};
use crate::report::{FieldOutcome, FillFailure, StepReport};
use crate::steps::Step;

/// The page operation an answer turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillAction {
    Text(String),
    Check(bool),
    /// Option labels exactly as rendered.
    Choose(Vec<String>),
    Upload(PathBuf),
}

/// Decide what to do with `value` for `field` without touching the page.
pub fn plan(field: &FieldDescriptor, value: &ProfileValue) -> std::result::Result<FillAction, FillFailure> {
    match field.kind {
        FieldKind::Text | FieldKind::Password | FieldKind::Date => match value {
            ProfileValue::List(_) => Err(incompatible(field, value)),
            other => Ok(FillAction::Text(other.as_text())),
        },
        FieldKind::Checkbox => value
            .as_flag()
            .map(FillAction::Check)
            .ok_or_else(|| incompatible(field, value)),
        FieldKind::Radio | FieldKind::Dropdown => {
            let wanted = value.as_text();
            match_option(&field.options, &wanted)
                .map(|o| FillAction::Choose(vec![o.to_string()]))
                .ok_or_else(|| no_option(field, wanted))
        }
        FieldKind::Multiselect => value
            .as_list()
            .into_iter()
            .map(|wanted| {
                match_option(&field.options, &wanted)
                    .map(str::to_string)
                    .ok_or_else(|| no_option(field, wanted))
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(FillAction::Choose),
        FieldKind::File => {
            let ProfileValue::Text(raw) = value else {
                return Err(incompatible(field, value));
            };
            let path = PathBuf::from(raw);
            if path.is_file() {
                Ok(FillAction::Upload(path))
            } else {
                Err(FillFailure::FileNotFound { path })
            }
        }
        FieldKind::Unsupported => Err(incompatible(field, value)),
    }
}

fn incompatible(field: &FieldDescriptor, value: &ProfileValue) -> FillFailure {
    FillFailure::IncompatibleValue {
        value: value.as_text(),
        kind: field.kind.to_string(),
    }
}

fn no_option(field: &FieldDescriptor, wanted: String) -> FillFailure {
    FillFailure::NoMatchingOption {
        wanted,
        options: field.options.clone(),
    }
}

async fn apply<S: FormSurface + ?Sized>(
    surface: &S,
    field: &FieldDescriptor,
    action: &FillAction,
) -> Result<()> {
    match action {
        FillAction::Text(text) => surface.fill_text(field, text).await,
        FillAction::Check(checked) => surface.set_checked(field, *checked).await,
        FillAction::Choose(choices) => surface.choose_options(field, choices).await,
        FillAction::Upload(path) => surface.upload_file(field, path).await,
    }
}

fn describe_action(action: &FillAction) -> String {
    match action {
        FillAction::Text(text) => text.clone(),
        FillAction::Check(true) => "checked".into(),
        FillAction::Check(false) => "unchecked".into(),
        FillAction::Choose(choices) => choices.join(", "),
        FillAction::Upload(path) => path.display().to_string(),
    }
}

/// Resolve and apply an answer for every field, in order.
///
/// Per-field problems land in the report; only fatal page errors (timeouts,
/// a dead session) are returned, and they stop the step at once.
pub async fn fill_fields<S, I>(
    surface: &S,
    step: Step,
    fields: I,
    section: Option<&Section>,
) -> Result<StepReport>
where
    S: FormSurface + ?Sized,
    I: IntoIterator<Item = FieldDescriptor>,
{
    let empty = Section::new();
    let section = section.unwrap_or(&empty);
    let mut report = StepReport::new(step);

    for field in fields {
        if field.kind == FieldKind::Unsupported {
            debug!(label = %field.label, id = %field.identifier, "skipping unsupported control");
            report.push(field, FieldOutcome::Skipped { reason: "unsupported control".into() });
            continue;
        }

        let Some(resolution) = resolve(&field, section) else {
            if field.required {
                warn!(%step, label = %field.label, "required field has no answer");
            }
            report.push(field, FieldOutcome::Unmatched);
            continue;
        };
        let key = resolution.key.to_string();
        debug!(label = %field.label, key = %key, rule = ?resolution.rule, "field resolved");

        let action = match plan(&field, resolution.value) {
            Ok(action) => action,
            Err(failure) => {
                report.push(field, FieldOutcome::Failed { key, failure });
                continue;
            }
        };

        match apply(surface, &field, &action).await {
            Ok(()) => {
                let value = match field.kind {
                    FieldKind::Password => "********".to_string(),
                    _ => describe_action(&action),
                };
                report.push(
                    field,
                    FieldOutcome::Filled { key, rule: resolution.rule, value },
                );
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                let failure = FillFailure::Interaction { message: e.to_string() };
                report.push(field, FieldOutcome::Failed { key, failure });
            }
        }
    }

    Ok(report)
}

/// Fill an extracted form from `section`: plain answers first, then one block
/// per entry of each repeatable group.
pub async fn fill_section<S: FormSurface + ?Sized>(
    surface: &S,
    step: Step,
    fields: Vec<FieldDescriptor>,
    section: Option<&Section>,
) -> Result<StepReport> {
    let Some(section) = section.filter(|s| s.groups().next().is_some()) else {
        return fill_fields(surface, step, fields, section).await;
    };
    let plain = fields
        .iter()
        .filter(|f| !owned_by_group(f, section))
        .cloned()
        .collect::<Vec<_>>();
    let mut report = fill_fields(surface, step, plain, Some(section)).await?;
    fill_repeats(surface, step, section, fields, &mut report).await?;
    Ok(report)
}

/// Extract the current form and fill it from `section`.
pub async fn fill_step<S: FormSurface + ?Sized>(
    surface: &S,
    step: Step,
    section: Option<&Section>,
) -> Result<StepReport> {
    let fields = extract_fields(surface).await?.collect();
    let report = fill_section(surface, step, fields, section).await?;
    info!(%step, fields = report.fields.len(), "step filled");
    Ok(report)
}
