//! The linear Workday application flow and progress-bar parsing.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::form::normalize::normalize_label;

/// One state of the application flow. Transitions are strictly linear; a
/// step is only repeated when Workday re-renders it with validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Login,
    ApplyManually,
    MyInformation,
    MyExperience,
    ApplicationQuestions,
    VoluntaryDisclosures,
    SelfIdentify,
    ReviewSubmit,
    Done,
}

impl Step {
    /// Steps rendered as a form with a footer "Next"/"Submit" button.
    pub const FORM_STEPS: [Step; 6] = [
        Step::MyInformation,
        Step::MyExperience,
        Step::ApplicationQuestions,
        Step::VoluntaryDisclosures,
        Step::SelfIdentify,
        Step::ReviewSubmit,
    ];

    pub fn next(self) -> Step {
        match self {
            Step::Login => Step::ApplyManually,
            Step::ApplyManually => Step::MyInformation,
            Step::MyInformation => Step::MyExperience,
            Step::MyExperience => Step::ApplicationQuestions,
            Step::ApplicationQuestions => Step::VoluntaryDisclosures,
            Step::VoluntaryDisclosures => Step::SelfIdentify,
            Step::SelfIdentify => Step::ReviewSubmit,
            Step::ReviewSubmit | Step::Done => Step::Done,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::Login => "Login",
            Step::ApplyManually => "Apply Manually",
            Step::MyInformation => "My Information",
            Step::MyExperience => "My Experience",
            Step::ApplicationQuestions => "Application Questions",
            Step::VoluntaryDisclosures => "Voluntary Disclosures",
            Step::SelfIdentify => "Self Identify",
            Step::ReviewSubmit => "Review",
            Step::Done => "Done",
        }
    }

    /// Snake-case name used in reports and artifact file names.
    pub fn slug(self) -> &'static str {
        match self {
            Step::Login => "login",
            Step::ApplyManually => "apply_manually",
            Step::MyInformation => "my_information",
            Step::MyExperience => "my_experience",
            Step::ApplicationQuestions => "application_questions",
            Step::VoluntaryDisclosures => "voluntary_disclosures",
            Step::SelfIdentify => "self_identify",
            Step::ReviewSubmit => "review_submit",
            Step::Done => "done",
        }
    }

    /// Name of the profile section answering this step.
    pub fn profile_key(self) -> Option<&'static str> {
        match self {
            Step::Login => Some("login"),
            Step::MyInformation => Some("step1"),
            Step::MyExperience => Some("step2"),
            Step::ApplicationQuestions => Some("step3"),
            Step::VoluntaryDisclosures => Some("step4"),
            Step::SelfIdentify => Some("step5"),
            Step::ReviewSubmit => Some("step6"),
            Step::ApplyManually | Step::Done => None,
        }
    }

    pub fn is_form(self) -> bool {
        Self::FORM_STEPS.contains(&self)
    }

    /// Map a progress-bar caption to a step. Workday tenants vary the wording
    /// ("Self Identify" vs "Self Identification", "Review" vs "Review and
    /// Submit"), so captions are compared by normalized prefix.
    pub fn from_title(title: &str) -> Option<Step> {
        let norm = normalize_label(title);
        if norm.is_empty() {
            return None;
        }
        const PREFIXES: &[(&str, Step)] = &[
            ("myinformation", Step::MyInformation),
            ("myexperience", Step::MyExperience),
            ("applicationquestions", Step::ApplicationQuestions),
            ("questions", Step::ApplicationQuestions),
            ("voluntarydisclosure", Step::VoluntaryDisclosures),
            ("selfidentif", Step::SelfIdentify),
            ("review", Step::ReviewSubmit),
        ];
        PREFIXES
            .iter()
            .find(|(prefix, _)| norm.starts_with(prefix))
            .map(|(_, step)| *step)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// One entry of the Workday progress bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub name: String,
    pub active: bool,
}

/// The step the progress bar marks as active, if it names a known step.
pub fn current_step(entries: &[ProgressEntry]) -> Option<Step> {
    entries
        .iter()
        .find(|e| e.active)
        .and_then(|e| Step::from_title(&e.name))
}
