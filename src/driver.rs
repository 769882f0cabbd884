//! Walks the Workday application flow one step at a time, handing each form
//! page to the fill engine.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::form::extract::{actionable, extract_fields};
use crate::form::field::FieldDescriptor;
use crate::form::fill::{fill_section, fill_step};
use crate::form::surface::FormSurface;
use crate::page::Page;
use crate::profile::Profile;
use crate::report::StepReport;
use crate::scripts::NEXT_BUTTON;
use crate::steps::{current_step, ProgressEntry, Step};

const SIGN_IN: &[&str] = &["Sign In"];
const CREATE_ACCOUNT: &[&str] = &["Create Account"];
const APPLY: &[&str] = &["Apply"];
const APPLY_MANUALLY: &[&str] = &["Apply Manually"];
pub const SIGN_IN_SUBMIT: &str = r#"[data-automation-id="signInSubmitButton"]"#;
pub const CREATE_ACCOUNT_SUBMIT: &str = r#"[data-automation-id="createAccountSubmitButton"]"#;
pub const LOGIN_ERROR: &str =
    r#"[data-automation-id="errorMessage"], [data-automation-id="errorBanner"]"#;

/// Page operations the driver needs on top of form filling: navigation,
/// buttons, and what the page says about where the application stands.
///
/// Implemented by [`Page`]. Errors follow the [`FormSurface`] convention:
/// [`Error::Timeout`] and other fatal errors end the run.
#[async_trait]
pub trait FlowSurface: FormSurface {
    async fn goto(&self, url: &str) -> Result<()>;

    async fn url(&self) -> Result<String>;

    /// Click the first visible button captioned with one of `labels`.
    async fn click_button(&self, labels: &[&str]) -> Result<bool>;

    /// Poll until a button captioned with one of `labels` can be clicked.
    async fn wait_for_button(&self, labels: &[&str]) -> Result<()>;

    async fn click(&self, selector: &str) -> Result<()>;

    async fn wait_for_selector(&self, selector: &str) -> Result<()>;

    async fn is_visible(&self, selector: &str) -> Result<bool>;

    async fn has_validation_errors(&self) -> Result<bool>;

    async fn progress(&self) -> Result<Vec<ProgressEntry>>;

    /// Pause after an interaction so the page can re-render.
    async fn settle(&self);

    fn default_timeout(&self) -> Duration;

    async fn screenshot_to_file(&self, path: &Path) -> Result<()>;
}

/// State carried through one run: where we are, what happened so far, and
/// whether the user asked us to stop.
#[derive(Debug)]
pub struct RunContext {
    step: Step,
    reports: Vec<StepReport>,
    extracted: BTreeMap<String, Vec<FieldDescriptor>>,
    cancel: Arc<AtomicBool>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::with_cancel_flag(Arc::new(AtomicBool::new(false)))
    }

    /// Share `cancel` with a signal handler; setting it stops the run at the
    /// next step boundary.
    pub fn with_cancel_flag(cancel: Arc<AtomicBool>) -> Self {
        Self {
            step: Step::Login,
            reports: Vec::new(),
            extracted: BTreeMap::new(),
            cancel,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn advance(&mut self) -> Step {
        self.step = self.step.next();
        self.step
    }

    /// Follow the page when Workday skips or repeats a step.
    pub fn jump_to(&mut self, step: Step) {
        if step != self.step {
            info!(from = %self.step, to = %step, "progress bar moved to another step");
            self.step = step;
        }
    }

    pub fn record(&mut self, report: StepReport) {
        self.reports.push(report);
    }

    pub fn reports(&self) -> &[StepReport] {
        &self.reports
    }

    /// Field descriptors captured per step, keyed by profile section name.
    pub fn extracted(&self) -> &BTreeMap<String, Vec<FieldDescriptor>> {
        &self.extracted
    }

    pub fn is_done(&self) -> bool {
        self.step == Step::Done
    }

    pub fn check_cancelled(&self) -> Result<()> {
        if self.cancel.load(Ordering::SeqCst) {
            return Err(Error::Cancelled(self.step));
        }
        Ok(())
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Click the final Submit button on the review step.
    pub submit: bool,
    /// Fill attempts per step before validation errors end the run.
    pub max_attempts: u32,
    /// Where `<step>_failed.png` screenshots go.
    pub artifacts_dir: PathBuf,
    /// Keep every step's field descriptors in the context.
    pub collect_fields: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            submit: true,
            max_attempts: 3,
            artifacts_dir: PathBuf::from("."),
            collect_fields: false,
        }
    }
}

enum Transition {
    Moved,
    Rejected,
}

/// What the page looked like when Next was clicked.
struct Landmark {
    /// The progress bar named the step being left.
    tracked: bool,
    url: String,
}

pub struct Driver<'a, P: ?Sized = Page> {
    page: &'a P,
    profile: &'a Profile,
    options: RunOptions,
}

impl<'a, P: FlowSurface + ?Sized> Driver<'a, P> {
    pub fn new(page: &'a P, profile: &'a Profile, options: RunOptions) -> Self {
        Self {
            page,
            profile,
            options,
        }
    }

    /// Run from `ctx.step()` until the application is submitted (or the
    /// review step is reached with submission disabled).
    pub async fn run(&self, ctx: &mut RunContext) -> Result<()> {
        while !ctx.is_done() {
            ctx.check_cancelled()?;
            let step = ctx.step();
            info!(%step, "starting step");

            if let Err(e) = self.run_step(ctx).await {
                if !matches!(e, Error::Cancelled(_)) {
                    self.capture_failure(step).await;
                }
                return Err(e);
            }
        }
        info!(steps = ctx.reports().len(), "application flow finished");
        Ok(())
    }

    async fn run_step(&self, ctx: &mut RunContext) -> Result<()> {
        match ctx.step() {
            Step::Login => self.login(ctx).await?,
            Step::ApplyManually => self.apply_manually().await?,
            Step::Done => return Ok(()),
            _ => return self.form_step(ctx).await,
        }
        ctx.advance();
        Ok(())
    }

    /// Open the posting, then sign in. With `create_account` set, register
    /// first and sign in with the new account afterwards.
    async fn login(&self, ctx: &mut RunContext) -> Result<()> {
        let settings = self.profile.settings();
        let url = settings
            .job_url
            .as_deref()
            .ok_or_else(|| Error::Config("job_url is not set".into()))?;
        self.page.goto(url).await?;

        self.page.wait_for_button(SIGN_IN).await?;
        self.page.settle().await;

        if settings.create_account {
            self.page.wait_for_button(CREATE_ACCOUNT).await?;
            self.page.settle().await;
            self.submit_credentials(ctx, CREATE_ACCOUNT, CREATE_ACCOUNT_SUBMIT)
                .await?;
            info!("account created");

            if !self.page.click_button(SIGN_IN).await? {
                info!("no Sign In prompt after account creation, continuing");
                return Ok(());
            }
            self.page.settle().await;
        }

        self.submit_credentials(ctx, SIGN_IN, SIGN_IN_SUBMIT).await?;
        let url = self.page.url().await?;
        info!(%url, "signed in");
        Ok(())
    }

    /// Fill the credentials form on screen and submit it with `submit`,
    /// falling back to a button captioned `labels`.
    async fn submit_credentials(
        &self,
        ctx: &mut RunContext,
        labels: &[&str],
        submit: &str,
    ) -> Result<()> {
        let section = self.profile.section_for(Step::Login);
        let report = fill_step(self.page, Step::Login, section.as_ref()).await?;
        report.log_summary();
        let ready = report.ensure_submittable();
        ctx.record(report);
        ready?;

        match self.page.click(submit).await {
            Ok(()) => {}
            Err(e) if e.is_fatal() => return Err(e),
            Err(_) => {
                if !self.page.click_button(labels).await? {
                    return Err(Error::ElementNotFound(format!("{} button", labels[0])));
                }
            }
        }
        self.page.settle().await;

        if self.page.is_visible(LOGIN_ERROR).await? {
            return Err(Error::LoginRejected(format!(
                "Workday refused the {} form",
                labels[0]
            )));
        }
        Ok(())
    }

    async fn apply_manually(&self) -> Result<()> {
        self.page.wait_for_button(APPLY).await?;
        self.page.settle().await;
        self.page.wait_for_button(APPLY_MANUALLY).await?;
        debug!("chose to apply manually");
        Ok(())
    }

    async fn form_step(&self, ctx: &mut RunContext) -> Result<()> {
        self.page.wait_for_selector(NEXT_BUTTON).await?;
        self.page.settle().await;

        let active = current_step(&self.page.progress().await?);
        if let Some(active) = active {
            ctx.jump_to(active);
        }
        let step = ctx.step();
        let section = self.profile.section_for(step);

        if step == Step::ReviewSubmit && !self.options.submit {
            info!(%step, "submission disabled, stopping before Submit");
            ctx.jump_to(Step::Done);
            return Ok(());
        }

        for attempt in 1..=self.options.max_attempts {
            let fields: Vec<FieldDescriptor> = extract_fields(self.page).await?.collect();
            debug!(%step, attempt, actionable = actionable(&fields), "form extracted");
            if self.options.collect_fields {
                if let Some(key) = step.profile_key() {
                    ctx.extracted.insert(key.to_string(), fields.clone());
                }
            }

            let report = fill_section(self.page, step, fields, section.as_ref()).await?;
            report.log_summary();
            let ready = report.ensure_submittable();
            ctx.record(report);
            ready?;

            ctx.check_cancelled()?;
            let landmark = Landmark {
                tracked: active.is_some(),
                url: self.page.url().await?,
            };
            self.page.click(NEXT_BUTTON).await?;
            self.page.settle().await;

            match self.wait_for_transition(step, &landmark).await? {
                Transition::Moved => {
                    ctx.advance();
                    return Ok(());
                }
                Transition::Rejected => {
                    warn!(%step, attempt, "Workday rejected the step, filling again");
                }
            }
        }

        Err(Error::StepBlocked {
            step,
            reason: format!(
                "validation errors remain after {} attempts",
                self.options.max_attempts
            ),
        })
    }

    /// Wait until the page leaves `from` or validation errors show. With a
    /// progress bar the active entry must change; without one the URL must
    /// change or a progress bar must appear.
    async fn wait_for_transition(&self, from: Step, before: &Landmark) -> Result<Transition> {
        let start = Instant::now();
        loop {
            if self.page.has_validation_errors().await? {
                return Ok(Transition::Rejected);
            }
            let now = current_step(&self.page.progress().await?);
            let moved = if before.tracked {
                now != Some(from)
            } else {
                now.is_some() || self.page.url().await? != before.url
            };
            if moved {
                return Ok(Transition::Moved);
            }
            if start.elapsed() >= self.page.default_timeout() {
                return Err(Error::Timeout(format!("leaving step '{from}'")));
            }
            self.page.settle().await;
        }
    }

    async fn capture_failure(&self, step: Step) {
        if let Ok(url) = self.page.url().await {
            warn!(%step, %url, "step failed");
        }
        let path = self
            .options
            .artifacts_dir
            .join(format!("{}_failed.png", step.slug()));
        match self.page.screenshot_to_file(&path).await {
            Ok(()) => info!(path = %path.display(), "failure screenshot saved"),
            Err(e) => warn!(error = %e, "could not save failure screenshot"),
        }
    }
}
