#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use workday_autofill::form::RawField;
use workday_autofill::scripts::NEXT_BUTTON;
use workday_autofill::steps::ProgressEntry;
use workday_autofill::{Error, FieldDescriptor, FlowSurface, FormSurface, Result};

/// Everything the engine or the driver asked the page to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Text(String, String),
    Checked(String, bool),
    Chose(String, Vec<String>),
    Uploaded(String, PathBuf),
    Added(String),
    Visited(String),
    Button(String),
    Clicked(String),
    Screenshot(PathBuf),
}

/// One state of a scripted Workday site.
#[derive(Debug, Clone, Default)]
pub struct Screen {
    pub url: String,
    pub progress: Option<String>,
    pub fields: Vec<RawField>,
    /// Blocks rendered by successive "Add" clicks, keyed by section heading.
    pub blocks: Vec<(String, Vec<RawField>)>,
}

impl Screen {
    pub fn new(url: &str, fields: Vec<RawField>) -> Self {
        Self {
            url: url.into(),
            fields,
            ..Self::default()
        }
    }

    /// Show a progress bar whose active entry reads `title`.
    pub fn step(mut self, title: &str) -> Self {
        self.progress = Some(title.into());
        self
    }

    pub fn with_block(mut self, heading: &str, fields: Vec<RawField>) -> Self {
        self.blocks.push((heading.into(), fields));
        self
    }
}

#[derive(Default)]
struct State {
    screens: Vec<Screen>,
    current: usize,
    scan_error: Option<Error>,
    rejections: u32,
    errors_shown: bool,
    actions: Vec<Action>,
}

impl State {
    fn screen(&self) -> Screen {
        self.screens
            .get(self.current)
            .cloned()
            .unwrap_or_else(|| Screen::new("about:finished", Vec::new()))
    }
}

/// In-memory site: serves scripted screens and records every interaction.
/// Any selector click moves to the next screen, except a Next click that is
/// due to be rejected, which shows validation errors instead.
#[derive(Default)]
pub struct RecordingSurface {
    state: Mutex<State>,
    fail_ids: Vec<String>,
    timeout_ids: Vec<String>,
    missing_buttons: Vec<String>,
    login_error: bool,
    cancel_on_fill: Option<Arc<AtomicBool>>,
}

impl RecordingSurface {
    pub fn new(fields: Vec<RawField>) -> Self {
        Self::site(vec![Screen::new("about:blank", fields)])
    }

    pub fn site(screens: Vec<Screen>) -> Self {
        let surface = Self::default();
        surface.state.lock().unwrap().screens = screens;
        surface
    }

    pub fn failing_scan(err: Error) -> Self {
        let surface = Self::new(Vec::new());
        surface.state.lock().unwrap().scan_error = Some(err);
        surface
    }

    /// Interactions with these controls fail with a non-fatal error.
    pub fn failing_on(mut self, id: &str) -> Self {
        self.fail_ids.push(id.to_string());
        self
    }

    /// Interactions with these controls time out.
    pub fn timing_out_on(mut self, id: &str) -> Self {
        self.timeout_ids.push(id.to_string());
        self
    }

    /// The next `times` Next clicks leave the screen showing errors.
    pub fn rejecting_next(self, times: u32) -> Self {
        self.state.lock().unwrap().rejections = times;
        self
    }

    pub fn without_button(mut self, label: &str) -> Self {
        self.missing_buttons.push(label.to_string());
        self
    }

    /// The login error banner is always visible.
    pub fn with_login_error(mut self) -> Self {
        self.login_error = true;
        self
    }

    /// Raise `flag` as soon as any field is filled.
    pub fn cancelling(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel_on_fill = Some(flag);
        self
    }

    pub fn actions(&self) -> Vec<Action> {
        self.state.lock().unwrap().actions.clone()
    }

    /// Only the field interactions, without navigation.
    pub fn fills(&self) -> Vec<Action> {
        self.actions()
            .into_iter()
            .filter(|a| {
                matches!(
                    a,
                    Action::Text(..) | Action::Checked(..) | Action::Chose(..) | Action::Uploaded(..)
                )
            })
            .collect()
    }

    pub fn clicks_on(&self, selector: &str) -> usize {
        self.actions()
            .iter()
            .filter(|a| matches!(a, Action::Clicked(s) if s == selector))
            .count()
    }

    fn record(&self, action: Action) {
        self.state.lock().unwrap().actions.push(action);
    }

    fn touch(&self, field: &FieldDescriptor, action: Action) -> Result<()> {
        if self.timeout_ids.contains(&field.identifier) {
            return Err(Error::Timeout(field.identifier.clone()));
        }
        if self.fail_ids.contains(&field.identifier) {
            return Err(Error::ElementNotFound(field.identifier.clone()));
        }
        self.record(action);
        if let Some(flag) = &self.cancel_on_fill {
            flag.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    fn has_button(&self, labels: &[&str]) -> bool {
        !labels
            .iter()
            .any(|l| self.missing_buttons.iter().any(|m| m == l))
    }
}

#[async_trait]
impl FormSurface for RecordingSurface {
    async fn scan_fields(&self) -> Result<Vec<RawField>> {
        let mut state = self.state.lock().unwrap();
        match state.scan_error.take() {
            Some(err) => Err(err),
            None => Ok(state.screen().fields),
        }
    }

    async fn fill_text(&self, field: &FieldDescriptor, value: &str) -> Result<()> {
        self.touch(field, Action::Text(field.identifier.clone(), value.to_string()))
    }

    async fn set_checked(&self, field: &FieldDescriptor, checked: bool) -> Result<()> {
        self.touch(field, Action::Checked(field.identifier.clone(), checked))
    }

    async fn choose_options(&self, field: &FieldDescriptor, choices: &[String]) -> Result<()> {
        self.touch(field, Action::Chose(field.identifier.clone(), choices.to_vec()))
    }

    async fn upload_file(&self, field: &FieldDescriptor, path: &Path) -> Result<()> {
        self.touch(field, Action::Uploaded(field.identifier.clone(), path.to_path_buf()))
    }

    async fn add_entry(&self, heading: &str) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        state.actions.push(Action::Added(heading.to_string()));
        let current = state.current;
        let Some(screen) = state.screens.get_mut(current) else {
            return Ok(false);
        };
        let Some(pos) = screen.blocks.iter().position(|(h, _)| h == heading) else {
            return Ok(false);
        };
        let (_, fields) = screen.blocks.remove(pos);
        screen.fields.extend(fields);
        Ok(true)
    }
}

#[async_trait]
impl FlowSurface for RecordingSurface {
    async fn goto(&self, url: &str) -> Result<()> {
        self.record(Action::Visited(url.to_string()));
        Ok(())
    }

    async fn url(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().screen().url)
    }

    async fn click_button(&self, labels: &[&str]) -> Result<bool> {
        if !self.has_button(labels) {
            return Ok(false);
        }
        self.record(Action::Button(labels[0].to_string()));
        Ok(true)
    }

    async fn wait_for_button(&self, labels: &[&str]) -> Result<()> {
        if !self.has_button(labels) {
            return Err(Error::Timeout(format!("button {}", labels.join(" / "))));
        }
        self.record(Action::Button(labels[0].to_string()));
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.actions.push(Action::Clicked(selector.to_string()));
        if selector == NEXT_BUTTON && state.rejections > 0 {
            state.rejections -= 1;
            state.errors_shown = true;
            return Ok(());
        }
        state.errors_shown = false;
        state.current += 1;
        Ok(())
    }

    async fn wait_for_selector(&self, _selector: &str) -> Result<()> {
        Ok(())
    }

    async fn is_visible(&self, _selector: &str) -> Result<bool> {
        Ok(self.login_error)
    }

    async fn has_validation_errors(&self) -> Result<bool> {
        Ok(self.state.lock().unwrap().errors_shown)
    }

    async fn progress(&self) -> Result<Vec<ProgressEntry>> {
        let screen = self.state.lock().unwrap().screen();
        Ok(screen
            .progress
            .map(|name| vec![ProgressEntry { name, active: true }])
            .unwrap_or_default())
    }

    async fn settle(&self) {
        tokio::task::yield_now().await;
    }

    fn default_timeout(&self) -> Duration {
        Duration::from_millis(50)
    }

    async fn screenshot_to_file(&self, path: &Path) -> Result<()> {
        self.record(Action::Screenshot(path.to_path_buf()));
        Ok(())
    }
}

pub fn input(id: &str, input_type: &str, label: &str) -> RawField {
    RawField {
        tag: "input".into(),
        input_type: input_type.into(),
        id: id.into(),
        label_text: label.into(),
        ..RawField::default()
    }
}

pub fn text(id: &str, label: &str) -> RawField {
    input(id, "text", label)
}

pub fn checkbox(id: &str, label: &str) -> RawField {
    input(id, "checkbox", label)
}

pub fn select(id: &str, label: &str, options: &[&str]) -> RawField {
    RawField {
        tag: "select".into(),
        id: id.into(),
        label_text: label.into(),
        options: options.iter().map(|o| o.to_string()).collect(),
        ..RawField::default()
    }
}

pub fn file_upload(id: &str, label: &str) -> RawField {
    RawField {
        tag: "div".into(),
        automation_id: "attachments-FileUpload".into(),
        id: id.into(),
        label_text: label.into(),
        ..RawField::default()
    }
}

pub fn required(mut raw: RawField) -> RawField {
    raw.required_attr = true;
    raw
}
