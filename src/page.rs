use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::Page as CrPage;
use chromiumoxide::page::ScreenshotParams;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::driver::FlowSurface;
use crate::element::Element;
use crate::error::{Error, Result};
use crate::form::classify::classify;
use crate::form::field::{FieldDescriptor, FieldKind, RawField};
use crate::form::surface::FormSurface;
use crate::scripts;
use crate::steps::ProgressEntry;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long a Workday popup gets to render its options.
const POPUP_TIMEOUT: Duration = Duration::from_secs(2);

const MULTISELECT_INPUT: &str = r#"[data-automation-id="multiselectInputContainer"], input"#;

/// Wrapper around a chromiumoxide Page that knows how to read and drive a
/// Workday application form.
pub struct Page {
    inner: CrPage,
    default_timeout: Duration,
    settle_delay: Duration,
}

impl Page {
    pub(crate) fn new(inner: CrPage, default_timeout: Duration, settle_delay: Duration) -> Self {
        Self {
            inner,
            default_timeout,
            settle_delay,
        }
    }

    /// Returns a reference to the underlying chromiumoxide Page.
    pub fn inner(&self) -> &CrPage {
        &self.inner
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    // ── Navigation ──────────────────────────────────────────────────

    /// Navigate to the given URL and wait for the page to load.
    pub async fn goto(&self, url: &str) -> Result<()> {
        self.inner
            .goto(url)
            .await
            .map_err(|e| Error::NavigationError(e.to_string()))?;
        Ok(())
    }

    /// Get the current page URL.
    pub async fn url(&self) -> Result<String> {
        self.inner
            .url()
            .await
            .map_err(|e| Error::NavigationError(e.to_string()))?
            .ok_or_else(|| Error::NavigationError("No URL found".into()))
    }

    /// Give the page time to re-render after an interaction.
    pub async fn settle(&self) {
        tokio::time::sleep(self.settle_delay).await;
    }

    // ── Actions ─────────────────────────────────────────────────────

    /// Click on an element matching the given CSS selector.
    pub async fn click(&self, selector: &str) -> Result<()> {
        let el = self.find_element(selector).await?;
        el.click().await
    }

    /// Press a key (e.g., "Enter", "Tab", "Escape"). Uses CDP keyboard events.
    pub async fn press_key(&self, key: &str) -> Result<()> {
        let el = self.find_element("body").await?;
        el.press_key(key).await
    }

    /// Click the first visible button whose caption matches one of `labels`
    /// (case-insensitive). Returns `false` when there is none.
    pub async fn click_button(&self, labels: &[&str]) -> Result<bool> {
        let marked: bool = self
            .run_script(json!({ "labels": labels }), scripts::MARK_BUTTON)
            .await?;
        if !marked {
            return Ok(false);
        }
        self.click_marked().await?;
        debug!(?labels, "button clicked");
        Ok(true)
    }

    /// Poll until a button captioned with one of `labels` shows up, then
    /// click it.
    pub async fn wait_for_button(&self, labels: &[&str]) -> Result<()> {
        let start = Instant::now();
        loop {
            if self.click_button(labels).await? {
                return Ok(());
            }
            if start.elapsed() >= self.default_timeout {
                return Err(Error::Timeout(format!("button {}", labels.join(" / "))));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Wait for an element matching the given CSS selector to appear in the DOM.
    /// Polls every 100ms up to the configured default timeout.
    pub async fn wait_for_selector(&self, selector: &str) -> Result<Element> {
        let timeout = self.default_timeout;
        let start = Instant::now();

        loop {
            match self.find_element(selector).await {
                Ok(el) => return Ok(el),
                Err(e) if e.is_fatal() => return Err(e),
                Err(_) if start.elapsed() < timeout => {
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
                Err(_) => {
                    return Err(Error::Timeout(format!(
                        "Timed out waiting for selector: {}",
                        selector
                    )));
                }
            }
        }
    }

    // ── Observations ────────────────────────────────────────────────

    /// Take a screenshot and save it to a file.
    pub async fn screenshot_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        self.inner
            .save_screenshot(params, path)
            .await
            .map_err(|e| Error::ScreenshotError(e.to_string()))?;
        Ok(())
    }

    /// Whether any element matching `selector` is currently visible.
    pub async fn is_visible(&self, selector: &str) -> Result<bool> {
        self.run_script(json!({ "selector": selector }), scripts::ANY_VISIBLE)
            .await
    }

    /// Whether Workday is showing validation errors for the current step.
    pub async fn has_validation_errors(&self) -> Result<bool> {
        self.is_visible(scripts::ERROR_INDICATORS).await
    }

    /// Entries of the application progress bar, empty when there is none.
    pub async fn progress(&self) -> Result<Vec<ProgressEntry>> {
        self.run_script(Value::Null, scripts::PROGRESS).await
    }

    // ── Element Queries ─────────────────────────────────────────────

    /// Find an element matching the given CSS selector.
    pub async fn find_element(&self, selector: &str) -> Result<Element> {
        let el = self
            .inner
            .find_element(selector)
            .await
            .map_err(|e| Error::lookup(e, selector))?;
        Ok(Element::new(el))
    }

    // ── Script plumbing ─────────────────────────────────────────────

    /// Evaluate one of the [`scripts`] bodies with `args` and decode its
    /// JSON result.
    async fn run_script<T: DeserializeOwned>(&self, args: Value, body: &str) -> Result<T> {
        let result = self
            .inner
            .evaluate(scripts::wrap(args, body))
            .await
            .map_err(Error::from_cdp)?;
        let json_str: String = result
            .into_value()
            .map_err(|e| Error::JsError(e.to_string()))?;
        Ok(serde_json::from_str(&json_str)?)
    }

    /// CDP-click the element a script marked, then drop the mark.
    async fn click_marked(&self) -> Result<()> {
        let selector = format!("[{}]", scripts::TARGET_ATTR);
        let clicked = match self.find_element(&selector).await {
            Ok(el) => el.click().await,
            Err(e) => Err(e),
        };
        self.clear_marks().await?;
        clicked
    }

    async fn clear_marks(&self) -> Result<()> {
        let _: bool = self.run_script(Value::Null, scripts::CLEAR_MARKS).await?;
        Ok(())
    }

    async fn mark_within(&self, handle: &str, selector: &str) -> Result<bool> {
        self.run_script(
            json!({ "handle": handle, "selector": selector }),
            scripts::MARK_WITHIN,
        )
        .await
    }

    /// Click the control itself, or the search input of a multiselect.
    async fn open_popup(&self, handle: &str, kind: FieldKind) -> Result<()> {
        let selector = match kind {
            FieldKind::Multiselect => MULTISELECT_INPUT,
            _ => "*",
        };
        if !self.mark_within(handle, selector).await? {
            return Err(Error::ElementNotFound(format!("control {handle}")));
        }
        self.click_marked().await
    }

    /// Options of a Workday popup control. The popup is opened, read once the
    /// listbox renders, and closed again.
    async fn read_popup_options(&self, handle: &str, kind: FieldKind) -> Result<Vec<String>> {
        self.open_popup(handle, kind).await?;

        let start = Instant::now();
        let options = loop {
            let options: Vec<String> = self.run_script(Value::Null, scripts::READ_OPTIONS).await?;
            if !options.is_empty() || start.elapsed() >= POPUP_TIMEOUT {
                break options;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        };

        self.press_key("Escape").await?;
        self.settle().await;
        Ok(options)
    }

    async fn choose_in_popup(&self, field: &FieldDescriptor, choice: &str) -> Result<()> {
        self.open_popup(&field.identifier, field.kind).await?;

        let start = Instant::now();
        loop {
            let marked: bool = self
                .run_script(json!({ "choice": choice }), scripts::MARK_OPTION)
                .await?;
            if marked {
                break;
            }
            if start.elapsed() >= POPUP_TIMEOUT {
                self.press_key("Escape").await?;
                return Err(Error::ElementNotFound(format!(
                    "option '{choice}' of '{}'",
                    field.label
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        self.click_marked().await?;

        if field.kind == FieldKind::Multiselect {
            self.press_key("Escape").await?;
        }
        self.settle().await;
        Ok(())
    }
}

#[async_trait]
impl FormSurface for Page {
    async fn scan_fields(&self) -> Result<Vec<RawField>> {
        let mut fields: Vec<RawField> = self.run_script(Value::Null, scripts::SCAN_FIELDS).await?;

        for raw in fields
            .iter_mut()
            .filter(|f| f.needs_options && !f.hidden && !f.disabled)
        {
            let kind = classify(raw);
            let read = self.read_popup_options(&raw.id, kind).await;
            match read {
                Ok(options) => raw.options = options,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!(id = %raw.id, error = %e, "could not read popup options"),
            }
        }

        debug!(count = fields.len(), "controls scanned");
        Ok(fields)
    }

    async fn fill_text(&self, field: &FieldDescriptor, value: &str) -> Result<()> {
        let found: bool = self
            .run_script(
                json!({ "handle": field.identifier, "value": value }),
                scripts::FILL_TEXT,
            )
            .await?;
        if !found {
            return Err(Error::ElementNotFound(field.identifier.clone()));
        }
        self.settle().await;
        Ok(())
    }

    async fn set_checked(&self, field: &FieldDescriptor, checked: bool) -> Result<()> {
        let state: String = self
            .run_script(
                json!({ "handle": field.identifier, "checked": checked }),
                scripts::PREPARE_CHECKBOX,
            )
            .await?;
        match state.as_str() {
            "ok" => Ok(()),
            "click" => {
                self.click_marked().await?;
                self.settle().await;
                Ok(())
            }
            _ => Err(Error::ElementNotFound(field.identifier.clone())),
        }
    }

    async fn choose_options(&self, field: &FieldDescriptor, choices: &[String]) -> Result<()> {
        if field.kind == FieldKind::Radio {
            for choice in choices {
                let marked: bool = self
                    .run_script(
                        json!({ "handle": field.identifier, "choice": choice }),
                        scripts::MARK_RADIO,
                    )
                    .await?;
                if !marked {
                    return Err(Error::ElementNotFound(format!("radio option '{choice}'")));
                }
                self.click_marked().await?;
            }
            self.settle().await;
            return Ok(());
        }

        let native: String = self
            .run_script(
                json!({ "handle": field.identifier, "choices": choices }),
                scripts::SELECT_NATIVE,
            )
            .await?;
        match native.as_str() {
            "done" => {
                self.settle().await;
                Ok(())
            }
            "missing" => Err(Error::ElementNotFound(field.identifier.clone())),
            _ => {
                for choice in choices {
                    self.choose_in_popup(field, choice).await?;
                }
                Ok(())
            }
        }
    }

    async fn upload_file(&self, field: &FieldDescriptor, path: &Path) -> Result<()> {
        let absolute = path.canonicalize()?;
        if !self
            .mark_within(&field.identifier, r#"input[type="file"]"#)
            .await?
        {
            return Err(Error::UploadError(format!(
                "no file input behind '{}'",
                field.label
            )));
        }

        let selector = format!("[{}]", scripts::TARGET_ATTR);
        let input = self.find_element(&selector).await;
        self.clear_marks().await?;
        let input = input?;

        let params = SetFileInputFilesParams::builder()
            .files(vec![absolute.display().to_string()])
            .backend_node_id(input.backend_node_id())
            .build()
            .map_err(Error::UploadError)?;
        self.inner
            .execute(params)
            .await
            .map_err(|e| Error::UploadError(e.to_string()))?;

        debug!(file = %absolute.display(), label = %field.label, "file attached");
        self.settle().await;
        Ok(())
    }

    async fn add_entry(&self, heading: &str) -> Result<bool> {
        let marked: bool = self
            .run_script(json!({ "heading": heading }), scripts::MARK_ADD)
            .await?;
        if !marked {
            return Ok(false);
        }
        self.click_marked().await?;
        self.settle().await;
        debug!(%heading, "entry added");
        Ok(true)
    }
}

#[async_trait]
impl FlowSurface for Page {
    async fn goto(&self, url: &str) -> Result<()> {
        Page::goto(self, url).await
    }

    async fn url(&self) -> Result<String> {
        Page::url(self).await
    }

    async fn click_button(&self, labels: &[&str]) -> Result<bool> {
        Page::click_button(self, labels).await
    }

    async fn wait_for_button(&self, labels: &[&str]) -> Result<()> {
        Page::wait_for_button(self, labels).await
    }

    async fn click(&self, selector: &str) -> Result<()> {
        Page::click(self, selector).await
    }

    async fn wait_for_selector(&self, selector: &str) -> Result<()> {
        Page::wait_for_selector(self, selector).await.map(drop)
    }

    async fn is_visible(&self, selector: &str) -> Result<bool> {
        Page::is_visible(self, selector).await
    }

    async fn has_validation_errors(&self) -> Result<bool> {
        Page::has_validation_errors(self).await
    }

    async fn progress(&self) -> Result<Vec<ProgressEntry>> {
        Page::progress(self).await
    }

    async fn settle(&self) {
        Page::settle(self).await
    }

    fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    async fn screenshot_to_file(&self, path: &Path) -> Result<()> {
        Page::screenshot_to_file(self, path).await
    }
}
