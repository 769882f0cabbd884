//! The YAML answer profile: run settings plus one section of answers per step.
//!
//! ```yaml
//! job_url: https://acme.wd5.myworkdayjobs.com/...
//! email: john.doe@example.com
//! password: hunter2
//! step1:
//!   first_name: John
//!   hear_about_us: [LinkedIn]
//! step6:
//!   submit: false
//! ```
//!
//! Every top-level mapping is a step section; top-level scalars are run
//! settings. Keys the run does not understand are ignored.
//!
//! Inside a section, a list of mappings (or a single mapping) is a repeatable
//! group, one entry per block Workday renders for it:
//!
//! ```yaml
//! step2:
//!   work_experience:
//!     - job_title: Engineer
//!       company: Acme
//!   language:
//!     language: English
//!     fluent: true
//! ```

use std::fmt;
use std::path::Path;

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::form::normalize::normalize_label;
use crate::steps::Step;

/// A single answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileValue {
    Text(String),
    Flag(bool),
    List(Vec<String>),
}

impl ProfileValue {
    /// Text rendering used for text inputs and option matching.
    pub fn as_text(&self) -> String {
        match self {
            ProfileValue::Text(s) => s.clone(),
            ProfileValue::Flag(true) => "Yes".to_string(),
            ProfileValue::Flag(false) => "No".to_string(),
            ProfileValue::List(items) => items.join(", "),
        }
    }

    /// Interpret the answer as a checkbox state.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            ProfileValue::Flag(b) => Some(*b),
            ProfileValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "yes" | "true" | "1" | "on" | "checked" => Some(true),
                "no" | "false" | "0" | "off" | "unchecked" => Some(false),
                _ => None,
            },
            ProfileValue::List(_) => None,
        }
    }

    /// Every answer as a list, for multiselect fields.
    pub fn as_list(&self) -> Vec<String> {
        match self {
            ProfileValue::List(items) => items.clone(),
            other => vec![other.as_text()],
        }
    }
}

impl fmt::Display for ProfileValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for ProfileValue {
    fn from(s: &str) -> Self {
        ProfileValue::Text(s.to_string())
    }
}

impl From<bool> for ProfileValue {
    fn from(b: bool) -> Self {
        ProfileValue::Flag(b)
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl TryFrom<&Value> for ProfileValue {
    type Error = String;

    fn try_from(value: &Value) -> std::result::Result<Self, Self::Error> {
        match value {
            Value::Bool(b) => Ok(ProfileValue::Flag(*b)),
            Value::String(_) | Value::Number(_) => {
                Ok(ProfileValue::Text(scalar_text(value).unwrap_or_default()))
            }
            Value::Sequence(items) => items
                .iter()
                .map(|item| scalar_text(item).ok_or_else(|| "list items must be scalars".to_string()))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(ProfileValue::List),
            Value::Null => Err("empty value".into()),
            Value::Mapping(_) => Err("nested mappings are not answers".into()),
            Value::Tagged(tagged) => ProfileValue::try_from(&tagged.value),
        }
    }
}

/// The answers for one step, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    entries: Vec<(String, ProfileValue)>,
    groups: Vec<(String, Vec<Section>)>,
}

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ProfileValue>) {
        let key = key.into();
        let norm = normalize_label(&key);
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| normalize_label(k) == norm) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Look a key up by normalized equality.
    pub fn get(&self, key: &str) -> Option<&ProfileValue> {
        let norm = normalize_label(key);
        self.entries
            .iter()
            .find(|(k, _)| normalize_label(k) == norm)
            .map(|(_, v)| v)
    }

    /// Like [`Section::get`] but also returns the key as written in the file.
    pub fn entry(&self, key: &str) -> Option<(&str, &ProfileValue)> {
        let norm = normalize_label(key);
        self.entries
            .iter()
            .find(|(k, _)| normalize_label(k) == norm)
            .map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProfileValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Add or replace a repeatable group.
    pub fn insert_group(&mut self, name: impl Into<String>, entries: Vec<Section>) {
        let name = name.into();
        let norm = normalize_label(&name);
        match self.groups.iter_mut().find(|(n, _)| normalize_label(n) == norm) {
            Some(slot) => slot.1 = entries,
            None => self.groups.push((name, entries)),
        }
    }

    /// Repeatable groups in file order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[Section])> {
        self.groups.iter().map(|(n, e)| (n.as_str(), e.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.groups.is_empty()
    }
}

impl<K: Into<String>, V: Into<ProfileValue>> FromIterator<(K, V)> for Section {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut section = Section::new();
        for (k, v) in iter {
            section.insert(k, v);
        }
        section
    }
}

fn parse_section(name: &str, fields: &Mapping) -> Section {
    let mut section = Section::new();
    for (key, value) in fields {
        let Some(key) = scalar_text(key) else {
            continue;
        };
        if let Some(entries) = group_entries(value) {
            let entries = entries
                .into_iter()
                .map(|entry| parse_section(&key, entry))
                .collect();
            section.insert_group(key, entries);
            continue;
        }
        match ProfileValue::try_from(value) {
            Ok(v) => section.insert(key, v),
            Err(reason) => debug!(section = name, key = %key, reason = %reason, "ignoring profile entry"),
        }
    }
    section
}

/// A mapping, or a non-empty list made only of mappings.
fn group_entries(value: &Value) -> Option<Vec<&Mapping>> {
    match value {
        Value::Mapping(entry) => Some(vec![entry]),
        Value::Sequence(items) if !items.is_empty() => items
            .iter()
            .map(|item| match item {
                Value::Mapping(entry) => Some(entry),
                _ => None,
            })
            .collect(),
        Value::Tagged(tagged) => group_entries(&tagged.value),
        _ => None,
    }
}

/// Top-level scalar settings of the profile file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    pub job_url: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub headless: Option<bool>,
    pub timeout_secs: Option<u64>,
    /// Register a new candidate account before signing in.
    #[serde(default)]
    pub create_account: bool,
}

/// Loaded once at start-up and never mutated.
#[derive(Debug, Clone, Default)]
pub struct Profile {
    settings: Settings,
    sections: Vec<(String, Section)>,
}

impl Profile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let profile = Self::from_yaml_str(&text)?;
        debug!(path = %path.display(), sections = profile.sections.len(), "profile loaded");
        Ok(profile)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let root: Value = serde_yaml::from_str(text)?;
        let mapping = match root {
            Value::Mapping(m) => m,
            Value::Null => return Ok(Self::default()),
            _ => return Err(Error::Config("top level must be a mapping".into())),
        };

        let settings: Settings = serde_yaml::from_value(Value::Mapping(mapping.clone()))?;

        let mut sections = Vec::new();
        for (name, body) in &mapping {
            let (Some(name), Value::Mapping(fields)) = (name.as_str(), body) else {
                continue;
            };
            sections.push((name.to_string(), parse_section(name, fields)));
        }

        Ok(Self { settings, sections })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Find a section by normalized name.
    pub fn section(&self, name: &str) -> Option<&Section> {
        let norm = normalize_label(name);
        self.sections
            .iter()
            .find(|(n, _)| normalize_label(n) == norm)
            .map(|(_, s)| s)
    }

    /// The answers for `step`. The login step falls back to a section built
    /// from the top-level credentials when the file has no `login:` block.
    pub fn section_for(&self, step: Step) -> Option<Section> {
        let key = step.profile_key()?;
        if let Some(section) = self.section(key) {
            return Some(section.clone());
        }
        if step == Step::Login {
            return self.credentials_section();
        }
        None
    }

    fn credentials_section(&self) -> Option<Section> {
        let email = self.settings.email.as_deref()?;
        let password = self.settings.password.as_deref()?;
        Some(Section::from_iter([
            ("email", email),
            ("password", password),
            ("verify_new_password", password),
            ("terms", "Yes"),
        ]))
    }

    /// Whether the final Submit click is allowed (`step6.submit`, default true).
    pub fn submit_enabled(&self) -> bool {
        self.section("step6")
            .and_then(|s| s.get("submit"))
            .and_then(ProfileValue::as_flag)
            .unwrap_or(true)
    }
}
