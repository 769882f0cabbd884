//! Resolve a field label to a profile answer.
//!
//! The chain is fixed and deterministic:
//! 1. exact key: normalized label equals a normalized profile key;
//! 2. synonym: the label equals an alias from [`SYNONYMS`] whose key is
//!    present in the section, or else contains one as whole words (the
//!    longest alias wins, ties go to table order);
//! 3. substring: the label contains a profile key (longest key wins, ties go
//!    to file order).
//!
//! A field without a label is matched through the same chain using its
//! identifier. A labeled field that resolves to nothing gets a second try
//! with the last `--` segment of its identifier (`workExperience-1--jobTitle`
//! tries `jobTitle`).

use serde::{Deserialize, Serialize};

use crate::form::field::FieldDescriptor;
use crate::form::normalize::normalize_label;
use crate::form::synonyms::SYNONYMS;
use crate::profile::{ProfileValue, Section};

/// Which rule of the chain produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    ExactKey,
    Synonym,
    Substring,
}

/// A resolved answer, borrowed from the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution<'p> {
    pub key: &'p str,
    pub value: &'p ProfileValue,
    pub rule: MatchRule,
}

/// Resolve a descriptor, falling back to its identifier when unlabeled.
pub fn resolve<'p>(field: &FieldDescriptor, section: &'p Section) -> Option<Resolution<'p>> {
    if normalize_label(&field.label).is_empty() {
        return resolve_label(&field.identifier, section);
    }
    resolve_label(&field.label, section).or_else(|| {
        let (_, tail) = field.identifier.rsplit_once("--")?;
        resolve_label(tail, section)
    })
}

pub fn resolve_label<'p>(label: &str, section: &'p Section) -> Option<Resolution<'p>> {
    let norm = normalize_label(label);
    if norm.is_empty() {
        return None;
    }

    if let Some((key, value)) = section.entry(&norm) {
        return Some(Resolution { key, value, rule: MatchRule::ExactKey });
    }

    if let Some((key, value)) = alias_hit(label, &norm, section) {
        return Some(Resolution { key, value, rule: MatchRule::Synonym });
    }

    let mut best: Option<(usize, &'p str, &'p ProfileValue)> = None;
    for (key, value) in section.iter() {
        let key_norm = normalize_label(key);
        if key_norm.is_empty() || !norm.contains(&key_norm) {
            continue;
        }
        if best.map_or(true, |(len, _, _)| key_norm.len() > len) {
            best = Some((key_norm.len(), key, value));
        }
    }
    best.map(|(_, key, value)| Resolution { key, value, rule: MatchRule::Substring })
}

/// Alias equality first; otherwise the longest alias found as whole words
/// inside the label.
fn alias_hit<'p>(label: &str, norm: &str, section: &'p Section) -> Option<(&'p str, &'p ProfileValue)> {
    let present = || {
        SYNONYMS
            .iter()
            .filter_map(|(alias, key)| section.entry(key).map(|hit| (*alias, hit)))
    };

    if let Some((_, hit)) = present().find(|(alias, _)| normalize_label(alias) == norm) {
        return Some(hit);
    }

    let label_words = words(label);
    let mut best: Option<(usize, (&'p str, &'p ProfileValue))> = None;
    for (alias, hit) in present() {
        let alias_words = words(alias);
        if alias_words.is_empty() || !contains_run(&label_words, &alias_words) {
            continue;
        }
        let len = normalize_label(alias).len();
        if best.map_or(true, |(best_len, _)| len > best_len) {
            best = Some((len, hit));
        }
    }
    best.map(|(_, hit)| hit)
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn contains_run(haystack: &[String], needle: &[String]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

/// Pick the option a profile answer refers to. Tiers, each scanned in display
/// order: case-insensitive equality, option starts with the answer, answer
/// appears as whole words, answer appears anywhere.
pub fn match_option<'o>(options: &'o [String], wanted: &str) -> Option<&'o str> {
    let wanted = wanted.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }
    let lowered: Vec<String> = options.iter().map(|o| o.trim().to_lowercase()).collect();
    let pick = |hit: &dyn Fn(&str) -> bool| lowered.iter().position(|o| hit(o.as_str()));

    pick(&|o: &str| o == wanted)
        .or_else(|| pick(&|o: &str| o.starts_with(wanted.as_str())))
        .or_else(|| pick(&|o: &str| contains_word(o, &wanted)))
        .or_else(|| pick(&|o: &str| o.contains(wanted.as_str())))
        .map(|i| options[i].as_str())
}

/// `needle` occurs in `haystack` with no letter or digit on either side.
fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
