//! Discovery of numbered slide images and narration clips.
//!
//! Files are matched by name prefix and extension, then ordered with a
//! natural sort so that `slide2.png` comes before `slide10.png`.

use crate::Result;
use regex::Regex;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Regex matching a run of ASCII digits.
static DIGIT_RUN_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").unwrap());

/// One run of a natural sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPart {
    /// Lowercased non-digit run.
    Text(String),
    /// Digit run with leading zeros stripped, compared numerically.
    Number(String),
}

impl Ord for KeyPart {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyPart::Number(a), KeyPart::Number(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (KeyPart::Text(a), KeyPart::Text(b)) => a.cmp(b),
            (KeyPart::Number(_), KeyPart::Text(_)) => Ordering::Less,
            (KeyPart::Text(_), KeyPart::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for KeyPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sort key made of alternating text and number runs.
pub type NaturalKey = Vec<KeyPart>;

/// Build the natural sort key of a string.
///
/// `"Script2.mp3"` becomes `[Text("script"), Number("2"), Text(".mp3")]`.
/// The key always starts with a (possibly empty) text run so that runs of
/// the same kind line up when two keys are compared.
pub fn natural_sort_key(s: &str) -> NaturalKey {
    let mut key = Vec::new();
    let mut last = 0;

    for m in DIGIT_RUN_REGEX.find_iter(s) {
        key.push(KeyPart::Text(s[last..m.start()].to_lowercase()));
        let digits = m.as_str().trim_start_matches('0');
        key.push(KeyPart::Number(if digits.is_empty() { "0" } else { digits }.to_string()));
        last = m.end();
    }
    key.push(KeyPart::Text(s[last..].to_lowercase()));

    key
}

/// Find all files in `directory` whose name starts with `prefix` and ends
/// with one of `extensions` (case-insensitive), in natural order.
///
/// Returns an empty list when nothing matches. Fails only if the directory
/// cannot be listed.
pub fn find_matching_files(directory: &Path, prefix: &str, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let extensions: Vec<String> = extensions.iter().map(|e| e.to_lowercase()).collect();
    let mut files: Vec<(NaturalKey, String, PathBuf)> = Vec::new();

    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with(prefix) {
            continue;
        }

        let lower = name.to_lowercase();
        if !extensions.iter().any(|ext| lower.ends_with(ext.as_str())) {
            continue;
        }

        files.push((natural_sort_key(&name), name, entry.path()));
    }

    // Names with equal keys (slide7 vs slide007) fall back to plain order.
    files.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    log::debug!(
        "Matched {} file(s) with prefix '{}' in {}",
        files.len(),
        prefix,
        directory.display()
    );

    Ok(files.into_iter().map(|(_, _, path)| path).collect())
}
