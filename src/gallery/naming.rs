//! Id generation, storage-key derivation and key fallback resolution.

use chrono::{DateTime, Utc};
use rand::distr::Alphanumeric;
use rand::Rng;

use super::record::STORAGE_PREFIX;

/// Extension used when neither filename nor MIME type yields one.
pub const DEFAULT_EXTENSION: &str = "jpg";

/// Content type used when nothing better is known.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Length of the random id suffix.
const ID_SUFFIX_LEN: usize = 6;

/// Longest extension accepted from a filename.
const MAX_EXTENSION_LEN: usize = 8;

/// Preferred extensions for common image MIME types.
const PREFERRED_EXTENSIONS: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/jpg", "jpg"),
    ("image/pjpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
    ("image/avif", "avif"),
    ("image/svg+xml", "svg"),
    ("image/bmp", "bmp"),
    ("image/tiff", "tif"),
    ("image/heic", "heic"),
    ("image/heif", "heif"),
];

// =============================================================================
// Ids
// =============================================================================

/// Generate an image id: `{unix_millis}-{index}-{random}`.
///
/// Unique with high probability only; no check against existing ids.
pub fn generate_id(now: DateTime<Utc>, index: usize) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(ID_SUFFIX_LEN)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();
    format!("{}-{}-{}", now.timestamp_millis(), index, suffix)
}

// =============================================================================
// Extensions and Content Types
// =============================================================================

fn extension_from_filename(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    let valid = !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LEN
        && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then_some(ext)
}

fn extension_from_mime(content_type: &str) -> Option<String> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if let Some((_, ext)) = PREFERRED_EXTENSIONS.iter().find(|(mime, _)| *mime == essence) {
        return Some((*ext).to_string());
    }

    mime_guess::get_mime_extensions_str(&essence)
        .and_then(|exts| exts.first())
        .map(|ext| (*ext).to_string())
}

/// Pick a file extension: filename first, then declared MIME type, then `jpg`.
pub fn derive_extension(file_name: Option<&str>, content_type: Option<&str>) -> String {
    file_name
        .and_then(extension_from_filename)
        .or_else(|| content_type.and_then(extension_from_mime))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// Storage key for an image id and extension.
pub fn storage_key(id: &str, extension: &str) -> String {
    format!("{}{}.{}", STORAGE_PREFIX, id, extension)
}

/// Infer a content type from a key's extension.
pub fn content_type_for_key(key: &str) -> String {
    mime_guess::from_path(key)
        .first_raw()
        .unwrap_or(FALLBACK_CONTENT_TYPE)
        .to_string()
}

/// Content type to store for an upload: declared type unless it is missing
/// or generic, otherwise inferred from the storage key.
pub fn resolve_content_type(declared: Option<&str>, key: &str) -> String {
    match declared.map(str::trim) {
        Some(ct) if !ct.is_empty() && ct != FALLBACK_CONTENT_TYPE => ct.to_string(),
        _ => content_type_for_key(key),
    }
}

// =============================================================================
// Key Candidates
// =============================================================================

/// One way of deriving a blob key from a requested key.
///
/// Earlier layouts stored images under other prefixes; serving tries each
/// strategy in order until one hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStrategy {
    /// The key exactly as requested.
    Exact,
    /// The current `images/` prefix prepended.
    CurrentPrefix,
    /// A legacy prefix in front of the file name.
    LegacyPrefix(&'static str),
    /// The bare file name with no prefix.
    Basename,
}

/// Strategies in the order they are tried.
pub const KEY_STRATEGIES: &[KeyStrategy] = &[
    KeyStrategy::Exact,
    KeyStrategy::CurrentPrefix,
    KeyStrategy::LegacyPrefix("uploads/"),
    KeyStrategy::LegacyPrefix("gallery/"),
    KeyStrategy::Basename,
];

fn basename(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

impl KeyStrategy {
    /// Derive a candidate key, or `None` when the strategy does not apply.
    pub fn derive(&self, requested: &str) -> Option<String> {
        let requested = requested.trim_start_matches('/');
        if requested.is_empty() {
            return None;
        }
        match self {
            KeyStrategy::Exact => Some(requested.to_string()),
            KeyStrategy::CurrentPrefix => (!requested.starts_with(STORAGE_PREFIX))
                .then(|| format!("{}{}", STORAGE_PREFIX, requested)),
            KeyStrategy::LegacyPrefix(prefix) => Some(format!("{}{}", prefix, basename(requested))),
            KeyStrategy::Basename => Some(basename(requested).to_string()),
        }
    }
}

/// Ordered, de-duplicated candidate keys for a requested key.
pub fn candidate_keys(requested: &str) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::with_capacity(KEY_STRATEGIES.len());
    for strategy in KEY_STRATEGIES {
        if let Some(key) = strategy.derive(requested) {
            if !candidates.contains(&key) {
                candidates.push(key);
            }
        }
    }
    candidates
}
