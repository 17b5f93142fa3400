//! Cache key normalization and derivation

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};
use url::Url;

/// Maximum number of characters kept from text-kind identifiers
pub const MAX_TEXT_KEY_CHARS: usize = 700;

/// Length of a truncated key in hex characters
pub const SHORT_KEY_HEX_CHARS: usize = 16;

const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid"];
const TRACKING_PREFIX: &str = "utm_";

/// How a raw identifier is canonicalized before hashing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// A URL; tracking parameters and fragments do not affect identity
    Url,
    /// Free text; whitespace and case do not affect identity
    Text,
}

/// Canonicalizes a raw identifier into a stable string.
///
/// Never fails: a URL that does not parse falls back to the trimmed input.
pub fn normalize(raw: &str, kind: KeyKind) -> String {
    match kind {
        KeyKind::Url => normalize_url(raw),
        KeyKind::Text => normalize_text(raw),
    }
}

fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();

    let mut url = match Url::parse(trimmed) {
        Ok(url) if !url.cannot_be_a_base() => url,
        _ => return trimmed.to_string(),
    };

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| !is_tracking_param(name))
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    url.set_fragment(None);

    if let Some(host) = url.host_str() {
        let lowered = host.to_lowercase();

        if lowered != host {
            // Only non-special schemes keep host case; a rejected host leaves the URL as parsed.
            let _ = url.set_host(Some(&lowered));
        }
    }

    let path = url.path().to_string();

    if path.len() > 1 && path.ends_with('/') {
        let stripped = path.trim_end_matches('/');
        url.set_path(if stripped.is_empty() { "/" } else { stripped });
    }

    url.to_string()
}

fn normalize_text(raw: &str) -> String {
    collapse_text(raw).chars().take(MAX_TEXT_KEY_CHARS).collect()
}

fn collapse_text(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn is_tracking_param(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    name.starts_with(TRACKING_PREFIX) || TRACKING_PARAMS.contains(&name.as_str())
}

/// Digest length policy for derived keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyLength {
    /// Full 64 hex characters, for URL-keyed and adversarial inputs
    #[default]
    Full,
    /// 16 hex characters, for single words and short phrases
    Short,
}

/// Parameters for cache key derivation
#[derive(Debug, Clone, Default)]
pub struct CacheKeyParams {
    /// Normalized identifier
    pub primary: String,
    /// Context fields that change the output for the same identifier (sorted for consistency)
    pub components: BTreeMap<String, String>,
}

impl CacheKeyParams {
    /// Creates key parameters from an already-normalized identifier
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            components: BTreeMap::new(),
        }
    }

    /// Normalizes the raw identifier and creates key parameters from it.
    ///
    /// Text longer than [`MAX_TEXT_KEY_CHARS`] also carries a digest of the
    /// whole normalized text, so inputs that differ only past the cut keep
    /// distinct keys.
    pub fn normalized(raw: &str, kind: KeyKind) -> Self {
        let params = Self::new(normalize(raw, kind));

        if kind != KeyKind::Text {
            return params;
        }

        let full = collapse_text(raw);
        if full.chars().count() > MAX_TEXT_KEY_CHARS {
            params.with_component("text_sha256", hex::encode(Sha256::digest(full.as_bytes())))
        } else {
            params
        }
    }

    /// Identity for items that have neither a URL nor a stable id.
    ///
    /// Weaker than a URL key: two distinct items sharing a title and a
    /// publish date map to the same key.
    pub fn from_title_and_date(title: &str, publish_date: Option<&str>) -> Self {
        let date = publish_date.map(str::trim).unwrap_or_default();
        Self::new(format!("{}|{}", normalize_text(title), date))
    }

    /// Adds a context field to the key parameters
    pub fn with_component(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.components.insert(key.into(), value.into());
        self
    }

    fn joined_components(&self) -> String {
        self.components
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Derives fixed-length content-addressable keys within a namespace
#[derive(Debug, Clone)]
pub struct CacheKeyDeriver {
    namespace: String,
    length: KeyLength,
}

impl CacheKeyDeriver {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            length: KeyLength::Full,
        }
    }

    /// Produces truncated keys
    pub fn with_short_keys(mut self) -> Self {
        self.length = KeyLength::Short;
        self
    }

    pub fn with_length(mut self, length: KeyLength) -> Self {
        self.length = length;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// SHA-256 over `namespace|primary|components`, rendered as hex
    pub fn derive(&self, params: &CacheKeyParams) -> String {
        let material = format!(
            "{}|{}|{}",
            self.namespace,
            params.primary,
            params.joined_components()
        );

        let digest = hex::encode(Sha256::digest(material.as_bytes()));

        match self.length {
            KeyLength::Full => digest,
            KeyLength::Short => digest[..SHORT_KEY_HEX_CHARS].to_string(),
        }
    }
}
