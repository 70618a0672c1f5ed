//! Locale message bundles and placeholder formatting.
//!
//! Bundles are embedded TOML tables mapping message keys to patterns. The
//! built-in catalog is parsed once per process and never changes afterwards.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use thiserror::Error;

use crate::error::TaskError;

/// Embedded bundles, keyed by locale tag. The empty tag is the root bundle.
const BUNDLES: &[(&str, &str)] = &[
    ("", include_str!("../../resources/messages.toml")),
    ("de", include_str!("../../resources/messages_de.toml")),
];

static BUILTIN: Lazy<Result<MessageCatalog, CatalogError>> =
    Lazy::new(|| MessageCatalog::from_sources(BUNDLES));

/// Errors that can occur while building a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to parse message bundle '{locale}': {source}")]
    ParseError {
        locale: String,
        #[source]
        source: toml::de::Error,
    },
}

/// A locale tag such as `en_US` or `de`. The empty tag is the root locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Locale {
    tag: String,
}

impl Locale {
    pub fn root() -> Self {
        Self::default()
    }

    /// Normalize a POSIX or BCP 47 style tag.
    ///
    /// `de_DE.UTF-8@euro` → `de_DE`, `en-US` → `en_US`, `C`/`POSIX` → root.
    pub fn new(tag: &str) -> Self {
        let tag = tag.split(['.', '@']).next().unwrap_or("").trim();
        if tag.is_empty() || tag == "C" || tag == "POSIX" {
            return Self::root();
        }
        Self {
            tag: tag.replace('-', "_"),
        }
    }

    /// Locale from `LC_ALL`, `LC_MESSAGES` or `LANG`, first non-empty wins.
    pub fn from_env() -> Self {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.is_empty())
            .map(|value| Self::new(&value))
            .unwrap_or_default()
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Tags to consult, most specific first, ending with the root tag.
    pub fn fallback_chain(&self) -> Vec<&str> {
        let mut chain = Vec::new();
        let mut tag = self.tag.as_str();
        while !tag.is_empty() {
            chain.push(tag);
            tag = match tag.rfind('_') {
                Some(pos) => &tag[..pos],
                None => "",
            };
        }
        chain.push("");
        chain
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tag.is_empty() {
            f.write_str("root")
        } else {
            f.write_str(&self.tag)
        }
    }
}

/// Message patterns for every available locale.
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    bundles: HashMap<String, HashMap<String, String>>,
}

impl MessageCatalog {
    /// The process-wide catalog of embedded bundles.
    pub fn builtin() -> Result<&'static MessageCatalog, &'static CatalogError> {
        BUILTIN.as_ref()
    }

    pub fn from_sources(sources: &[(&str, &str)]) -> Result<Self, CatalogError> {
        let mut bundles = HashMap::new();
        for (locale, source) in sources {
            let bundle: HashMap<String, String> =
                toml::from_str(source).map_err(|e| CatalogError::ParseError {
                    locale: locale.to_string(),
                    source: e,
                })?;
            bundles.insert(locale.to_string(), bundle);
        }
        Ok(Self { bundles })
    }

    /// Whether a bundle exists for exactly this tag.
    pub fn has_locale(&self, locale: &Locale) -> bool {
        self.bundles.contains_key(locale.tag())
    }

    /// Find the pattern for `key`, walking the locale's fallback chain.
    pub fn pattern(&self, locale: &Locale, key: &str) -> Option<&str> {
        locale
            .fallback_chain()
            .into_iter()
            .filter_map(|tag| self.bundles.get(tag))
            .find_map(|bundle| bundle.get(key))
            .map(String::as_str)
    }

    /// Render `key` for `locale` with positional arguments.
    ///
    /// A key that no bundle in the chain defines is an internal error.
    pub fn lookup(&self, locale: &Locale, key: &str, args: &[String]) -> Result<String, TaskError> {
        self.pattern(locale, key)
            .map(|pattern| format_message(pattern, args))
            .ok_or_else(|| {
                TaskError::internal("err.missing.message", vec![key.to_string(), locale.to_string()])
            })
    }
}

/// Substitute `{n}` placeholders with `args[n]`.
///
/// Placeholders without a matching argument are kept verbatim and `''`
/// renders as a single quote.
pub fn format_message(pattern: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;

    while let Some(pos) = rest.find(['{', '\'']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(after) = tail.strip_prefix("''") {
            out.push('\'');
            rest = after;
            continue;
        }

        if let Some((index, after)) = placeholder(tail) {
            match args.get(index) {
                Some(arg) => out.push_str(arg),
                None => out.push_str(&tail[..tail.len() - after.len()]),
            }
            rest = after;
            continue;
        }

        out.push_str(&tail[..1]);
        rest = &tail[1..];
    }

    out.push_str(rest);
    out
}

/// Parse `{digits}` at the start of `text`; returns the index and the remainder.
fn placeholder(text: &str) -> Option<(usize, &str)> {
    let body = text.strip_prefix('{')?;
    let end = body.find('}')?;
    let digits = &body[..end];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let index = digits.parse().ok()?;
    Some((index, &body[end + 1..]))
}
