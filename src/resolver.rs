//! Turning a requested class name into a readable resource.

use std::io;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::search::{BinaryResource, FileKind, Location, SearchPathProvider};

static URL_LIKE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]+:.*$").expect("URL pattern is valid"));

pub const DEFAULT_URL_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolves a class name with a fixed strategy order:
///
/// 1. the name as a binary name
/// 2. rightmost dots turned into `$`, one at a time
/// 3. (names ending in `.class` only) the name as a file path
/// 4. (names ending in `.class` only) the name as a URL
pub struct ClassResolver<'a> {
    provider: &'a dyn SearchPathProvider,
    module: Option<&'a Location>,
    url_timeout: Duration,
}

impl<'a> ClassResolver<'a> {
    pub fn new(provider: &'a dyn SearchPathProvider) -> Self {
        Self {
            provider,
            module: None,
            url_timeout: DEFAULT_URL_TIMEOUT,
        }
    }

    /// Restrict binary-name lookups to one module.
    pub fn in_module(mut self, module: Option<&'a Location>) -> Self {
        self.module = module;
        self
    }

    pub fn with_url_timeout(mut self, timeout: Duration) -> Self {
        self.url_timeout = timeout;
        self
    }

    pub fn resolve(&self, class_name: &str) -> io::Result<Option<BinaryResource>> {
        if let Some(found) = self.lookup(class_name)? {
            return Ok(Some(found));
        }

        let mut name = class_name.to_string();
        while let Some(dot) = name.rfind('.') {
            name.replace_range(dot..=dot, "$");
            if let Some(found) = self.lookup(&name)? {
                tracing::debug!(requested = %class_name, resolved = %name, "Resolved as nested class");
                return Ok(Some(found));
            }
        }

        if !class_name.ends_with(".class") {
            return Ok(None);
        }

        if let Some(file) = self.provider.resolve_path(class_name) {
            if file.last_modified() != 0 {
                tracing::debug!(path = %class_name, "Resolved as file path");
                return Ok(Some(file));
            }
        }

        Ok(self.fetch_url(class_name))
    }

    fn lookup(&self, name: &str) -> io::Result<Option<BinaryResource>> {
        if let Some(module) = self.module {
            return self.provider.resolve(module, name, FileKind::Class);
        }
        for location in [Location::PlatformClassPath, Location::ClassPath] {
            if let Some(found) = self.provider.resolve(&location, name, FileKind::Class)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    fn fetch_url(&self, name: &str) -> Option<BinaryResource> {
        if !URL_LIKE.is_match(name) {
            return None;
        }
        let url = match Url::parse(name) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!(name = %name, error = %e, "Not a URL");
                return None;
            }
        };
        match BinaryResource::fetch(url, self.url_timeout) {
            Ok(resource) => {
                tracing::debug!(url = %name, "Resolved as URL");
                Some(resource)
            }
            Err(e) => {
                tracing::debug!(url = %name, error = %e, "URL fallback failed");
                None
            }
        }
    }
}
