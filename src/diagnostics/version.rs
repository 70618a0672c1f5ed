//! Version metadata, computed once per process.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Set at compile time to produce a `full` version entry.
const BUILD_ID: Option<&str> = option_env!("JADIS_BUILD");

static VERSIONS: Lazy<HashMap<&'static str, String>> = Lazy::new(|| {
    let release = env!("CARGO_PKG_VERSION");
    let mut versions = HashMap::new();
    versions.insert("release", release.to_string());
    if let Some(build) = BUILD_ID {
        versions.insert("full", format!("{}+{}", release, build));
    }
    versions
});

/// Look up a version string: `release` is always present, `full` only in
/// builds that carry a build id.
pub fn version(key: &str) -> Option<&'static str> {
    VERSIONS.get(key).map(String::as_str)
}

pub fn release() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
