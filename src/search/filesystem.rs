//! Directory-based search path.
//!
//! Class path and module path entries are directories. A module path entry
//! is either one exploded module (it holds `module-info.class`) or a
//! directory of exploded modules.

use std::cell::RefCell;
use std::collections::HashMap;
use std::env;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::SearchConfig;
use crate::search::{
    BinaryResource, FileKind, InvalidOptionError, Location, LocationSet, ModuleRoot, ModuleTier,
    SearchPathProvider,
};

/// Options owned by the search path, in help order. Each takes one value.
pub const PROVIDER_OPTIONS: &[&str] = &[
    "--module-path",
    "--upgrade-module-path",
    "--system",
    "--class-path",
    "-classpath",
    "-cp",
    "-bootclasspath",
    "--multi-release",
];

/// Oldest release with versioned class path entries.
const FIRST_VERSIONED_RELEASE: u32 = 9;

/// A [`SearchPathProvider`] over directory trees.
#[derive(Debug, Default)]
pub struct FileSystemSearchPath {
    /// Set by `-cp` and friends; replaces `default_class_path`.
    class_path: Option<Vec<PathBuf>>,
    default_class_path: Vec<PathBuf>,
    boot_class_path: Option<Vec<PathBuf>>,
    /// JDK home; its `modules` directory holds the system modules.
    system: Option<PathBuf>,
    module_path: Vec<PathBuf>,
    upgrade_module_path: Vec<PathBuf>,
    release: Option<u32>,
    location_sets: RefCell<HashMap<ModuleTier, Vec<LocationSet>>>,
    closed: bool,
}

impl FileSystemSearchPath {
    /// A search path whose class path is the current directory.
    pub fn new() -> Self {
        Self {
            default_class_path: vec![PathBuf::from(".")],
            ..Self::default()
        }
    }

    /// Defaults from the configuration file, then `CLASSPATH`, then `.`.
    pub fn from_config(search: &SearchConfig) -> Self {
        let default_class_path = if !search.class_path.is_empty() {
            search.class_path.clone()
        } else if let Some(value) = env::var_os("CLASSPATH").filter(|v| !v.is_empty()) {
            split_paths(&value)
        } else {
            vec![PathBuf::from(".")]
        };

        Self {
            default_class_path,
            system: search.system.clone(),
            ..Self::default()
        }
    }

    pub fn with_class_path(mut self, entries: Vec<PathBuf>) -> Self {
        self.class_path = Some(entries);
        self
    }

    pub fn with_boot_class_path(mut self, entries: Vec<PathBuf>) -> Self {
        self.boot_class_path = Some(entries);
        self
    }

    pub fn with_system(mut self, home: Option<PathBuf>) -> Self {
        self.system = home;
        self
    }

    pub fn with_module_path(mut self, entries: Vec<PathBuf>) -> Self {
        self.module_path = entries;
        self
    }

    pub fn with_upgrade_module_path(mut self, entries: Vec<PathBuf>) -> Self {
        self.upgrade_module_path = entries;
        self
    }

    pub fn with_release(mut self, release: u32) -> Self {
        self.release = Some(release);
        self
    }

    fn class_path_roots(&self) -> &[PathBuf] {
        self.class_path.as_deref().unwrap_or(&self.default_class_path)
    }

    fn ensure_open(&self) -> io::Result<()> {
        if self.closed {
            return Err(io::Error::other("search path is closed"));
        }
        Ok(())
    }

    /// Every module root of a tier, flattened.
    fn module_roots(&self, tier: ModuleTier) -> io::Result<Vec<PathBuf>> {
        Ok(self
            .list_location_sets(tier)?
            .into_iter()
            .flatten()
            .filter_map(|location| match location {
                Location::Module(root) => Some(root.path),
                _ => None,
            })
            .collect())
    }

    fn find_in_roots(
        &self,
        roots: &[PathBuf],
        relative: &Path,
        versioned: bool,
    ) -> io::Result<Option<BinaryResource>> {
        for root in roots {
            for candidate in self.candidates(root, relative, versioned) {
                if candidate.is_file() {
                    tracing::trace!(path = %candidate.display(), "Found class file");
                    return BinaryResource::file(candidate).map(Some);
                }
            }
        }
        Ok(None)
    }

    /// Versioned entries newest first, then the base entry.
    fn candidates(&self, root: &Path, relative: &Path, versioned: bool) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let (true, Some(release)) = (versioned, self.release) {
            for version in (FIRST_VERSIONED_RELEASE..=release).rev() {
                candidates.push(
                    root.join("META-INF")
                        .join("versions")
                        .join(version.to_string())
                        .join(relative),
                );
            }
        }
        candidates.push(root.join(relative));
        candidates
    }

    fn scan_tier(&self, tier: ModuleTier) -> io::Result<Vec<LocationSet>> {
        let entries: Vec<PathBuf> = match tier {
            ModuleTier::UpgradeModulePath => self.upgrade_module_path.clone(),
            ModuleTier::SystemModules => self.system.iter().map(|home| home.join("modules")).collect(),
            ModuleTier::ModulePath => self.module_path.clone(),
        };

        let mut sets = Vec::new();
        for entry in entries {
            if !entry.is_dir() {
                tracing::debug!(entry = %entry.display(), ?tier, "Skipping missing module path entry");
                continue;
            }

            let set: LocationSet = if entry.join("module-info.class").is_file() {
                vec![Location::Module(ModuleRoot { tier, path: entry })]
            } else {
                let mut dirs = fs::read_dir(&entry)?
                    .map(|e| e.map(|e| e.path()))
                    .collect::<io::Result<Vec<_>>>()?;
                dirs.retain(|p| p.is_dir());
                dirs.sort();
                dirs.into_iter()
                    .map(|path| Location::Module(ModuleRoot { tier, path }))
                    .collect()
            };

            if !set.is_empty() {
                sets.push(set);
            }
        }
        Ok(sets)
    }
}

impl SearchPathProvider for FileSystemSearchPath {
    fn resolve(
        &self,
        location: &Location,
        name: &str,
        kind: FileKind,
    ) -> io::Result<Option<BinaryResource>> {
        self.ensure_open()?;
        let Some(relative) = relative_path(name, kind) else {
            return Ok(None);
        };

        match location {
            Location::PlatformClassPath => match &self.boot_class_path {
                Some(roots) => self.find_in_roots(roots, &relative, false),
                None => {
                    let roots = self.module_roots(ModuleTier::SystemModules)?;
                    self.find_in_roots(&roots, &relative, false)
                }
            },
            Location::ClassPath => self.find_in_roots(self.class_path_roots(), &relative, true),
            Location::Module(root) => {
                self.find_in_roots(std::slice::from_ref(&root.path), &relative, false)
            }
        }
    }

    fn resolve_path(&self, path: &str) -> Option<BinaryResource> {
        BinaryResource::file(path).ok()
    }

    fn is_supported_option(&self, name: &str) -> bool {
        PROVIDER_OPTIONS.contains(&name)
    }

    fn handle_option(
        &mut self,
        name: &str,
        rest: &mut dyn Iterator<Item = &String>,
    ) -> Result<bool, InvalidOptionError> {
        if !self.is_supported_option(name) {
            return Ok(false);
        }
        let value = rest.next().ok_or_else(|| InvalidOptionError::MissingValue {
            option: name.to_string(),
        })?;

        match name {
            "--class-path" | "-classpath" | "-cp" => {
                self.class_path = Some(split_paths(OsStr::new(value)))
            }
            "-bootclasspath" => self.boot_class_path = Some(split_paths(OsStr::new(value))),
            "--module-path" => self.module_path = split_paths(OsStr::new(value)),
            "--upgrade-module-path" => self.upgrade_module_path = split_paths(OsStr::new(value)),
            "--system" => {
                self.system = (value != "none").then(|| PathBuf::from(value));
            }
            "--multi-release" => self.release = Some(parse_release(name, value)?),
            _ => return Ok(false),
        }

        self.location_sets.get_mut().clear();
        tracing::debug!(option = %name, value = %value, "Applied search path option");
        Ok(true)
    }

    fn list_location_sets(&self, tier: ModuleTier) -> io::Result<Vec<LocationSet>> {
        self.ensure_open()?;
        if let Some(sets) = self.location_sets.borrow().get(&tier) {
            return Ok(sets.clone());
        }
        let sets = self.scan_tier(tier)?;
        self.location_sets.borrow_mut().insert(tier, sets.clone());
        Ok(sets)
    }

    fn infer_module_name(&self, location: &Location) -> io::Result<String> {
        match location {
            Location::Module(root) => root
                .path
                .file_name()
                .and_then(OsStr::to_str)
                .map(infer_module_name)
                .ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("no module name in {}", root.path.display()),
                    )
                }),
            other => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{:?} is not a module location", other),
            )),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        self.location_sets.get_mut().clear();
        self.closed = true;
        tracing::debug!("Closed search path");
        Ok(())
    }
}

/// Path of a binary name's file relative to a root: `a.b.C` → `a/b/C.class`.
/// Internal names such as `a/b/C` are accepted too.
///
/// `None` for names that cannot be binary names.
fn relative_path(name: &str, kind: FileKind) -> Option<PathBuf> {
    if name.contains('\\') {
        return None;
    }
    let segments: Vec<&str> = name.split(['.', '/']).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return None;
    }
    let (last, packages) = segments.split_last()?;
    let mut path: PathBuf = packages.iter().collect();
    path.push(format!("{}.{}", last, kind.extension()));
    Some(path)
}

/// Module name for a directory, automatic-module style.
///
/// `foo-bar-1.2.3` → `foo.bar`, `java.base` → `java.base`.
pub fn infer_module_name(dir_name: &str) -> String {
    let base = dir_name
        .char_indices()
        .find(|&(i, c)| {
            c == '-' && dir_name[i + 1..].starts_with(|d: char| d.is_ascii_digit())
        })
        .map_or(dir_name, |(i, _)| &dir_name[..i]);

    let mut name = String::with_capacity(base.len());
    let mut pending_dot = false;
    for c in base.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dot && !name.is_empty() {
                name.push('.');
            }
            pending_dot = false;
            name.push(c);
        } else {
            pending_dot = true;
        }
    }
    name
}

fn split_paths(value: &OsStr) -> Vec<PathBuf> {
    env::split_paths(value)
        .filter(|p| !p.as_os_str().is_empty())
        .collect()
}

fn parse_release(option: &str, value: &str) -> Result<u32, InvalidOptionError> {
    let invalid = |reason: &str| InvalidOptionError::InvalidValue {
        option: option.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };
    let release: u32 = value.parse().map_err(|_| invalid("not a number"))?;
    if release < FIRST_VERSIONED_RELEASE {
        return Err(invalid("must be 9 or later"));
    }
    Ok(release)
}
