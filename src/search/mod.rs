//! Search spaces for class files: class paths, module paths and the
//! resources found in them.

mod filesystem;
mod modules;
mod resource;

pub use filesystem::{infer_module_name, FileSystemSearchPath, PROVIDER_OPTIONS};
pub use modules::{LocateError, ModuleLocator};
pub use resource::{BinaryResource, FetchError, FileResource, ResourceError, UrlResource};

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Module-path tiers, in search precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleTier {
    UpgradeModulePath,
    SystemModules,
    ModulePath,
}

impl ModuleTier {
    pub const SEARCH_ORDER: [ModuleTier; 3] = [
        ModuleTier::UpgradeModulePath,
        ModuleTier::SystemModules,
        ModuleTier::ModulePath,
    ];
}

/// One root directory holding a module's classes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleRoot {
    pub tier: ModuleTier,
    pub path: PathBuf,
}

/// An opaque segment of a search space.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    PlatformClassPath,
    ClassPath,
    Module(ModuleRoot),
}

/// Locations that are alternatives for the same module path entry.
pub type LocationSet = Vec<Location>;

/// Kind of file being looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Class,
    Source,
}

impl FileKind {
    pub fn extension(self) -> &'static str {
        match self {
            FileKind::Class => "class",
            FileKind::Source => "java",
        }
    }
}

/// The provider rejected the value of an option it owns.
#[derive(Debug, Error)]
pub enum InvalidOptionError {
    #[error("{option}: missing value")]
    MissingValue { option: String },

    #[error("{option}: invalid value '{value}': {reason}")]
    InvalidValue {
        option: String,
        value: String,
        reason: String,
    },
}

/// Where class files come from.
///
/// The provider owns its search-path options and is closed exactly once at
/// the end of a run.
pub trait SearchPathProvider {
    /// Look up `name` (a binary name such as `java.lang.Object` or
    /// `pkg.Outer$Inner`) in one location.
    fn resolve(
        &self,
        location: &Location,
        name: &str,
        kind: FileKind,
    ) -> io::Result<Option<BinaryResource>>;

    /// A resource for an arbitrary file path, if the provider supports paths.
    ///
    /// The file need not exist; callers check `last_modified`.
    fn resolve_path(&self, _path: &str) -> Option<BinaryResource> {
        None
    }

    /// Whether `name` is one of the provider's options.
    fn is_supported_option(&self, name: &str) -> bool;

    /// Consume `name` and its value from `rest` if the option is ours.
    ///
    /// `Ok(false)` means the option is unknown to the provider.
    fn handle_option(
        &mut self,
        name: &str,
        rest: &mut dyn Iterator<Item = &String>,
    ) -> Result<bool, InvalidOptionError>;

    fn list_location_sets(&self, tier: ModuleTier) -> io::Result<Vec<LocationSet>>;

    fn infer_module_name(&self, location: &Location) -> io::Result<String>;

    fn close(&mut self) -> io::Result<()>;
}
