//! Finding a named module across the module-path tiers.

use std::io;

use thiserror::Error;

use crate::search::{Location, ModuleTier, SearchPathProvider};

#[derive(Debug, Error)]
pub enum LocateError {
    /// Two locations in one location set claim the same module.
    #[error("multiple definitions found for {module}")]
    Ambiguous { module: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Looks a module up tier by tier: upgrade path, system modules, module path.
///
/// Within a tier every location set is scanned and the first match wins.
/// Sets after that match are still checked, so a duplicate inside any set
/// of the tier fails the lookup. A later tier is only consulted when the
/// earlier ones have no match.
pub struct ModuleLocator<'a> {
    provider: &'a dyn SearchPathProvider,
}

impl<'a> ModuleLocator<'a> {
    pub fn new(provider: &'a dyn SearchPathProvider) -> Self {
        Self { provider }
    }

    pub fn locate(&self, module: &str) -> Result<Option<Location>, LocateError> {
        for tier in ModuleTier::SEARCH_ORDER {
            if let Some(location) = self.locate_in_tier(tier, module)? {
                tracing::debug!(module = %module, ?tier, "Located module");
                return Ok(Some(location));
            }
        }
        tracing::debug!(module = %module, "Module not found on any path");
        Ok(None)
    }

    fn locate_in_tier(
        &self,
        tier: ModuleTier,
        module: &str,
    ) -> Result<Option<Location>, LocateError> {
        let mut found = None;
        for set in self.provider.list_location_sets(tier)? {
            let mut in_set = None;
            for location in set {
                if self.provider.infer_module_name(&location)? != module {
                    continue;
                }
                if in_set.is_some() {
                    return Err(LocateError::Ambiguous {
                        module: module.to_string(),
                    });
                }
                in_set = Some(location);
            }
            if found.is_none() {
                found = in_set;
            }
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{BinaryResource, FileKind, InvalidOptionError, LocationSet, ModuleRoot};
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// Location sets per tier; a location's module name is its directory name.
    #[derive(Default)]
    struct StubProvider {
        tiers: HashMap<ModuleTier, Vec<LocationSet>>,
    }

    impl StubProvider {
        fn with(mut self, tier: ModuleTier, sets: &[&[&str]]) -> Self {
            let sets = sets
                .iter()
                .map(|set| {
                    set.iter()
                        .map(|path| {
                            Location::Module(ModuleRoot {
                                tier,
                                path: PathBuf::from(path),
                            })
                        })
                        .collect()
                })
                .collect();
            self.tiers.insert(tier, sets);
            self
        }
    }

    impl SearchPathProvider for StubProvider {
        fn resolve(&self, _: &Location, _: &str, _: FileKind) -> io::Result<Option<BinaryResource>> {
            Ok(None)
        }

        fn is_supported_option(&self, _: &str) -> bool {
            false
        }

        fn handle_option(
            &mut self,
            _: &str,
            _: &mut dyn Iterator<Item = &String>,
        ) -> Result<bool, InvalidOptionError> {
            Ok(false)
        }

        fn list_location_sets(&self, tier: ModuleTier) -> io::Result<Vec<LocationSet>> {
            Ok(self.tiers.get(&tier).cloned().unwrap_or_default())
        }

        fn infer_module_name(&self, location: &Location) -> io::Result<String> {
            match location {
                Location::Module(root) => Ok(root
                    .path
                    .file_name()
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()),
                _ => Err(io::Error::other("not a module")),
            }
        }

        fn close(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn tier_of(location: Option<Location>) -> (ModuleTier, PathBuf) {
        match location {
            Some(Location::Module(root)) => (root.tier, root.path),
            other => panic!("Expected module location, got {:?}", other),
        }
    }

    #[test]
    fn test_upgrade_path_shadows_later_tiers() {
        let provider = StubProvider::default()
            .with(ModuleTier::UpgradeModulePath, &[&["/up/m.a"]])
            .with(ModuleTier::SystemModules, &[&["/jdk/m.a", "/jdk/m.b"]])
            .with(ModuleTier::ModulePath, &[&["/mp/m.a", "/mp/m.c"]]);
        let locator = ModuleLocator::new(&provider);

        assert_eq!(
            tier_of(locator.locate("m.a").unwrap()),
            (ModuleTier::UpgradeModulePath, PathBuf::from("/up/m.a"))
        );
        assert_eq!(
            tier_of(locator.locate("m.b").unwrap()),
            (ModuleTier::SystemModules, PathBuf::from("/jdk/m.b"))
        );
        assert_eq!(
            tier_of(locator.locate("m.c").unwrap()),
            (ModuleTier::ModulePath, PathBuf::from("/mp/m.c"))
        );
        assert!(locator.locate("m.missing").unwrap().is_none());
    }

    #[test]
    fn test_first_set_within_tier_wins() {
        let provider = StubProvider::default()
            .with(ModuleTier::ModulePath, &[&["/one/x"], &["/two/m", "/two/y"], &["/three/m"]]);
        let locator = ModuleLocator::new(&provider);

        assert_eq!(
            tier_of(locator.locate("m").unwrap()).1,
            PathBuf::from("/two/m")
        );
    }

    #[test]
    fn test_duplicate_in_one_set_is_ambiguous() {
        let provider = StubProvider::default()
            .with(ModuleTier::ModulePath, &[&["/a/m"], &["/b/m", "/c/m"]]);
        let locator = ModuleLocator::new(&provider);

        let err = locator.locate("m").unwrap_err();
        assert!(matches!(err, LocateError::Ambiguous { ref module } if module == "m"));
        assert_eq!(err.to_string(), "multiple definitions found for m");
    }

    #[test]
    fn test_ambiguity_in_later_tier_is_not_reached() {
        let provider = StubProvider::default()
            .with(ModuleTier::SystemModules, &[&["/jdk/m"]])
            .with(ModuleTier::ModulePath, &[&["/a/m", "/b/m"]]);
        let locator = ModuleLocator::new(&provider);
        assert!(locator.locate("m").unwrap().is_some());
    }
}
