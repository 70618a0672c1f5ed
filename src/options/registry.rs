//! Option registry: the single source of truth for task options.
//!
//! Search-path options (`-cp`, `--module-path`, ...) are not listed here;
//! they belong to the search-path provider.

use crate::error::TaskError;
use crate::options::config::{AccessFilter, TaskConfig};

/// What an option does to the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionAction {
    Help,
    Version,
    FullVersion,
    Verbose,
    ShowDescriptors,
    SysInfo,
    ShowConstants,
    Access(AccessFilter),
    Module,
}

/// A single option definition.
#[derive(Debug, Clone)]
pub struct OptionDef {
    /// Every spelling of the option. The first one names its help entry.
    pub aliases: &'static [&'static str],
    /// Does it consume the next token?
    pub takes_argument: bool,
    /// Are all tokens after it discarded?
    pub halts_further_parsing: bool,
    /// Left out of the help listing.
    pub hidden: bool,
    pub action: OptionAction,
}

impl OptionDef {
    fn flag(aliases: &'static [&'static str], action: OptionAction) -> Self {
        Self {
            aliases,
            takes_argument: false,
            halts_further_parsing: false,
            hidden: false,
            action,
        }
    }

    fn with_argument(aliases: &'static [&'static str], action: OptionAction) -> Self {
        Self {
            aliases,
            takes_argument: true,
            halts_further_parsing: false,
            hidden: false,
            action,
        }
    }

    fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Verbatim comparison against every alias.
    pub fn matches(&self, token: &str) -> bool {
        self.aliases.iter().any(|alias| *alias == token)
    }

    /// Apply the option as spelled by `name`, with its argument if it takes one.
    pub fn apply(
        &self,
        config: &mut TaskConfig,
        name: &str,
        argument: Option<&str>,
    ) -> Result<(), TaskError> {
        match self.action {
            OptionAction::Help => config.help = true,
            OptionAction::Version => config.version = true,
            OptionAction::FullVersion => config.full_version = true,
            OptionAction::Verbose => config.verbose = true,
            OptionAction::ShowDescriptors => config.show_descriptors = true,
            OptionAction::SysInfo => config.sys_info = true,
            OptionAction::ShowConstants => config.show_constants = true,
            OptionAction::Access(filter) => config.add_access_filter(filter, name),
            OptionAction::Module => {
                let module = argument.ok_or_else(|| {
                    TaskError::bad_args("err.missing.arg", vec![name.to_string()]).with_usage()
                })?;
                config.module_name = Some(module.to_string());
            }
        }
        Ok(())
    }

    /// Catalog key of the option's help line: `--module` → `main.opt.module`,
    /// `--class-path` → `main.opt.class_path`.
    pub fn help_key(&self) -> String {
        help_key_for(self.aliases.first().copied().unwrap_or_default())
    }
}

/// Catalog key of the help line for an option spelled `alias`.
pub fn help_key_for(alias: &str) -> String {
    let name = alias.trim_start_matches('-');
    let mut key = String::from("main.opt.");
    let mut in_dashes = false;
    for c in name.chars() {
        if c == '-' {
            if !in_dashes {
                key.push('_');
            }
            in_dashes = true;
        } else {
            key.push(c);
            in_dashes = false;
        }
    }
    key
}

/// Build the complete option registry, in help order.
pub fn option_registry() -> Vec<OptionDef> {
    vec![
        OptionDef::flag(&["-help", "--help", "-?", "-h"], OptionAction::Help),
        OptionDef::flag(&["-version"], OptionAction::Version),
        OptionDef::flag(&["-fullversion"], OptionAction::FullVersion).hidden(),
        OptionDef::flag(&["-v", "-verbose"], OptionAction::Verbose),
        OptionDef::flag(&["-s"], OptionAction::ShowDescriptors),
        OptionDef::flag(&["-sysinfo"], OptionAction::SysInfo),
        OptionDef::flag(&["-constants"], OptionAction::ShowConstants),
        OptionDef::flag(&["-public"], OptionAction::Access(AccessFilter::Public)),
        OptionDef::flag(&["-protected"], OptionAction::Access(AccessFilter::Protected)),
        OptionDef::flag(&["-package"], OptionAction::Access(AccessFilter::Package)),
        OptionDef::flag(&["-p", "-private"], OptionAction::Access(AccessFilter::Private)),
        OptionDef::with_argument(&["--module", "-m"], OptionAction::Module),
    ]
}
