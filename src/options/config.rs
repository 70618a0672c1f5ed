//! Task configuration accumulated from command-line options.

use crate::classfile::access;

/// Visibility restriction on the classes and members shown.
///
/// Variants are ordered from most to least restrictive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AccessFilter {
    Public,
    Protected,
    Package,
    Private,
}

impl AccessFilter {
    /// Whether an item with these access flags is shown under this filter.
    pub fn admits(self, access_flags: u16) -> bool {
        let level = if access_flags & access::ACC_PUBLIC != 0 {
            AccessFilter::Public
        } else if access_flags & access::ACC_PROTECTED != 0 {
            AccessFilter::Protected
        } else if access_flags & access::ACC_PRIVATE != 0 {
            AccessFilter::Private
        } else {
            AccessFilter::Package
        };
        level <= self
    }
}

/// Everything the options of one run asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskConfig {
    pub help: bool,
    pub version: bool,
    pub full_version: bool,
    pub verbose: bool,
    /// `-s`: print internal type descriptors.
    pub show_descriptors: bool,
    /// `-constants`: print values of `static final` fields.
    pub show_constants: bool,
    /// `-sysinfo`: print location, size, date and checksum.
    pub sys_info: bool,
    /// Filters in encounter order, with the token that selected each.
    access_filters: Vec<(AccessFilter, String)>,
    pub module_name: Option<String>,
    pub classes: Vec<String>,
}

impl TaskConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an access filter. Repeating a filter, under any alias, is a no-op.
    pub fn add_access_filter(&mut self, filter: AccessFilter, token: &str) {
        if !self.access_filters.iter().any(|(f, _)| *f == filter) {
            self.access_filters.push((filter, token.to_string()));
        }
    }

    /// Tokens that selected access filters, in encounter order.
    pub fn access_tokens(&self) -> Vec<&str> {
        self.access_filters.iter().map(|(_, t)| t.as_str()).collect()
    }

    /// The filter in effect; `-package` unless one was given.
    pub fn access_filter(&self) -> AccessFilter {
        self.access_filters
            .first()
            .map(|(f, _)| *f)
            .unwrap_or(AccessFilter::Package)
    }

    pub fn wants_help_or_version(&self) -> bool {
        self.help || self.version || self.full_version
    }
}
