//! Option handling for a disassembly run.
//!
//! ```text
//! Raw args → Registry match / search-path delegation → TaskConfig → Validate
//! ```

mod config;
mod parser;
mod registry;

pub use config::{AccessFilter, TaskConfig};
pub use parser::parse_args;
pub use registry::{help_key_for, option_registry, OptionAction, OptionDef};
