//! jadis: a class file disassembler in the style of `javap`.

pub mod classfile;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod options;
pub mod resolver;
pub mod search;
pub mod task;
