//! Class file disassembly engine.
//!
//! ```text
//! BinaryResource → bytes → ClassInfo (reader) → text (writer)
//! ```

mod constant_pool;
mod descriptor;
mod parser;
mod reader;
mod writer;

#[cfg(test)]
pub(crate) mod test_support;

pub use constant_pool::{Constant, ConstantPool};
pub use reader::{ClassInfo, ConstantValue, MemberInfo, SourceSummary};

use std::collections::TryReserveError;
use std::fmt;
use std::io::{self, Read};

use md5::{Digest, Md5};
use thiserror::Error;

use crate::error::TaskError;
use crate::options::TaskConfig;
use crate::search::BinaryResource;

/// Access and property flags (JVMS §4.1, §4.5, §4.6).
pub mod access {
    pub const ACC_PUBLIC: u16 = 0x0001;
    pub const ACC_PRIVATE: u16 = 0x0002;
    pub const ACC_PROTECTED: u16 = 0x0004;
    pub const ACC_STATIC: u16 = 0x0008;
    pub const ACC_FINAL: u16 = 0x0010;
    pub const ACC_SUPER: u16 = 0x0020;
    pub const ACC_SYNCHRONIZED: u16 = 0x0020;
    pub const ACC_VOLATILE: u16 = 0x0040;
    pub const ACC_BRIDGE: u16 = 0x0040;
    pub const ACC_TRANSIENT: u16 = 0x0080;
    pub const ACC_VARARGS: u16 = 0x0080;
    pub const ACC_NATIVE: u16 = 0x0100;
    pub const ACC_INTERFACE: u16 = 0x0200;
    pub const ACC_ABSTRACT: u16 = 0x0400;
    pub const ACC_STRICT: u16 = 0x0800;
    pub const ACC_SYNTHETIC: u16 = 0x1000;
    pub const ACC_ANNOTATION: u16 = 0x2000;
    pub const ACC_ENUM: u16 = 0x4000;
    pub const ACC_MODULE: u16 = 0x8000;
}

/// A class file that does not follow the format.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("truncated at offset {offset} (needed {needed} more bytes)")]
    Truncated { offset: usize, needed: usize },

    #[error("bad magic number 0x{0:08x}")]
    BadMagic(u32),

    #[error("invalid constant pool index #{0}")]
    BadIndex(u16),

    #[error("unknown constant pool tag {tag} for #{index} at offset {offset}")]
    BadTag { tag: u8, index: u16, offset: usize },

    #[error("#{index} is not a {expected} constant")]
    WrongKind { index: u16, expected: &'static str },

    #[error("malformed modified UTF-8 in #{index}")]
    BadUtf8 { index: u16 },

    #[error("invalid descriptor '{0}'")]
    BadDescriptor(String),
}

impl FormatError {
    /// Message key this error is reported under.
    pub fn message_key(&self) -> &'static str {
        match self {
            FormatError::Truncated { .. } => "err.end.of.file",
            FormatError::BadIndex(_)
            | FormatError::BadTag { .. }
            | FormatError::WrongKind { .. }
            | FormatError::BadUtf8 { .. } => "err.bad.constant.pool",
            FormatError::BadMagic(_) | FormatError::BadDescriptor(_) => "err.bad.class.file",
        }
    }
}

/// Why one class could not be disassembled.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Io(io::Error),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("out of memory")]
    OutOfMemory,

    /// An engine invariant was violated; ends the run.
    #[error("internal error: {key} {args:?}")]
    Internal { key: String, args: Vec<String> },

    /// Anything else; ends the run.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<io::Error> for EngineError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::OutOfMemory {
            EngineError::OutOfMemory
        } else {
            EngineError::Io(e)
        }
    }
}

impl From<TryReserveError> for EngineError {
    fn from(_: TryReserveError) -> Self {
        EngineError::OutOfMemory
    }
}

impl From<fmt::Error> for EngineError {
    fn from(_: fmt::Error) -> Self {
        EngineError::Internal {
            key: "err.output.format".to_string(),
            args: Vec::new(),
        }
    }
}

impl From<TaskError> for EngineError {
    fn from(e: TaskError) -> Self {
        match e {
            TaskError::Internal { key, args } => EngineError::Internal { key, args },
            other => EngineError::Other(other.into()),
        }
    }
}

/// Reads class files and renders them as text.
pub trait Disassembler {
    fn read(&self, resource: &BinaryResource) -> Result<ClassInfo, EngineError>;

    fn write(&self, info: &ClassInfo, config: &TaskConfig) -> Result<String, EngineError>;
}

/// The class file reader and javap-style writer.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClassFileDisassembler;

impl ClassFileDisassembler {
    pub fn new() -> Self {
        Self
    }
}

impl Disassembler for ClassFileDisassembler {
    fn read(&self, resource: &BinaryResource) -> Result<ClassInfo, EngineError> {
        let mut bytes = Vec::new();
        resource.open_read()?.read_to_end(&mut bytes)?;

        let source = SourceSummary {
            uri: resource.uri().clone(),
            last_modified: resource.last_modified(),
            size: bytes.len() as u64,
            md5: format!("{:x}", Md5::digest(&bytes)),
        };
        tracing::debug!(resource = %resource.name(), size = source.size, "Read class file");
        ClassInfo::parse(&bytes, source)
    }

    fn write(&self, info: &ClassInfo, config: &TaskConfig) -> Result<String, EngineError> {
        writer::render(info, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use test_support::ClassBuilder;

    #[test]
    fn test_read_and_write_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Foo.class");
        let bytes = ClassBuilder::new("Foo").method(access::ACC_PUBLIC, "run", "()V").build();
        fs::write(&path, &bytes).unwrap();

        let engine = ClassFileDisassembler::new();
        let resource = BinaryResource::file(&path).unwrap();
        let info = engine.read(&resource).unwrap();

        assert_eq!(info.source.size, bytes.len() as u64);
        assert_eq!(info.source.md5.len(), 32);
        assert!(info.source.last_modified > 0);
        assert_eq!(
            engine.write(&info, &TaskConfig::new()).unwrap(),
            "public class Foo {\n  public void run();\n}\n"
        );
    }

    #[test]
    fn test_missing_file_is_io_not_found() {
        let dir = TempDir::new().unwrap();
        let resource = BinaryResource::file(dir.path().join("Gone.class")).unwrap();
        match ClassFileDisassembler::new().read(&resource) {
            Err(EngineError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            other => panic!("Expected I/O error, got {:?}", other),
        }
    }

    #[test]
    fn test_format_error_keys() {
        assert_eq!(
            FormatError::Truncated { offset: 0, needed: 4 }.message_key(),
            "err.end.of.file"
        );
        assert_eq!(FormatError::BadIndex(3).message_key(), "err.bad.constant.pool");
        assert_eq!(FormatError::BadMagic(0).message_key(), "err.bad.class.file");
    }

    #[test]
    fn test_error_conversions() {
        let oom = io::Error::from(io::ErrorKind::OutOfMemory);
        assert!(matches!(EngineError::from(oom), EngineError::OutOfMemory));

        let internal = TaskError::internal("err.missing.message", vec!["k".into()]);
        assert!(matches!(
            EngineError::from(internal),
            EngineError::Internal { key, .. } if key == "err.missing.message"
        ));

        assert!(matches!(EngineError::from(fmt::Error), EngineError::Internal { .. }));
    }
}
