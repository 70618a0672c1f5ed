//! The constant pool: tagged entries indexed from 1.

use crate::classfile::parser::Parser;
use crate::classfile::{EngineError, FormatError};

/// One constant pool entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class { name_index: u16 },
    String { string_index: u16 },
    FieldRef { class_index: u16, name_and_type_index: u16 },
    MethodRef { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodRef { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { reference_kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    Dynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    InvokeDynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    Module { name_index: u16 },
    Package { name_index: u16 },
    /// Slot 0, and the slot after a `Long` or `Double`.
    Unusable,
}

impl Constant {
    /// Name used in verbose pool listings.
    pub fn kind(&self) -> &'static str {
        match self {
            Constant::Utf8(_) => "Utf8",
            Constant::Integer(_) => "Integer",
            Constant::Float(_) => "Float",
            Constant::Long(_) => "Long",
            Constant::Double(_) => "Double",
            Constant::Class { .. } => "Class",
            Constant::String { .. } => "String",
            Constant::FieldRef { .. } => "Fieldref",
            Constant::MethodRef { .. } => "Methodref",
            Constant::InterfaceMethodRef { .. } => "InterfaceMethodref",
            Constant::NameAndType { .. } => "NameAndType",
            Constant::MethodHandle { .. } => "MethodHandle",
            Constant::MethodType { .. } => "MethodType",
            Constant::Dynamic { .. } => "Dynamic",
            Constant::InvokeDynamic { .. } => "InvokeDynamic",
            Constant::Module { .. } => "Module",
            Constant::Package { .. } => "Package",
            Constant::Unusable => "Unusable",
        }
    }

    fn takes_two_slots(&self) -> bool {
        matches!(self, Constant::Long(_) | Constant::Double(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    pub(crate) fn parse(parser: &mut Parser<'_>) -> Result<Self, EngineError> {
        let count = usize::from(parser.read_u16()?);
        let mut entries = Vec::new();
        entries.try_reserve(count)?;
        entries.push(Constant::Unusable);

        while entries.len() < count {
            let index = entries.len();
            let constant = read_constant(parser, index)?;
            let wide = constant.takes_two_slots();
            entries.push(constant);
            if wide {
                if entries.len() >= count {
                    return Err(FormatError::BadIndex(index as u16).into());
                }
                entries.push(Constant::Unusable);
            }
        }

        let pool = Self { entries };
        pool.check_references()?;
        Ok(pool)
    }

    /// `constant_pool_count` as stored in the class file.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, index: u16) -> Result<&Constant, FormatError> {
        match self.entries.get(usize::from(index)) {
            Some(Constant::Unusable) | None => Err(FormatError::BadIndex(index)),
            Some(constant) => Ok(constant),
        }
    }

    pub fn utf8(&self, index: u16) -> Result<&str, FormatError> {
        match self.get(index)? {
            Constant::Utf8(s) => Ok(s),
            _ => Err(FormatError::WrongKind {
                index,
                expected: "Utf8",
            }),
        }
    }

    /// Internal name of a `Class` constant, such as `java/lang/Object`.
    pub fn class_name(&self, index: u16) -> Result<&str, FormatError> {
        match self.get(index)? {
            Constant::Class { name_index } => self.utf8(*name_index),
            _ => Err(FormatError::WrongKind {
                index,
                expected: "Class",
            }),
        }
    }

    /// Usable entries with their indices.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Constant)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, c)| **c != Constant::Unusable)
            .map(|(i, c)| (i as u16, c))
    }

    /// The javap-style one-line rendering of an entry: its operands and
    /// the resolved text they point at.
    pub fn describe(&self, index: u16) -> Result<(String, Option<String>), FormatError> {
        let described = match self.get(index)? {
            Constant::Utf8(s) => (s.clone(), None),
            Constant::Integer(v) => (v.to_string(), None),
            Constant::Float(v) => (format!("{v:?}f"), None),
            Constant::Long(v) => (format!("{v}l"), None),
            Constant::Double(v) => (format!("{v:?}d"), None),
            Constant::Class { name_index }
            | Constant::Module { name_index }
            | Constant::Package { name_index } => {
                (format!("#{name_index}"), Some(self.utf8(*name_index)?.to_string()))
            }
            Constant::String { string_index } => {
                (format!("#{string_index}"), Some(self.utf8(*string_index)?.to_string()))
            }
            Constant::FieldRef { class_index, name_and_type_index }
            | Constant::MethodRef { class_index, name_and_type_index }
            | Constant::InterfaceMethodRef { class_index, name_and_type_index } => (
                format!("#{class_index}.#{name_and_type_index}"),
                Some(format!(
                    "{}.{}",
                    self.class_name(*class_index)?,
                    self.name_and_type(*name_and_type_index)?
                )),
            ),
            Constant::NameAndType { name_index, descriptor_index } => (
                format!("#{name_index}:#{descriptor_index}"),
                Some(self.name_and_type(index)?),
            ),
            Constant::MethodHandle { reference_kind, reference_index } => (
                format!("{reference_kind}:#{reference_index}"),
                self.describe(*reference_index)?.1,
            ),
            Constant::MethodType { descriptor_index } => (
                format!("#{descriptor_index}"),
                Some(self.utf8(*descriptor_index)?.to_string()),
            ),
            Constant::Dynamic { bootstrap_method_attr_index, name_and_type_index }
            | Constant::InvokeDynamic { bootstrap_method_attr_index, name_and_type_index } => (
                format!("#{bootstrap_method_attr_index}:#{name_and_type_index}"),
                Some(format!(
                    "#{bootstrap_method_attr_index}:{}",
                    self.name_and_type(*name_and_type_index)?
                )),
            ),
            Constant::Unusable => return Err(FormatError::BadIndex(index)),
        };
        Ok(described)
    }

    fn name_and_type(&self, index: u16) -> Result<String, FormatError> {
        match self.get(index)? {
            Constant::NameAndType { name_index, descriptor_index } => {
                let name = self.utf8(*name_index)?;
                let descriptor = self.utf8(*descriptor_index)?;
                if name.starts_with('<') {
                    Ok(format!("\"{name}\":{descriptor}"))
                } else {
                    Ok(format!("{name}:{descriptor}"))
                }
            }
            _ => Err(FormatError::WrongKind {
                index,
                expected: "NameAndType",
            }),
        }
    }

    /// Every entry's operands must point at entries of the right kind.
    fn check_references(&self) -> Result<(), FormatError> {
        for (index, _) in self.iter() {
            self.describe(index)?;
        }
        Ok(())
    }
}

fn read_constant(parser: &mut Parser<'_>, index: usize) -> Result<Constant, EngineError> {
    let offset = parser.pos();
    let tag = parser.read_u8()?;
    let constant = match tag {
        1 => {
            let len = usize::from(parser.read_u16()?);
            let bytes = parser.read_bytes(len)?;
            Constant::Utf8(decode_modified_utf8(bytes).ok_or(FormatError::BadUtf8 {
                index: index as u16,
            })?)
        }
        3 => Constant::Integer(parser.read_u32()? as i32),
        4 => Constant::Float(f32::from_bits(parser.read_u32()?)),
        5 => Constant::Long(parser.read_u64()? as i64),
        6 => Constant::Double(f64::from_bits(parser.read_u64()?)),
        7 => Constant::Class { name_index: parser.read_u16()? },
        8 => Constant::String { string_index: parser.read_u16()? },
        9 => Constant::FieldRef {
            class_index: parser.read_u16()?,
            name_and_type_index: parser.read_u16()?,
        },
        10 => Constant::MethodRef {
            class_index: parser.read_u16()?,
            name_and_type_index: parser.read_u16()?,
        },
        11 => Constant::InterfaceMethodRef {
            class_index: parser.read_u16()?,
            name_and_type_index: parser.read_u16()?,
        },
        12 => Constant::NameAndType {
            name_index: parser.read_u16()?,
            descriptor_index: parser.read_u16()?,
        },
        15 => Constant::MethodHandle {
            reference_kind: parser.read_u8()?,
            reference_index: parser.read_u16()?,
        },
        16 => Constant::MethodType { descriptor_index: parser.read_u16()? },
        17 => Constant::Dynamic {
            bootstrap_method_attr_index: parser.read_u16()?,
            name_and_type_index: parser.read_u16()?,
        },
        18 => Constant::InvokeDynamic {
            bootstrap_method_attr_index: parser.read_u16()?,
            name_and_type_index: parser.read_u16()?,
        },
        19 => Constant::Module { name_index: parser.read_u16()? },
        20 => Constant::Package { name_index: parser.read_u16()? },
        _ => {
            return Err(FormatError::BadTag {
                tag,
                index: index as u16,
                offset,
            }
            .into())
        }
    };
    Ok(constant)
}

/// Decode the class file's modified UTF-8.
///
/// NUL is encoded as `C0 80` and supplementary characters as surrogate
/// pairs; unpaired surrogates decode to U+FFFD.
fn decode_modified_utf8(bytes: &[u8]) -> Option<String> {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        let continuation = |at: usize| {
            bytes
                .get(at)
                .filter(|c| *c & 0xC0 == 0x80)
                .map(|c| u16::from(c & 0x3F))
        };
        match b {
            0x01..=0x7F => {
                units.push(u16::from(b));
                i += 1;
            }
            0xC0..=0xDF => {
                let low = continuation(i + 1)?;
                units.push((u16::from(b & 0x1F) << 6) | low);
                i += 2;
            }
            0xE0..=0xEF => {
                let mid = continuation(i + 1)?;
                let low = continuation(i + 2)?;
                units.push((u16::from(b & 0x0F) << 12) | (mid << 6) | low);
                i += 3;
            }
            _ => return None,
        }
    }
    Some(String::from_utf16_lossy(&units))
}
