//! Class file structure: header, pool, members and the attributes we show.

use url::Url;

use crate::classfile::constant_pool::{Constant, ConstantPool};
use crate::classfile::descriptor;
use crate::classfile::parser::Parser;
use crate::classfile::{access, EngineError, FormatError};

const MAGIC: u32 = 0xCAFE_BABE;

/// Where a class file came from, for `-sysinfo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSummary {
    pub uri: Url,
    /// Milliseconds since the epoch; 0 when unknown.
    pub last_modified: u64,
    pub size: u64,
    /// Lowercase hex.
    pub md5: String,
}

/// A `ConstantValue` attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
}

/// A field or method.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberInfo {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub constant_value: Option<ConstantValue>,
    /// Internal names from the `Exceptions` attribute.
    pub exceptions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassInfo {
    pub minor_version: u16,
    pub major_version: u16,
    pub constant_pool: ConstantPool,
    pub access_flags: u16,
    pub this_class_index: u16,
    /// Internal form, `p/Outer$Inner`.
    pub this_class: String,
    /// 0 when there is no superclass.
    pub super_class_index: u16,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<MemberInfo>,
    pub methods: Vec<MemberInfo>,
    pub attribute_count: u16,
    pub source_file: Option<String>,
    /// Name from the `Module` attribute of a `module-info` class.
    pub module_name: Option<String>,
    pub source: SourceSummary,
}

impl ClassInfo {
    pub fn parse(bytes: &[u8], source: SourceSummary) -> Result<Self, EngineError> {
        let mut parser = Parser::new(bytes);

        let magic = parser.read_u32()?;
        if magic != MAGIC {
            return Err(FormatError::BadMagic(magic).into());
        }
        let minor_version = parser.read_u16()?;
        let major_version = parser.read_u16()?;
        let constant_pool = ConstantPool::parse(&mut parser)?;
        let cp = &constant_pool;

        let access_flags = parser.read_u16()?;
        let this_class_index = parser.read_u16()?;
        let this_class = cp.class_name(this_class_index)?.to_string();
        let super_class_index = parser.read_u16()?;
        let super_class = match super_class_index {
            0 => None,
            index => Some(cp.class_name(index)?.to_string()),
        };

        let interface_count = parser.read_u16()?;
        let mut interfaces = Vec::new();
        interfaces.try_reserve(usize::from(interface_count))?;
        for _ in 0..interface_count {
            interfaces.push(cp.class_name(parser.read_u16()?)?.to_string());
        }

        let fields = read_members(&mut parser, cp, MemberKind::Field)?;
        let methods = read_members(&mut parser, cp, MemberKind::Method)?;

        let mut source_file = None;
        let mut module_name = None;
        let attribute_count = parser.read_u16()?;
        for _ in 0..attribute_count {
            let (name, len) = attribute_header(&mut parser, cp)?;
            match name {
                "SourceFile" => {
                    let mut body = Parser::new(parser.read_bytes(len)?);
                    source_file = Some(cp.utf8(body.read_u16()?)?.to_string());
                }
                "Module" => {
                    let mut body = Parser::new(parser.read_bytes(len)?);
                    module_name = Some(module_constant(cp, body.read_u16()?)?);
                }
                _ => parser.skip(len)?,
            }
        }

        tracing::trace!(
            class = %this_class,
            major_version,
            constants = cp.count(),
            fields = fields.len(),
            methods = methods.len(),
            "Parsed class file"
        );

        Ok(Self {
            minor_version,
            major_version,
            access_flags,
            this_class_index,
            this_class,
            super_class_index,
            super_class,
            interfaces,
            fields,
            methods,
            attribute_count,
            source_file,
            module_name,
            constant_pool,
            source,
        })
    }

    /// The class name with `/` and `$` read as `.`, for comparing against
    /// the name that was asked for.
    pub fn dotted_name(&self) -> String {
        self.this_class.replace(['/', '$'], ".")
    }

    pub fn is_module_info(&self) -> bool {
        self.access_flags & access::ACC_MODULE != 0 || self.this_class == "module-info"
    }
}

#[derive(Clone, Copy)]
enum MemberKind {
    Field,
    Method,
}

fn read_members(
    parser: &mut Parser<'_>,
    cp: &ConstantPool,
    kind: MemberKind,
) -> Result<Vec<MemberInfo>, EngineError> {
    let count = parser.read_u16()?;
    let mut members = Vec::new();
    members.try_reserve(usize::from(count))?;

    for _ in 0..count {
        let access_flags = parser.read_u16()?;
        let name = cp.utf8(parser.read_u16()?)?.to_string();
        let descriptor = cp.utf8(parser.read_u16()?)?.to_string();
        match kind {
            MemberKind::Field => descriptor::field_type(&descriptor).map(|_| ())?,
            MemberKind::Method => descriptor::method_type(&descriptor).map(|_| ())?,
        }

        let mut constant_value = None;
        let mut exceptions = Vec::new();
        for _ in 0..parser.read_u16()? {
            let (attribute, len) = attribute_header(parser, cp)?;
            match (kind, attribute) {
                (MemberKind::Field, "ConstantValue") => {
                    let mut body = Parser::new(parser.read_bytes(len)?);
                    constant_value = Some(read_constant_value(cp, body.read_u16()?)?);
                }
                (MemberKind::Method, "Exceptions") => {
                    let mut body = Parser::new(parser.read_bytes(len)?);
                    for _ in 0..body.read_u16()? {
                        exceptions.push(cp.class_name(body.read_u16()?)?.to_string());
                    }
                }
                _ => parser.skip(len)?,
            }
        }

        members.push(MemberInfo {
            access_flags,
            name,
            descriptor,
            constant_value,
            exceptions,
        });
    }
    Ok(members)
}

/// An attribute's name and body length. The parser is left at the body.
fn attribute_header<'p>(
    parser: &mut Parser<'_>,
    cp: &'p ConstantPool,
) -> Result<(&'p str, usize), FormatError> {
    let name = cp.utf8(parser.read_u16()?)?;
    let len = parser.read_u32()? as usize;
    Ok((name, len))
}

fn read_constant_value(cp: &ConstantPool, index: u16) -> Result<ConstantValue, FormatError> {
    let value = match cp.get(index)? {
        Constant::Integer(v) => ConstantValue::Int(*v),
        Constant::Long(v) => ConstantValue::Long(*v),
        Constant::Float(v) => ConstantValue::Float(*v),
        Constant::Double(v) => ConstantValue::Double(*v),
        Constant::String { string_index } => ConstantValue::String(cp.utf8(*string_index)?.to_string()),
        _ => {
            return Err(FormatError::WrongKind {
                index,
                expected: "constant value",
            })
        }
    };
    Ok(value)
}

fn module_constant(cp: &ConstantPool, index: u16) -> Result<String, FormatError> {
    match cp.get(index)? {
        Constant::Module { name_index } => Ok(cp.utf8(*name_index)?.to_string()),
        _ => Err(FormatError::WrongKind {
            index,
            expected: "Module",
        }),
    }
}
