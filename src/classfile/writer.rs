//! javap-style text output for a parsed class.

use std::fmt::Write;

use chrono::{DateTime, Local, Utc};

use crate::classfile::access::*;
use crate::classfile::descriptor::{class_name, field_type, method_type};
use crate::classfile::reader::{ClassInfo, ConstantValue, MemberInfo};
use crate::classfile::EngineError;
use crate::options::TaskConfig;

const CLASS_FLAGS: &[(u16, &str)] = &[
    (ACC_PUBLIC, "ACC_PUBLIC"),
    (ACC_FINAL, "ACC_FINAL"),
    (ACC_SUPER, "ACC_SUPER"),
    (ACC_INTERFACE, "ACC_INTERFACE"),
    (ACC_ABSTRACT, "ACC_ABSTRACT"),
    (ACC_SYNTHETIC, "ACC_SYNTHETIC"),
    (ACC_ANNOTATION, "ACC_ANNOTATION"),
    (ACC_ENUM, "ACC_ENUM"),
    (ACC_MODULE, "ACC_MODULE"),
];

const FIELD_FLAGS: &[(u16, &str)] = &[
    (ACC_PUBLIC, "ACC_PUBLIC"),
    (ACC_PRIVATE, "ACC_PRIVATE"),
    (ACC_PROTECTED, "ACC_PROTECTED"),
    (ACC_STATIC, "ACC_STATIC"),
    (ACC_FINAL, "ACC_FINAL"),
    (ACC_VOLATILE, "ACC_VOLATILE"),
    (ACC_TRANSIENT, "ACC_TRANSIENT"),
    (ACC_SYNTHETIC, "ACC_SYNTHETIC"),
    (ACC_ENUM, "ACC_ENUM"),
];

const METHOD_FLAGS: &[(u16, &str)] = &[
    (ACC_PUBLIC, "ACC_PUBLIC"),
    (ACC_PRIVATE, "ACC_PRIVATE"),
    (ACC_PROTECTED, "ACC_PROTECTED"),
    (ACC_STATIC, "ACC_STATIC"),
    (ACC_FINAL, "ACC_FINAL"),
    (ACC_SYNCHRONIZED, "ACC_SYNCHRONIZED"),
    (ACC_BRIDGE, "ACC_BRIDGE"),
    (ACC_VARARGS, "ACC_VARARGS"),
    (ACC_NATIVE, "ACC_NATIVE"),
    (ACC_ABSTRACT, "ACC_ABSTRACT"),
    (ACC_STRICT, "ACC_STRICT"),
    (ACC_SYNTHETIC, "ACC_SYNTHETIC"),
];

pub fn render(info: &ClassInfo, config: &TaskConfig) -> Result<String, EngineError> {
    let mut out = String::new();

    if config.sys_info || config.verbose {
        write_sys_info(&mut out, info)?;
    }
    if let Some(source) = &info.source_file {
        writeln!(out, "Compiled from \"{source}\"")?;
    }

    let header = class_header(info);
    if config.verbose {
        writeln!(out, "{header}")?;
        write_verbose_header(&mut out, info)?;
        writeln!(out, "{{")?;
    } else {
        writeln!(out, "{header} {{")?;
    }

    let filter = config.access_filter();
    let mut first = true;
    for (member, is_method) in info
        .fields
        .iter()
        .map(|f| (f, false))
        .chain(info.methods.iter().map(|m| (m, true)))
    {
        if !filter.admits(member.access_flags) {
            continue;
        }
        if config.verbose && !first {
            writeln!(out)?;
        }
        first = false;
        if is_method {
            write_method(&mut out, info, member, config)?;
        } else {
            write_field(&mut out, member, config)?;
        }
    }

    writeln!(out, "}}")?;
    if config.verbose {
        if let Some(source) = &info.source_file {
            writeln!(out, "SourceFile: \"{source}\"")?;
        }
    }
    Ok(out)
}

fn write_sys_info(out: &mut String, info: &ClassInfo) -> Result<(), EngineError> {
    let source = &info.source;
    let location = match source.uri.to_file_path() {
        Ok(path) if source.uri.scheme() == "file" => path.display().to_string(),
        _ => source.uri.to_string(),
    };
    writeln!(out, "Classfile {location}")?;
    writeln!(
        out,
        "  Last modified {}; size {} bytes",
        format_date(source.last_modified),
        source.size
    )?;
    writeln!(out, "  MD5 checksum {}", source.md5)?;
    Ok(())
}

/// Local date in `Oct 14, 2026` form.
fn format_date(millis: u64) -> String {
    i64::try_from(millis)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|t| t.with_timezone(&Local).format("%b %-d, %Y").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn class_header(info: &ClassInfo) -> String {
    let flags = info.access_flags;
    if flags & ACC_MODULE != 0 {
        let name = info.module_name.as_deref().unwrap_or(&info.this_class);
        return format!("module {name}");
    }

    let mut words: Vec<String> = Vec::new();
    if flags & ACC_PUBLIC != 0 {
        words.push("public".into());
    }
    let is_interface = flags & ACC_INTERFACE != 0;
    if is_interface {
        words.push("interface".into());
    } else {
        if flags & ACC_ABSTRACT != 0 {
            words.push("abstract".into());
        }
        if flags & ACC_FINAL != 0 {
            words.push("final".into());
        }
        words.push("class".into());
    }
    words.push(class_name(&info.this_class));

    let super_class = info
        .super_class
        .as_deref()
        .filter(|s| *s != "java/lang/Object");
    let interfaces: Vec<String> = info.interfaces.iter().map(|i| class_name(i)).collect();

    if is_interface {
        if !interfaces.is_empty() {
            words.push(format!("extends {}", interfaces.join(", ")));
        }
    } else {
        if let Some(super_class) = super_class {
            words.push(format!("extends {}", class_name(super_class)));
        }
        if !interfaces.is_empty() {
            words.push(format!("implements {}", interfaces.join(", ")));
        }
    }
    words.join(" ")
}

fn write_verbose_header(out: &mut String, info: &ClassInfo) -> Result<(), EngineError> {
    let cp = &info.constant_pool;
    writeln!(out, "  minor version: {}", info.minor_version)?;
    writeln!(out, "  major version: {}", info.major_version)?;
    writeln!(out, "  {}", flag_line(info.access_flags, CLASS_FLAGS))?;
    writeln!(
        out,
        "  {:<40}// {}",
        format!("this_class: #{}", info.this_class_index),
        info.this_class
    )?;
    match &info.super_class {
        Some(name) => writeln!(
            out,
            "  {:<40}// {}",
            format!("super_class: #{}", info.super_class_index),
            name
        )?,
        None => writeln!(out, "  super_class: #0")?,
    }
    writeln!(
        out,
        "  interfaces: {}, fields: {}, methods: {}, attributes: {}",
        info.interfaces.len(),
        info.fields.len(),
        info.methods.len(),
        info.attribute_count
    )?;

    writeln!(out, "Constant pool:")?;
    let width = format!("#{}", cp.count().saturating_sub(1)).len();
    for (index, constant) in cp.iter() {
        let (operands, comment) = cp.describe(index)?;
        let slot = format!("#{index}");
        match comment {
            Some(comment) => writeln!(
                out,
                "  {slot:>width$} = {:<18} {operands:<14} // {comment}",
                constant.kind()
            )?,
            None => writeln!(out, "  {slot:>width$} = {:<18} {operands}", constant.kind())?,
        }
    }
    Ok(())
}

fn flag_line(flags: u16, table: &[(u16, &str)]) -> String {
    let names: Vec<&str> = table
        .iter()
        .filter(|(bit, _)| flags & bit != 0)
        .map(|(_, name)| *name)
        .collect();
    format!("flags: (0x{:04x}) {}", flags, names.join(", "))
}

fn access_word(flags: u16) -> Option<&'static str> {
    if flags & ACC_PUBLIC != 0 {
        Some("public")
    } else if flags & ACC_PROTECTED != 0 {
        Some("protected")
    } else if flags & ACC_PRIVATE != 0 {
        Some("private")
    } else {
        None
    }
}

fn write_field(
    out: &mut String,
    field: &MemberInfo,
    config: &TaskConfig,
) -> Result<(), EngineError> {
    let flags = field.access_flags;
    let mut words: Vec<&str> = access_word(flags).into_iter().collect();
    for (bit, word) in [
        (ACC_STATIC, "static"),
        (ACC_FINAL, "final"),
        (ACC_VOLATILE, "volatile"),
        (ACC_TRANSIENT, "transient"),
    ] {
        if flags & bit != 0 {
            words.push(word);
        }
    }
    let ty = field_type(&field.descriptor)?;
    words.push(&ty);
    words.push(&field.name);

    let mut line = words.join(" ");
    if config.show_constants {
        if let Some(value) = &field.constant_value {
            line.push_str(" = ");
            line.push_str(&source_literal(value, &field.descriptor));
        }
    }
    writeln!(out, "  {line};")?;

    if config.show_descriptors || config.verbose {
        writeln!(out, "    descriptor: {}", field.descriptor)?;
    }
    if config.verbose {
        writeln!(out, "    {}", flag_line(flags, FIELD_FLAGS))?;
        if let Some(value) = &field.constant_value {
            writeln!(out, "    ConstantValue: {}", attribute_value(value))?;
        }
    }
    Ok(())
}

fn write_method(
    out: &mut String,
    class: &ClassInfo,
    method: &MemberInfo,
    config: &TaskConfig,
) -> Result<(), EngineError> {
    let flags = method.access_flags;

    if method.name == "<clinit>" {
        writeln!(out, "  static {{}};")?;
    } else {
        let (mut params, ret) = method_type(&method.descriptor)?;
        if flags & ACC_VARARGS != 0 {
            if let Some(last) = params.last_mut().filter(|p| p.ends_with("[]")) {
                last.truncate(last.len() - 2);
                last.push_str("...");
            }
        }

        let mut words: Vec<String> = access_word(flags).into_iter().map(String::from).collect();
        let in_interface = class.access_flags & ACC_INTERFACE != 0;
        if in_interface && flags & (ACC_STATIC | ACC_ABSTRACT | ACC_PRIVATE) == 0 {
            words.push("default".into());
        }
        for (bit, word) in [
            (ACC_STATIC, "static"),
            (ACC_FINAL, "final"),
            (ACC_SYNCHRONIZED, "synchronized"),
            (ACC_NATIVE, "native"),
            (ACC_ABSTRACT, "abstract"),
        ] {
            if flags & bit != 0 {
                words.push(word.into());
            }
        }
        let signature = format!("({})", params.join(", "));
        if method.name == "<init>" {
            words.push(format!("{}{signature}", class_name(&class.this_class)));
        } else {
            words.push(ret);
            words.push(format!("{}{signature}", method.name));
        }

        let mut line = words.join(" ");
        if !method.exceptions.is_empty() {
            let thrown: Vec<String> = method.exceptions.iter().map(|e| class_name(e)).collect();
            line.push_str(" throws ");
            line.push_str(&thrown.join(", "));
        }
        writeln!(out, "  {line};")?;
    }

    if config.show_descriptors || config.verbose {
        writeln!(out, "    descriptor: {}", method.descriptor)?;
    }
    if config.verbose {
        writeln!(out, "    {}", flag_line(flags, METHOD_FLAGS))?;
    }
    Ok(())
}

/// A constant as it would appear in source, typed by the field descriptor.
fn source_literal(value: &ConstantValue, descriptor: &str) -> String {
    match value {
        ConstantValue::Int(v) => match descriptor {
            "Z" => (*v != 0).to_string(),
            "C" => match u32::try_from(*v).ok().and_then(char::from_u32) {
                Some(c) => format!("'{}'", escape(&c.to_string(), '\'')),
                None => v.to_string(),
            },
            _ => v.to_string(),
        },
        ConstantValue::Long(v) => format!("{v}l"),
        ConstantValue::Float(v) => format!("{v:?}f"),
        ConstantValue::Double(v) => format!("{v:?}d"),
        ConstantValue::String(s) => format!("\"{}\"", escape(s, '"')),
    }
}

/// `ConstantValue:` line of verbose output.
fn attribute_value(value: &ConstantValue) -> String {
    match value {
        ConstantValue::Int(v) => format!("int {v}"),
        ConstantValue::Long(v) => format!("long {v}l"),
        ConstantValue::Float(v) => format!("float {v:?}f"),
        ConstantValue::Double(v) => format!("double {v:?}d"),
        ConstantValue::String(s) => format!("String {}", escape(s, '"')),
    }
}

fn escape(s: &str, quote: char) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            c if c == quote => {
                escaped.push('\\');
                escaped.push(c);
            }
            c if c.is_control() => escaped.push_str(&format!("\\u{:04x}", c as u32)),
            c => escaped.push(c),
        }
    }
    escaped
}
