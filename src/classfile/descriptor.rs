//! Field and method descriptors rendered as Java source types.

use crate::classfile::FormatError;

/// `[Ljava/lang/String;` → `java.lang.String[]`.
pub fn field_type(descriptor: &str) -> Result<String, FormatError> {
    let mut rest = descriptor;
    let rendered = next_type(&mut rest, descriptor)?;
    if !rest.is_empty() {
        return Err(FormatError::BadDescriptor(descriptor.to_string()));
    }
    Ok(rendered)
}

/// `(I[J)V` → (`["int", "long[]"]`, `"void"`).
pub fn method_type(descriptor: &str) -> Result<(Vec<String>, String), FormatError> {
    let bad = || FormatError::BadDescriptor(descriptor.to_string());
    let mut rest = descriptor.strip_prefix('(').ok_or_else(bad)?;

    let mut params = Vec::new();
    while !rest.starts_with(')') {
        if rest.is_empty() || rest.starts_with('V') {
            return Err(bad());
        }
        params.push(next_type(&mut rest, descriptor)?);
    }
    rest = &rest[1..];

    let ret = next_type(&mut rest, descriptor)?;
    if !rest.is_empty() {
        return Err(bad());
    }
    Ok((params, ret))
}

/// Internal class name to source form: `java/lang/Object` → `java.lang.Object`.
pub fn class_name(internal: &str) -> String {
    internal.replace('/', ".")
}

fn next_type(rest: &mut &str, whole: &str) -> Result<String, FormatError> {
    let bad = || FormatError::BadDescriptor(whole.to_string());

    let mut dims = 0;
    while let Some(tail) = rest.strip_prefix('[') {
        dims += 1;
        *rest = tail;
    }

    let mut chars = rest.chars();
    let base = match chars.next().ok_or_else(bad)? {
        'B' => "byte".to_string(),
        'C' => "char".to_string(),
        'D' => "double".to_string(),
        'F' => "float".to_string(),
        'I' => "int".to_string(),
        'J' => "long".to_string(),
        'S' => "short".to_string(),
        'Z' => "boolean".to_string(),
        'V' if dims == 0 => "void".to_string(),
        'L' => {
            let end = rest.find(';').ok_or_else(bad)?;
            let name = &rest[1..end];
            if name.is_empty() {
                return Err(bad());
            }
            *rest = &rest[end + 1..];
            return Ok(format!("{}{}", class_name(name), "[]".repeat(dims)));
        }
        _ => return Err(bad()),
    };
    *rest = chars.as_str();
    Ok(format!("{}{}", base, "[]".repeat(dims)))
}
