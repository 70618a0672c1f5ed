//! Builds small class files for unit tests.

use crate::classfile::access;

#[derive(Default)]
struct Pool {
    entries: Vec<Vec<u8>>,
}

impl Pool {
    fn add(&mut self, entry: Vec<u8>) -> u16 {
        if let Some(i) = self.entries.iter().position(|e| *e == entry) {
            return i as u16 + 1;
        }
        self.entries.push(entry);
        self.entries.len() as u16
    }

    fn utf8(&mut self, s: &str) -> u16 {
        let mut entry = vec![1];
        entry.extend_from_slice(&(s.len() as u16).to_be_bytes());
        entry.extend_from_slice(s.as_bytes());
        self.add(entry)
    }

    fn with_index(&mut self, tag: u8, index: u16) -> u16 {
        let mut entry = vec![tag];
        entry.extend_from_slice(&index.to_be_bytes());
        self.add(entry)
    }

    fn class(&mut self, name: &str) -> u16 {
        let name = self.utf8(name);
        self.with_index(7, name)
    }

    fn string(&mut self, s: &str) -> u16 {
        let s = self.utf8(s);
        self.with_index(8, s)
    }

    fn module(&mut self, name: &str) -> u16 {
        let name = self.utf8(name);
        self.with_index(19, name)
    }

    fn integer(&mut self, value: i32) -> u16 {
        let mut entry = vec![3];
        entry.extend_from_slice(&value.to_be_bytes());
        self.add(entry)
    }
}

enum Value {
    Int(i32),
    Str(String),
}

struct Member {
    flags: u16,
    name: String,
    descriptor: String,
    value: Option<Value>,
    exceptions: Vec<String>,
}

pub struct ClassBuilder {
    flags: u16,
    this_class: String,
    super_class: Option<String>,
    interfaces: Vec<String>,
    fields: Vec<Member>,
    methods: Vec<Member>,
    attributes: Vec<(String, Vec<u8>)>,
    source_file: Option<String>,
    module: Option<String>,
}

impl ClassBuilder {
    pub fn new(this_class: &str) -> Self {
        Self {
            flags: access::ACC_PUBLIC | access::ACC_SUPER,
            this_class: this_class.to_string(),
            super_class: Some("java/lang/Object".to_string()),
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
            source_file: None,
            module: None,
        }
    }

    pub fn module_info(name: &str) -> Self {
        let mut builder = Self::new("module-info");
        builder.flags = access::ACC_MODULE;
        builder.super_class = None;
        builder.module = Some(name.to_string());
        builder
    }

    pub fn access(mut self, flags: u16) -> Self {
        self.flags = flags;
        self
    }

    pub fn super_class(mut self, name: &str) -> Self {
        self.super_class = Some(name.to_string());
        self
    }

    pub fn interface(mut self, name: &str) -> Self {
        self.interfaces.push(name.to_string());
        self
    }

    pub fn source_file(mut self, name: &str) -> Self {
        self.source_file = Some(name.to_string());
        self
    }

    /// A class attribute with an arbitrary name and body, written before
    /// `SourceFile` and `Module`.
    pub fn class_attribute(mut self, name: &str, body: &[u8]) -> Self {
        self.attributes.push((name.to_string(), body.to_vec()));
        self
    }

    pub fn field(self, flags: u16, name: &str, descriptor: &str) -> Self {
        self.push_field(flags, name, descriptor, None)
    }

    pub fn constant_field(self, flags: u16, name: &str, descriptor: &str, value: i32) -> Self {
        self.push_field(flags, name, descriptor, Some(Value::Int(value)))
    }

    pub fn string_field(self, flags: u16, name: &str, value: &str) -> Self {
        self.push_field(flags, name, "Ljava/lang/String;", Some(Value::Str(value.to_string())))
    }

    pub fn method(self, flags: u16, name: &str, descriptor: &str) -> Self {
        self.method_throws(flags, name, descriptor, &[])
    }

    pub fn method_throws(mut self, flags: u16, name: &str, descriptor: &str, exceptions: &[&str]) -> Self {
        self.methods.push(Member {
            flags,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            value: None,
            exceptions: exceptions.iter().map(|e| e.to_string()).collect(),
        });
        self
    }

    fn push_field(mut self, flags: u16, name: &str, descriptor: &str, value: Option<Value>) -> Self {
        self.fields.push(Member {
            flags,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            value,
            exceptions: Vec::new(),
        });
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut pool = Pool::default();
        let mut body = Vec::new();
        let u16s = |out: &mut Vec<u8>, v: u16| out.extend_from_slice(&v.to_be_bytes());
        let u32s = |out: &mut Vec<u8>, v: u32| out.extend_from_slice(&v.to_be_bytes());

        u16s(&mut body, self.flags);
        let this = pool.class(&self.this_class);
        u16s(&mut body, this);
        let super_index = self.super_class.as_deref().map_or(0, |s| pool.class(s));
        u16s(&mut body, super_index);

        u16s(&mut body, self.interfaces.len() as u16);
        for interface in &self.interfaces {
            let index = pool.class(interface);
            u16s(&mut body, index);
        }

        for members in [&self.fields, &self.methods] {
            u16s(&mut body, members.len() as u16);
            for member in members {
                u16s(&mut body, member.flags);
                let name = pool.utf8(&member.name);
                u16s(&mut body, name);
                let descriptor = pool.utf8(&member.descriptor);
                u16s(&mut body, descriptor);

                let attributes = usize::from(member.value.is_some()) + usize::from(!member.exceptions.is_empty());
                u16s(&mut body, attributes as u16);
                if let Some(value) = &member.value {
                    let attr = pool.utf8("ConstantValue");
                    let index = match value {
                        Value::Int(v) => pool.integer(*v),
                        Value::Str(s) => pool.string(s),
                    };
                    u16s(&mut body, attr);
                    u32s(&mut body, 2);
                    u16s(&mut body, index);
                }
                if !member.exceptions.is_empty() {
                    let attr = pool.utf8("Exceptions");
                    u16s(&mut body, attr);
                    u32s(&mut body, 2 + 2 * member.exceptions.len() as u32);
                    u16s(&mut body, member.exceptions.len() as u16);
                    for exception in &member.exceptions {
                        let index = pool.class(exception);
                        u16s(&mut body, index);
                    }
                }
            }
        }

        let attributes = self.attributes.len()
            + usize::from(self.source_file.is_some())
            + usize::from(self.module.is_some());
        u16s(&mut body, attributes as u16);
        for (name, bytes) in &self.attributes {
            let attr = pool.utf8(name);
            u16s(&mut body, attr);
            u32s(&mut body, bytes.len() as u32);
            body.extend_from_slice(bytes);
        }
        if let Some(source) = &self.source_file {
            let attr = pool.utf8("SourceFile");
            let index = pool.utf8(source);
            u16s(&mut body, attr);
            u32s(&mut body, 2);
            u16s(&mut body, index);
        }
        if let Some(module) = &self.module {
            let attr = pool.utf8("Module");
            let index = pool.module(module);
            u16s(&mut body, attr);
            // Name, flags, version and empty requires/exports/opens/uses/provides.
            u32s(&mut body, 16);
            u16s(&mut body, index);
            body.extend_from_slice(&[0; 14]);
        }

        let mut out = Vec::new();
        u32s(&mut out, 0xCAFE_BABE);
        u16s(&mut out, 0);
        u16s(&mut out, 65);
        u16s(&mut out, pool.entries.len() as u16 + 1);
        for entry in &pool.entries {
            out.extend_from_slice(entry);
        }
        out.extend_from_slice(&body);
        out
    }
}
