//! Minimal class-file encoder for fixtures.
//!
//! Emits just enough structure for [`ClassFile::parse`](crate::ClassFile::parse)
//! to exercise every path it cares about: header, interfaces, annotated
//! fields, methods (without code) and class-level annotations. Analysis
//! tests use it to describe command hierarchies without compiled Java.
//!
//! ```
//! use cmdsec_classfile::{Annotation, ClassFile, ClassWriter, ElementValue};
//!
//! let bytes = ClassWriter::new("com/example/ListThings")
//!     .interface("org/glassfish/api/admin/AdminCommand")
//!     .annotation(
//!         Annotation::new("Lorg/jvnet/hk2/annotations/Service;")
//!             .with("name", ElementValue::String("list-things".into())),
//!     )
//!     .to_bytes();
//! let class = ClassFile::parse(&bytes).unwrap();
//! assert_eq!(class.this_class, "com/example/ListThings");
//! ```

use std::collections::HashMap;

use crate::annotation::{
    Annotation, ElementValue, RUNTIME_INVISIBLE_ANNOTATIONS, RUNTIME_VISIBLE_ANNOTATIONS,
};
use crate::class_file::CLASS_MAGIC;

#[derive(Debug, Clone)]
pub struct ClassWriter {
    major_version: u16,
    access_flags: u16,
    this_class: String,
    super_class: Option<String>,
    interfaces: Vec<String>,
    fields: Vec<(String, String, Vec<Annotation>)>,
    methods: Vec<(String, String)>,
    annotations: Vec<Annotation>,
}

impl ClassWriter {
    /// A public class extending `java/lang/Object`, Java 8 format.
    pub fn new(internal_name: impl Into<String>) -> Self {
        Self {
            major_version: 52,
            access_flags: 0x0021,
            this_class: internal_name.into(),
            super_class: Some("java/lang/Object".to_string()),
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn major_version(mut self, major: u16) -> Self {
        self.major_version = major;
        self
    }

    pub fn access_flags(mut self, flags: u16) -> Self {
        self.access_flags = flags;
        self
    }

    pub fn super_class(mut self, internal_name: impl Into<String>) -> Self {
        self.super_class = Some(internal_name.into());
        self
    }

    pub fn no_super_class(mut self) -> Self {
        self.super_class = None;
        self
    }

    pub fn interface(mut self, internal_name: impl Into<String>) -> Self {
        self.interfaces.push(internal_name.into());
        self
    }

    pub fn field(
        mut self,
        name: impl Into<String>,
        descriptor: impl Into<String>,
        annotations: Vec<Annotation>,
    ) -> Self {
        self.fields.push((name.into(), descriptor.into(), annotations));
        self
    }

    pub fn method(mut self, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        self.methods.push((name.into(), descriptor.into()));
        self
    }

    pub fn annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut pool = PoolBuilder::default();
        let mut body = Vec::new();

        put_u16(&mut body, self.access_flags);
        put_u16(&mut body, pool.class(&self.this_class));
        let super_index = self.super_class.as_deref().map_or(0, |s| pool.class(s));
        put_u16(&mut body, super_index);

        put_u16(&mut body, self.interfaces.len() as u16);
        for iface in &self.interfaces {
            put_u16(&mut body, pool.class(iface));
        }

        put_u16(&mut body, self.fields.len() as u16);
        for (name, descriptor, annotations) in &self.fields {
            put_u16(&mut body, 0x0002);
            put_u16(&mut body, pool.utf8(name));
            put_u16(&mut body, pool.utf8(descriptor));
            write_annotation_attributes(&mut body, &mut pool, annotations, &[]);
        }

        put_u16(&mut body, self.methods.len() as u16);
        for (name, descriptor) in &self.methods {
            put_u16(&mut body, 0x0001);
            put_u16(&mut body, pool.utf8(name));
            put_u16(&mut body, pool.utf8(descriptor));
            // one zero-length attribute so the reader has something to skip
            put_u16(&mut body, 1);
            put_u16(&mut body, pool.utf8("Deprecated"));
            put_u32(&mut body, 0);
        }

        let source_file = format!("{}.java", self.this_class.rsplit('/').next().unwrap_or(""));
        let source_attr = [pool.utf8("SourceFile"), pool.utf8(&source_file)];
        write_annotation_attributes(&mut body, &mut pool, &self.annotations, &source_attr);

        let mut out = Vec::with_capacity(body.len() + 64);
        put_u32(&mut out, CLASS_MAGIC);
        put_u16(&mut out, 0);
        put_u16(&mut out, self.major_version);
        put_u16(&mut out, pool.next);
        for entry in &pool.entries {
            out.extend_from_slice(entry);
        }
        out.extend_from_slice(&body);
        out
    }
}

/// Write an attribute table holding the annotation attributes and, when
/// `source_file` is `[name_index, value_index]`, a `SourceFile` attribute.
fn write_annotation_attributes(
    out: &mut Vec<u8>,
    pool: &mut PoolBuilder,
    annotations: &[Annotation],
    source_file: &[u16],
) {
    let visible: Vec<&Annotation> = annotations.iter().filter(|a| a.visible).collect();
    let invisible: Vec<&Annotation> = annotations.iter().filter(|a| !a.visible).collect();

    let mut count = 0u16;
    let mut attrs = Vec::new();
    for (name, group) in [
        (RUNTIME_VISIBLE_ANNOTATIONS, &visible),
        (RUNTIME_INVISIBLE_ANNOTATIONS, &invisible),
    ] {
        if group.is_empty() {
            continue;
        }
        let mut data = Vec::new();
        put_u16(&mut data, group.len() as u16);
        for anno in group.iter() {
            write_annotation(&mut data, pool, anno);
        }
        put_u16(&mut attrs, pool.utf8(name));
        put_u32(&mut attrs, data.len() as u32);
        attrs.extend_from_slice(&data);
        count += 1;
    }
    if let [name_index, value_index] = source_file {
        put_u16(&mut attrs, *name_index);
        put_u32(&mut attrs, 2);
        put_u16(&mut attrs, *value_index);
        count += 1;
    }
    put_u16(out, count);
    out.extend_from_slice(&attrs);
}

fn write_annotation(out: &mut Vec<u8>, pool: &mut PoolBuilder, anno: &Annotation) {
    put_u16(out, pool.utf8(&anno.descriptor));
    put_u16(out, anno.elements.len() as u16);
    for (name, value) in &anno.elements {
        put_u16(out, pool.utf8(name));
        write_element_value(out, pool, value);
    }
}

fn write_element_value(out: &mut Vec<u8>, pool: &mut PoolBuilder, value: &ElementValue) {
    match value {
        ElementValue::Byte(v) => tagged(out, b'B', pool.integer(*v as i32)),
        ElementValue::Char(v) => tagged(out, b'C', pool.integer(*v as i32)),
        ElementValue::Short(v) => tagged(out, b'S', pool.integer(*v as i32)),
        ElementValue::Int(v) => tagged(out, b'I', pool.integer(*v)),
        ElementValue::Boolean(v) => tagged(out, b'Z', pool.integer(*v as i32)),
        ElementValue::Long(v) => tagged(out, b'J', pool.long(*v)),
        ElementValue::Float(v) => tagged(out, b'F', pool.float(*v)),
        ElementValue::Double(v) => tagged(out, b'D', pool.double(*v)),
        ElementValue::String(v) => tagged(out, b's', pool.utf8(v)),
        ElementValue::Class(v) => tagged(out, b'c', pool.utf8(v)),
        ElementValue::Enum {
            type_descriptor,
            constant,
        } => {
            out.push(b'e');
            put_u16(out, pool.utf8(type_descriptor));
            put_u16(out, pool.utf8(constant));
        }
        ElementValue::Annotation(anno) => {
            out.push(b'@');
            write_annotation(out, pool, anno);
        }
        ElementValue::Array(values) => {
            out.push(b'[');
            put_u16(out, values.len() as u16);
            for v in values {
                write_element_value(out, pool, v);
            }
        }
    }
}

fn tagged(out: &mut Vec<u8>, tag: u8, index: u16) {
    out.push(tag);
    put_u16(out, index);
}

fn put_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_be_bytes());
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PoolKey {
    Utf8(String),
    Integer(i32),
    Float(u32),
    Long(i64),
    Double(u64),
    Class(String),
}

#[derive(Debug)]
struct PoolBuilder {
    entries: Vec<Vec<u8>>,
    index: HashMap<PoolKey, u16>,
    next: u16,
}

impl Default for PoolBuilder {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            next: 1,
        }
    }
}

impl PoolBuilder {
    fn intern(&mut self, key: PoolKey, encoded: Vec<u8>, wide: bool) -> u16 {
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.next;
        self.entries.push(encoded);
        self.index.insert(key, idx);
        self.next += if wide { 2 } else { 1 };
        idx
    }

    fn utf8(&mut self, s: &str) -> u16 {
        let bytes = encode_modified_utf8(s);
        let mut encoded = vec![1];
        put_u16(&mut encoded, bytes.len() as u16);
        encoded.extend_from_slice(&bytes);
        self.intern(PoolKey::Utf8(s.to_string()), encoded, false)
    }

    fn class(&mut self, internal_name: &str) -> u16 {
        let name_index = self.utf8(internal_name);
        let mut encoded = vec![7];
        put_u16(&mut encoded, name_index);
        self.intern(PoolKey::Class(internal_name.to_string()), encoded, false)
    }

    fn integer(&mut self, v: i32) -> u16 {
        let mut encoded = vec![3];
        encoded.extend_from_slice(&v.to_be_bytes());
        self.intern(PoolKey::Integer(v), encoded, false)
    }

    fn float(&mut self, v: f32) -> u16 {
        let mut encoded = vec![4];
        encoded.extend_from_slice(&v.to_bits().to_be_bytes());
        self.intern(PoolKey::Float(v.to_bits()), encoded, false)
    }

    fn long(&mut self, v: i64) -> u16 {
        let mut encoded = vec![5];
        encoded.extend_from_slice(&v.to_be_bytes());
        self.intern(PoolKey::Long(v), encoded, true)
    }

    fn double(&mut self, v: f64) -> u16 {
        let mut encoded = vec![6];
        encoded.extend_from_slice(&v.to_bits().to_be_bytes());
        self.intern(PoolKey::Double(v.to_bits()), encoded, true)
    }
}

fn encode_modified_utf8(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for unit in s.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | ((unit >> 6) as u8 & 0x1F));
                out.push(0x80 | (unit as u8 & 0x3F));
            }
            _ => {
                out.push(0xE0 | ((unit >> 12) as u8 & 0x0F));
                out.push(0x80 | ((unit >> 6) as u8 & 0x3F));
                out.push(0x80 | (unit as u8 & 0x3F));
            }
        }
    }
    out
}
