//! Structural view of a compiled class.
//!
//! Decoding stops at what authorization analysis needs: the header, the
//! interface list, class-level annotations and per-field annotations. Method
//! bodies and all other attributes are skipped by length, so nothing here
//! requires any other class to be resolvable.

use tracing::trace;

use crate::annotation::{
    parse_annotations, Annotation, RUNTIME_INVISIBLE_ANNOTATIONS, RUNTIME_VISIBLE_ANNOTATIONS,
};
use crate::constant_pool::ConstantPool;
use crate::error::{ClassFileError, Result};
use crate::reader::ByteReader;

pub const CLASS_MAGIC: u32 = 0xCAFE_BABE;
/// JDK 1.1
pub const MIN_MAJOR_VERSION: u16 = 45;
/// JDK 26
pub const MAX_MAJOR_VERSION: u16 = 70;

pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ANNOTATION: u16 = 0x2000;

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub access_flags: u16,
    pub name: String,
    /// Field descriptor, e.g. `Ljava/lang/String;` or `Z`.
    pub descriptor: String,
    pub annotations: Vec<Annotation>,
}

impl FieldInfo {
    pub fn annotation(&self, descriptor: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.descriptor == descriptor)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub access_flags: u16,
    /// Internal (slash-separated) name of this class.
    pub this_class: String,
    /// `None` only for `java/lang/Object` and module-info.
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub annotations: Vec<Annotation>,
    pub fields: Vec<FieldInfo>,
}

impl ClassFile {
    /// Decode a class file.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);

        let magic = reader.u32()?;
        if magic != CLASS_MAGIC {
            return Err(ClassFileError::BadMagic { found: magic });
        }
        let minor_version = reader.u16()?;
        let major_version = reader.u16()?;
        if !(MIN_MAJOR_VERSION..=MAX_MAJOR_VERSION).contains(&major_version) {
            return Err(ClassFileError::UnsupportedVersion {
                major: major_version,
                minor: minor_version,
            });
        }

        let pool = ConstantPool::parse(&mut reader)?;

        let access_flags = reader.u16()?;
        let this_class = pool.class_name(reader.u16()?)?.to_string();
        let super_index = reader.u16()?;
        let super_class = if super_index == 0 {
            None
        } else {
            Some(pool.class_name(super_index)?.to_string())
        };

        let interface_count = reader.u16()?;
        let mut interfaces = Vec::with_capacity(interface_count as usize);
        for _ in 0..interface_count {
            interfaces.push(pool.class_name(reader.u16()?)?.to_string());
        }

        let field_count = reader.u16()?;
        let mut fields = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            let access_flags = reader.u16()?;
            let name = pool.utf8(reader.u16()?)?.to_string();
            let descriptor = pool.utf8(reader.u16()?)?.to_string();
            let annotations = read_attributes(&mut reader, &pool)?;
            fields.push(FieldInfo {
                access_flags,
                name,
                descriptor,
                annotations,
            });
        }

        let method_count = reader.u16()?;
        for _ in 0..method_count {
            // access_flags, name_index, descriptor_index
            reader.skip(6)?;
            read_attributes(&mut reader, &pool)?;
        }

        let annotations = read_attributes(&mut reader, &pool)?;

        trace!(
            class = %this_class,
            constants = pool.len(),
            consumed = reader.position(),
            "decoded class file"
        );

        Ok(Self {
            minor_version,
            major_version,
            access_flags,
            this_class,
            super_class,
            interfaces,
            annotations,
            fields,
        })
    }

    pub fn is_interface(&self) -> bool {
        self.access_flags & ACC_INTERFACE != 0
    }

    pub fn implements(&self, internal_name: &str) -> bool {
        self.interfaces.iter().any(|i| i == internal_name)
    }

    pub fn annotation(&self, descriptor: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.descriptor == descriptor)
    }
}

/// Read an attribute table, decoding annotation attributes and skipping the rest.
fn read_attributes(reader: &mut ByteReader<'_>, pool: &ConstantPool) -> Result<Vec<Annotation>> {
    let count = reader.u16()?;
    let mut annotations = Vec::new();
    for _ in 0..count {
        let name = pool.utf8(reader.u16()?)?;
        let len = reader.u32()? as usize;
        let mut body = reader.sub_reader(len)?;
        match name {
            RUNTIME_VISIBLE_ANNOTATIONS => {
                annotations.extend(parse_annotations(&mut body, pool, true)?)
            }
            RUNTIME_INVISIBLE_ANNOTATIONS => {
                annotations.extend(parse_annotations(&mut body, pool, false)?)
            }
            _ => {}
        }
    }
    Ok(annotations)
}
