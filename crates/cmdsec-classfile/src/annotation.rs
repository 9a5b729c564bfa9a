//! `RuntimeVisibleAnnotations` / `RuntimeInvisibleAnnotations` decoding.

use crate::constant_pool::ConstantPool;
use crate::error::{ClassFileError, Result};
use crate::reader::ByteReader;

pub const RUNTIME_VISIBLE_ANNOTATIONS: &str = "RuntimeVisibleAnnotations";
pub const RUNTIME_INVISIBLE_ANNOTATIONS: &str = "RuntimeInvisibleAnnotations";

/// Deepest array/annotation nesting accepted inside one element value.
pub const MAX_ELEMENT_NESTING: usize = 64;

/// One annotation occurrence with its element values in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Field descriptor of the annotation type, e.g. `Lorg/example/Anno;`.
    pub descriptor: String,
    /// Retained at runtime (`RuntimeVisibleAnnotations`).
    pub visible: bool,
    pub elements: Vec<(String, ElementValue)>,
}

impl Annotation {
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
            visible: true,
            elements: Vec::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: ElementValue) -> Self {
        self.elements.push((name.into(), value));
        self
    }

    /// First element with the given name.
    pub fn get(&self, name: &str) -> Option<&ElementValue> {
        self.elements
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// String values of an element that may be a single string or an array of them.
    pub fn strings(&self, name: &str) -> Vec<String> {
        self.get(name).map(ElementValue::strings).unwrap_or_default()
    }

    fn parse(reader: &mut ByteReader<'_>, pool: &ConstantPool, visible: bool, depth: usize) -> Result<Self> {
        let descriptor = pool.utf8(reader.u16()?)?.to_string();
        let pairs = reader.u16()?;
        let mut elements = Vec::with_capacity(pairs as usize);
        for _ in 0..pairs {
            let name = pool.utf8(reader.u16()?)?.to_string();
            let value = ElementValue::parse(reader, pool, visible, depth)?;
            elements.push((name, value));
        }
        Ok(Self {
            descriptor,
            visible,
            elements,
        })
    }
}

/// Decode the body of an annotations attribute.
pub(crate) fn parse_annotations(
    reader: &mut ByteReader<'_>,
    pool: &ConstantPool,
    visible: bool,
) -> Result<Vec<Annotation>> {
    let count = reader.u16()?;
    (0..count)
        .map(|_| Annotation::parse(reader, pool, visible, 0))
        .collect()
}

fn nested(depth: usize) -> Result<usize> {
    if depth >= MAX_ELEMENT_NESTING {
        return Err(ClassFileError::NestingTooDeep {
            limit: MAX_ELEMENT_NESTING,
        });
    }
    Ok(depth + 1)
}

/// A typed annotation element value.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Byte(i8),
    Char(char),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    String(String),
    Enum {
        type_descriptor: String,
        constant: String,
    },
    /// Return descriptor of a class literal, e.g. `Lcom/example/Foo;` or `V`.
    Class(String),
    Annotation(Annotation),
    Array(Vec<ElementValue>),
}

impl ElementValue {
    fn parse(reader: &mut ByteReader<'_>, pool: &ConstantPool, visible: bool, depth: usize) -> Result<Self> {
        let tag = reader.u8()? as char;
        let value = match tag {
            'B' => ElementValue::Byte(pool.integer(reader.u16()?)? as i8),
            'C' => {
                let code = pool.integer(reader.u16()?)? as u32;
                ElementValue::Char(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
            }
            'S' => ElementValue::Short(pool.integer(reader.u16()?)? as i16),
            'I' => ElementValue::Int(pool.integer(reader.u16()?)?),
            'Z' => ElementValue::Boolean(pool.integer(reader.u16()?)? != 0),
            'J' => ElementValue::Long(pool.long(reader.u16()?)?),
            'F' => ElementValue::Float(pool.float(reader.u16()?)?),
            'D' => ElementValue::Double(pool.double(reader.u16()?)?),
            's' => ElementValue::String(pool.utf8(reader.u16()?)?.to_string()),
            'e' => {
                let type_descriptor = pool.utf8(reader.u16()?)?.to_string();
                let constant = pool.utf8(reader.u16()?)?.to_string();
                ElementValue::Enum {
                    type_descriptor,
                    constant,
                }
            }
            'c' => ElementValue::Class(pool.utf8(reader.u16()?)?.to_string()),
            '@' => ElementValue::Annotation(Annotation::parse(reader, pool, visible, nested(depth)?)?),
            '[' => {
                let depth = nested(depth)?;
                let count = reader.u16()?;
                let values = (0..count)
                    .map(|_| ElementValue::parse(reader, pool, visible, depth))
                    .collect::<Result<Vec<_>>>()?;
                ElementValue::Array(values)
            }
            other => return Err(ClassFileError::UnknownElementTag { tag: other }),
        };
        Ok(value)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ElementValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ElementValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_annotation(&self) -> Option<&Annotation> {
        match self {
            ElementValue::Annotation(a) => Some(a),
            _ => None,
        }
    }

    /// `(type_descriptor, constant)` of an enum constant.
    pub fn as_enum(&self) -> Option<(&str, &str)> {
        match self {
            ElementValue::Enum {
                type_descriptor,
                constant,
            } => Some((type_descriptor, constant)),
            _ => None,
        }
    }

    /// Internal name of a class literal that names an object type.
    pub fn as_class_internal_name(&self) -> Option<&str> {
        match self {
            ElementValue::Class(desc) => desc.strip_prefix('L').and_then(|d| d.strip_suffix(';')),
            _ => None,
        }
    }

    /// Elements of an array value; a scalar is treated as a one-element array.
    pub fn items(&self) -> Vec<&ElementValue> {
        match self {
            ElementValue::Array(values) => values.iter().collect(),
            other => vec![other],
        }
    }

    /// Every string among [`items`](Self::items).
    pub fn strings(&self) -> Vec<String> {
        self.items()
            .into_iter()
            .filter_map(ElementValue::as_str)
            .map(str::to_string)
            .collect()
    }
}
