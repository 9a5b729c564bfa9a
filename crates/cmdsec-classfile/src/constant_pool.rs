//! Constant pool decoding.
//!
//! Only the entry kinds that annotation and class-header decoding can refer
//! to are kept with their payload; every other tag is validated and skipped
//! so that class files from any supported compiler version still parse.

use crate::error::{ClassFileError, Result};
use crate::reader::ByteReader;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Constant {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class { name_index: u16 },
    /// Any other entry; payload is not needed for structural analysis.
    Other,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ConstantPool {
    // Slot 0 is unused; the second slot of a long/double is None.
    entries: Vec<Option<Constant>>,
}

impl ConstantPool {
    pub(crate) fn parse(reader: &mut ByteReader<'_>) -> Result<Self> {
        let count = reader.u16()?;
        let mut entries: Vec<Option<Constant>> = Vec::with_capacity(count as usize);
        entries.push(None);
        let mut index: u16 = 1;
        while index < count {
            let tag = reader.u8()?;
            let constant = match tag {
                1 => {
                    let len = reader.u16()? as usize;
                    let raw = reader.bytes(len)?;
                    Constant::Utf8(decode_modified_utf8(raw, index)?)
                }
                3 => Constant::Integer(reader.u32()? as i32),
                4 => Constant::Float(f32::from_bits(reader.u32()?)),
                5 => Constant::Long(reader.u64()? as i64),
                6 => Constant::Double(f64::from_bits(reader.u64()?)),
                7 => Constant::Class {
                    name_index: reader.u16()?,
                },
                // Field/Method/InterfaceMethod refs, NameAndType, Dynamic, InvokeDynamic
                9 | 10 | 11 | 12 | 17 | 18 => {
                    reader.skip(4)?;
                    Constant::Other
                }
                15 => {
                    reader.skip(3)?;
                    Constant::Other
                }
                // String, MethodType, Module, Package
                8 | 16 | 19 | 20 => {
                    reader.skip(2)?;
                    Constant::Other
                }
                _ => return Err(ClassFileError::UnknownConstantTag { tag, index }),
            };
            // A long/double also occupies the following slot, which must exist.
            let slots: u32 = match constant {
                Constant::Long(_) | Constant::Double(_) => 2,
                _ => 1,
            };
            if u32::from(index) + slots > u32::from(count) {
                return Err(ClassFileError::WideConstantOverflow { index, count });
            }
            entries.push(Some(constant));
            if slots == 2 {
                entries.push(None);
            }
            index += slots as u16;
        }
        Ok(Self { entries })
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn get(&self, index: u16) -> Result<&Constant> {
        self.entries
            .get(index as usize)
            .and_then(Option::as_ref)
            .ok_or(ClassFileError::BadConstantIndex { index })
    }

    pub(crate) fn utf8(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            Constant::Utf8(s) => Ok(s),
            _ => Err(ClassFileError::UnexpectedConstant {
                index,
                expected: "Utf8",
            }),
        }
    }

    /// Internal name referenced by a `CONSTANT_Class` entry.
    pub(crate) fn class_name(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            Constant::Class { name_index } => self.utf8(*name_index),
            _ => Err(ClassFileError::UnexpectedConstant {
                index,
                expected: "Class",
            }),
        }
    }

    pub(crate) fn integer(&self, index: u16) -> Result<i32> {
        match self.get(index)? {
            Constant::Integer(v) => Ok(*v),
            _ => Err(ClassFileError::UnexpectedConstant {
                index,
                expected: "Integer",
            }),
        }
    }

    pub(crate) fn long(&self, index: u16) -> Result<i64> {
        match self.get(index)? {
            Constant::Long(v) => Ok(*v),
            _ => Err(ClassFileError::UnexpectedConstant {
                index,
                expected: "Long",
            }),
        }
    }

    pub(crate) fn float(&self, index: u16) -> Result<f32> {
        match self.get(index)? {
            Constant::Float(v) => Ok(*v),
            _ => Err(ClassFileError::UnexpectedConstant {
                index,
                expected: "Float",
            }),
        }
    }

    pub(crate) fn double(&self, index: u16) -> Result<f64> {
        match self.get(index)? {
            Constant::Double(v) => Ok(*v),
            _ => Err(ClassFileError::UnexpectedConstant {
                index,
                expected: "Double",
            }),
        }
    }
}

/// Decode the JVM's modified UTF-8: NUL is encoded as `C0 80` and
/// supplementary characters as surrogate pairs of 3-byte sequences.
pub(crate) fn decode_modified_utf8(raw: &[u8], index: u16) -> Result<String> {
    if raw.iter().all(|b| (0x01..0x80).contains(b)) {
        // Fast path: plain ASCII, which is nearly every class and descriptor name.
        return Ok(raw.iter().map(|&b| b as char).collect());
    }
    let bad = || ClassFileError::InvalidUtf8 { index };
    let mut units: Vec<u16> = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let b0 = raw[i];
        if b0 & 0x80 == 0 {
            if b0 == 0 {
                return Err(bad());
            }
            units.push(b0 as u16);
            i += 1;
        } else if b0 & 0xE0 == 0xC0 {
            let b1 = *raw.get(i + 1).ok_or_else(bad)?;
            if b1 & 0xC0 != 0x80 {
                return Err(bad());
            }
            units.push((((b0 & 0x1F) as u16) << 6) | (b1 & 0x3F) as u16);
            i += 2;
        } else if b0 & 0xF0 == 0xE0 {
            let b1 = *raw.get(i + 1).ok_or_else(bad)?;
            let b2 = *raw.get(i + 2).ok_or_else(bad)?;
            if b1 & 0xC0 != 0x80 || b2 & 0xC0 != 0x80 {
                return Err(bad());
            }
            units.push(
                (((b0 & 0x0F) as u16) << 12) | (((b1 & 0x3F) as u16) << 6) | (b2 & 0x3F) as u16,
            );
            i += 3;
        } else {
            return Err(bad());
        }
    }
    String::from_utf16(&units).map_err(|_| bad())
}
