//! Decode errors for class-file parsing.

use thiserror::Error;

/// Structural decode failure. Any of these means the bytes are not a class
/// file this reader understands.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassFileError {
    #[error("bad magic number 0x{found:08X} (expected 0xCAFEBABE)")]
    BadMagic { found: u32 },

    #[error("unsupported class file version {major}.{minor}")]
    UnsupportedVersion { major: u16, minor: u16 },

    #[error("unexpected end of input at offset {offset} (needed {needed} more bytes)")]
    UnexpectedEof { offset: usize, needed: usize },

    #[error("constant pool index {index} is out of range or unusable")]
    BadConstantIndex { index: u16 },

    #[error("constant pool index {index}: expected {expected}")]
    UnexpectedConstant { index: u16, expected: &'static str },

    #[error("unknown constant pool tag {tag} at index {index}")]
    UnknownConstantTag { tag: u8, index: u16 },

    #[error("long/double constant at index {index} runs past the pool end ({count} slots)")]
    WideConstantOverflow { index: u16, count: u16 },

    #[error("annotation element values nested deeper than {limit} levels")]
    NestingTooDeep { limit: usize },

    #[error("unknown annotation element tag '{tag}'")]
    UnknownElementTag { tag: char },

    #[error("invalid modified UTF-8 in constant pool entry {index}")]
    InvalidUtf8 { index: u16 },
}

pub type Result<T> = std::result::Result<T, ClassFileError>;
