//! JVM class-file reader
//!
//! Structural decoding of compiled classes into a read-only view: superclass,
//! interfaces, class-level annotations and per-field annotations. Nothing is
//! executed or linked; every fact comes from the bytes of one class.
//!
//! - [`class_file`]: [`ClassFile::parse`] and [`FieldInfo`]
//! - [`annotation`]: [`Annotation`] and typed [`ElementValue`]s
//! - [`source`]: the [`ClassSource`] seam used to fetch bytes by type name
//! - [`writer`]: [`ClassWriter`], a small encoder for test fixtures
//!
//! # Example
//!
//! ```
//! use cmdsec_classfile::{ClassFile, ClassSource, ClassWriter, MapClassSource};
//!
//! let source = MapClassSource::new().with_class(
//!     "com/example/Foo",
//!     ClassWriter::new("com/example/Foo").super_class("com/example/Base").to_bytes(),
//! );
//! let bytes = source.class_bytes("com/example/Foo").unwrap().unwrap();
//! let class = ClassFile::parse(&bytes).unwrap();
//! assert_eq!(class.super_class.as_deref(), Some("com/example/Base"));
//! ```

pub mod annotation;
pub mod class_file;
mod constant_pool;
pub mod error;
mod reader;
pub mod source;
pub mod writer;

pub use annotation::{Annotation, ElementValue};
pub use class_file::{ClassFile, FieldInfo};
pub use error::ClassFileError;
pub use source::{ClassSource, DirectoryClassSource, MapClassSource};
pub use writer::ClassWriter;
