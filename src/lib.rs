//! Read, write, and incrementally build JVM class files
//!
//! The interesting parts all live under [`jvm`]:
//!
//!   - [`jvm::class_file`] is an exact model of the binary class file format, with a reader and a
//!     writer that round-trip byte for byte
//!   - [`jvm::code`] holds the table-driven instruction set
//!   - [`jvm::builder`] is what a compiler front end uses to emit a class one method at a time
//!   - [`jvm::TypeTable`] hands out canonical descriptor types
//!
//! Parsing source languages and resolving names is left entirely to the caller.

pub mod jvm;
pub mod util;
