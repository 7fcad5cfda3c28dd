//! JVM class files: the binary format, the instruction set, descriptors, and a builder

mod access_flags;
pub mod builder;
pub mod class_file;
pub mod code;
mod descriptors;
mod diagnostics;
mod errors;
mod type_table;

pub use access_flags::*;
pub use descriptors::*;
pub use diagnostics::*;
pub use errors::*;
pub use type_table::*;
