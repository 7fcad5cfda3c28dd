//! Incremental construction of class files
//!
//! A [`ClassBuilder`] owns the class being built and its constant pool. Methods are built one at
//! a time: [`ClassBuilder::enter_method`] hands out a [`MethodBuilder`] which mutably borrows the
//! class builder, so no other method can be started (and the class can't be finished) until
//! [`MethodBuilder::leave_method`] has been called.
//!
//! ```
//! use jasm::jvm::builder::ClassBuilder;
//! use jasm::jvm::code::Opcode;
//! use jasm::jvm::{MethodAccessFlags, TypeArenas, TypeTable};
//!
//! let arenas = TypeArenas::new();
//! let types = TypeTable::new(&arenas);
//! let constructor = types.get_method_type(types.get_void(), vec![]).unwrap();
//!
//! let mut class = ClassBuilder::open("Empty").unwrap();
//! let object_init = class
//!     .add_method_ref("java/lang/Object", "<init>", constructor)
//!     .unwrap();
//!
//! let mut init = class
//!     .enter_constructor(constructor, MethodAccessFlags::PUBLIC)
//!     .unwrap();
//! init.make_instruction(Opcode::ALoad0, vec![]).unwrap();
//! init.make_instruction(Opcode::InvokeSpecial, object_init.0.to_be_bytes().to_vec())
//!     .unwrap();
//! init.make_instruction(Opcode::Return, vec![]).unwrap();
//! init.leave_method().unwrap();
//!
//! let bytes = class.build().to_bytes().unwrap();
//! assert_eq!(&bytes[..4], &[0xCA, 0xFE, 0xBA, 0xBE]);
//! ```

mod class_builder;
mod constant_interner;
mod method_builder;

pub use class_builder::*;
pub use constant_interner::*;
pub use method_builder::*;
