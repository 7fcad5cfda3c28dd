//! Bytecode representation
//!
//! Instructions are kept close to their binary form: an [`Opcode`] plus the raw operand bytes.
//! Everything else about an opcode (how many operand bytes follow it, how it changes the operand
//! stack, its mnemonic) comes from a single table, [`OPCODE_TABLE`].
//!
//! The variable-length opcodes (`tableswitch`, `lookupswitch`, and `wide`) aren't supported.
//!
//! [`BasicBlock`]s are what the [builder](crate::jvm::builder) appends instructions to, before
//! they get concatenated into a method's [`Code`](crate::jvm::class_file::Code).

mod basic_block;
mod instruction;
mod opcodes;

pub use basic_block::*;
pub use instruction::*;
pub use opcodes::*;
