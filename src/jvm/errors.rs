use crate::jvm::class_file::{Constant, ConstantIndex};
use crate::jvm::code::Opcode;
use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// Underlying reader or writer failed (this includes running out of input)
    IoError(std::io::Error),

    /// Input doesn't start with `0xCAFEBABE`
    BadMagic([u8; 4]),

    /// Constant pool entry with an unknown tag
    InvalidConstantTag(u8),

    /// Method handle constant with an unknown reference kind
    InvalidHandleKind(u8),

    /// Constant pool count is zero, or an 8-byte constant runs past the declared count
    MalformedConstantPool { count: u16 },

    /// Pool index is zero, past the end of the pool, or on the unusable slot after a long/double
    InvalidIndex(ConstantIndex),

    /// Pool index points at a constant of a different kind
    ConstantTypeMismatch {
        index: ConstantIndex,
        expected: &'static str,
        found: &'static str,
    },

    /// UTF-8 pool entry which isn't valid modified UTF-8
    InvalidModifiedUtf8 { offset: usize },

    /// UTF-8 pool entry with an unpaired surrogate was asked for as a `&str`
    UnpairedSurrogate(ConstantIndex),

    MalformedDescriptor(String),

    /// Type used in a position that requires a method type
    ExpectedMethodType(String),

    /// Opcode is one of the variable-length ones (`tableswitch`, `lookupswitch`, `wide`)
    UnsupportedInstruction { opcode: u8, offset: usize },

    /// Byte doesn't correspond to any known opcode
    InvalidOpcode { opcode: u8, offset: usize },

    /// Instruction constructed with the wrong number of operand bytes
    InvalidOperandCount {
        opcode: Opcode,
        expected: usize,
        found: usize,
    },

    /// Constant pool index doesn't fit in the single operand byte of an instruction like `ldc`
    ConstantIndexTooLarge { opcode: Opcode, index: ConstantIndex },

    ConstantPoolOverflow { constant: Constant, offset: u16 },

    /// A table would have more entries than its length prefix can express
    CountOverflow { what: &'static str, count: usize },

    MethodCodeOverflow(usize),
    MethodCodeMaxStackOverflow(usize),
    MethodCodeMaxLocalsOverflow(usize),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::IoError(err) => write!(f, "I/O error: {}", err),
            Error::BadMagic(magic) => write!(
                f,
                "bad magic {:02X}{:02X}{:02X}{:02X} (expected CAFEBABE)",
                magic[0], magic[1], magic[2], magic[3]
            ),
            Error::InvalidConstantTag(tag) => write!(f, "invalid constant tag {}", tag),
            Error::InvalidHandleKind(kind) => write!(f, "invalid method handle kind {}", kind),
            Error::MalformedConstantPool { count } => {
                write!(f, "malformed constant pool (declared count {})", count)
            }
            Error::InvalidIndex(index) => write!(f, "invalid constant pool index {}", index.0),
            Error::ConstantTypeMismatch {
                index,
                expected,
                found,
            } => write!(
                f,
                "constant #{} is a {} (expected a {})",
                index.0, found, expected
            ),
            Error::InvalidModifiedUtf8 { offset } => {
                write!(f, "invalid modified UTF-8 at byte {}", offset)
            }
            Error::UnpairedSurrogate(index) => {
                write!(f, "constant #{} has an unpaired surrogate", index.0)
            }
            Error::MalformedDescriptor(descriptor) => {
                write!(f, "malformed descriptor {:?}", descriptor)
            }
            Error::ExpectedMethodType(descriptor) => {
                write!(f, "expected a method type, got {:?}", descriptor)
            }
            Error::UnsupportedInstruction { opcode, offset } => write!(
                f,
                "unsupported instruction 0x{:02X} at offset {}",
                opcode, offset
            ),
            Error::InvalidOpcode { opcode, offset } => {
                write!(f, "invalid opcode 0x{:02X} at offset {}", opcode, offset)
            }
            Error::InvalidOperandCount {
                opcode,
                expected,
                found,
            } => write!(
                f,
                "{} takes {} operand bytes, got {}",
                opcode.mnemonic(),
                expected,
                found
            ),
            Error::ConstantIndexTooLarge { opcode, index } => write!(
                f,
                "{} can't refer to constant #{} (only up to #255, see ldc_w)",
                opcode.mnemonic(),
                index.0
            ),
            Error::ConstantPoolOverflow { constant, offset } => write!(
                f,
                "constant pool is full (adding {} at #{})",
                constant.kind_name(),
                offset
            ),
            Error::CountOverflow { what, count } => {
                write!(f, "too many {} ({})", what, count)
            }
            Error::MethodCodeOverflow(len) => write!(f, "method code is too long ({} bytes)", len),
            Error::MethodCodeMaxStackOverflow(depth) => {
                write!(f, "method max stack is too large ({})", depth)
            }
            Error::MethodCodeMaxLocalsOverflow(locals) => {
                write!(f, "method max locals is too large ({})", locals)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::IoError(err)
    }
}
