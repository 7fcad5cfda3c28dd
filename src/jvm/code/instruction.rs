use crate::jvm::class_file::{ConstantIndex, Serialize};
use crate::jvm::code::Opcode;
use crate::jvm::{Diagnostic, DiagnosticSink, Error};
use crate::util::{OffsetVec, Width};
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::fmt;

/// A single bytecode instruction, with its operand bytes kept raw
///
/// The number of operand bytes always matches what the opcode table says, and the opcode is never
/// one of the variable-length ones.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Instruction {
    opcode: Opcode,
    operands: Vec<u8>,
}

impl Instruction {
    /// Make an instruction from an opcode and its operand bytes
    ///
    /// Variable-length opcodes are rejected with [`Error::UnsupportedInstruction`] (with offset
    /// `0`, since the instruction isn't placed anywhere yet).
    pub fn new(opcode: Opcode, operands: Vec<u8>) -> Result<Instruction, Error> {
        if !opcode.is_supported() {
            return Err(Error::UnsupportedInstruction {
                opcode: opcode as u8,
                offset: 0,
            });
        }
        let expected = opcode.info().operand_bytes;
        if operands.len() != expected {
            return Err(Error::InvalidOperandCount {
                opcode,
                expected,
                found: operands.len(),
            });
        }
        Ok(Instruction { opcode, operands })
    }

    /// Instruction without operands
    pub fn simple(opcode: Opcode) -> Result<Instruction, Error> {
        Instruction::new(opcode, vec![])
    }

    /// Instruction with a one byte operand (eg. `bipush`, `aload`, `newarray`)
    pub fn with_byte(opcode: Opcode, operand: u8) -> Result<Instruction, Error> {
        Instruction::new(opcode, vec![operand])
    }

    /// Instruction whose only operand is a constant pool index
    ///
    /// The index is written big-endian across all of the operand bytes, which means `ldc` only
    /// accepts indices up to 255 (use `ldc_w` past that).
    pub fn with_index<I: Into<ConstantIndex>>(
        opcode: Opcode,
        index: I,
    ) -> Result<Instruction, Error> {
        let ConstantIndex(index) = index.into();
        match opcode.info().operand_bytes {
            1 if index <= u8::MAX as u16 => Instruction::new(opcode, vec![index as u8]),
            1 => Err(Error::ConstantIndexTooLarge {
                opcode,
                index: ConstantIndex(index),
            }),
            _ => Instruction::new(opcode, index.to_be_bytes().to_vec()),
        }
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn operands(&self) -> &[u8] {
        &self.operands
    }

    /// Number of bytes the instruction takes up in the code array
    pub fn byte_length(&self) -> usize {
        1 + self.operands.len()
    }

    /// Number of operand stack entries consumed
    pub fn stack_in(&self) -> usize {
        self.opcode.info().stack_in
    }

    /// Number of operand stack entries produced
    pub fn stack_out(&self) -> usize {
        self.opcode.info().stack_out
    }

    /// Constant pool index in the operands, for instructions that have one
    pub fn constant_index(&self) -> Option<ConstantIndex> {
        let index_bytes = self.opcode.constant_index_bytes();
        if index_bytes == 0 {
            return None;
        }
        let index = self.operands[..index_bytes]
            .iter()
            .fold(0u16, |index, byte| index << 8 | *byte as u16);
        Some(ConstantIndex(index))
    }

    /// Read one instruction
    ///
    /// For variable-length or unknown opcodes, only the opcode byte is consumed. The problem is
    /// reported to the sink and then returned as an error, since there is no way to know where
    /// the next instruction starts.
    pub fn decode<R: ReadBytesExt>(
        reader: &mut R,
        offset: usize,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Instruction, Error> {
        let byte = reader.read_u8()?;
        let opcode = match Opcode::from_u8(byte) {
            Some(opcode) if opcode.is_supported() => opcode,
            Some(_) => {
                sink.report(Diagnostic::UnsupportedInstruction {
                    opcode: byte,
                    offset,
                });
                return Err(Error::UnsupportedInstruction {
                    opcode: byte,
                    offset,
                });
            }
            None => {
                sink.report(Diagnostic::InvalidOpcode {
                    opcode: byte,
                    offset,
                });
                return Err(Error::InvalidOpcode {
                    opcode: byte,
                    offset,
                });
            }
        };

        let mut operands = vec![0; opcode.info().operand_bytes];
        reader.read_exact(&mut operands)?;
        Ok(Instruction { opcode, operands })
    }
}

/// Decode a whole code array, keyed by program counter
pub fn decode_instructions(
    code: &[u8],
    sink: &mut dyn DiagnosticSink,
) -> Result<OffsetVec<Instruction>, Error> {
    let mut instructions = OffsetVec::new();
    let mut reader = code;
    while !reader.is_empty() {
        let offset = code.len() - reader.len();
        instructions.push(Instruction::decode(&mut reader, offset, sink)?);
    }
    Ok(instructions)
}

impl Width for Instruction {
    fn width(&self) -> usize {
        self.byte_length()
    }
}

impl Serialize for Instruction {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<(), Error> {
        (self.opcode as u8).serialize(writer)?;
        writer.write_all(&self.operands)?;
        Ok(())
    }
}

/// Mnemonic followed by the operands: constant pool indices as `#index`, everything else as
/// `$byte`
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode.mnemonic())?;
        let index_bytes = self.opcode.constant_index_bytes();
        if let Some(index) = self.constant_index() {
            write!(f, " #{}", index.0)?;
        }
        for byte in &self.operands[index_bytes..] {
            write!(f, " ${}", byte)?;
        }
        Ok(())
    }
}
