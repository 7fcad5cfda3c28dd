use crate::jvm::class_file::{
    read_bytes, serialize_list, u32_count, ClassConstantIndex, ConstantIndex,
    ConstantPool, Deserialize, Serialize, Utf8ConstantIndex,
};
use crate::jvm::code::{decode_instructions, Instruction};
use crate::jvm::{Diagnostic, DiagnosticSink, Error};
use crate::util::OffsetVec;
use byteorder::{ReadBytesExt, WriteBytesExt};

/// Attributes (used in classes, fields, methods, and on the code attribute)
///
/// Every attribute knows the constant pool index of its own name. Unknown attributes are skipped
/// when reading, so only the kinds below ever show up.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    /// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.10
    SourceFile {
        name_index: Utf8ConstantIndex,
        source_file: Utf8ConstantIndex,
    },

    /// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.2
    ConstantValue {
        name_index: Utf8ConstantIndex,
        value: ConstantIndex,
    },

    Code(Code),

    /// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.12
    LineNumberTable {
        name_index: Utf8ConstantIndex,
        line_numbers: Vec<LineNumber>,
    },
}

impl Attribute {
    pub const SOURCE_FILE: &'static str = "SourceFile";
    pub const CONSTANT_VALUE: &'static str = "ConstantValue";
    pub const CODE: &'static str = "Code";
    pub const LINE_NUMBER_TABLE: &'static str = "LineNumberTable";

    pub fn name_index(&self) -> Utf8ConstantIndex {
        match self {
            Attribute::SourceFile { name_index, .. }
            | Attribute::ConstantValue { name_index, .. }
            | Attribute::LineNumberTable { name_index, .. } => *name_index,
            Attribute::Code(code) => code.name_index,
        }
    }

    /// Length of the attribute body (not counting the 6 bytes of name index and length)
    pub fn length(&self) -> Result<u32, Error> {
        match self {
            Attribute::SourceFile { .. } | Attribute::ConstantValue { .. } => Ok(2),
            Attribute::LineNumberTable { line_numbers, .. } => {
                u32_count("attribute bytes", 2 + 4 * line_numbers.len())
            }
            Attribute::Code(code) => code.length(),
        }
    }

    /// Read one attribute
    ///
    /// Unknown attributes are skipped (and reported) and come back as `None`. Known attributes
    /// are parsed out of exactly the number of bytes declared: running out is an error, while
    /// leftover bytes are reported and then ignored.
    pub fn read<R: ReadBytesExt>(
        reader: &mut R,
        constants: &ConstantPool,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Option<Attribute>, Error> {
        let name_index = constants.utf8_index(ConstantIndex::deserialize(reader)?)?;
        let name = constants.get_utf8_lossy(name_index)?;
        let length = u32::deserialize(reader)?;
        let body = read_bytes(reader, length as usize)?;
        let mut body_reader: &[u8] = &body;

        let attribute = match name.as_ref() {
            Attribute::SOURCE_FILE => Attribute::SourceFile {
                name_index,
                source_file: constants.utf8_index(ConstantIndex::deserialize(&mut body_reader)?)?,
            },
            Attribute::CONSTANT_VALUE => Attribute::ConstantValue {
                name_index,
                value: ConstantIndex::deserialize(&mut body_reader)?,
            },
            Attribute::CODE => {
                Attribute::Code(Code::read_body(&mut body_reader, name_index, constants, sink)?)
            }
            Attribute::LINE_NUMBER_TABLE => {
                let count = u16::deserialize(&mut body_reader)?;
                let mut line_numbers = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    line_numbers.push(LineNumber::deserialize(&mut body_reader)?);
                }
                Attribute::LineNumberTable {
                    name_index,
                    line_numbers,
                }
            }
            _ => {
                sink.report(Diagnostic::UnknownAttribute {
                    name: name.to_string(),
                    length,
                });
                return Ok(None);
            }
        };

        if !body_reader.is_empty() {
            sink.report(Diagnostic::TrailingAttributeBytes {
                name: name.into_owned(),
                declared: length,
                consumed: length - body_reader.len() as u32,
            });
        }
        Ok(Some(attribute))
    }
}

impl Serialize for Attribute {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<(), Error> {
        self.name_index().serialize(writer)?;
        self.length()?.serialize(writer)?;
        match self {
            Attribute::SourceFile { source_file, .. } => source_file.serialize(writer)?,
            Attribute::ConstantValue { value, .. } => value.serialize(writer)?,
            Attribute::LineNumberTable { line_numbers, .. } => {
                serialize_list("line numbers", line_numbers, writer)?
            }
            Attribute::Code(code) => code.serialize_body(writer)?,
        }
        Ok(())
    }
}

/// Read an attribute count followed by that many attributes, dropping unknown ones
pub fn read_attributes<R: ReadBytesExt>(
    reader: &mut R,
    constants: &ConstantPool,
    sink: &mut dyn DiagnosticSink,
) -> Result<Vec<Attribute>, Error> {
    let count = u16::deserialize(reader)?;
    let mut attributes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        if let Some(attribute) = Attribute::read(reader, constants, sink)? {
            attributes.push(attribute);
        }
    }
    Ok(attributes)
}

/// Sum of the full serialized sizes (header included) of a list of attributes
fn attributes_length(attributes: &[Attribute]) -> Result<usize, Error> {
    let mut total: usize = 0;
    for attribute in attributes {
        total += 6 + attribute.length()? as usize;
    }
    Ok(total)
}

/// Things that own a list of attributes
pub trait Attributable {
    fn attributes(&self) -> &[Attribute];
    fn attributes_mut(&mut self) -> &mut Vec<Attribute>;

    fn add_attribute(&mut self, attribute: Attribute) {
        self.attributes_mut().push(attribute);
    }

    /// First attribute whose name is at this index
    fn find_attribute(&self, name_index: Utf8ConstantIndex) -> Option<&Attribute> {
        self.attributes()
            .iter()
            .find(|attribute| attribute.name_index() == name_index)
    }

    /// First attribute with this name
    fn find_attribute_named(&self, constants: &ConstantPool, name: &str) -> Option<&Attribute> {
        self.attributes()
            .iter()
            .find(|attribute| constants.get_utf8(attribute.name_index()).ok() == Some(name))
    }

    /// Remove every attribute whose name is at this index
    fn remove_attributes(&mut self, name_index: Utf8ConstantIndex) {
        self.attributes_mut()
            .retain(|attribute| attribute.name_index() != name_index);
    }
}

/// Method body
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.3
#[derive(Debug, Clone, PartialEq)]
pub struct Code {
    pub name_index: Utf8ConstantIndex,
    pub max_stack: u16,
    pub max_locals: u16,

    /// Instructions, keyed by their program counter
    pub instructions: OffsetVec<Instruction>,
    pub exception_table: Vec<ExceptionHandler>,
    pub attributes: Vec<Attribute>,
}

impl Code {
    /// Largest code array the JVM accepts
    pub const MAX_CODE_LENGTH: usize = 65535;

    pub fn new(name_index: Utf8ConstantIndex) -> Code {
        Code {
            name_index,
            max_stack: 0,
            max_locals: 0,
            instructions: OffsetVec::new(),
            exception_table: vec![],
            attributes: vec![],
        }
    }

    /// Size of the code array in bytes
    pub fn code_length(&self) -> usize {
        self.instructions.total_width()
    }

    /// Attribute body length: `12 + 8 * exception_count + code_length + nested attributes`
    pub fn length(&self) -> Result<u32, Error> {
        let code_length = self.code_length();
        if code_length > Code::MAX_CODE_LENGTH {
            return Err(Error::MethodCodeOverflow(code_length));
        }
        let length = 12
            + 8 * self.exception_table.len()
            + code_length
            + attributes_length(&self.attributes)?;
        u32_count("attribute bytes", length)
    }

    fn read_body(
        reader: &mut &[u8],
        name_index: Utf8ConstantIndex,
        constants: &ConstantPool,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Code, Error> {
        let max_stack = u16::deserialize(reader)?;
        let max_locals = u16::deserialize(reader)?;
        let code_length = u32::deserialize(reader)?;
        let code_array = read_bytes(reader, code_length as usize)?;
        let instructions = decode_instructions(&code_array, sink)?;

        let exception_count = u16::deserialize(reader)?;
        let mut exception_table = Vec::with_capacity(exception_count as usize);
        for _ in 0..exception_count {
            exception_table.push(ExceptionHandler::deserialize(reader)?);
        }
        let attributes = read_attributes(reader, constants, sink)?;

        Ok(Code {
            name_index,
            max_stack,
            max_locals,
            instructions,
            exception_table,
            attributes,
        })
    }

    fn serialize_body<W: WriteBytesExt>(&self, writer: &mut W) -> Result<(), Error> {
        self.max_stack.serialize(writer)?;
        self.max_locals.serialize(writer)?;
        (self.code_length() as u32).serialize(writer)?;
        for (_, _, instruction) in &self.instructions {
            instruction.serialize(writer)?;
        }
        serialize_list("exception handlers", &self.exception_table, writer)?;
        serialize_list("attributes", &self.attributes, writer)?;
        Ok(())
    }
}

impl Attributable for Code {
    fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    fn attributes_mut(&mut self) -> &mut Vec<Attribute> {
        &mut self.attributes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionHandler {
    /// Start of exception handler range (inclusive)
    pub start_pc: u16,

    /// End of exception handler range (exclusive)
    pub end_pc: u16,

    /// Start of the exception handler
    pub handler_pc: u16,

    /// Class of exceptions caught (`None` catches everything)
    pub catch_type: Option<ClassConstantIndex>,
}

impl Serialize for ExceptionHandler {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<(), Error> {
        self.start_pc.serialize(writer)?;
        self.end_pc.serialize(writer)?;
        self.handler_pc.serialize(writer)?;
        match self.catch_type {
            Some(catch_type) => catch_type.serialize(writer)?,
            None => 0u16.serialize(writer)?,
        }
        Ok(())
    }
}

impl Deserialize for ExceptionHandler {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        let start_pc = u16::deserialize(reader)?;
        let end_pc = u16::deserialize(reader)?;
        let handler_pc = u16::deserialize(reader)?;
        let catch_type = match u16::deserialize(reader)? {
            0 => None,
            index => Some(ClassConstantIndex(ConstantIndex(index))),
        };
        Ok(ExceptionHandler {
            start_pc,
            end_pc,
            handler_pc,
            catch_type,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineNumber {
    pub start_pc: u16,
    pub line_number: u16,
}

impl Serialize for LineNumber {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<(), Error> {
        self.start_pc.serialize(writer)?;
        self.line_number.serialize(writer)?;
        Ok(())
    }
}

impl Deserialize for LineNumber {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        Ok(LineNumber {
            start_pc: u16::deserialize(reader)?,
            line_number: u16::deserialize(reader)?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::class_file::Constant;
    use crate::jvm::code::Opcode;

    fn pool_with(names: &[&str]) -> (ConstantPool, Vec<Utf8ConstantIndex>) {
        let mut pool = ConstantPool::new();
        let indices = names
            .iter()
            .map(|name| Utf8ConstantIndex(pool.intern(Constant::Utf8(name.to_string())).unwrap()))
            .collect();
        (pool, indices)
    }

    fn sample_code(name_index: Utf8ConstantIndex, lines: Utf8ConstantIndex) -> Code {
        let mut code = Code::new(name_index);
        code.max_stack = 1;
        code.max_locals = 1;
        code.instructions.push(Instruction::simple(Opcode::ALoad0).unwrap());
        code.instructions.push(Instruction::simple(Opcode::AReturn).unwrap());
        code.exception_table.push(ExceptionHandler {
            start_pc: 0,
            end_pc: 1,
            handler_pc: 1,
            catch_type: None,
        });
        code.attributes.push(Attribute::LineNumberTable {
            name_index: lines,
            line_numbers: vec![LineNumber {
                start_pc: 0,
                line_number: 7,
            }],
        });
        code
    }

    #[test]
    fn code_length_includes_nested_headers() {
        let (_, names) = pool_with(&["Code", "LineNumberTable"]);
        let code = sample_code(names[0], names[1]);
        // 12 fixed + 8 for the handler + 2 bytes of code + (6 + 6) for the line number table
        assert_eq!(code.length().unwrap(), 34);
    }

    #[test]
    fn read_write_code() {
        let (pool, names) = pool_with(&["Code", "LineNumberTable"]);
        let attribute = Attribute::Code(sample_code(names[0], names[1]));

        let mut bytes = vec![];
        attribute.serialize(&mut bytes).unwrap();
        assert_eq!(bytes.len(), 6 + 34);

        let mut diagnostics: Vec<Diagnostic> = vec![];
        let read = Attribute::read(&mut bytes.as_slice(), &pool, &mut diagnostics).unwrap();
        assert_eq!(read, Some(attribute));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn unknown_attributes_are_skipped() {
        let (pool, names) = pool_with(&["Deprecated", "SourceFile", "Example.java"]);
        let mut bytes = vec![];
        2u16.serialize(&mut bytes).unwrap();
        names[0].serialize(&mut bytes).unwrap();
        3u32.serialize(&mut bytes).unwrap();
        bytes.extend_from_slice(&[0xDE, 0xAD, 0x00]);
        Attribute::SourceFile {
            name_index: names[1],
            source_file: names[2],
        }
        .serialize(&mut bytes)
        .unwrap();

        let mut diagnostics: Vec<Diagnostic> = vec![];
        let attributes = read_attributes(&mut bytes.as_slice(), &pool, &mut diagnostics).unwrap();
        assert_eq!(
            attributes,
            vec![Attribute::SourceFile {
                name_index: names[1],
                source_file: names[2],
            }]
        );
        assert_eq!(
            diagnostics,
            vec![Diagnostic::UnknownAttribute {
                name: String::from("Deprecated"),
                length: 3
            }]
        );
    }

    #[test]
    fn trailing_bytes_are_reported() {
        let (pool, names) = pool_with(&["ConstantValue"]);
        let mut bytes = vec![];
        names[0].serialize(&mut bytes).unwrap();
        4u32.serialize(&mut bytes).unwrap();
        bytes.extend_from_slice(&[0x00, 0x01, 0xFF, 0xFF]);

        let mut diagnostics: Vec<Diagnostic> = vec![];
        let read = Attribute::read(&mut bytes.as_slice(), &pool, &mut diagnostics).unwrap();
        assert_eq!(
            read,
            Some(Attribute::ConstantValue {
                name_index: names[0],
                value: ConstantIndex(1),
            })
        );
        assert_eq!(
            diagnostics,
            vec![Diagnostic::TrailingAttributeBytes {
                name: String::from("ConstantValue"),
                declared: 4,
                consumed: 2,
            }]
        );
    }

    #[test]
    fn short_body_is_an_error() {
        let (pool, names) = pool_with(&["SourceFile"]);
        let mut bytes = vec![];
        names[0].serialize(&mut bytes).unwrap();
        1u32.serialize(&mut bytes).unwrap();
        bytes.push(0x00);

        let mut diagnostics: Vec<Diagnostic> = vec![];
        assert!(matches!(
            Attribute::read(&mut bytes.as_slice(), &pool, &mut diagnostics),
            Err(Error::IoError(_))
        ));
    }

    #[test]
    fn find_and_remove() {
        let (pool, names) = pool_with(&["Code", "LineNumberTable"]);
        let mut code = sample_code(names[0], names[1]);
        assert!(code.find_attribute(names[1]).is_some());
        assert!(code.find_attribute_named(&pool, "LineNumberTable").is_some());
        assert!(code.find_attribute_named(&pool, "StackMapTable").is_none());
        code.remove_attributes(names[1]);
        assert!(code.attributes().is_empty());
    }
}
