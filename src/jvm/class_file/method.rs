use crate::jvm::class_file::{
    read_attributes, serialize_list, Attributable, Attribute, Code, ConstantIndex, ConstantPool,
    Deserialize, Serialize, Utf8ConstantIndex,
};
use crate::jvm::{DiagnosticSink, Error, MethodAccessFlags};
use byteorder::{ReadBytesExt, WriteBytesExt};

/// Method declared by a class or interface
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.6
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub access_flags: MethodAccessFlags,
    pub name_index: Utf8ConstantIndex,
    pub descriptor_index: Utf8ConstantIndex,
    pub attributes: Vec<Attribute>,
}

impl Method {
    /// Code attribute, if the method has a body
    pub fn code(&self) -> Option<&Code> {
        self.attributes.iter().find_map(|attribute| match attribute {
            Attribute::Code(code) => Some(code),
            _ => None,
        })
    }

    pub fn code_mut(&mut self) -> Option<&mut Code> {
        self.attributes.iter_mut().find_map(|attribute| match attribute {
            Attribute::Code(code) => Some(code),
            _ => None,
        })
    }

    pub fn read<R: ReadBytesExt>(
        reader: &mut R,
        constants: &ConstantPool,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Method, Error> {
        let access_flags = MethodAccessFlags::deserialize(reader)?;
        let name_index = constants.utf8_index(ConstantIndex::deserialize(reader)?)?;
        let descriptor_index = constants.utf8_index(ConstantIndex::deserialize(reader)?)?;
        let attributes = read_attributes(reader, constants, sink)?;
        Ok(Method {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        })
    }
}

impl Attributable for Method {
    fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    fn attributes_mut(&mut self) -> &mut Vec<Attribute> {
        &mut self.attributes
    }
}

impl Serialize for Method {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<(), Error> {
        self.access_flags.serialize(writer)?;
        self.name_index.serialize(writer)?;
        self.descriptor_index.serialize(writer)?;
        serialize_list("attributes", &self.attributes, writer)?;
        Ok(())
    }
}
