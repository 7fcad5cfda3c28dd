use crate::jvm::class_file::{
    read_attributes, serialize_list, Attributable, Attribute, ConstantIndex, ConstantPool,
    Deserialize, Serialize, Utf8ConstantIndex,
};
use crate::jvm::{DiagnosticSink, Error, FieldAccessFlags};
use byteorder::{ReadBytesExt, WriteBytesExt};

/// Field declared by a class or interface
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.5
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub access_flags: FieldAccessFlags,
    pub name_index: Utf8ConstantIndex,
    pub descriptor_index: Utf8ConstantIndex,
    pub attributes: Vec<Attribute>,
}

impl Field {
    pub fn read<R: ReadBytesExt>(
        reader: &mut R,
        constants: &ConstantPool,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Field, Error> {
        let access_flags = FieldAccessFlags::deserialize(reader)?;
        let name_index = constants.utf8_index(ConstantIndex::deserialize(reader)?)?;
        let descriptor_index = constants.utf8_index(ConstantIndex::deserialize(reader)?)?;
        let attributes = read_attributes(reader, constants, sink)?;
        Ok(Field {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        })
    }
}

impl Attributable for Field {
    fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    fn attributes_mut(&mut self) -> &mut Vec<Attribute> {
        &mut self.attributes
    }
}

impl Serialize for Field {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<(), Error> {
        self.access_flags.serialize(writer)?;
        self.name_index.serialize(writer)?;
        self.descriptor_index.serialize(writer)?;
        serialize_list("attributes", &self.attributes, writer)?;
        Ok(())
    }
}
