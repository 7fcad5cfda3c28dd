use crate::jvm::class_file::{
    read_attributes, serialize_list, Attributable, Attribute, ClassConstantIndex, ConstantIndex,
    ConstantPool, Deserialize, Field, Method, Serialize, Version,
};
use crate::jvm::{ClassAccessFlags, DiagnosticSink, Error};
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::fs;
use std::path::Path;

/// Representation of the [`class` file format of the JVM][0]
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html
#[derive(Debug, Clone, PartialEq)]
pub struct ClassFile {
    pub version: Version,
    pub constants: ConstantPool,
    pub access_flags: ClassAccessFlags,
    pub this_class: ClassConstantIndex,

    /// Only `java/lang/Object` has no superclass
    pub super_class: Option<ClassConstantIndex>,
    pub interfaces: Vec<ClassConstantIndex>,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
    pub attributes: Vec<Attribute>,
}

impl ClassFile {
    /// Magic header bytes that go at the front of the serialized class file
    pub const MAGIC: [u8; 4] = [0xCA, 0xFE, 0xBA, 0xBE];

    /// Binary name of the class
    pub fn name(&self) -> Result<&str, Error> {
        self.constants.get_class_name(self.this_class)
    }

    /// Binary name of the superclass
    pub fn super_name(&self) -> Result<Option<&str>, Error> {
        self.super_class
            .map(|super_class| self.constants.get_class_name(super_class))
            .transpose()
    }

    /// Read a class file
    ///
    /// Sections are read in file order. Any error discards everything read so far.
    pub fn read<R: ReadBytesExt>(
        reader: &mut R,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<ClassFile, Error> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != ClassFile::MAGIC {
            return Err(Error::BadMagic(magic));
        }

        let version = Version::deserialize(reader)?;
        let constants = ConstantPool::read(reader)?;
        let access_flags = ClassAccessFlags::deserialize(reader)?;
        let this_class = constants.class_index(ConstantIndex::deserialize(reader)?)?;
        let super_class = match ConstantIndex::deserialize(reader)? {
            ConstantIndex(0) => None,
            index => Some(constants.class_index(index)?),
        };

        let interface_count = u16::deserialize(reader)?;
        let mut interfaces = Vec::with_capacity(interface_count as usize);
        for _ in 0..interface_count {
            interfaces.push(constants.class_index(ConstantIndex::deserialize(reader)?)?);
        }

        let field_count = u16::deserialize(reader)?;
        let mut fields = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            fields.push(Field::read(reader, &constants, sink)?);
        }

        let method_count = u16::deserialize(reader)?;
        let mut methods = Vec::with_capacity(method_count as usize);
        for _ in 0..method_count {
            methods.push(Method::read(reader, &constants, sink)?);
        }

        let attributes = read_attributes(reader, &constants, sink)?;

        let class_file = ClassFile {
            version,
            constants,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        };
        log::debug!(
            "read class {} (version {}, {} fields, {} methods)",
            class_file.name().unwrap_or("?"),
            class_file.version,
            class_file.fields.len(),
            class_file.methods.len()
        );
        Ok(class_file)
    }

    pub fn from_bytes(bytes: &[u8], sink: &mut dyn DiagnosticSink) -> Result<ClassFile, Error> {
        let mut reader = bytes;
        ClassFile::read(&mut reader, sink)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut bytes = vec![];
        self.serialize(&mut bytes)?;
        Ok(bytes)
    }

    /// Save the class file to disk
    ///
    /// The class is serialized in memory first, so nothing gets written if that fails.
    pub fn save_to_path<P: AsRef<Path>>(
        &self,
        path: P,
        create_missing_directories: bool,
    ) -> Result<(), Error> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        if create_missing_directories {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, bytes)?;
        Ok(())
    }
}

impl Attributable for ClassFile {
    fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    fn attributes_mut(&mut self) -> &mut Vec<Attribute> {
        &mut self.attributes
    }
}

impl Serialize for ClassFile {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<(), Error> {
        writer.write_all(&ClassFile::MAGIC)?;
        self.version.serialize(writer)?;
        self.constants.serialize(writer)?;
        self.access_flags.serialize(writer)?;
        self.this_class.serialize(writer)?;
        match self.super_class {
            Some(super_class) => super_class.serialize(writer)?,
            None => 0u16.serialize(writer)?,
        }
        serialize_list("interfaces", &self.interfaces, writer)?;
        serialize_list("fields", &self.fields, writer)?;
        serialize_list("methods", &self.methods, writer)?;
        serialize_list("attributes", &self.attributes, writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::class_file::{Constant, Utf8ConstantIndex};
    use crate::jvm::Diagnostic;

    fn minimal_class() -> ClassFile {
        let mut constants = ConstantPool::new();
        let name = constants
            .intern(Constant::Utf8(String::from("Empty")))
            .unwrap();
        let name = Utf8ConstantIndex(name);
        let this_class = ClassConstantIndex(constants.intern(Constant::Class(name)).unwrap());
        ClassFile {
            version: Version::JAVA8,
            constants,
            access_flags: ClassAccessFlags::PUBLIC,
            this_class,
            super_class: None,
            interfaces: vec![],
            fields: vec![],
            methods: vec![],
            attributes: vec![],
        }
    }

    #[test]
    fn exact_layout() {
        let bytes = minimal_class().to_bytes().unwrap();
        #[rustfmt::skip]
        let expected: Vec<u8> = vec![
            0xCA, 0xFE, 0xBA, 0xBE, // magic
            0, 0, 0, 52,            // minor, major
            0, 3,                   // constant pool count
            1, 0, 5, b'E', b'm', b'p', b't', b'y',
            7, 0, 1,
            0, 1,                   // access flags
            0, 2,                   // this class
            0, 0,                   // super class
            0, 0, 0, 0, 0, 0, 0, 0, // interfaces, fields, methods, attributes
        ];
        assert_eq!(bytes, expected);

        let mut diagnostics: Vec<Diagnostic> = vec![];
        let read = ClassFile::from_bytes(&bytes, &mut diagnostics).unwrap();
        assert_eq!(read, minimal_class());
        assert_eq!(read.name().unwrap(), "Empty");
        assert_eq!(read.super_name().unwrap(), None);
    }

    #[test]
    fn bad_magic() {
        let mut bytes = minimal_class().to_bytes().unwrap();
        bytes[3] = 0xBF;
        let mut diagnostics: Vec<Diagnostic> = vec![];
        assert!(matches!(
            ClassFile::from_bytes(&bytes, &mut diagnostics),
            Err(Error::BadMagic([0xCA, 0xFE, 0xBA, 0xBF]))
        ));
    }

    #[test]
    fn truncated_input() {
        let bytes = minimal_class().to_bytes().unwrap();
        let mut diagnostics: Vec<Diagnostic> = vec![];
        for length in [0, 3, 9, 20, bytes.len() - 1] {
            assert!(
                matches!(
                    ClassFile::from_bytes(&bytes[..length], &mut diagnostics),
                    Err(Error::IoError(_))
                ),
                "reading {} bytes should fail",
                length
            );
        }
    }

    #[test]
    fn this_class_must_be_a_class() {
        let mut bytes = minimal_class().to_bytes().unwrap();
        // point `this_class` at the UTF-8 entry
        bytes[24] = 1;
        let mut diagnostics: Vec<Diagnostic> = vec![];
        assert!(matches!(
            ClassFile::from_bytes(&bytes, &mut diagnostics),
            Err(Error::ConstantTypeMismatch {
                expected: "Class",
                found: "Utf8",
                ..
            })
        ));
    }
}
