use crate::jvm::class_file::{read_bytes, u16_count, Deserialize, Serialize};
use crate::jvm::Error;
use crate::util::Width;
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::hash::{Hash, Hasher};

/// Constants as in the constant pool
///
/// Constants refer to each other by index into the same pool. Equality (and hashing) is on the
/// payload exactly as stored, so two `Class` constants are equal when their name indices are,
/// and floating point literals are compared bit for bit.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.4
#[derive(Debug, Clone)]
pub enum Constant {
    /// Constant UTF-8 encoded raw string value
    ///
    /// Despite the name, the encoding is not quite UTF-8 (the encoding of the
    /// null character `\u{0000}` and the encoding of supplementary characters
    /// is different).
    Utf8(String),

    /// UTF-8 constant holding a string with an unpaired surrogate
    ///
    /// Java strings are sequences of UTF-16 code units, and not all of them are valid Unicode
    /// (`"\uD800"` is a legal Java literal). Those can't be a Rust `String`, so the code units are
    /// kept as is. It has the same tag as [`Constant::Utf8`].
    Utf16(Vec<u16>),

    /// Constant primitive of type `int`
    Integer(i32),

    /// Constant primitive of type `float`
    Float(f32),

    /// Constant primitive of type `long`
    Long(i64),

    /// Constant primitive of type `double`
    Double(f64),

    /// Class or an interface
    Class(Utf8ConstantIndex),

    /// Constant object of type `java.lang.String`
    String(Utf8ConstantIndex),

    FieldRef(ClassConstantIndex, NameAndTypeConstantIndex),
    MethodRef(ClassConstantIndex, NameAndTypeConstantIndex),
    InterfaceMethodRef(ClassConstantIndex, NameAndTypeConstantIndex),

    /// Name and a type (eg. for a field or a method)
    NameAndType {
        name: Utf8ConstantIndex,
        descriptor: Utf8ConstantIndex,
    },

    /// Constant object of type `java.lang.invoke.MethodHandle`
    MethodHandle {
        handle_kind: HandleKind,

        /// Depending on the method kind, this points to different things:
        ///
        ///   - `FieldRef` for `GetField`, `GetStatic`, `PutField`, `PutStatic`
        ///   - `MethodRef` or `InterfaceMethodRef` for the rest
        member: ConstantIndex,
    },

    /// Method type
    MethodType { descriptor: Utf8ConstantIndex },

    /// Dynamically-computed call site
    InvokeDynamic {
        /// Index into the `BootstrapMethods` attribute
        bootstrap_method: u16,
        name_and_type: NameAndTypeConstantIndex,
    },
}

impl Constant {
    /// Tag byte preceding the constant in the binary format
    pub fn tag(&self) -> u8 {
        match self {
            Constant::Utf8(_) | Constant::Utf16(_) => 1,
            Constant::Integer(_) => 3,
            Constant::Float(_) => 4,
            Constant::Long(_) => 5,
            Constant::Double(_) => 6,
            Constant::Class(_) => 7,
            Constant::String(_) => 8,
            Constant::FieldRef(..) => 9,
            Constant::MethodRef(..) => 10,
            Constant::InterfaceMethodRef(..) => 11,
            Constant::NameAndType { .. } => 12,
            Constant::MethodHandle { .. } => 15,
            Constant::MethodType { .. } => 16,
            Constant::InvokeDynamic { .. } => 18,
        }
    }

    /// Name of the kind of constant, as used in listings
    pub fn kind_name(&self) -> &'static str {
        match self {
            Constant::Utf8(_) | Constant::Utf16(_) => "Utf8",
            Constant::Integer(_) => "Integer",
            Constant::Float(_) => "Float",
            Constant::Long(_) => "Long",
            Constant::Double(_) => "Double",
            Constant::Class(_) => "Class",
            Constant::String(_) => "String",
            Constant::FieldRef(..) => "Fieldref",
            Constant::MethodRef(..) => "Methodref",
            Constant::InterfaceMethodRef(..) => "InterfaceMethodref",
            Constant::NameAndType { .. } => "NameAndType",
            Constant::MethodHandle { .. } => "MethodHandle",
            Constant::MethodType { .. } => "MethodType",
            Constant::InvokeDynamic { .. } => "InvokeDynamic",
        }
    }
}

impl PartialEq for Constant {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Constant::Utf8(s1), Constant::Utf8(s2)) => s1 == s2,
            (Constant::Utf16(u1), Constant::Utf16(u2)) => u1 == u2,
            (Constant::Integer(i1), Constant::Integer(i2)) => i1 == i2,
            (Constant::Float(f1), Constant::Float(f2)) => f1.to_bits() == f2.to_bits(),
            (Constant::Long(l1), Constant::Long(l2)) => l1 == l2,
            (Constant::Double(d1), Constant::Double(d2)) => d1.to_bits() == d2.to_bits(),
            (Constant::Class(n1), Constant::Class(n2)) => n1 == n2,
            (Constant::String(s1), Constant::String(s2)) => s1 == s2,
            (Constant::FieldRef(c1, n1), Constant::FieldRef(c2, n2))
            | (Constant::MethodRef(c1, n1), Constant::MethodRef(c2, n2))
            | (Constant::InterfaceMethodRef(c1, n1), Constant::InterfaceMethodRef(c2, n2)) => {
                c1 == c2 && n1 == n2
            }
            (
                Constant::NameAndType {
                    name: n1,
                    descriptor: d1,
                },
                Constant::NameAndType {
                    name: n2,
                    descriptor: d2,
                },
            ) => n1 == n2 && d1 == d2,
            (
                Constant::MethodHandle {
                    handle_kind: k1,
                    member: m1,
                },
                Constant::MethodHandle {
                    handle_kind: k2,
                    member: m2,
                },
            ) => k1 == k2 && m1 == m2,
            (Constant::MethodType { descriptor: d1 }, Constant::MethodType { descriptor: d2 }) => {
                d1 == d2
            }
            (
                Constant::InvokeDynamic {
                    bootstrap_method: b1,
                    name_and_type: n1,
                },
                Constant::InvokeDynamic {
                    bootstrap_method: b2,
                    name_and_type: n2,
                },
            ) => b1 == b2 && n1 == n2,
            _ => false,
        }
    }
}

impl Eq for Constant {}

impl Hash for Constant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tag().hash(state);
        match self {
            Constant::Utf8(string) => string.hash(state),
            Constant::Utf16(units) => units.hash(state),
            Constant::Integer(integer) => integer.hash(state),
            Constant::Float(float) => float.to_bits().hash(state),
            Constant::Long(long) => long.hash(state),
            Constant::Double(double) => double.to_bits().hash(state),
            Constant::Class(name) => name.hash(state),
            Constant::String(string) => string.hash(state),
            Constant::FieldRef(class, name_and_type)
            | Constant::MethodRef(class, name_and_type)
            | Constant::InterfaceMethodRef(class, name_and_type) => {
                class.hash(state);
                name_and_type.hash(state);
            }
            Constant::NameAndType { name, descriptor } => {
                name.hash(state);
                descriptor.hash(state);
            }
            Constant::MethodHandle {
                handle_kind,
                member,
            } => {
                handle_kind.hash(state);
                member.hash(state);
            }
            Constant::MethodType { descriptor } => descriptor.hash(state),
            Constant::InvokeDynamic {
                bootstrap_method,
                name_and_type,
            } => {
                bootstrap_method.hash(state);
                name_and_type.hash(state);
            }
        }
    }
}

impl Serialize for Constant {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<(), Error> {
        self.tag().serialize(writer)?;
        match self {
            Constant::Utf8(string) => {
                let buffer: Vec<u8> = encode_modified_utf8(string);
                u16_count("modified UTF-8 bytes", buffer.len())?.serialize(writer)?;
                writer.write_all(&buffer)?;
            }
            Constant::Utf16(units) => {
                let buffer: Vec<u8> = encode_modified_utf16(units);
                u16_count("modified UTF-8 bytes", buffer.len())?.serialize(writer)?;
                writer.write_all(&buffer)?;
            }
            Constant::Integer(integer) => integer.serialize(writer)?,
            Constant::Float(float) => float.serialize(writer)?,
            Constant::Long(long) => long.serialize(writer)?,
            Constant::Double(double) => double.serialize(writer)?,
            Constant::Class(name) => name.serialize(writer)?,
            Constant::String(string) => string.serialize(writer)?,
            Constant::FieldRef(class, name_and_type)
            | Constant::MethodRef(class, name_and_type)
            | Constant::InterfaceMethodRef(class, name_and_type) => {
                class.serialize(writer)?;
                name_and_type.serialize(writer)?;
            }
            Constant::NameAndType { name, descriptor } => {
                name.serialize(writer)?;
                descriptor.serialize(writer)?;
            }
            Constant::MethodHandle {
                handle_kind,
                member,
            } => {
                handle_kind.serialize(writer)?;
                member.serialize(writer)?;
            }
            Constant::MethodType { descriptor } => descriptor.serialize(writer)?,
            Constant::InvokeDynamic {
                bootstrap_method,
                name_and_type,
            } => {
                bootstrap_method.serialize(writer)?;
                name_and_type.serialize(writer)?;
            }
        };
        Ok(())
    }
}

impl Deserialize for Constant {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        let constant = match u8::deserialize(reader)? {
            1 => {
                let length = u16::deserialize(reader)?;
                let bytes = read_bytes(reader, length as usize)?;
                let units = decode_modified_utf16(&bytes)?;
                match String::from_utf16(&units) {
                    Ok(string) => Constant::Utf8(string),
                    Err(_) => Constant::Utf16(units),
                }
            }
            3 => Constant::Integer(i32::deserialize(reader)?),
            4 => Constant::Float(f32::deserialize(reader)?),
            5 => Constant::Long(i64::deserialize(reader)?),
            6 => Constant::Double(f64::deserialize(reader)?),
            7 => Constant::Class(Utf8ConstantIndex::deserialize(reader)?),
            8 => Constant::String(Utf8ConstantIndex::deserialize(reader)?),
            9 => Constant::FieldRef(
                ClassConstantIndex::deserialize(reader)?,
                NameAndTypeConstantIndex::deserialize(reader)?,
            ),
            10 => Constant::MethodRef(
                ClassConstantIndex::deserialize(reader)?,
                NameAndTypeConstantIndex::deserialize(reader)?,
            ),
            11 => Constant::InterfaceMethodRef(
                ClassConstantIndex::deserialize(reader)?,
                NameAndTypeConstantIndex::deserialize(reader)?,
            ),
            12 => Constant::NameAndType {
                name: Utf8ConstantIndex::deserialize(reader)?,
                descriptor: Utf8ConstantIndex::deserialize(reader)?,
            },
            15 => Constant::MethodHandle {
                handle_kind: HandleKind::deserialize(reader)?,
                member: ConstantIndex::deserialize(reader)?,
            },
            16 => Constant::MethodType {
                descriptor: Utf8ConstantIndex::deserialize(reader)?,
            },
            18 => Constant::InvokeDynamic {
                bootstrap_method: u16::deserialize(reader)?,
                name_and_type: NameAndTypeConstantIndex::deserialize(reader)?,
            },
            tag => return Err(Error::InvalidConstantTag(tag)),
        };
        Ok(constant)
    }
}

/// Almost all constants have width 1, except for `Constant::Long` and `Constant::Double`. Quoting
/// the JVM specification:
///
/// > All 8-byte constants take up two entries in the constant_pool table of the class file. If a
/// > CONSTANT_Long_info or CONSTANT_Double_info structure is the item in the constant_pool table
/// > at index n, then the next usable item in the pool is located at index n+2. The constant_pool
/// > index n+1 must be valid but is considered unusable.
impl Width for Constant {
    fn width(&self) -> usize {
        match self {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        }
    }
}

/// Modified UTF-8 format used in class files.
///
/// See [this `DataInput` section for details][0]. Quoting from that section:
///
/// > The differences between this format and the standard UTF-8 format are the following:
/// >
/// >  * The null byte `\u0000` is encoded in 2-byte format rather than 1-byte, so that the encoded
/// >    strings never have embedded nulls.
/// >  * Only the 1-byte, 2-byte, and 3-byte formats are used.
/// >  * Supplementary characters are represented in the form of surrogate pairs.
///
/// [0]: https://docs.oracle.com/en/java/javase/17/docs/api/java.base/java/io/DataInput.html#modified-utf-8
pub fn encode_modified_utf8(string: &str) -> Vec<u8> {
    let units: Vec<u16> = string.encode_utf16().collect();
    encode_modified_utf16(&units)
}

/// Encode UTF-16 code units, paired or not, as modified UTF-8
pub fn encode_modified_utf16(units: &[u16]) -> Vec<u8> {
    let mut buffer: Vec<u8> = Vec::with_capacity(units.len());
    for &code in units {
        match code {
            0x0001..=0x007F => buffer.push(code as u8),
            0x0000 | 0x0080..=0x07FF => {
                buffer.push((code >> 6 & 0x1F) as u8 | 0b1100_0000);
                buffer.push((code & 0x3F) as u8 | 0b1000_0000);
            }
            _ => {
                buffer.push((code >> 12 & 0x0F) as u8 | 0b1110_0000);
                buffer.push((code >> 6 & 0x3F) as u8 | 0b1000_0000);
                buffer.push((code & 0x3F) as u8 | 0b1000_0000);
            }
        }
    }
    buffer
}

/// Number of modified UTF-8 bytes used to encode one UTF-16 code unit
fn encoded_unit_length(code: u16) -> usize {
    match code {
        0x0001..=0x007F => 1,
        0x0000 | 0x0080..=0x07FF => 2,
        _ => 3,
    }
}

/// Inverse of [`encode_modified_utf8`]
///
/// Unpaired surrogates are rejected since they have no `String` representation. Use
/// [`decode_modified_utf16`] to read them.
pub fn decode_modified_utf8(bytes: &[u8]) -> Result<String, Error> {
    let units = decode_modified_utf16(bytes)?;
    let mut string = String::with_capacity(units.len());
    let mut offset = 0;
    for decoded in char::decode_utf16(units.iter().copied()) {
        match decoded {
            Ok(c) => {
                string.push(c);
                let mut buffer = [0u16; 2];
                offset += c
                    .encode_utf16(&mut buffer)
                    .iter()
                    .map(|unit| encoded_unit_length(*unit))
                    .sum::<usize>();
            }
            Err(_) => return Err(Error::InvalidModifiedUtf8 { offset }),
        }
    }
    Ok(string)
}

/// Inverse of [`encode_modified_utf16`]
///
/// Overlong forms (other than the two byte null), raw null bytes and 4-byte sequences are all
/// rejected, so that any code units accepted here encode back to the same bytes.
pub fn decode_modified_utf16(bytes: &[u8]) -> Result<Vec<u16>, Error> {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut offset = 0;

    let continuation = |offset: usize| -> Result<u16, Error> {
        match bytes.get(offset) {
            Some(byte) if byte & 0b1100_0000 == 0b1000_0000 => Ok((byte & 0x3F) as u16),
            _ => Err(Error::InvalidModifiedUtf8 { offset }),
        }
    };

    while let Some(&byte) = bytes.get(offset) {
        let byte = byte as u16;
        let (unit, length) = if byte & 0b1000_0000 == 0 && byte != 0 {
            (byte, 1)
        } else if byte & 0b1110_0000 == 0b1100_0000 {
            let unit = (byte & 0x1F) << 6 | continuation(offset + 1)?;
            if unit != 0 && unit < 0x80 {
                return Err(Error::InvalidModifiedUtf8 { offset });
            }
            (unit, 2)
        } else if byte & 0b1111_0000 == 0b1110_0000 {
            let unit =
                (byte & 0x0F) << 12 | continuation(offset + 1)? << 6 | continuation(offset + 2)?;
            if unit < 0x800 {
                return Err(Error::InvalidModifiedUtf8 { offset });
            }
            (unit, 3)
        } else {
            return Err(Error::InvalidModifiedUtf8 { offset });
        };
        units.push(unit);
        offset += length;
    }

    Ok(units)
}

/// Raw index into the constant pool
#[derive(Copy, Clone, Hash, Eq, PartialEq, PartialOrd, Ord, Debug)]
pub struct ConstantIndex(pub u16);

impl Serialize for ConstantIndex {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<(), Error> {
        self.0.serialize(writer)
    }
}

impl Deserialize for ConstantIndex {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        Ok(ConstantIndex(u16::deserialize(reader)?))
    }
}

/// Indices which are known (or at least expected) to point at a particular kind of constant
macro_rules! typed_constant_index {
    ($( $(#[$attr:meta])* $index:ident, )*) => {
        $(
            $(#[$attr])*
            #[derive(Copy, Clone, Hash, Eq, PartialEq, PartialOrd, Ord, Debug)]
            pub struct $index(pub ConstantIndex);

            impl From<$index> for ConstantIndex {
                fn from(index: $index) -> ConstantIndex {
                    index.0
                }
            }

            impl Serialize for $index {
                fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<(), Error> {
                    self.0.serialize(writer)
                }
            }

            impl Deserialize for $index {
                fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
                    Ok($index(ConstantIndex::deserialize(reader)?))
                }
            }
        )*
    };
}

typed_constant_index! {
    Utf8ConstantIndex,
    StringConstantIndex,
    ClassConstantIndex,
    NameAndTypeConstantIndex,
    FieldRefConstantIndex,
    /// Either a `MethodRef` or an `InterfaceMethodRef`
    MethodRefConstantIndex,
    MethodTypeConstantIndex,
    InvokeDynamicConstantIndex,
}

/// Type of method handle
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-5.html#jvms-5.4.3.5-220
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum HandleKind {
    GetField,
    GetStatic,
    PutField,
    PutStatic,
    InvokeVirtual,
    InvokeStatic,
    InvokeSpecial,
    NewInvokeSpecial,
    InvokeInterface,
}

impl HandleKind {
    const ALL: [HandleKind; 9] = [
        HandleKind::GetField,
        HandleKind::GetStatic,
        HandleKind::PutField,
        HandleKind::PutStatic,
        HandleKind::InvokeVirtual,
        HandleKind::InvokeStatic,
        HandleKind::InvokeSpecial,
        HandleKind::NewInvokeSpecial,
        HandleKind::InvokeInterface,
    ];

    /// Reference kind as stored in the class file (`1` through `9`)
    pub fn reference_kind(self) -> u8 {
        self as u8 + 1
    }
}

impl Serialize for HandleKind {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<(), Error> {
        self.reference_kind().serialize(writer)
    }
}

impl Deserialize for HandleKind {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        let kind = u8::deserialize(reader)?;
        HandleKind::ALL
            .iter()
            .copied()
            .find(|handle_kind| handle_kind.reference_kind() == kind)
            .ok_or(Error::InvalidHandleKind(kind))
    }
}
