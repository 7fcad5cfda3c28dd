use crate::jvm::Error;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::Read;

/// Types which can be written out in the binary class file format
///
/// Everything is big-endian. Length prefixes are checked, so a table that is too large fails with
/// [`Error::CountOverflow`] instead of being truncated.
pub trait Serialize {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<(), Error>;
}

/// Types which can be read back without any surrounding context
pub trait Deserialize: Sized {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error>;
}

impl Serialize for u8 {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<(), Error> {
        writer.write_u8(*self)?;
        Ok(())
    }
}

impl Serialize for u16 {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<(), Error> {
        writer.write_u16::<BigEndian>(*self)?;
        Ok(())
    }
}

impl Serialize for u32 {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<(), Error> {
        writer.write_u32::<BigEndian>(*self)?;
        Ok(())
    }
}

impl Serialize for i32 {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<(), Error> {
        writer.write_i32::<BigEndian>(*self)?;
        Ok(())
    }
}

impl Serialize for i64 {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<(), Error> {
        writer.write_i64::<BigEndian>(*self)?;
        Ok(())
    }
}

impl Serialize for f32 {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<(), Error> {
        writer.write_f32::<BigEndian>(*self)?;
        Ok(())
    }
}

impl Serialize for f64 {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<(), Error> {
        writer.write_f64::<BigEndian>(*self)?;
        Ok(())
    }
}

impl Deserialize for u8 {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        Ok(reader.read_u8()?)
    }
}

impl Deserialize for u16 {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        Ok(reader.read_u16::<BigEndian>()?)
    }
}

impl Deserialize for u32 {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        Ok(reader.read_u32::<BigEndian>()?)
    }
}

impl Deserialize for i32 {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        Ok(reader.read_i32::<BigEndian>()?)
    }
}

impl Deserialize for i64 {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        Ok(reader.read_i64::<BigEndian>()?)
    }
}

impl Deserialize for f32 {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        Ok(reader.read_f32::<BigEndian>()?)
    }
}

impl Deserialize for f64 {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        Ok(reader.read_f64::<BigEndian>()?)
    }
}

/// Convert a length into a `u2` length prefix
pub fn u16_count(what: &'static str, count: usize) -> Result<u16, Error> {
    u16::try_from(count).map_err(|_| Error::CountOverflow { what, count })
}

/// Convert a length into a `u4` length prefix
pub fn u32_count(what: &'static str, count: usize) -> Result<u32, Error> {
    u32::try_from(count).map_err(|_| Error::CountOverflow { what, count })
}

/// Write a `u2` count followed by every element
pub fn serialize_list<A: Serialize, W: WriteBytesExt>(
    what: &'static str,
    elements: &[A],
    writer: &mut W,
) -> Result<(), Error> {
    u16_count(what, elements.len())?.serialize(writer)?;
    for element in elements {
        element.serialize(writer)?;
    }
    Ok(())
}

/// Read a `u2` count followed by that many elements
pub fn deserialize_list<A: Deserialize, R: ReadBytesExt>(reader: &mut R) -> Result<Vec<A>, Error> {
    let count = u16::deserialize(reader)?;
    let mut elements = Vec::with_capacity(count as usize);
    for _ in 0..count {
        elements.push(A::deserialize(reader)?);
    }
    Ok(elements)
}

/// Read exactly `length` bytes
///
/// The buffer grows as bytes actually arrive, so a bogus length in a corrupted file turns into an
/// `UnexpectedEof` error rather than a huge allocation.
pub fn read_bytes<R: ReadBytesExt>(reader: &mut R, length: usize) -> Result<Vec<u8>, Error> {
    let mut buffer = vec![];
    Read::take(&mut *reader, length as u64).read_to_end(&mut buffer)?;
    if buffer.len() != length {
        return Err(Error::IoError(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("expected {} bytes, got {}", length, buffer.len()),
        )));
    }
    Ok(buffer)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn big_endian() {
        let mut bytes = vec![];
        0xCAFEu16.serialize(&mut bytes).unwrap();
        0xBABE_0001u32.serialize(&mut bytes).unwrap();
        (-2i32).serialize(&mut bytes).unwrap();
        assert_eq!(
            bytes,
            vec![0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x01, 0xFF, 0xFF, 0xFF, 0xFE]
        );

        let mut reader = bytes.as_slice();
        assert_eq!(u16::deserialize(&mut reader).unwrap(), 0xCAFE);
        assert_eq!(u32::deserialize(&mut reader).unwrap(), 0xBABE_0001);
        assert_eq!(i32::deserialize(&mut reader).unwrap(), -2);
        assert!(matches!(
            u8::deserialize(&mut reader),
            Err(Error::IoError(err)) if err.kind() == std::io::ErrorKind::UnexpectedEof
        ));
    }

    #[test]
    fn lists_are_length_prefixed() {
        let mut bytes = vec![];
        serialize_list("entries", &[7u16, 8u16], &mut bytes).unwrap();
        assert_eq!(bytes, vec![0, 2, 0, 7, 0, 8]);
        let read: Vec<u16> = deserialize_list(&mut bytes.as_slice()).unwrap();
        assert_eq!(read, vec![7, 8]);
    }

    #[test]
    fn counts_do_not_truncate() {
        assert_eq!(u16_count("entries", 65535).unwrap(), 65535);
        assert!(matches!(
            u16_count("interfaces", 65536),
            Err(Error::CountOverflow {
                what: "interfaces",
                count: 65536
            })
        ));
    }

    #[test]
    fn short_reads_fail() {
        let bytes = [1u8, 2, 3];
        assert_eq!(read_bytes(&mut &bytes[..], 2).unwrap(), vec![1, 2]);
        assert!(read_bytes(&mut &bytes[..], 4).is_err());
    }
}
