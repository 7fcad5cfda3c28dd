use crate::jvm::class_file::{
    ClassConstantIndex, Constant, ConstantIndex, Deserialize, NameAndTypeConstantIndex,
    Serialize, Utf8ConstantIndex,
};
use crate::jvm::Error;
use crate::util::{Offset, OffsetResult, OffsetVec, Width};
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::borrow::Cow;
use std::collections::HashMap;

/// Constant pool of a class file
///
/// The pool is append only. Indexing starts at 1 and longs/doubles use up two indices, the second
/// of which is never valid to look up.
#[derive(Debug, Clone)]
pub struct ConstantPool {
    constants: OffsetVec<Constant>,

    /// Index of the first occurrence of every constant
    interned: HashMap<Constant, ConstantIndex>,
}

impl ConstantPool {
    /// Make a fresh empty constants pool
    pub fn new() -> ConstantPool {
        ConstantPool {
            constants: OffsetVec::new_starting_at(Offset(1)),
            interned: HashMap::new(),
        }
    }

    /// Append a constant, even if an equal one is already present
    ///
    /// Note: the largest valid index is 65534, indexing starts at 1, and some constants take two
    /// spaces.
    pub fn push(&mut self, constant: Constant) -> Result<ConstantIndex, Error> {
        let offset = self.constants.offset_len().0;
        if offset + constant.width() > u16::MAX as usize {
            return Err(Error::ConstantPoolOverflow {
                constant,
                offset: offset as u16,
            });
        }

        let index = ConstantIndex(offset as u16);
        self.interned.entry(constant.clone()).or_insert(index);
        self.constants.push(constant);
        Ok(index)
    }

    /// Get the index of a constant, adding it only if there is no equal constant yet
    pub fn intern(&mut self, constant: Constant) -> Result<ConstantIndex, Error> {
        match self.interned.get(&constant) {
            Some(index) => Ok(*index),
            None => self.push(constant),
        }
    }

    /// Look up a constant by index
    pub fn get(&self, index: ConstantIndex) -> Result<&Constant, Error> {
        match self.constants.get_offset(Offset(index.0 as usize)) {
            OffsetResult::Ok(_, constant) => Ok(constant),
            OffsetResult::InvalidOffset(_) | OffsetResult::TooLarge => {
                Err(Error::InvalidIndex(index))
            }
        }
    }

    fn mismatch(&self, index: ConstantIndex, expected: &'static str) -> Error {
        match self.get(index) {
            Ok(found) => Error::ConstantTypeMismatch {
                index,
                expected,
                found: found.kind_name(),
            },
            Err(err) => err,
        }
    }

    /// Text of a UTF-8 constant
    ///
    /// Fails with [`Error::UnpairedSurrogate`] for strings which aren't valid Unicode, see
    /// [`ConstantPool::get_utf8_lossy`] for those.
    pub fn get_utf8(&self, index: Utf8ConstantIndex) -> Result<&str, Error> {
        match self.get(index.0)? {
            Constant::Utf8(string) => Ok(string),
            Constant::Utf16(_) => Err(Error::UnpairedSurrogate(index.0)),
            _ => Err(self.mismatch(index.0, "Utf8")),
        }
    }

    /// Text of a UTF-8 constant, with unpaired surrogates replaced by `U+FFFD`
    pub fn get_utf8_lossy(&self, index: Utf8ConstantIndex) -> Result<Cow<'_, str>, Error> {
        match self.get(index.0)? {
            Constant::Utf8(string) => Ok(Cow::Borrowed(string)),
            Constant::Utf16(units) => Ok(Cow::Owned(String::from_utf16_lossy(units))),
            _ => Err(self.mismatch(index.0, "Utf8")),
        }
    }

    /// Binary name of a class constant
    pub fn get_class_name(&self, index: ClassConstantIndex) -> Result<&str, Error> {
        match self.get(index.0)? {
            Constant::Class(name) => self.get_utf8(*name),
            _ => Err(self.mismatch(index.0, "Class")),
        }
    }

    /// Name and descriptor of a name and type constant
    pub fn get_name_and_type(
        &self,
        index: NameAndTypeConstantIndex,
    ) -> Result<(&str, &str), Error> {
        match self.get(index.0)? {
            Constant::NameAndType { name, descriptor } => {
                Ok((self.get_utf8(*name)?, self.get_utf8(*descriptor)?))
            }
            _ => Err(self.mismatch(index.0, "NameAndType")),
        }
    }

    /// Check that an index points at a UTF-8 constant
    pub fn utf8_index(&self, index: ConstantIndex) -> Result<Utf8ConstantIndex, Error> {
        match self.get(index)? {
            Constant::Utf8(_) | Constant::Utf16(_) => Ok(Utf8ConstantIndex(index)),
            _ => Err(self.mismatch(index, "Utf8")),
        }
    }

    /// Check that an index points at a class constant
    pub fn class_index(&self, index: ConstantIndex) -> Result<ClassConstantIndex, Error> {
        match self.get(index)? {
            Constant::Class(_) => Ok(ClassConstantIndex(index)),
            _ => Err(self.mismatch(index, "Class")),
        }
    }

    /// Render a constant along with whatever it refers to, as used in listings
    ///
    /// References that don't resolve are rendered as `?` rather than failing.
    pub fn describe(&self, index: ConstantIndex) -> String {
        let utf8 = |index: Utf8ConstantIndex| {
            self.get_utf8_lossy(index)
                .unwrap_or(Cow::Borrowed("?"))
                .into_owned()
        };
        let class = |index: ClassConstantIndex| self.get_class_name(index).unwrap_or("?");
        let name_and_type = |index: NameAndTypeConstantIndex| match self.get_name_and_type(index) {
            Ok((name, descriptor)) => format!("{}:{}", name, descriptor),
            Err(_) => String::from("?"),
        };

        match self.get(index) {
            Err(_) => String::from("?"),
            Ok(Constant::Utf8(string)) => format!("{:?}", string),
            Ok(Constant::Utf16(units)) => format!("{:?}", String::from_utf16_lossy(units)),
            Ok(Constant::Integer(integer)) => format!("{}", integer),
            Ok(Constant::Float(float)) => format!("{:?}f", float),
            Ok(Constant::Long(long)) => format!("{}l", long),
            Ok(Constant::Double(double)) => format!("{:?}d", double),
            Ok(Constant::Class(name)) => utf8(*name),
            Ok(Constant::String(string)) => format!("{:?}", utf8(*string)),
            Ok(Constant::FieldRef(owner, member))
            | Ok(Constant::MethodRef(owner, member))
            | Ok(Constant::InterfaceMethodRef(owner, member)) => {
                format!("{}.{}", class(*owner), name_and_type(*member))
            }
            Ok(Constant::NameAndType { name, descriptor }) => {
                format!("{}:{}", utf8(*name), utf8(*descriptor))
            }
            Ok(Constant::MethodHandle {
                handle_kind,
                member,
            }) => format!("{:?} #{}", handle_kind, member.0),
            Ok(Constant::MethodType { descriptor }) => utf8(*descriptor),
            Ok(Constant::InvokeDynamic {
                bootstrap_method,
                name_and_type: member,
            }) => format!("{}:{}", bootstrap_method, name_and_type(*member)),
        }
    }

    /// Number of constants in the pool
    pub fn len(&self) -> usize {
        self.constants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }

    /// Number of slots used up in the pool (longs and doubles count twice)
    pub fn size(&self) -> usize {
        self.constants.total_width()
    }

    /// Constants with their indices, in index order
    pub fn iter(&self) -> impl Iterator<Item = (ConstantIndex, &Constant)> + '_ {
        self.constants
            .iter()
            .map(|(offset, _, constant)| (ConstantIndex(offset.0 as u16), constant))
    }

    /// Read the `constant_pool_count` and all of the constants which follow
    pub fn read<R: ReadBytesExt>(reader: &mut R) -> Result<ConstantPool, Error> {
        let count = u16::deserialize(reader)?;
        if count == 0 {
            return Err(Error::MalformedConstantPool { count });
        }

        let mut pool = ConstantPool::new();
        while pool.constants.offset_len().0 < count as usize {
            let constant = Constant::deserialize(reader)?;
            if pool.constants.offset_len().0 + constant.width() > count as usize {
                return Err(Error::MalformedConstantPool { count });
            }
            pool.push(constant)?;
        }
        log::debug!("read {} constants ({} slots)", pool.len(), pool.size());
        Ok(pool)
    }
}

impl Default for ConstantPool {
    fn default() -> Self {
        ConstantPool::new()
    }
}

impl PartialEq for ConstantPool {
    fn eq(&self, other: &Self) -> bool {
        self.constants == other.constants
    }
}

impl Eq for ConstantPool {}

/// Writes out `constant_pool_count` (which is the number of slots plus one) and the constants
impl Serialize for ConstantPool {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<(), Error> {
        let count = self.constants.offset_len().0;
        if count > u16::MAX as usize {
            return Err(Error::CountOverflow {
                what: "constant pool slots",
                count,
            });
        }
        (count as u16).serialize(writer)?;
        for (_, _, constant) in &self.constants {
            constant.serialize(writer)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn utf8(string: &str) -> Constant {
        Constant::Utf8(String::from(string))
    }

    #[test]
    fn interning_deduplicates() {
        let mut pool = ConstantPool::new();
        let hello1 = pool.intern(utf8("hello")).unwrap();
        let hello2 = pool.intern(utf8("hello")).unwrap();
        let world = pool.intern(utf8("world")).unwrap();

        assert_eq!(hello1, ConstantIndex(1));
        assert_eq!(hello1, hello2);
        assert_eq!(world, ConstantIndex(2));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn classes_are_keyed_on_name_index() {
        let mut pool = ConstantPool::new();
        let name = Utf8ConstantIndex(pool.intern(utf8("java/lang/Object")).unwrap());
        let class1 = pool.intern(Constant::Class(name)).unwrap();
        let class2 = pool.intern(Constant::Class(name)).unwrap();
        assert_eq!(class1, class2);
        assert_eq!(
            pool.get_class_name(ClassConstantIndex(class1)).unwrap(),
            "java/lang/Object"
        );
    }

    #[test]
    fn wide_constants_use_two_slots() {
        let mut pool = ConstantPool::new();
        let long = pool.intern(Constant::Long(42)).unwrap();
        let next = pool.intern(utf8("after long")).unwrap();
        let double = pool.intern(Constant::Double(4.2)).unwrap();
        let last = pool.intern(Constant::Integer(42)).unwrap();

        assert_eq!(next.0, long.0 + 2);
        assert_eq!(last.0, double.0 + 2);
        assert_eq!(pool.size(), 6);
        assert_eq!(pool.len(), 4);
    }

    #[test]
    fn invalid_indices() {
        let mut pool = ConstantPool::new();
        let long = pool.intern(Constant::Long(-1)).unwrap();
        pool.intern(utf8("x")).unwrap();

        assert!(pool.get(long).is_ok());
        for index in [0, long.0 + 1, 4, 100] {
            let result = pool.get(ConstantIndex(index));
            assert!(
                matches!(result, Err(Error::InvalidIndex(ConstantIndex(i))) if i == index),
                "#{} should be invalid",
                index
            );
        }
    }

    #[test]
    fn kind_mismatch() {
        let mut pool = ConstantPool::new();
        let integer = pool.intern(Constant::Integer(3)).unwrap();
        assert!(matches!(
            pool.get_utf8(Utf8ConstantIndex(integer)),
            Err(Error::ConstantTypeMismatch {
                expected: "Utf8",
                found: "Integer",
                ..
            })
        ));
        assert!(pool.class_index(integer).is_err());
    }

    #[test]
    fn unpaired_surrogate_text() {
        let mut pool = ConstantPool::new();
        let lone = pool.intern(Constant::Utf16(vec![0x61, 0xD800])).unwrap();
        let string = pool.intern(Constant::String(Utf8ConstantIndex(lone))).unwrap();

        assert!(matches!(
            pool.get_utf8(Utf8ConstantIndex(lone)),
            Err(Error::UnpairedSurrogate(index)) if index == lone
        ));
        assert_eq!(pool.get_utf8_lossy(Utf8ConstantIndex(lone)).unwrap(), "a\u{FFFD}");
        assert_eq!(pool.utf8_index(lone).unwrap(), Utf8ConstantIndex(lone));
        assert_eq!(pool.describe(string), "\"a\u{FFFD}\"");
    }

    #[test]
    fn overflow() {
        let mut pool = ConstantPool::new();
        for i in 0..65533 {
            pool.push(Constant::Integer(i)).unwrap();
        }
        // #65534 is the last usable index
        assert!(matches!(
            pool.push(Constant::Long(0)),
            Err(Error::ConstantPoolOverflow { offset: 65534, .. })
        ));
        assert_eq!(pool.push(Constant::Integer(-1)).unwrap(), ConstantIndex(65534));
        assert!(pool.push(Constant::Integer(-2)).is_err());
    }

    #[test]
    fn read_write() {
        let mut pool = ConstantPool::new();
        let name = Utf8ConstantIndex(pool.intern(utf8("Example")).unwrap());
        pool.intern(Constant::Double(0.5)).unwrap();
        pool.intern(Constant::Class(name)).unwrap();

        let mut bytes = vec![];
        pool.serialize(&mut bytes).unwrap();
        assert_eq!(&bytes[0..2], &[0, 5]);

        let read = ConstantPool::read(&mut bytes.as_slice()).unwrap();
        assert_eq!(read, pool);
        assert_eq!(
            read.iter().map(|(index, _)| index.0).collect::<Vec<_>>(),
            vec![1, 2, 4]
        );
    }

    #[test]
    fn truncated_long_at_end() {
        // count says 2 slots (so 1 live entry) but the only entry is a long
        let bytes = [0u8, 2, 5, 0, 0, 0, 0, 0, 0, 0, 1];
        assert!(matches!(
            ConstantPool::read(&mut &bytes[..]),
            Err(Error::MalformedConstantPool { count: 2 })
        ));
    }

    #[test]
    fn describe_refs() {
        let mut pool = ConstantPool::new();
        let class_name = Utf8ConstantIndex(pool.intern(utf8("java/io/PrintStream")).unwrap());
        let class = ClassConstantIndex(pool.intern(Constant::Class(class_name)).unwrap());
        let name = Utf8ConstantIndex(pool.intern(utf8("println")).unwrap());
        let descriptor = Utf8ConstantIndex(pool.intern(utf8("(Ljava/lang/String;)V")).unwrap());
        let name_and_type = NameAndTypeConstantIndex(
            pool.intern(Constant::NameAndType { name, descriptor })
                .unwrap(),
        );
        let method = pool
            .intern(Constant::MethodRef(class, name_and_type))
            .unwrap();
        assert_eq!(
            pool.describe(method),
            "java/io/PrintStream.println:(Ljava/lang/String;)V"
        );
        assert_eq!(pool.describe(ConstantIndex(99)), "?");
    }
}
