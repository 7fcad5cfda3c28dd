use crate::jvm::class_file::{Deserialize, Serialize};
use crate::jvm::Error;
use bitflags::bitflags;
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::fmt;

bitflags! {
    /// Access flags on classes
    ///
    /// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.1-200-E.1
    pub struct ClassAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const FINAL = 0x0010;
        const SUPER = 0x0020;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
        const MODULE = 0x8000;
    }
}

bitflags! {
    /// Access flags on methods
    ///
    /// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.6-200-A.1
    pub struct MethodAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const BRIDGE = 0x0040;
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
    }
}

bitflags! {
    /// Access flags on fields
    ///
    /// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.5-200-A.1
    pub struct FieldAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const VOLATILE = 0x0040;
        const TRANSIENT = 0x0080;
        const SYNTHETIC = 0x1000;
        const ENUM = 0x4000;
    }
}

/// Serialization as a `u2` plus rendering as space-separated keywords (in the order given here)
///
/// Bits without a name are kept as they are when reading, so that writing the flags back produces
/// the same `u2`. They aren't rendered.
macro_rules! access_flags_impls {
    ($flags:ident { $( $flag:ident => $keyword:literal, )* }) => {
        impl Serialize for $flags {
            fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<(), Error> {
                self.bits().serialize(writer)
            }
        }

        impl Deserialize for $flags {
            fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
                let bits = u16::deserialize(reader)?;
                if bits & !$flags::all().bits() != 0 {
                    log::debug!(
                        "keeping unknown {} bits 0x{:04X}",
                        stringify!($flags),
                        bits & !$flags::all().bits()
                    );
                }
                // Unknown bits are valid for all of the access flag types
                Ok(unsafe { $flags::from_bits_unchecked(bits) })
            }
        }

        impl fmt::Display for $flags {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let keywords: Vec<&str> = [$( ($flags::$flag, $keyword), )*]
                    .iter()
                    .filter(|(flag, _)| self.contains(*flag))
                    .map(|(_, keyword)| *keyword)
                    .collect();
                f.write_str(&keywords.join(" "))
            }
        }
    };
}

access_flags_impls!(ClassAccessFlags {
    PUBLIC => "public",
    FINAL => "final",
    SUPER => "super",
    INTERFACE => "interface",
    ABSTRACT => "abstract",
    SYNTHETIC => "synthetic",
    ANNOTATION => "annotation",
    ENUM => "enum",
    MODULE => "module",
});

access_flags_impls!(MethodAccessFlags {
    PUBLIC => "public",
    PRIVATE => "private",
    PROTECTED => "protected",
    STATIC => "static",
    FINAL => "final",
    SYNCHRONIZED => "synchronized",
    BRIDGE => "bridge",
    VARARGS => "varargs",
    NATIVE => "native",
    ABSTRACT => "abstract",
    STRICT => "strict",
    SYNTHETIC => "synthetic",
});

access_flags_impls!(FieldAccessFlags {
    PUBLIC => "public",
    PRIVATE => "private",
    PROTECTED => "protected",
    STATIC => "static",
    FINAL => "final",
    VOLATILE => "volatile",
    TRANSIENT => "transient",
    SYNTHETIC => "synthetic",
    ENUM => "enum",
});
