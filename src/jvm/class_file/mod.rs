//! Exact model of the binary class file format
//!
//! [`ClassFile`] mirrors the layout of a class file one to one. It can be read from bytes (see
//! [`ClassFile::read`]) and written back (see [`Serialize`]), and writing something that was just
//! read produces the same bytes again. Unknown access flag bits and UTF-8 constants that aren't
//! valid Unicode (see [`Constant::Utf16`]) are kept. The exceptions are:
//!
//!   - attributes this crate doesn't know about, which are dropped on read
//!   - bytes left over at the end of a known attribute, which are reported and then dropped

mod attribute;
mod binary_format;
mod class;
mod constant_pool;
mod constants;
mod field;
mod listing;
mod method;
mod version;

pub use attribute::*;
pub use binary_format::*;
pub use class::*;
pub use constant_pool::*;
pub use constants::*;
pub use field::*;
pub use listing::*;
pub use method::*;
pub use version::*;
