/// Utility trait for converting types to their descriptor string representations
pub trait RenderDescriptor {
    /// Turn the descriptor into a string
    fn render(&self) -> String {
        let mut string = String::new();
        self.render_to(&mut string);
        string
    }

    /// Write the descriptor to a string
    fn render_to(&self, write_to: &mut String);
}

/// Primitive value types (plus `void`, which only ever shows up as a return type)
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum BaseType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
    Void,
}

impl BaseType {
    pub const ALL: [BaseType; 9] = [
        BaseType::Byte,
        BaseType::Char,
        BaseType::Double,
        BaseType::Float,
        BaseType::Int,
        BaseType::Long,
        BaseType::Short,
        BaseType::Boolean,
        BaseType::Void,
    ];

    /// Single letter used for the type in descriptors
    pub const fn code(self) -> char {
        match self {
            BaseType::Byte => 'B',
            BaseType::Char => 'C',
            BaseType::Double => 'D',
            BaseType::Float => 'F',
            BaseType::Int => 'I',
            BaseType::Long => 'J',
            BaseType::Short => 'S',
            BaseType::Boolean => 'Z',
            BaseType::Void => 'V',
        }
    }

    pub fn from_code(code: u8) -> Option<BaseType> {
        BaseType::ALL
            .iter()
            .copied()
            .find(|base_type| base_type.code() as u8 == code)
    }
}

impl RenderDescriptor for BaseType {
    fn render_to(&self, write_to: &mut String) {
        write_to.push(self.code());
    }
}

/// Type of a value or of a method
///
/// Types are handed out by a [`TypeTable`](crate::jvm::TypeTable), which stores exactly one
/// instance per distinct descriptor. Comparisons are structural, so two types are equal exactly
/// when their descriptors are.
#[derive(PartialEq, Eq, Hash, Debug)]
pub enum Type<'t> {
    Primitive(BaseType),

    /// Class or interface, by its binary name (eg. `java/lang/String`)
    Class(String),

    /// Array with `dimensions >= 1` of some non-array element type
    Array {
        dimensions: usize,
        element_type: &'t Type<'t>,
    },

    Method {
        return_type: &'t Type<'t>,
        argument_types: Vec<&'t Type<'t>>,
    },
}

impl<'t> Type<'t> {
    pub fn is_void(&self) -> bool {
        matches!(self, Type::Primitive(BaseType::Void))
    }

    pub fn is_method(&self) -> bool {
        matches!(self, Type::Method { .. })
    }

    /// Arguments of a method type (empty for every other type)
    pub fn argument_types(&self) -> &[&'t Type<'t>] {
        match self {
            Type::Method { argument_types, .. } => argument_types,
            _ => &[],
        }
    }

    pub fn return_type(&self) -> Option<&'t Type<'t>> {
        match self {
            Type::Method { return_type, .. } => Some(*return_type),
            _ => None,
        }
    }
}

impl<'t> RenderDescriptor for Type<'t> {
    fn render_to(&self, write_to: &mut String) {
        match self {
            Type::Primitive(base_type) => base_type.render_to(write_to),
            Type::Class(name) => {
                write_to.push('L');
                write_to.push_str(name);
                write_to.push(';');
            }
            Type::Array {
                dimensions,
                element_type,
            } => {
                for _ in 0..*dimensions {
                    write_to.push('[');
                }
                element_type.render_to(write_to);
            }
            Type::Method {
                return_type,
                argument_types,
            } => {
                write_to.push('(');
                for argument_type in argument_types {
                    argument_type.render_to(write_to);
                }
                write_to.push(')');
                return_type.render_to(write_to);
            }
        }
    }
}
