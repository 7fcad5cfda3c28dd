use crate::jvm::{BaseType, Error, RenderDescriptor, Type};
use elsa::map::FrozenMap;
use typed_arena::Arena;

/// Storage for the types handed out by a [`TypeTable`]
pub struct TypeArenas<'t> {
    type_arena: Arena<Type<'t>>,
}

impl<'t> TypeArenas<'t> {
    pub fn new() -> TypeArenas<'t> {
        TypeArenas {
            type_arena: Arena::new(),
        }
    }
}

impl<'t> Default for TypeArenas<'t> {
    fn default() -> Self {
        TypeArenas::new()
    }
}

/// Canonical types, keyed by descriptor
///
/// Every distinct descriptor maps to exactly one `&'t Type<'t>`, so for types from the same
/// table, reference equality and structural equality coincide. The table can be shared freely
/// (all methods take `&self`), but types never outlive the arenas backing them.
pub struct TypeTable<'t> {
    arenas: &'t TypeArenas<'t>,
    types: FrozenMap<String, &'t Type<'t>>,
}

/// Pending work in [`TypeTable::from_descriptor`]
enum Action {
    /// Read one type starting at the cursor
    GetType,

    /// Move the last type read into the innermost method's argument list
    AddArgument,

    /// Wrap the last type read into an array of this many dimensions
    MakeArray(usize),

    /// Close the innermost method, using the last type read as return type
    MakeMethod,
}

impl<'t> TypeTable<'t> {
    pub fn new(arenas: &'t TypeArenas<'t>) -> TypeTable<'t> {
        TypeTable {
            arenas,
            types: FrozenMap::new(),
        }
    }

    /// Get the canonical instance of a type
    fn intern(&'t self, typ: Type<'t>) -> &'t Type<'t> {
        let descriptor = typ.render();
        if let Some(existing) = self.types.get(&descriptor) {
            return existing;
        }
        let typ = &*self.arenas.type_arena.alloc(typ);
        self.types.insert(descriptor, typ);
        typ
    }

    pub fn get_primitive(&'t self, base_type: BaseType) -> &'t Type<'t> {
        self.intern(Type::Primitive(base_type))
    }

    pub fn get_void(&'t self) -> &'t Type<'t> {
        self.get_primitive(BaseType::Void)
    }

    pub fn get_boolean(&'t self) -> &'t Type<'t> {
        self.get_primitive(BaseType::Boolean)
    }

    pub fn get_byte(&'t self) -> &'t Type<'t> {
        self.get_primitive(BaseType::Byte)
    }

    pub fn get_char(&'t self) -> &'t Type<'t> {
        self.get_primitive(BaseType::Char)
    }

    pub fn get_short(&'t self) -> &'t Type<'t> {
        self.get_primitive(BaseType::Short)
    }

    pub fn get_int(&'t self) -> &'t Type<'t> {
        self.get_primitive(BaseType::Int)
    }

    pub fn get_long(&'t self) -> &'t Type<'t> {
        self.get_primitive(BaseType::Long)
    }

    pub fn get_float(&'t self) -> &'t Type<'t> {
        self.get_primitive(BaseType::Float)
    }

    pub fn get_double(&'t self) -> &'t Type<'t> {
        self.get_primitive(BaseType::Double)
    }

    /// Class type from a binary name such as `java/lang/Object`
    ///
    /// The name must be one or more non-empty identifiers separated by `/`, none of which contain
    /// `.`, `;` or `[`.
    pub fn get_class_type(&'t self, name: &str) -> Result<&'t Type<'t>, Error> {
        let valid = name
            .split('/')
            .all(|part| !part.is_empty() && !part.contains(&['.', ';', '['][..]));
        if !valid {
            return Err(Error::MalformedDescriptor(format!("L{};", name)));
        }
        Ok(self.intern(Type::Class(name.to_owned())))
    }

    /// Array type with `dimensions` more dimensions than `element_type`
    ///
    /// Nested arrays are flattened, so `[[I` has dimension 2 and element type `I` no matter how
    /// it was built. Arrays of `void` or of methods are not valid types.
    pub fn get_array_type(
        &'t self,
        element_type: &'t Type<'t>,
        dimensions: usize,
    ) -> Result<&'t Type<'t>, Error> {
        let (element_type, dimensions) = match element_type {
            Type::Array {
                dimensions: inner,
                element_type,
            } => (*element_type, inner + dimensions),
            _ => (element_type, dimensions),
        };
        if dimensions == 0 || element_type.is_void() || element_type.is_method() {
            let mut descriptor = "[".repeat(dimensions);
            element_type.render_to(&mut descriptor);
            return Err(Error::MalformedDescriptor(descriptor));
        }
        Ok(self.intern(Type::Array {
            dimensions,
            element_type,
        }))
    }

    pub fn get_method_type(
        &'t self,
        return_type: &'t Type<'t>,
        argument_types: Vec<&'t Type<'t>>,
    ) -> Result<&'t Type<'t>, Error> {
        let invalid_argument = argument_types
            .iter()
            .any(|typ| typ.is_void() || typ.is_method());
        if return_type.is_method() || invalid_argument {
            let typ = Type::Method {
                return_type,
                argument_types,
            };
            return Err(Error::MalformedDescriptor(typ.render()));
        }
        Ok(self.intern(Type::Method {
            return_type,
            argument_types,
        }))
    }

    /// Parse a field or method descriptor
    ///
    /// Method and array descriptors nest, so this runs a small stack machine over the input
    /// instead of recursing. Values are pushed on `values` as they are read, and `arguments`
    /// accumulates the argument lists of the methods currently open.
    pub fn from_descriptor(&'t self, descriptor: &str) -> Result<&'t Type<'t>, Error> {
        let malformed = || Error::MalformedDescriptor(descriptor.to_owned());
        let bytes = descriptor.as_bytes();
        let mut position: usize = 0;

        let mut actions: Vec<Action> = vec![Action::GetType];
        let mut values: Vec<&'t Type<'t>> = vec![];
        let mut arguments: Vec<Vec<&'t Type<'t>>> = vec![];

        while let Some(action) = actions.pop() {
            match action {
                Action::GetType => {
                    let byte = *bytes.get(position).ok_or_else(malformed)?;
                    position += 1;
                    match byte {
                        b'L' => {
                            let length = bytes[position..]
                                .iter()
                                .position(|b| *b == b';')
                                .ok_or_else(malformed)?;
                            let name = &descriptor[position..position + length];
                            let class_type =
                                self.get_class_type(name).map_err(|_| malformed())?;
                            values.push(class_type);
                            position += length + 1;
                        }
                        b'[' => {
                            let mut dimensions = 1;
                            while bytes.get(position) == Some(&b'[') {
                                dimensions += 1;
                                position += 1;
                            }
                            actions.push(Action::MakeArray(dimensions));
                            actions.push(Action::GetType);
                        }
                        b'(' => {
                            arguments.push(vec![]);
                            actions.push(Action::MakeMethod);
                            if bytes.get(position) == Some(&b')') {
                                position += 1;
                            } else {
                                actions.push(Action::AddArgument);
                            }
                            actions.push(Action::GetType);
                        }
                        _ => {
                            let base_type = BaseType::from_code(byte).ok_or_else(malformed)?;
                            values.push(self.get_primitive(base_type));
                        }
                    }
                }
                Action::AddArgument => {
                    let argument = values.pop().ok_or_else(malformed)?;
                    if argument.is_void() || argument.is_method() {
                        return Err(malformed());
                    }
                    arguments.last_mut().ok_or_else(malformed)?.push(argument);
                    if bytes.get(position) == Some(&b')') {
                        position += 1;
                    } else {
                        actions.push(Action::AddArgument);
                    }
                    actions.push(Action::GetType);
                }
                Action::MakeArray(dimensions) => {
                    let element_type = values.pop().ok_or_else(malformed)?;
                    let array_type = self
                        .get_array_type(element_type, dimensions)
                        .map_err(|_| malformed())?;
                    values.push(array_type);
                }
                Action::MakeMethod => {
                    let return_type = values.pop().ok_or_else(malformed)?;
                    let argument_types = arguments.pop().ok_or_else(malformed)?;
                    let method_type = self
                        .get_method_type(return_type, argument_types)
                        .map_err(|_| malformed())?;
                    values.push(method_type);
                }
            }
        }

        match values.pop() {
            Some(typ) if values.is_empty() && position == bytes.len() => Ok(typ),
            _ => Err(malformed()),
        }
    }

    /// Inverse of [`TypeTable::from_descriptor`]
    pub fn to_descriptor(typ: &Type) -> String {
        typ.render()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn descriptor_round_trips() {
        let arenas = TypeArenas::new();
        let table = TypeTable::new(&arenas);

        for descriptor in [
            "I",
            "V",
            "Z",
            "[[I",
            "Ljava/lang/Thread;",
            "[Ljava/lang/String;",
            "()V",
            "([Ljava/lang/String;)V",
            "(IJ[[DLjava/lang/Object;)Ljava/lang/String;",
            "(Ljava/util/List;[I)[[Ljava/util/Map;",
        ] {
            let typ = table.from_descriptor(descriptor).unwrap();
            assert_eq!(TypeTable::to_descriptor(typ), descriptor);
        }
    }

    #[test]
    fn structure_of_parsed_types() {
        let arenas = TypeArenas::new();
        let table = TypeTable::new(&arenas);

        let main = table.from_descriptor("([Ljava/lang/String;)V").unwrap();
        match main {
            Type::Method {
                return_type,
                argument_types,
            } => {
                assert!(return_type.is_void());
                assert_eq!(
                    argument_types,
                    &vec![&Type::Array {
                        dimensions: 1,
                        element_type: &Type::Class(String::from("java/lang/String")),
                    }]
                );
            }
            other => panic!("expected method type, got {:?}", other),
        }
    }

    #[test]
    fn canonical_instances() {
        let arenas = TypeArenas::new();
        let table = TypeTable::new(&arenas);

        let int_matrix = table
            .get_array_type(table.get_array_type(table.get_int(), 1).unwrap(), 1)
            .unwrap();
        let parsed = table.from_descriptor("[[I").unwrap();
        assert!(std::ptr::eq(int_matrix, parsed));

        let object1 = table.get_class_type("java/lang/Object").unwrap();
        let object2 = table.from_descriptor("Ljava/lang/Object;").unwrap();
        assert!(std::ptr::eq(object1, object2));

        let method1 = table.from_descriptor("(II)I").unwrap();
        let method2 = table
            .get_method_type(table.get_int(), vec![table.get_int(), table.get_int()])
            .unwrap();
        assert!(std::ptr::eq(method1, method2));
    }

    #[test]
    fn malformed_descriptors() {
        let arenas = TypeArenas::new();
        let table = TypeTable::new(&arenas);

        for descriptor in [
            "", "Q", "II", "L;", "Ljava/lang/Object", "[", "[V", "(V)V", "(I", "(I)", "((I)V)V",
            "()V;", "L[I;", "Ljava/lang/;", "Ljava.lang.Object;",
        ] {
            assert!(
                matches!(
                    table.from_descriptor(descriptor),
                    Err(Error::MalformedDescriptor(_))
                ),
                "{:?} should not parse",
                descriptor
            );
        }
    }

    #[test]
    fn class_names_are_checked() {
        let arenas = TypeArenas::new();
        let table = TypeTable::new(&arenas);

        let nested = table.get_class_type("demo/Outer$Inner").unwrap();
        assert_eq!(TypeTable::to_descriptor(nested), "Ldemo/Outer$Inner;");
        for name in ["", "java/lang/", "/Object", "a//b", "java.lang.Object", "A;", "[I"] {
            assert!(
                matches!(table.get_class_type(name), Err(Error::MalformedDescriptor(_))),
                "{:?} should be rejected",
                name
            );
        }
    }
}
