use super::{ConstantInterner, MethodBuilder};
use crate::jvm::class_file::{
    Attributable, Attribute, ClassFile, ConstantIndex, ConstantPool, Field, Version,
};
use crate::jvm::{
    ClassAccessFlags, Error, FieldAccessFlags, MethodAccessFlags, RenderDescriptor, Type,
};

/// Builder for a single class file
///
/// Constants used anywhere in the class go through the builder's [`ConstantInterner`], so the
/// final pool has no duplicates. Methods are built one at a time through [`MethodBuilder`], which
/// holds on to the class builder until [`MethodBuilder::leave_method`] is called.
#[derive(Debug)]
pub struct ClassBuilder {
    /// Class file, but with `constants` left blank
    class: ClassFile,

    /// Constants pool
    constants: ConstantInterner,
}

impl ClassBuilder {
    /// Superclass of a freshly opened class
    pub const DEFAULT_SUPER_CLASS: &'static str = "java/lang/Object";

    /// Start building a class (eg. `com/example/HelloWorld`)
    ///
    /// The class starts out `public`, extending `java/lang/Object`, and targeting Java 15.
    pub fn open(name: &str) -> Result<ClassBuilder, Error> {
        let mut constants = ConstantInterner::new();
        let this_class = constants.add_class(name)?;
        let super_class = constants.add_class(ClassBuilder::DEFAULT_SUPER_CLASS)?;
        log::debug!("opened class {}", name);

        let class = ClassFile {
            version: Version::default(),
            constants: ConstantPool::new(),
            access_flags: ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
            this_class,
            super_class: Some(super_class),
            interfaces: vec![],
            fields: vec![],
            methods: vec![],
            attributes: vec![],
        };

        Ok(ClassBuilder { class, constants })
    }

    /// Consume the builder and return the finished class file
    pub fn build(mut self) -> ClassFile {
        self.class.constants = self.constants.into_pool();
        log::debug!(
            "built class with {} constants, {} fields, {} methods",
            self.class.constants.len(),
            self.class.fields.len(),
            self.class.methods.len()
        );
        self.class
    }

    /// Constants pool used by the class
    pub fn constants(&mut self) -> &mut ConstantInterner {
        &mut self.constants
    }

    pub fn set_version(&mut self, version: Version) -> &mut ClassBuilder {
        self.class.version = version;
        self
    }

    pub fn set_access_flags(&mut self, access_flags: ClassAccessFlags) -> &mut ClassBuilder {
        self.class.access_flags = access_flags;
        self
    }

    pub fn add_access_flags(&mut self, access_flags: ClassAccessFlags) -> &mut ClassBuilder {
        self.class.access_flags |= access_flags;
        self
    }

    /// Replace the superclass
    pub fn set_super_class(&mut self, name: &str) -> Result<&mut ClassBuilder, Error> {
        self.class.super_class = Some(self.constants.add_class(name)?);
        Ok(self)
    }

    /// Add an implemented interface (adding the same interface twice has no effect)
    pub fn add_interface(&mut self, name: &str) -> Result<&mut ClassBuilder, Error> {
        let interface = self.constants.add_class(name)?;
        if !self.class.interfaces.contains(&interface) {
            self.class.interfaces.push(interface);
        }
        Ok(self)
    }

    /// Set the `SourceFile` attribute, replacing any previous one
    pub fn set_source_file(&mut self, source_file: &str) -> Result<&mut ClassBuilder, Error> {
        let name_index = self.constants.add_utf8(Attribute::SOURCE_FILE)?;
        let source_file = self.constants.add_utf8(source_file)?;
        self.class.remove_attributes(name_index);
        self.class.add_attribute(Attribute::SourceFile {
            name_index,
            source_file,
        });
        Ok(self)
    }

    pub fn add_utf8(&mut self, utf8: &str) -> Result<ConstantIndex, Error> {
        Ok(self.constants.add_utf8(utf8)?.0)
    }

    pub fn add_class(&mut self, name: &str) -> Result<ConstantIndex, Error> {
        Ok(self.constants.add_class(name)?.0)
    }

    pub fn add_string(&mut self, string: &str) -> Result<ConstantIndex, Error> {
        Ok(self.constants.add_string(string)?.0)
    }

    pub fn add_integer(&mut self, integer: i32) -> Result<ConstantIndex, Error> {
        self.constants.add_integer(integer)
    }

    pub fn add_long(&mut self, long: i64) -> Result<ConstantIndex, Error> {
        self.constants.add_long(long)
    }

    pub fn add_float(&mut self, float: f32) -> Result<ConstantIndex, Error> {
        self.constants.add_float(float)
    }

    pub fn add_double(&mut self, double: f64) -> Result<ConstantIndex, Error> {
        self.constants.add_double(double)
    }

    pub fn add_name_and_type(&mut self, name: &str, typ: &Type) -> Result<ConstantIndex, Error> {
        Ok(self.constants.add_name_and_type(name, typ)?.0)
    }

    pub fn add_field_ref(
        &mut self,
        class: &str,
        name: &str,
        typ: &Type,
    ) -> Result<ConstantIndex, Error> {
        Ok(self.constants.add_field_ref(class, name, typ)?.0)
    }

    pub fn add_method_ref(
        &mut self,
        class: &str,
        name: &str,
        typ: &Type,
    ) -> Result<ConstantIndex, Error> {
        Ok(self.constants.add_method_ref(class, name, typ)?.0)
    }

    pub fn add_interface_method_ref(
        &mut self,
        interface: &str,
        name: &str,
        typ: &Type,
    ) -> Result<ConstantIndex, Error> {
        Ok(self.constants.add_interface_method_ref(interface, name, typ)?.0)
    }

    /// Declare a field on the class
    ///
    /// Static fields can have an initial value, which must point at a constant of a type matching
    /// the field (`Integer` for `int`, `String` for `java.lang.String`, etc.).
    pub fn declare_field(
        &mut self,
        name: &str,
        typ: &Type,
        access_flags: FieldAccessFlags,
        constant_value: Option<ConstantIndex>,
    ) -> Result<(), Error> {
        if typ.is_method() || typ.is_void() {
            return Err(Error::MalformedDescriptor(typ.render()));
        }
        let name_index = self.constants.add_utf8(name)?;
        let descriptor_index = self.constants.add_utf8(typ.render())?;
        let mut field = Field {
            access_flags,
            name_index,
            descriptor_index,
            attributes: vec![],
        };
        if let Some(value) = constant_value {
            let name_index = self.constants.add_utf8(Attribute::CONSTANT_VALUE)?;
            field.add_attribute(Attribute::ConstantValue { name_index, value });
        }
        log::debug!("declared field {} {}", name, typ.render());
        self.class.fields.push(field);
        Ok(())
    }

    /// Start building a method
    ///
    /// The method only becomes part of the class once [`MethodBuilder::leave_method`] is called.
    /// Dropping the method builder before that discards the method, although constants interned
    /// for it (such as its name and descriptor) stay in the pool.
    pub fn enter_method(
        &mut self,
        name: &str,
        typ: &Type,
        access_flags: MethodAccessFlags,
    ) -> Result<MethodBuilder<'_>, Error> {
        MethodBuilder::new(self, name, typ, access_flags)
    }

    /// Start building an instance initializer (`<init>`)
    pub fn enter_constructor(
        &mut self,
        typ: &Type,
        access_flags: MethodAccessFlags,
    ) -> Result<MethodBuilder<'_>, Error> {
        self.enter_method("<init>", typ, access_flags)
    }

    pub(super) fn class_mut(&mut self) -> &mut ClassFile {
        &mut self.class
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::class_file::Constant;
    use crate::jvm::{TypeArenas, TypeTable};

    #[test]
    fn open_registers_this_and_super() {
        let class = ClassBuilder::open("HelloWorld").unwrap().build();
        assert_eq!(class.name().unwrap(), "HelloWorld");
        assert_eq!(class.super_name().unwrap(), Some("java/lang/Object"));
        assert_eq!(class.version, Version::JAVA15);
        assert_eq!(
            class.access_flags,
            ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER
        );
        assert_eq!(class.constants.len(), 4);
    }

    #[test]
    fn settings() {
        let mut builder = ClassBuilder::open("foo/Bar").unwrap();
        builder
            .set_version(Version::JAVA8)
            .set_access_flags(ClassAccessFlags::FINAL)
            .add_access_flags(ClassAccessFlags::SUPER);
        builder.set_super_class("foo/Base").unwrap();
        builder.add_interface("java/lang/Runnable").unwrap();
        builder.add_interface("java/lang/Runnable").unwrap();
        builder.set_source_file("Old.java").unwrap();
        builder.set_source_file("Bar.java").unwrap();
        let class = builder.build();

        assert_eq!(class.version, Version::JAVA8);
        assert_eq!(
            class.access_flags,
            ClassAccessFlags::FINAL | ClassAccessFlags::SUPER
        );
        assert_eq!(class.super_name().unwrap(), Some("foo/Base"));
        assert_eq!(class.interfaces.len(), 1);
        assert_eq!(class.attributes.len(), 1);
        match &class.attributes[0] {
            Attribute::SourceFile { source_file, .. } => {
                assert_eq!(class.constants.get_utf8(*source_file).unwrap(), "Bar.java")
            }
            other => panic!("unexpected attribute {:?}", other),
        }
    }

    #[test]
    fn constant_helpers_dedup() {
        let mut builder = ClassBuilder::open("A").unwrap();
        let hello = builder.add_string("hello").unwrap();
        assert_eq!(builder.add_string("hello").unwrap(), hello);
        assert_eq!(builder.add_class("A").unwrap(), builder.add_class("A").unwrap());

        let long = builder.add_long(5).unwrap();
        let after = builder.add_utf8("after").unwrap();
        assert_eq!(after.0, long.0 + 2);
    }

    #[test]
    fn fields() {
        let arenas = TypeArenas::new();
        let types = TypeTable::new(&arenas);

        let mut builder = ClassBuilder::open("A").unwrap();
        let seven = builder.add_integer(7).unwrap();
        builder
            .declare_field(
                "SEVEN",
                types.get_int(),
                FieldAccessFlags::STATIC | FieldAccessFlags::FINAL,
                Some(seven),
            )
            .unwrap();
        builder
            .declare_field(
                "name",
                types.get_class_type("java/lang/String").unwrap(),
                FieldAccessFlags::PRIVATE,
                None,
            )
            .unwrap();
        assert!(matches!(
            builder.declare_field("bad", types.get_void(), FieldAccessFlags::empty(), None),
            Err(Error::MalformedDescriptor(_))
        ));

        let class = builder.build();
        assert_eq!(class.fields.len(), 2);
        let field = &class.fields[0];
        assert_eq!(class.constants.get_utf8(field.descriptor_index).unwrap(), "I");
        match field.find_attribute_named(&class.constants, Attribute::CONSTANT_VALUE) {
            Some(Attribute::ConstantValue { value, .. }) => {
                assert!(matches!(class.constants.get(*value), Ok(Constant::Integer(7))))
            }
            other => panic!("unexpected attribute {:?}", other),
        }
        assert!(class.fields[1].attributes.is_empty());
    }
}
