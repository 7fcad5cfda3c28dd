use crate::jvm::class_file::{
    ClassConstantIndex, Constant, ConstantIndex, ConstantPool, FieldRefConstantIndex, HandleKind,
    InvokeDynamicConstantIndex, MethodRefConstantIndex, MethodTypeConstantIndex,
    NameAndTypeConstantIndex, StringConstantIndex, Utf8ConstantIndex,
};
use crate::jvm::{Error, RenderDescriptor, Type};
use std::borrow::{Borrow, Cow};
use std::collections::HashMap;

/// Constant pool under construction, with a lookup table per kind of constant
///
/// Every `add_*` method returns the index of an existing equal constant when there is one, so
/// asking for the same thing twice is cheap and never grows the pool. Tables are keyed on the
/// already-interned indices of their parts (eg. a `Class` is keyed on its name's UTF-8 index),
/// which means equality here agrees with equality of the constants in the pool.
#[derive(Debug, Default)]
pub struct ConstantInterner {
    pool: ConstantPool,

    utf8s: HashMap<String, Utf8ConstantIndex>,
    classes: HashMap<Utf8ConstantIndex, ClassConstantIndex>,
    strings: HashMap<Utf8ConstantIndex, StringConstantIndex>,
    integers: HashMap<i32, ConstantIndex>,
    floats: HashMap<[u8; 4], ConstantIndex>,
    longs: HashMap<i64, ConstantIndex>,
    doubles: HashMap<[u8; 8], ConstantIndex>,
    name_and_types: HashMap<(Utf8ConstantIndex, Utf8ConstantIndex), NameAndTypeConstantIndex>,
    field_refs: HashMap<(ClassConstantIndex, NameAndTypeConstantIndex), FieldRefConstantIndex>,
    method_refs: HashMap<(ClassConstantIndex, NameAndTypeConstantIndex), MethodRefConstantIndex>,
    interface_method_refs:
        HashMap<(ClassConstantIndex, NameAndTypeConstantIndex), MethodRefConstantIndex>,
    method_handles: HashMap<(HandleKind, ConstantIndex), ConstantIndex>,
    method_types: HashMap<Utf8ConstantIndex, MethodTypeConstantIndex>,
    invoke_dynamics: HashMap<(u16, NameAndTypeConstantIndex), InvokeDynamicConstantIndex>,
}

impl ConstantInterner {
    pub fn new() -> ConstantInterner {
        ConstantInterner::default()
    }

    /// Pool built up so far
    pub fn pool(&self) -> &ConstantPool {
        &self.pool
    }

    /// Consume the interner, keeping only the pool
    pub fn into_pool(self) -> ConstantPool {
        self.pool
    }

    /// Get or insert a UTF-8 constant
    pub fn add_utf8<'a, S: Into<Cow<'a, str>>>(
        &mut self,
        utf8: S,
    ) -> Result<Utf8ConstantIndex, Error> {
        let cow = utf8.into();
        if let Some(idx) = self.utf8s.get::<str>(cow.borrow()) {
            return Ok(*idx);
        }
        let owned = cow.into_owned();
        let idx = Utf8ConstantIndex(self.pool.push(Constant::Utf8(owned.clone()))?);
        self.utf8s.insert(owned, idx);
        Ok(idx)
    }

    /// Get or insert a class constant, given a binary class name (eg. `java/lang/String`)
    pub fn add_class(&mut self, name: &str) -> Result<ClassConstantIndex, Error> {
        let name = self.add_utf8(name)?;
        if let Some(idx) = self.classes.get(&name) {
            return Ok(*idx);
        }
        let idx = ClassConstantIndex(self.pool.push(Constant::Class(name))?);
        self.classes.insert(name, idx);
        Ok(idx)
    }

    /// Get or insert a `java.lang.String` literal
    pub fn add_string(&mut self, string: &str) -> Result<StringConstantIndex, Error> {
        let utf8 = self.add_utf8(string)?;
        if let Some(idx) = self.strings.get(&utf8) {
            return Ok(*idx);
        }
        let idx = StringConstantIndex(self.pool.push(Constant::String(utf8))?);
        self.strings.insert(utf8, idx);
        Ok(idx)
    }

    pub fn add_integer(&mut self, integer: i32) -> Result<ConstantIndex, Error> {
        if let Some(idx) = self.integers.get(&integer) {
            return Ok(*idx);
        }
        let idx = self.pool.push(Constant::Integer(integer))?;
        self.integers.insert(integer, idx);
        Ok(idx)
    }

    /// Get or insert a float literal (floats with the same bits are the same constant)
    pub fn add_float(&mut self, float: f32) -> Result<ConstantIndex, Error> {
        let key = float.to_be_bytes();
        if let Some(idx) = self.floats.get(&key) {
            return Ok(*idx);
        }
        let idx = self.pool.push(Constant::Float(float))?;
        self.floats.insert(key, idx);
        Ok(idx)
    }

    /// Get or insert a long literal (this uses up two pool indices)
    pub fn add_long(&mut self, long: i64) -> Result<ConstantIndex, Error> {
        if let Some(idx) = self.longs.get(&long) {
            return Ok(*idx);
        }
        let idx = self.pool.push(Constant::Long(long))?;
        self.longs.insert(long, idx);
        Ok(idx)
    }

    /// Get or insert a double literal (this uses up two pool indices)
    pub fn add_double(&mut self, double: f64) -> Result<ConstantIndex, Error> {
        let key = double.to_be_bytes();
        if let Some(idx) = self.doubles.get(&key) {
            return Ok(*idx);
        }
        let idx = self.pool.push(Constant::Double(double))?;
        self.doubles.insert(key, idx);
        Ok(idx)
    }

    /// Get or insert a name & type constant
    pub fn add_name_and_type(
        &mut self,
        name: &str,
        typ: &Type,
    ) -> Result<NameAndTypeConstantIndex, Error> {
        let name = self.add_utf8(name)?;
        let descriptor = self.add_utf8(typ.render())?;
        let key = (name, descriptor);
        if let Some(idx) = self.name_and_types.get(&key) {
            return Ok(*idx);
        }
        let constant = Constant::NameAndType { name, descriptor };
        let idx = NameAndTypeConstantIndex(self.pool.push(constant)?);
        self.name_and_types.insert(key, idx);
        Ok(idx)
    }

    /// Get or insert a reference to a field of some class
    pub fn add_field_ref(
        &mut self,
        class: &str,
        name: &str,
        typ: &Type,
    ) -> Result<FieldRefConstantIndex, Error> {
        let key = (self.add_class(class)?, self.add_name_and_type(name, typ)?);
        if let Some(idx) = self.field_refs.get(&key) {
            return Ok(*idx);
        }
        let idx = FieldRefConstantIndex(self.pool.push(Constant::FieldRef(key.0, key.1))?);
        self.field_refs.insert(key, idx);
        Ok(idx)
    }

    /// Get or insert a reference to a method of some class
    pub fn add_method_ref(
        &mut self,
        class: &str,
        name: &str,
        typ: &Type,
    ) -> Result<MethodRefConstantIndex, Error> {
        if !typ.is_method() {
            return Err(Error::ExpectedMethodType(typ.render()));
        }
        let key = (self.add_class(class)?, self.add_name_and_type(name, typ)?);
        if let Some(idx) = self.method_refs.get(&key) {
            return Ok(*idx);
        }
        let idx = MethodRefConstantIndex(self.pool.push(Constant::MethodRef(key.0, key.1))?);
        self.method_refs.insert(key, idx);
        Ok(idx)
    }

    /// Get or insert a reference to a method of some interface
    pub fn add_interface_method_ref(
        &mut self,
        interface: &str,
        name: &str,
        typ: &Type,
    ) -> Result<MethodRefConstantIndex, Error> {
        if !typ.is_method() {
            return Err(Error::ExpectedMethodType(typ.render()));
        }
        let key = (self.add_class(interface)?, self.add_name_and_type(name, typ)?);
        if let Some(idx) = self.interface_method_refs.get(&key) {
            return Ok(*idx);
        }
        let constant = Constant::InterfaceMethodRef(key.0, key.1);
        let idx = MethodRefConstantIndex(self.pool.push(constant)?);
        self.interface_method_refs.insert(key, idx);
        Ok(idx)
    }

    /// Get or insert a method handle
    ///
    /// The member should be a field reference for the field handle kinds and a method reference
    /// otherwise. This is not checked.
    pub fn add_method_handle(
        &mut self,
        handle_kind: HandleKind,
        member: ConstantIndex,
    ) -> Result<ConstantIndex, Error> {
        let key = (handle_kind, member);
        if let Some(idx) = self.method_handles.get(&key) {
            return Ok(*idx);
        }
        let idx = self.pool.push(Constant::MethodHandle {
            handle_kind,
            member,
        })?;
        self.method_handles.insert(key, idx);
        Ok(idx)
    }

    /// Get or insert a method type
    pub fn add_method_type(&mut self, typ: &Type) -> Result<MethodTypeConstantIndex, Error> {
        if !typ.is_method() {
            return Err(Error::ExpectedMethodType(typ.render()));
        }
        let descriptor = self.add_utf8(typ.render())?;
        if let Some(idx) = self.method_types.get(&descriptor) {
            return Ok(*idx);
        }
        let idx = MethodTypeConstantIndex(self.pool.push(Constant::MethodType { descriptor })?);
        self.method_types.insert(descriptor, idx);
        Ok(idx)
    }

    /// Get or insert a dynamically-computed call site
    pub fn add_invoke_dynamic(
        &mut self,
        bootstrap_method: u16,
        name: &str,
        typ: &Type,
    ) -> Result<InvokeDynamicConstantIndex, Error> {
        if !typ.is_method() {
            return Err(Error::ExpectedMethodType(typ.render()));
        }
        let name_and_type = self.add_name_and_type(name, typ)?;
        let key = (bootstrap_method, name_and_type);
        if let Some(idx) = self.invoke_dynamics.get(&key) {
            return Ok(*idx);
        }
        let idx = InvokeDynamicConstantIndex(self.pool.push(Constant::InvokeDynamic {
            bootstrap_method,
            name_and_type,
        })?);
        self.invoke_dynamics.insert(key, idx);
        Ok(idx)
    }
}
