use super::{ClassBuilder, ConstantInterner};
use crate::jvm::class_file::{Attribute, Code, Method};
use crate::jvm::code::{BasicBlock, Instruction, Opcode};
use crate::jvm::{Error, MethodAccessFlags, RenderDescriptor, Type};

/// Handle on one of the basic blocks of the method being built
///
/// Only meaningful for the [`MethodBuilder`] that produced it.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct InsertionPoint(usize);

/// Builder for the body of a single method
///
/// Instructions are appended to the block at the current insertion point. The method (and its
/// `Code` attribute) is only added to the class by [`MethodBuilder::leave_method`], which also
/// works out how deep the operand stack gets.
#[must_use = "the method is only added to the class by `leave_method`"]
pub struct MethodBuilder<'c> {
    class: &'c mut ClassBuilder,
    method: Method,
    code: Code,

    /// Blocks, in creation order
    blocks: Vec<BasicBlock>,
    current: InsertionPoint,
}

impl<'c> MethodBuilder<'c> {
    pub(super) fn new(
        class: &'c mut ClassBuilder,
        name: &str,
        typ: &Type,
        access_flags: MethodAccessFlags,
    ) -> Result<MethodBuilder<'c>, Error> {
        if !typ.is_method() {
            return Err(Error::ExpectedMethodType(typ.render()));
        }

        // Slot 0 is set aside for `this`, even on static methods
        let max_locals = 1 + typ.argument_types().len();
        if max_locals > u16::MAX as usize {
            return Err(Error::MethodCodeMaxLocalsOverflow(max_locals));
        }

        let descriptor = typ.render();
        log::debug!("entering method {}{}", name, descriptor);
        let constants = class.constants();
        let method = Method {
            access_flags,
            name_index: constants.add_utf8(name)?,
            descriptor_index: constants.add_utf8(descriptor)?,
            attributes: vec![],
        };
        let mut code = Code::new(constants.add_utf8(Attribute::CODE)?);
        code.max_locals = max_locals as u16;

        Ok(MethodBuilder {
            class,
            method,
            code,
            blocks: vec![BasicBlock::new()],
            current: InsertionPoint(0),
        })
    }

    /// Constants pool of the enclosing class
    pub fn constants(&mut self) -> &mut ConstantInterner {
        self.class.constants()
    }

    /// Block that instructions are currently appended to
    pub fn insertion_point(&self) -> InsertionPoint {
        self.current
    }

    /// Add a fresh empty block after all the existing ones
    ///
    /// This does not move the insertion point.
    pub fn create_basic_block(&mut self) -> InsertionPoint {
        self.blocks.push(BasicBlock::new());
        InsertionPoint(self.blocks.len() - 1)
    }

    /// Move the insertion point
    ///
    /// Panics if the insertion point came from a different method builder.
    pub fn set_insertion_point(&mut self, insertion_point: InsertionPoint) {
        assert!(
            insertion_point.0 < self.blocks.len(),
            "insertion point {:?} does not belong to this method",
            insertion_point
        );
        self.current = insertion_point;
    }

    /// Override the number of local variable slots (by default one per argument, plus one)
    pub fn set_locals_limit(&mut self, max_locals: u16) {
        self.code.max_locals = max_locals;
    }

    /// Append an instruction at the insertion point
    pub fn push_instruction(&mut self, instruction: Instruction) {
        self.blocks[self.current.0].push(instruction);
    }

    /// Make an instruction and append it at the insertion point
    pub fn make_instruction(&mut self, opcode: Opcode, operands: Vec<u8>) -> Result<(), Error> {
        let instruction = Instruction::new(opcode, operands)?;
        self.push_instruction(instruction);
        Ok(())
    }

    /// Finish the method and add it to the class
    ///
    /// Blocks are laid out in the order they were created. Native and abstract methods don't get
    /// a `Code` attribute at all.
    pub fn leave_method(mut self) -> Result<(), Error> {
        let max_stack = BasicBlock::max_stack_depth(&self.blocks);
        if max_stack > u16::MAX as usize {
            return Err(Error::MethodCodeMaxStackOverflow(max_stack));
        }
        self.code.max_stack = max_stack as u16;

        for block in self.blocks {
            self.code
                .instructions
                .extend(block.instructions.into_iter().map(|(_, _, insn)| insn));
        }
        let code_length = self.code.code_length();
        if code_length > Code::MAX_CODE_LENGTH {
            return Err(Error::MethodCodeOverflow(code_length));
        }

        let bodyless = MethodAccessFlags::NATIVE | MethodAccessFlags::ABSTRACT;
        if self.method.access_flags.intersects(bodyless) {
            if !self.code.instructions.is_empty() {
                log::warn!(
                    "dropping {} instructions from a method without a body",
                    self.code.instructions.len()
                );
            }
        } else {
            self.method.attributes.push(Attribute::Code(self.code));
        }

        log::debug!(
            "leaving method (max stack {}, {} bytes of code)",
            max_stack,
            code_length
        );
        self.class.class_mut().methods.push(self.method);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::class_file::{ClassFile, Constant, ConstantIndex};
    use crate::jvm::{TypeArenas, TypeTable};

    fn index_bytes(index: ConstantIndex) -> Vec<u8> {
        index.0.to_be_bytes().to_vec()
    }

    #[test]
    fn hello_world_main() {
        let arenas = TypeArenas::new();
        let types = TypeTable::new(&arenas);
        let string = types.get_class_type("java/lang/String").unwrap();
        let main = types
            .get_method_type(
                types.get_void(),
                vec![types.get_array_type(string, 1).unwrap()],
            )
            .unwrap();
        let println = types.get_method_type(types.get_void(), vec![string]).unwrap();

        let mut class = ClassBuilder::open("HelloWorld").unwrap();
        let message = class.add_string("Hello, World!").unwrap();
        let out = class
            .add_field_ref(
                "java/lang/System",
                "out",
                types.get_class_type("java/io/PrintStream").unwrap(),
            )
            .unwrap();
        let println = class
            .add_method_ref("java/io/PrintStream", "println", println)
            .unwrap();

        let flags = MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC;
        let mut method = class.enter_method("main", main, flags).unwrap();
        method
            .make_instruction(Opcode::GetStatic, index_bytes(out))
            .unwrap();
        method
            .make_instruction(Opcode::Ldc, vec![message.0 as u8])
            .unwrap();
        method
            .make_instruction(Opcode::InvokeVirtual, index_bytes(println))
            .unwrap();
        method.make_instruction(Opcode::Return, vec![]).unwrap();
        method.leave_method().unwrap();

        let class = class.build();
        let code = class.methods[0].code().unwrap();
        assert_eq!(code.max_stack, 2);
        assert_eq!(code.max_locals, 2);
        assert_eq!(code.code_length(), 9);
    }

    #[test]
    fn blocks_concatenate_in_creation_order() {
        let arenas = TypeArenas::new();
        let types = TypeTable::new(&arenas);
        let returns_int = types.get_method_type(types.get_int(), vec![]).unwrap();

        let mut class = ClassBuilder::open("A").unwrap();
        let mut method = class
            .enter_method("f", returns_int, MethodAccessFlags::STATIC)
            .unwrap();
        let entry = method.insertion_point();
        let exit = method.create_basic_block();
        assert_ne!(entry, exit);
        assert_eq!(method.insertion_point(), entry);

        method.set_insertion_point(exit);
        method.make_instruction(Opcode::IReturn, vec![]).unwrap();
        method.set_insertion_point(entry);
        method.make_instruction(Opcode::BIPush, vec![42]).unwrap();
        method.leave_method().unwrap();

        let class = class.build();
        let code = class.methods[0].code().unwrap();
        let opcodes: Vec<Opcode> = code
            .instructions
            .iter()
            .map(|(_, _, insn)| insn.opcode())
            .collect();
        assert_eq!(opcodes, vec![Opcode::BIPush, Opcode::IReturn]);
        assert_eq!(code.max_stack, 1);
        assert_eq!(code.max_locals, 1);
    }

    #[test]
    fn locals_limit() {
        let arenas = TypeArenas::new();
        let types = TypeTable::new(&arenas);
        let typ = types
            .get_method_type(types.get_void(), vec![types.get_long(), types.get_int()])
            .unwrap();

        let mut class = ClassBuilder::open("A").unwrap();
        let method = class
            .enter_method("g", typ, MethodAccessFlags::empty())
            .unwrap();
        method.leave_method().unwrap();
        let mut method = class
            .enter_method("h", typ, MethodAccessFlags::STATIC)
            .unwrap();
        method.set_locals_limit(5);
        method.leave_method().unwrap();

        let class = class.build();
        assert_eq!(class.methods[0].code().unwrap().max_locals, 3);
        assert_eq!(class.methods[1].code().unwrap().max_locals, 5);
    }

    #[test]
    fn native_methods_have_no_code() {
        let arenas = TypeArenas::new();
        let types = TypeTable::new(&arenas);
        let typ = types.get_method_type(types.get_void(), vec![]).unwrap();

        let mut class = ClassBuilder::open("A").unwrap();
        class
            .enter_method("n", typ, MethodAccessFlags::NATIVE)
            .unwrap()
            .leave_method()
            .unwrap();
        class
            .enter_method("a", typ, MethodAccessFlags::ABSTRACT)
            .unwrap()
            .leave_method()
            .unwrap();
        let class = class.build();
        assert!(class.methods.iter().all(|method| method.code().is_none()));
    }

    #[test]
    fn dropped_method_is_discarded() {
        let arenas = TypeArenas::new();
        let types = TypeTable::new(&arenas);
        let typ = types.get_method_type(types.get_int(), vec![]).unwrap();

        let mut class = ClassBuilder::open("A").unwrap();
        let mut method = class
            .enter_method("unfinished", typ, MethodAccessFlags::PUBLIC)
            .unwrap();
        method.make_instruction(Opcode::IConst0, vec![]).unwrap();
        drop(method);
        let class = class.build();

        assert!(class.methods.is_empty());
        let names: Vec<&Constant> = class
            .constants
            .iter()
            .map(|(_, constant)| constant)
            .filter(|constant| matches!(constant, Constant::Utf8(s) if s == "unfinished"))
            .collect();
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn constructor_is_init() {
        let arenas = TypeArenas::new();
        let types = TypeTable::new(&arenas);
        let typ = types.get_method_type(types.get_void(), vec![]).unwrap();

        let mut class = ClassBuilder::open("A").unwrap();
        let object_init = class.add_method_ref("java/lang/Object", "<init>", typ).unwrap();
        let mut init = class
            .enter_constructor(typ, MethodAccessFlags::PUBLIC)
            .unwrap();
        init.make_instruction(Opcode::ALoad0, vec![]).unwrap();
        init.make_instruction(Opcode::InvokeSpecial, index_bytes(object_init))
            .unwrap();
        init.make_instruction(Opcode::Return, vec![]).unwrap();
        init.leave_method().unwrap();

        let class: ClassFile = class.build();
        let method = &class.methods[0];
        assert_eq!(class.constants.get_utf8(method.name_index).unwrap(), "<init>");
        assert_eq!(class.constants.get_utf8(method.descriptor_index).unwrap(), "()V");
        assert_eq!(method.code().unwrap().max_stack, 1);
    }

    #[test]
    fn constants_reachable_while_building() {
        let arenas = TypeArenas::new();
        let types = TypeTable::new(&arenas);
        let typ = types.get_method_type(types.get_long(), vec![]).unwrap();

        let mut class = ClassBuilder::open("A").unwrap();
        let mut method = class.enter_method("big", typ, MethodAccessFlags::STATIC).unwrap();
        let long = method.constants().add_long(1 << 40).unwrap();
        method
            .make_instruction(Opcode::Ldc2W, index_bytes(long))
            .unwrap();
        method.make_instruction(Opcode::LReturn, vec![]).unwrap();
        method.leave_method().unwrap();

        let class = class.build();
        assert!(matches!(class.constants.get(long), Ok(Constant::Long(_))));
    }

    #[test]
    fn bad_instructions_and_signatures() {
        let arenas = TypeArenas::new();
        let types = TypeTable::new(&arenas);
        let typ = types.get_method_type(types.get_void(), vec![]).unwrap();

        let mut class = ClassBuilder::open("A").unwrap();
        assert!(matches!(
            class.enter_method("x", types.get_int(), MethodAccessFlags::empty()),
            Err(Error::ExpectedMethodType(_))
        ));

        let mut method = class.enter_method("y", typ, MethodAccessFlags::empty()).unwrap();
        assert!(matches!(
            method.make_instruction(Opcode::TableSwitch, vec![]),
            Err(Error::UnsupportedInstruction { opcode: 0xaa, .. })
        ));
        assert!(matches!(
            method.make_instruction(Opcode::BIPush, vec![]),
            Err(Error::InvalidOperandCount { expected: 1, found: 0, .. })
        ));
        method.leave_method().unwrap();
        assert_eq!(class.build().methods.len(), 1);
    }

    #[test]
    fn code_too_long() {
        let arenas = TypeArenas::new();
        let types = TypeTable::new(&arenas);
        let typ = types.get_method_type(types.get_void(), vec![]).unwrap();

        let mut class = ClassBuilder::open("A").unwrap();
        let mut method = class.enter_method("z", typ, MethodAccessFlags::empty()).unwrap();
        for _ in 0..=Code::MAX_CODE_LENGTH {
            method.make_instruction(Opcode::Nop, vec![]).unwrap();
        }
        assert!(matches!(
            method.leave_method(),
            Err(Error::MethodCodeOverflow(65536))
        ));
        assert!(class.build().methods.is_empty());
    }
}
