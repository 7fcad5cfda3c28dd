use jasm::jvm::builder::ClassBuilder;
use jasm::jvm::class_file::{ClassFile, Constant, ConstantIndex};
use jasm::jvm::code::Opcode;
use jasm::jvm::{Diagnostic, MethodAccessFlags, TypeArenas, TypeTable};

fn index_bytes(index: ConstantIndex) -> Vec<u8> {
    index.0.to_be_bytes().to_vec()
}

/// `public class HelloWorld` with a default constructor and a `main` that prints a greeting
fn hello_world() -> ClassFile {
    let arenas = TypeArenas::new();
    let types = TypeTable::new(&arenas);
    let string = types.get_class_type("java/lang/String").unwrap();
    let print_stream = types.get_class_type("java/io/PrintStream").unwrap();
    let constructor = types.get_method_type(types.get_void(), vec![]).unwrap();
    let main = types.from_descriptor("([Ljava/lang/String;)V").unwrap();
    let println = types.get_method_type(types.get_void(), vec![string]).unwrap();

    let mut class = ClassBuilder::open("HelloWorld").unwrap();
    class.set_source_file("HelloWorld.java").unwrap();

    let object_init = class
        .add_method_ref("java/lang/Object", "<init>", constructor)
        .unwrap();
    let mut init = class
        .enter_constructor(constructor, MethodAccessFlags::PUBLIC)
        .unwrap();
    init.make_instruction(Opcode::ALoad0, vec![]).unwrap();
    init.make_instruction(Opcode::InvokeSpecial, index_bytes(object_init))
        .unwrap();
    init.make_instruction(Opcode::Return, vec![]).unwrap();
    init.leave_method().unwrap();

    let message = class.add_string("Hello, World!").unwrap();
    let out = class
        .add_field_ref("java/lang/System", "out", print_stream)
        .unwrap();
    let println = class
        .add_method_ref("java/io/PrintStream", "println", println)
        .unwrap();

    let mut main = class
        .enter_method(
            "main",
            main,
            MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
        )
        .unwrap();
    main.make_instruction(Opcode::GetStatic, index_bytes(out))
        .unwrap();
    main.make_instruction(Opcode::Ldc, vec![message.0 as u8])
        .unwrap();
    main.make_instruction(Opcode::InvokeVirtual, index_bytes(println))
        .unwrap();
    main.make_instruction(Opcode::Return, vec![]).unwrap();
    main.leave_method().unwrap();

    class.build()
}

#[test]
fn starts_with_magic() {
    let bytes = hello_world().to_bytes().unwrap();
    assert_eq!(&bytes[..4], &[0xCA, 0xFE, 0xBA, 0xBE]);

    // Java 15
    assert_eq!(&bytes[4..8], &[0x00, 0x00, 0x00, 0x3B]);
}

#[test]
fn reread_pool_and_methods() {
    let bytes = hello_world().to_bytes().unwrap();
    let mut diagnostics: Vec<Diagnostic> = vec![];
    let class = ClassFile::from_bytes(&bytes, &mut diagnostics).unwrap();
    assert!(diagnostics.is_empty());

    let strings: Vec<&Constant> = class
        .constants
        .iter()
        .map(|(_, constant)| constant)
        .filter(|constant| matches!(constant, Constant::String(_)))
        .collect();
    assert_eq!(strings.len(), 1);

    let hello_world_classes = class
        .constants
        .iter()
        .filter(|(_, constant)| match constant {
            Constant::Class(name) => class.constants.get_utf8(*name).unwrap() == "HelloWorld",
            _ => false,
        })
        .count();
    assert_eq!(hello_world_classes, 1);

    assert_eq!(class.name().unwrap(), "HelloWorld");
    assert_eq!(class.methods.len(), 2);
    assert_eq!(class.fields.len(), 0);

    let main = &class.methods[1];
    assert_eq!(class.constants.get_utf8(main.name_index).unwrap(), "main");
    let code = main.code().unwrap();
    assert_eq!(code.max_stack, 2);
    assert_eq!(code.max_locals, 2);
}

#[test]
fn rewrite_is_identical() {
    let bytes = hello_world().to_bytes().unwrap();
    let class = ClassFile::from_bytes(&bytes, &mut Vec::<Diagnostic>::new()).unwrap();
    assert_eq!(class, hello_world());
    assert_eq!(class.to_bytes().unwrap(), bytes);
}
