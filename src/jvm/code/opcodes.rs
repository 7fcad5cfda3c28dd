//! Table driven metadata for every opcode in the `0x00`-`0xCA` range

/// Static properties of an opcode
///
/// The stack counts are only used to approximate the maximum operand stack depth of a method, so
/// they are kept exactly as the builder expects them (and not necessarily as the verifier counts
/// slots).
#[derive(Debug, PartialEq, Eq)]
pub struct OpcodeInfo {
    pub opcode: Opcode,
    pub mnemonic: &'static str,

    /// Number of operand bytes following the opcode byte
    pub operand_bytes: usize,

    /// Number of operand stack entries consumed
    pub stack_in: usize,

    /// Number of operand stack entries produced
    pub stack_out: usize,
}

macro_rules! opcodes {
    ($(
        $byte:literal => $variant:ident($mnemonic:literal, $operands:literal, $pops:literal, $pushes:literal),
    )*) => {
        /// Opcode byte of an instruction
        ///
        /// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-6.html#jvms-6.5
        #[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
        #[repr(u8)]
        pub enum Opcode {
            $( $variant = $byte, )*
        }

        /// Opcode metadata, indexed by opcode byte
        pub static OPCODE_TABLE: [OpcodeInfo; 203] = [
            $(
                OpcodeInfo {
                    opcode: Opcode::$variant,
                    mnemonic: $mnemonic,
                    operand_bytes: $operands,
                    stack_in: $pops,
                    stack_out: $pushes,
                },
            )*
        ];
    };
}

opcodes! {
    0x00 => Nop("nop", 0, 0, 0),
    0x01 => AConstNull("aconst_null", 0, 0, 1),
    0x02 => IConstM1("iconst_m1", 0, 0, 1),
    0x03 => IConst0("iconst_0", 0, 0, 1),
    0x04 => IConst1("iconst_1", 0, 0, 1),
    0x05 => IConst2("iconst_2", 0, 0, 1),
    0x06 => IConst3("iconst_3", 0, 0, 1),
    0x07 => IConst4("iconst_4", 0, 0, 1),
    0x08 => IConst5("iconst_5", 0, 0, 1),
    0x09 => LConst0("lconst_0", 0, 0, 1),
    0x0A => LConst1("lconst_1", 0, 0, 1),
    0x0B => FConst0("fconst_0", 0, 0, 1),
    0x0C => FConst1("fconst_1", 0, 0, 1),
    0x0D => FConst2("fconst_2", 0, 0, 1),
    0x0E => DConst0("dconst_0", 0, 0, 1),
    0x0F => DConst1("dconst_1", 0, 0, 1),
    0x10 => BIPush("bipush", 1, 0, 1),
    0x11 => SIPush("sipush", 2, 0, 1),
    0x12 => Ldc("ldc", 1, 0, 1),
    0x13 => LdcW("ldc_w", 2, 0, 1),
    0x14 => Ldc2W("ldc2_w", 2, 0, 1),
    0x15 => ILoad("iload", 1, 0, 1),
    0x16 => LLoad("lload", 1, 0, 1),
    0x17 => FLoad("fload", 1, 0, 1),
    0x18 => DLoad("dload", 1, 0, 1),
    0x19 => ALoad("aload", 1, 0, 1),
    0x1A => ILoad0("iload_0", 0, 0, 1),
    0x1B => ILoad1("iload_1", 0, 0, 1),
    0x1C => ILoad2("iload_2", 0, 0, 1),
    0x1D => ILoad3("iload_3", 0, 0, 1),
    0x1E => LLoad0("lload_0", 0, 0, 1),
    0x1F => LLoad1("lload_1", 0, 0, 1),
    0x20 => LLoad2("lload_2", 0, 0, 1),
    0x21 => LLoad3("lload_3", 0, 0, 1),
    0x22 => FLoad0("fload_0", 0, 0, 1),
    0x23 => FLoad1("fload_1", 0, 0, 1),
    0x24 => FLoad2("fload_2", 0, 0, 1),
    0x25 => FLoad3("fload_3", 0, 0, 1),
    0x26 => DLoad0("dload_0", 0, 0, 1),
    0x27 => DLoad1("dload_1", 0, 0, 1),
    0x28 => DLoad2("dload_2", 0, 0, 1),
    0x29 => DLoad3("dload_3", 0, 0, 1),
    0x2A => ALoad0("aload_0", 0, 0, 1),
    0x2B => ALoad1("aload_1", 0, 0, 1),
    0x2C => ALoad2("aload_2", 0, 0, 1),
    0x2D => ALoad3("aload_3", 0, 0, 1),
    0x2E => IALoad("iaload", 0, 2, 1),
    0x2F => LALoad("laload", 0, 2, 1),
    0x30 => FALoad("faload", 0, 2, 1),
    0x31 => DALoad("daload", 0, 2, 1),
    0x32 => AALoad("aaload", 0, 2, 1),
    0x33 => BALoad("baload", 0, 2, 1),
    0x34 => CALoad("caload", 0, 2, 1),
    0x35 => SALoad("saload", 0, 2, 1),
    0x36 => IStore("istore", 1, 1, 0),
    0x37 => LStore("lstore", 1, 1, 0),
    0x38 => FStore("fstore", 1, 1, 0),
    0x39 => DStore("dstore", 1, 1, 0),
    0x3A => AStore("astore", 1, 1, 0),
    0x3B => IStore0("istore_0", 0, 1, 0),
    0x3C => IStore1("istore_1", 0, 1, 0),
    0x3D => IStore2("istore_2", 0, 1, 0),
    0x3E => IStore3("istore_3", 0, 1, 0),
    0x3F => LStore0("lstore_0", 0, 1, 0),
    0x40 => LStore1("lstore_1", 0, 1, 0),
    0x41 => LStore2("lstore_2", 0, 1, 0),
    0x42 => LStore3("lstore_3", 0, 1, 0),
    0x43 => FStore0("fstore_0", 0, 1, 0),
    0x44 => FStore1("fstore_1", 0, 1, 0),
    0x45 => FStore2("fstore_2", 0, 1, 0),
    0x46 => FStore3("fstore_3", 0, 1, 0),
    0x47 => DStore0("dstore_0", 0, 1, 0),
    0x48 => DStore1("dstore_1", 0, 1, 0),
    0x49 => DStore2("dstore_2", 0, 1, 0),
    0x4A => DStore3("dstore_3", 0, 1, 0),
    0x4B => AStore0("astore_0", 0, 1, 0),
    0x4C => AStore1("astore_1", 0, 1, 0),
    0x4D => AStore2("astore_2", 0, 1, 0),
    0x4E => AStore3("astore_3", 0, 1, 0),
    0x4F => IAStore("iastore", 0, 3, 0),
    0x50 => LAStore("lastore", 0, 3, 0),
    0x51 => FAStore("fastore", 0, 3, 0),
    0x52 => DAStore("dastore", 0, 3, 0),
    0x53 => AAStore("aastore", 0, 3, 0),
    0x54 => BAStore("bastore", 0, 3, 0),
    0x55 => CAStore("castore", 0, 3, 0),
    0x56 => SAStore("sastore", 0, 3, 0),
    0x57 => Pop("pop", 0, 1, 0),
    0x58 => Pop2("pop2", 0, 2, 0),
    0x59 => Dup("dup", 0, 1, 2),
    0x5A => DupX1("dup_x1", 0, 2, 3),
    0x5B => DupX2("dup_x2", 0, 3, 4),
    0x5C => Dup2("dup2", 0, 2, 4),
    0x5D => Dup2X1("dup2_x1", 0, 3, 5),
    0x5E => Dup2X2("dup2_x2", 0, 4, 6),
    0x5F => Swap("swap", 0, 2, 2),
    0x60 => IAdd("iadd", 0, 2, 1),
    0x61 => LAdd("ladd", 0, 2, 1),
    0x62 => FAdd("fadd", 0, 2, 1),
    0x63 => DAdd("dadd", 0, 2, 1),
    0x64 => ISub("isub", 0, 2, 1),
    0x65 => LSub("lsub", 0, 2, 1),
    0x66 => FSub("fsub", 0, 2, 1),
    0x67 => DSub("dsub", 0, 2, 1),
    0x68 => IMul("imul", 0, 2, 1),
    0x69 => LMul("lmul", 0, 2, 1),
    0x6A => FMul("fmul", 0, 2, 1),
    0x6B => DMul("dmul", 0, 2, 1),
    0x6C => IDiv("idiv", 0, 2, 1),
    0x6D => LDiv("ldiv", 0, 2, 1),
    0x6E => FDiv("fdiv", 0, 2, 1),
    0x6F => DDiv("ddiv", 0, 2, 1),
    0x70 => IRem("irem", 0, 2, 1),
    0x71 => LRem("lrem", 0, 2, 1),
    0x72 => FRem("frem", 0, 2, 1),
    0x73 => DRem("drem", 0, 2, 1),
    0x74 => INeg("ineg", 0, 1, 1),
    0x75 => LNeg("lneg", 0, 1, 1),
    0x76 => FNeg("fneg", 0, 1, 1),
    0x77 => DNeg("dneg", 0, 1, 1),
    0x78 => IShl("ishl", 0, 2, 1),
    0x79 => LShl("lshl", 0, 2, 1),
    0x7A => IShr("ishr", 0, 2, 1),
    0x7B => LShr("lshr", 0, 2, 1),
    0x7C => IUshr("iushr", 0, 2, 1),
    0x7D => LUshr("lushr", 0, 2, 1),
    0x7E => IAnd("iand", 0, 2, 1),
    0x7F => LAnd("land", 0, 2, 1),
    0x80 => IOr("ior", 0, 2, 1),
    0x81 => LOr("lor", 0, 2, 1),
    0x82 => IXor("ixor", 0, 2, 1),
    0x83 => LXor("lxor", 0, 2, 1),
    0x84 => IInc("iinc", 2, 0, 0),
    0x85 => I2L("i2l", 0, 1, 1),
    0x86 => I2F("i2f", 0, 1, 1),
    0x87 => I2D("i2d", 0, 1, 1),
    0x88 => L2I("l2i", 0, 1, 1),
    0x89 => L2F("l2f", 0, 1, 1),
    0x8A => L2D("l2d", 0, 1, 1),
    0x8B => F2I("f2i", 0, 1, 1),
    0x8C => F2L("f2l", 0, 1, 1),
    0x8D => F2D("f2d", 0, 1, 1),
    0x8E => D2I("d2i", 0, 1, 1),
    0x8F => D2L("d2l", 0, 1, 1),
    0x90 => D2F("d2f", 0, 1, 1),
    0x91 => I2B("i2b", 0, 1, 1),
    0x92 => I2C("i2c", 0, 1, 1),
    0x93 => I2S("i2s", 0, 1, 1),
    0x94 => LCmp("lcmp", 0, 2, 1),
    0x95 => FCmpl("fcmpl", 0, 2, 1),
    0x96 => FCmpg("fcmpg", 0, 2, 1),
    0x97 => DCmpl("dcmpl", 0, 2, 1),
    0x98 => DCmpg("dcmpg", 0, 2, 1),
    0x99 => IfEq("ifeq", 2, 1, 0),
    0x9A => IfNe("ifne", 2, 1, 0),
    0x9B => IfLt("iflt", 2, 1, 0),
    0x9C => IfGe("ifge", 2, 1, 0),
    0x9D => IfGt("ifgt", 2, 1, 0),
    0x9E => IfLe("ifle", 2, 1, 0),
    0x9F => IfICmpEq("if_icmpeq", 2, 2, 0),
    0xA0 => IfICmpNe("if_icmpne", 2, 2, 0),
    0xA1 => IfICmpLt("if_icmplt", 2, 2, 0),
    0xA2 => IfICmpGe("if_icmpge", 2, 2, 0),
    0xA3 => IfICmpGt("if_icmpgt", 2, 2, 0),
    0xA4 => IfICmpLe("if_icmple", 2, 2, 0),
    0xA5 => IfACmpEq("if_acmpeq", 2, 2, 0),
    0xA6 => IfACmpNe("if_acmpne", 2, 2, 0),
    0xA7 => Goto("goto", 2, 0, 0),
    0xA8 => Jsr("jsr", 2, 0, 1),
    0xA9 => Ret("ret", 1, 0, 0),
    0xAA => TableSwitch("tableswitch", 0, 0, 0),
    0xAB => LookupSwitch("lookupswitch", 0, 0, 0),
    0xAC => IReturn("ireturn", 0, 1, 0),
    0xAD => LReturn("lreturn", 0, 1, 0),
    0xAE => FReturn("freturn", 0, 1, 0),
    0xAF => DReturn("dreturn", 0, 1, 0),
    0xB0 => AReturn("areturn", 0, 1, 0),
    0xB1 => Return("return", 0, 0, 0),
    0xB2 => GetStatic("getstatic", 2, 0, 1),
    0xB3 => PutStatic("putstatic", 2, 1, 0),
    0xB4 => GetField("getfield", 2, 1, 1),
    0xB5 => PutField("putfield", 2, 2, 0),
    0xB6 => InvokeVirtual("invokevirtual", 2, 1, 0),
    0xB7 => InvokeSpecial("invokespecial", 2, 1, 0),
    0xB8 => InvokeStatic("invokestatic", 2, 0, 0),
    0xB9 => InvokeInterface("invokeinterface", 4, 1, 0),
    0xBA => InvokeDynamic("invokedynamic", 4, 0, 0),
    0xBB => New("new", 2, 0, 1),
    0xBC => NewArray("newarray", 1, 1, 1),
    0xBD => ANewArray("anewarray", 2, 1, 1),
    0xBE => ArrayLength("arraylength", 0, 1, 1),
    0xBF => AThrow("athrow", 0, 1, 1),
    0xC0 => CheckCast("checkcast", 2, 1, 1),
    0xC1 => InstanceOf("instanceof", 2, 1, 1),
    0xC2 => MonitorEnter("monitorenter", 0, 1, 0),
    0xC3 => MonitorExit("monitorexit", 0, 1, 0),
    0xC4 => Wide("wide", 0, 0, 0),
    0xC5 => MultiANewArray("multianewarray", 3, 1, 1),
    0xC6 => IfNull("ifnull", 2, 1, 0),
    0xC7 => IfNonNull("ifnonnull", 2, 1, 0),
    0xC8 => GotoW("goto_w", 4, 0, 0),
    0xC9 => JsrW("jsr_w", 4, 0, 1),
    0xCA => Breakpoint("breakpoint", 0, 0, 0),
}

impl Opcode {
    /// Look up an opcode from its byte (`None` for bytes past `0xCA`)
    pub fn from_u8(byte: u8) -> Option<Opcode> {
        OPCODE_TABLE.get(byte as usize).map(|info| info.opcode)
    }

    pub fn info(self) -> &'static OpcodeInfo {
        &OPCODE_TABLE[self as usize]
    }

    pub fn mnemonic(self) -> &'static str {
        self.info().mnemonic
    }

    /// Variable-length opcodes which can't be decoded from the table alone
    pub fn is_supported(self) -> bool {
        !matches!(
            self,
            Opcode::Wide | Opcode::TableSwitch | Opcode::LookupSwitch
        )
    }

    /// How many of the leading operand bytes form an index into the constant pool
    pub fn constant_index_bytes(self) -> usize {
        match self {
            Opcode::Ldc => 1,
            Opcode::LdcW
            | Opcode::Ldc2W
            | Opcode::GetStatic
            | Opcode::PutStatic
            | Opcode::GetField
            | Opcode::PutField
            | Opcode::InvokeVirtual
            | Opcode::InvokeSpecial
            | Opcode::InvokeStatic
            | Opcode::InvokeInterface
            | Opcode::InvokeDynamic
            | Opcode::New
            | Opcode::ANewArray
            | Opcode::CheckCast
            | Opcode::InstanceOf
            | Opcode::MultiANewArray => 2,
            _ => 0,
        }
    }
}
