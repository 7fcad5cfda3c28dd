use crate::jvm::class_file::{Attribute, ClassFile, Code, ConstantPool, Utf8ConstantIndex};
use std::borrow::Cow;
use std::fmt;

/// Human readable listing of a class file, in an assembler-like syntax
///
/// ```text
/// .version 59.0
/// .class public super HelloWorld
/// .super java/lang/Object
///
///     #1 = Utf8               "HelloWorld"
///     #2 = Class              HelloWorld
///     ...
///
/// .method public static main([Ljava/lang/String;)V
///   .limit stack 2
///   .limit locals 1
///      0: getstatic #12       // java/lang/System.out:Ljava/io/PrintStream;
///      ...
/// .end method
/// ```
///
/// Anything that doesn't resolve in the constant pool is printed as `?` instead of failing.
pub struct Listing<'a>(pub &'a ClassFile);

fn header(f: &mut fmt::Formatter<'_>, directive: &str, flags: &dyn fmt::Display) -> fmt::Result {
    let flags = flags.to_string();
    if flags.is_empty() {
        write!(f, ".{} ", directive)
    } else {
        write!(f, ".{} {} ", directive, flags)
    }
}

fn utf8(constants: &ConstantPool, index: Utf8ConstantIndex) -> Cow<'_, str> {
    constants.get_utf8_lossy(index).unwrap_or(Cow::Borrowed("?"))
}

fn write_code(f: &mut fmt::Formatter<'_>, constants: &ConstantPool, code: &Code) -> fmt::Result {
    writeln!(f, "  .limit stack {}", code.max_stack)?;
    writeln!(f, "  .limit locals {}", code.max_locals)?;
    for (offset, _, instruction) in &code.instructions {
        let rendered = instruction.to_string();
        match instruction.constant_index() {
            Some(index) => writeln!(
                f,
                "  {:>4}: {:<24}// {}",
                offset.0,
                rendered,
                constants.describe(index)
            )?,
            None => writeln!(f, "  {:>4}: {}", offset.0, rendered)?,
        }
    }
    for handler in &code.exception_table {
        let catch_type = match handler.catch_type {
            Some(class) => constants.get_class_name(class).unwrap_or("?"),
            None => "any",
        };
        writeln!(
            f,
            "  .catch {} from {} to {} using {}",
            catch_type, handler.start_pc, handler.end_pc, handler.handler_pc
        )?;
    }
    for attribute in &code.attributes {
        if let Attribute::LineNumberTable { line_numbers, .. } = attribute {
            for line_number in line_numbers {
                writeln!(
                    f,
                    "  .line {} {}",
                    line_number.line_number, line_number.start_pc
                )?;
            }
        }
    }
    Ok(())
}

impl<'a> fmt::Display for Listing<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let class = self.0;
        let constants = &class.constants;

        writeln!(f, ".version {}", class.version)?;
        header(f, "class", &class.access_flags)?;
        writeln!(f, "{}", class.name().unwrap_or("?"))?;
        if let Ok(Some(super_name)) = class.super_name() {
            writeln!(f, ".super {}", super_name)?;
        }
        for interface in &class.interfaces {
            writeln!(
                f,
                ".implements {}",
                constants.get_class_name(*interface).unwrap_or("?")
            )?;
        }
        for attribute in &class.attributes {
            if let Attribute::SourceFile { source_file, .. } = attribute {
                writeln!(f, ".source {}", utf8(constants, *source_file))?;
            }
        }

        writeln!(f)?;
        for (index, constant) in constants.iter() {
            writeln!(
                f,
                "{:>6} = {:<18} {}",
                format!("#{}", index.0),
                constant.kind_name(),
                constants.describe(index)
            )?;
        }

        for field in &class.fields {
            writeln!(f)?;
            header(f, "field", &field.access_flags)?;
            write!(
                f,
                "{} {}",
                utf8(constants, field.name_index),
                utf8(constants, field.descriptor_index)
            )?;
            for attribute in &field.attributes {
                if let Attribute::ConstantValue { value, .. } = attribute {
                    write!(f, " = {}", constants.describe(*value))?;
                }
            }
            writeln!(f)?;
        }

        for method in &class.methods {
            writeln!(f)?;
            header(f, "method", &method.access_flags)?;
            writeln!(
                f,
                "{}{}",
                utf8(constants, method.name_index),
                utf8(constants, method.descriptor_index)
            )?;
            if let Some(code) = method.code() {
                write_code(f, constants, code)?;
            }
            writeln!(f, ".end method")?;
        }

        Ok(())
    }
}
