use std::fmt;

/// Recoverable anomalies noticed while reading a class file
///
/// None of these stop a read. Problems that do (bad magic, truncated input, variable-length
/// instructions, ...) are returned as [`Error`](crate::jvm::Error)s, sometimes after also being
/// reported here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Attribute with a name we don't parse, skipped over
    UnknownAttribute { name: String, length: u32 },

    /// Instruction whose length can't be determined from the opcode table
    UnsupportedInstruction { opcode: u8, offset: usize },

    /// Byte that isn't an opcode at all
    InvalidOpcode { opcode: u8, offset: usize },

    /// Known attribute whose declared length exceeds what its parser consumed
    TrailingAttributeBytes {
        name: String,
        declared: u32,
        consumed: u32,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnknownAttribute { name, length } => {
                write!(f, "skipping unknown attribute {:?} ({} bytes)", name, length)
            }
            Diagnostic::UnsupportedInstruction { opcode, offset } => write!(
                f,
                "unsupported instruction 0x{:02X} at offset {}",
                opcode, offset
            ),
            Diagnostic::InvalidOpcode { opcode, offset } => {
                write!(f, "invalid opcode 0x{:02X} at offset {}", opcode, offset)
            }
            Diagnostic::TrailingAttributeBytes {
                name,
                declared,
                consumed,
            } => write!(
                f,
                "attribute {:?} declares {} bytes but only {} were used",
                name, declared, consumed
            ),
        }
    }
}

/// Somewhere to send diagnostics
///
/// The sink is always passed in explicitly by the caller of a read, so there is no global state
/// to reset between inputs.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Forwards every diagnostic to `log::warn!`
#[derive(Copy, Clone, Default, Debug)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        log::warn!("{}", diagnostic);
    }
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

impl<F: FnMut(Diagnostic)> DiagnosticSink for F {
    fn report(&mut self, diagnostic: Diagnostic) {
        self(diagnostic)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn report_twice(sink: &mut dyn DiagnosticSink) {
        sink.report(Diagnostic::UnknownAttribute {
            name: String::from("Deprecated"),
            length: 0,
        });
        sink.report(Diagnostic::InvalidOpcode {
            opcode: 0xFE,
            offset: 3,
        });
    }

    #[test]
    fn collecting_sink() {
        let mut collected: Vec<Diagnostic> = vec![];
        report_twice(&mut collected);
        assert_eq!(collected.len(), 2);
        assert_eq!(
            collected[1].to_string(),
            "invalid opcode 0xFE at offset 3"
        );
    }

    #[test]
    fn closure_sink() {
        let mut count = 0;
        report_twice(&mut |_: Diagnostic| count += 1);
        assert_eq!(count, 2);
    }
}
