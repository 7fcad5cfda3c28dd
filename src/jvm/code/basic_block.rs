use crate::jvm::code::Instruction;
use crate::util::{OffsetVec, Width};

/// Straight-line run of instructions accumulated by the builder
///
/// Blocks are concatenated in creation order once the method is finished, so the offsets inside
/// a block are only relative to the start of that block.
#[derive(Debug, Eq, PartialEq, Clone, Default)]
pub struct BasicBlock {
    pub instructions: OffsetVec<Instruction>,
}

impl Width for BasicBlock {
    fn width(&self) -> usize {
        self.instructions.total_width()
    }
}

impl BasicBlock {
    pub fn new() -> BasicBlock {
        BasicBlock {
            instructions: OffsetVec::new(),
        }
    }

    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Maximum operand stack depth reached when running the blocks one after another
    ///
    /// This is a single pass over the instructions in emission order, tracking the running depth
    /// and its peak. Branches are not followed, so code where control flow merges at different
    /// stack heights can get an inaccurate result.
    pub fn max_stack_depth<'a>(blocks: impl IntoIterator<Item = &'a BasicBlock>) -> usize {
        let mut depth: isize = 0;
        let mut max_depth: isize = 0;
        for block in blocks {
            for (_, _, instruction) in &block.instructions {
                depth -= instruction.stack_in() as isize;
                depth += instruction.stack_out() as isize;
                max_depth = max_depth.max(depth);
            }
        }
        max_depth as usize
    }
}
