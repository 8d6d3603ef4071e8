//! Disassembly and basic-block analysis

mod opcode;

use std::collections::BTreeSet;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DisassemblyError {
    #[error("empty bytecode")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub pc: usize,
    pub opcode: u8,
    pub name: String,
    pub operand: Vec<u8>,
}

impl Instruction {
    pub fn operand_hex(&self) -> Option<String> {
        (!self.operand.is_empty()).then(|| format!("0x{}", hex::encode(&self.operand)))
    }

    pub fn is_jump(&self) -> bool {
        matches!(self.opcode, opcode::JUMP | opcode::JUMPI)
    }
}

/// Inclusive PC range of one basic block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicBlock {
    pub start: usize,
    pub end: usize,
}

impl BasicBlock {
    pub fn contains(&self, pc: usize) -> bool {
        pc >= self.start && pc <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disassembly {
    pub instructions: Vec<Instruction>,
    pub blocks: Vec<BasicBlock>,
    pub jump_dests: BTreeSet<usize>,
}

impl Disassembly {
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Instructions belonging to `block_index`, or `None` for an invalid index.
    pub fn instructions_for_block(&self, block_index: usize) -> Option<&[Instruction]> {
        let block = self.blocks.get(block_index)?;
        let first = self
            .instructions
            .iter()
            .position(|inst| inst.pc >= block.start)?;
        let len = self.instructions[first..]
            .iter()
            .take_while(|inst| inst.pc <= block.end)
            .count();
        Some(&self.instructions[first..first + len])
    }

    pub fn find_block_containing_pc(&self, pc: usize) -> Option<usize> {
        self.blocks.iter().position(|block| block.contains(pc))
    }
}

/// Decode bytecode into instructions and split it into basic blocks.
///
/// A block starts at PC 0, at every JUMPDEST, and after every terminator.
pub fn disassemble(code: &[u8]) -> Result<Disassembly, DisassemblyError> {
    if code.is_empty() {
        return Err(DisassemblyError::Empty);
    }

    let mut instructions = Vec::new();
    let mut jump_dests = BTreeSet::new();
    let mut pc = 0;
    while pc < code.len() {
        let op = code[pc];
        let size = opcode::immediate_size(op);
        let end = (pc + 1 + size).min(code.len());
        if op == opcode::JUMPDEST {
            jump_dests.insert(pc);
        }
        instructions.push(Instruction {
            pc,
            opcode: op,
            name: opcode::name(op),
            operand: code[pc + 1..end].to_vec(),
        });
        pc += 1 + size;
    }

    let mut blocks = Vec::new();
    let mut start: Option<usize> = None;
    let mut last_pc = 0;
    for inst in &instructions {
        if inst.opcode == opcode::JUMPDEST {
            if let Some(open) = start.take() {
                blocks.push(BasicBlock {
                    start: open,
                    end: last_pc,
                });
            }
        }
        if start.is_none() {
            start = Some(inst.pc);
        }
        last_pc = inst.pc;
        if opcode::is_terminator(inst.opcode) {
            if let Some(open) = start.take() {
                blocks.push(BasicBlock {
                    start: open,
                    end: inst.pc,
                });
            }
        }
    }
    if let Some(open) = start {
        blocks.push(BasicBlock {
            start: open,
            end: last_pc,
        });
    }

    Ok(Disassembly {
        instructions,
        blocks,
        jump_dests,
    })
}

/// Target PC of the jump at `index`, resolved from an immediately preceding PUSH.
pub fn jump_destination(instructions: &[Instruction], index: usize) -> Option<usize> {
    let inst = instructions.get(index)?;
    if !inst.is_jump() || index == 0 {
        return None;
    }
    let push = &instructions[index - 1];
    if !opcode::is_push(push.opcode) {
        return None;
    }
    if push.operand.len() > std::mem::size_of::<usize>() {
        return None;
    }
    Some(
        push.operand
            .iter()
            .fold(0usize, |acc, byte| (acc << 8) | *byte as usize),
    )
}

pub fn find_instruction_index_by_pc(instructions: &[Instruction], pc: usize) -> Option<usize> {
    instructions.iter().position(|inst| inst.pc == pc)
}

#[cfg(test)]
mod tests {
    use super::*;

    // PUSH1 0x06 JUMP INVALID INVALID INVALID JUMPDEST PUSH1 0x00 STOP
    const JUMPY: [u8; 10] = [0x60, 0x06, 0x56, 0xfe, 0xfe, 0xfe, 0x5b, 0x60, 0x00, 0x00];

    #[test]
    fn test_empty_code_is_error() {
        assert_eq!(disassemble(&[]), Err(DisassemblyError::Empty));
    }

    #[test]
    fn test_blocks_split_at_terminators_and_jumpdests() {
        let dis = disassemble(&JUMPY).unwrap();
        assert_eq!(
            dis.blocks,
            vec![
                BasicBlock { start: 0, end: 2 },
                BasicBlock { start: 3, end: 3 },
                BasicBlock { start: 4, end: 4 },
                BasicBlock { start: 5, end: 5 },
                BasicBlock { start: 6, end: 9 },
            ]
        );
        assert!(dis.jump_dests.contains(&6));
        let last = dis.instructions_for_block(4).unwrap();
        assert_eq!(last.len(), 3);
        assert_eq!(last[0].name, "JUMPDEST");
        assert!(dis.instructions_for_block(5).is_none());
    }

    #[test]
    fn test_jump_destination_resolution() {
        let dis = disassemble(&JUMPY).unwrap();
        let first = dis.instructions_for_block(0).unwrap();
        assert_eq!(jump_destination(first, 1), Some(6));
        assert_eq!(jump_destination(first, 0), None);
        assert_eq!(dis.find_block_containing_pc(6), Some(4));
        let target = dis.instructions_for_block(4).unwrap();
        assert_eq!(find_instruction_index_by_pc(target, 6), Some(0));
        assert_eq!(dis.find_block_containing_pc(100), None);
    }

    #[test]
    fn test_truncated_push_operand() {
        let dis = disassemble(&[0x61, 0x01]).unwrap();
        assert_eq!(dis.instructions.len(), 1);
        assert_eq!(dis.instructions[0].operand, vec![0x01]);
        assert_eq!(dis.blocks, vec![BasicBlock { start: 0, end: 0 }]);
    }
}
