use super::{Address, Link, Opcode, Symbol};
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

/// ## Code segment under construction

#[derive(Debug, Default)]
pub struct Program {
    ops: Vec<Opcode>,
    link: Link,
}

impl Program {
    pub fn new() -> Program {
        Program::default()
    }

    pub fn push(&mut self, op: Opcode) {
        self.ops.push(op)
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[Opcode] {
        &self.ops
    }

    pub fn last(&self) -> Option<&Opcode> {
        self.ops.last()
    }

    pub fn label(&mut self) -> Symbol {
        self.link.next_symbol()
    }

    /// Binds `sym` to the next instruction.
    pub fn place(&mut self, sym: Symbol) {
        let addr: Address = self.ops.len();
        self.link.insert(sym, addr);
    }

    /// Pushes a jump whose target is resolved by `finish`.
    pub fn push_jump(&mut self, op: Opcode, sym: Symbol) {
        self.link.link_addr_to_symbol(self.ops.len(), sym);
        self.ops.push(op);
    }

    pub fn clear(&mut self) {
        self.ops.clear();
        self.link.clear();
    }

    pub fn finish(&mut self) -> Result<Vec<Opcode>> {
        self.link.link(&mut self.ops)?;
        Ok(std::mem::take(&mut self.ops))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_and_backward_jumps() {
        let mut p = Program::new();
        let top = p.label();
        let done = p.label();
        p.place(top);
        p.push(Opcode::One);
        p.push_jump(Opcode::JumpIfZero(0), done);
        p.push_jump(Opcode::Jump(0), top);
        p.place(done);
        p.push(Opcode::Halt);
        let ops = p.finish().unwrap();
        assert_eq!(ops[1], Opcode::JumpIfZero(3));
        assert_eq!(ops[2], Opcode::Jump(0));
        assert!(p.is_empty());
    }

    #[test]
    fn test_unplaced_label_fails() {
        let mut p = Program::new();
        let nowhere = p.label();
        p.push_jump(Opcode::Jump(0), nowhere);
        assert!(p.finish().is_err());
    }
}
