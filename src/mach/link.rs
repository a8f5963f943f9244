use super::{Address, Opcode, Symbol};
use crate::error;
use crate::lang::Error;
use std::collections::HashMap;

type Result<T> = std::result::Result<T, Error>;

/// ## Jump labels
///
/// Labels are created before their address is known; jumps to them are
/// patched once the code segment is complete.

#[derive(Debug, Default)]
pub struct Link {
    next_symbol: Symbol,
    symbols: HashMap<Symbol, Address>,
    unlinked: Vec<(Address, Symbol)>,
}

impl Link {
    pub fn new() -> Link {
        Link::default()
    }

    pub fn clear(&mut self) {
        self.next_symbol = 0;
        self.symbols.clear();
        self.unlinked.clear();
    }

    pub fn next_symbol(&mut self) -> Symbol {
        self.next_symbol += 1;
        self.next_symbol
    }

    pub fn insert(&mut self, sym: Symbol, addr: Address) {
        self.symbols.insert(sym, addr);
    }

    pub fn link_addr_to_symbol(&mut self, addr: Address, symbol: Symbol) {
        self.unlinked.push((addr, symbol));
    }

    pub fn link(&mut self, ops: &mut [Opcode]) -> Result<()> {
        for (op_addr, symbol) in std::mem::take(&mut self.unlinked) {
            let dest = match self.symbols.get(&symbol) {
                Some(dest) => *dest,
                None => return Err(error!(InternalError; "LINK FAILURE")),
            };
            match ops.get_mut(op_addr) {
                Some(Opcode::Jump(addr))
                | Some(Opcode::JumpIfZero(addr))
                | Some(Opcode::JumpIfNonZero(addr)) => *addr = dest,
                _ => return Err(error!(InternalError; "LINK FAILURE")),
            }
        }
        self.clear();
        Ok(())
    }
}
