/*!
## Rust Machine Module

This Rust module is the arbitrary precision number engine, the storage
for variables, arrays and functions, and the virtual machine that
runs compiled bc.

*/

pub type Address = usize;
pub type Symbol = isize;

mod codegen;
mod config;
mod function;
mod link;
mod number;
mod opcode;
mod operation;
mod output;
mod program;
mod runtime;
mod stack;
mod symbol;
mod var;

#[cfg(test)]
mod tests;

pub use codegen::codegen;
pub use config::{Config, Portability};
pub use function::{Arg, Function, Param};
pub use link::Link;
pub use number::Number;
pub use opcode::Opcode;
pub use operation::Operation;
pub use output::{Output, LINE_LENGTH};
pub use program::Program;
pub use runtime::{Event, Runtime, State};
pub use stack::Stack;
pub use symbol::{Namespace, SymbolTable, MAX_STORE};
pub use var::Var;
