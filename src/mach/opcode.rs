use super::{Address, Arg, Number};
use std::rc::Rc;

/// ## Virtual machine instruction set
///
/// The bc virtual machine has no registers besides `ibase`, `obase`
/// and `scale`. Every operation is performed on the operand stack.
///
/// For example: `a = 3 * b` compiles to
/// `[ConstRadix(3), Load(b), Mul, Store(a), Pop]`
///
/// Ids refer to the scalar, array or function namespace depending on
/// the instruction.

#[derive(Clone, PartialEq)]
pub enum Opcode {
    // *** Stack manipulation
    /// Push a number that is already converted.
    Const(Number),
    /// Push a literal converted with the `ibase` in effect when it runs.
    ConstRadix(Rc<str>),
    Zero,
    One,
    /// Push the visible value of a scalar.
    Load(usize),
    /// Store top of stack to a scalar, leaving the value on the stack.
    Store(usize),
    /// Pop an index, push the array element.
    LoadArray(usize),
    /// Pop a value and an index, store, push the value back.
    StoreArray(usize),
    /// Increment or decrement a scalar in place.
    Incr(usize),
    Decr(usize),
    /// Pop an index and step that element in place.
    IncrArray(usize),
    DecrArray(usize),
    Dup,
    Pop,
    Swap,

    // *** Branch control
    Jump(Address),
    /// Pop and branch if zero.
    JumpIfZero(Address),
    /// Pop and branch if not zero.
    JumpIfNonZero(Address),
    /// Scalar arguments are on the stack in declaration order.
    Call(usize, Rc<[Arg]>),
    /// Pop the return value and resume the caller.
    Return,

    // *** Statements
    /// Pop and print with a newline, remembering the value in `last`.
    Print,
    /// Pop and print without a newline, remembering the value in `last`.
    PrintInline,
    /// Print text verbatim.
    Write(Rc<str>),
    Halt,

    // *** Expression operations
    Neg,
    Pow,
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Not,

    // *** Built-in functions
    Length,
    Scale,
    Sqrt,
}

impl std::fmt::Debug for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Opcode::*;
        match self {
            Const(n) => write!(f, "CONST({})", n),
            ConstRadix(s) => write!(f, "CONST({})", s),
            Zero => write!(f, "ZERO"),
            One => write!(f, "ONE"),
            Load(id) => write!(f, "LOAD({})", id),
            Store(id) => write!(f, "STORE({})", id),
            LoadArray(id) => write!(f, "LOADARR({})", id),
            StoreArray(id) => write!(f, "STOREARR({})", id),
            Incr(id) => write!(f, "INCR({})", id),
            Decr(id) => write!(f, "DECR({})", id),
            IncrArray(id) => write!(f, "INCRARR({})", id),
            DecrArray(id) => write!(f, "DECRARR({})", id),
            Dup => write!(f, "DUP"),
            Pop => write!(f, "POP"),
            Swap => write!(f, "SWAP"),

            Jump(a) => write!(f, "JUMP({})", a),
            JumpIfZero(a) => write!(f, "JZ({})", a),
            JumpIfNonZero(a) => write!(f, "JNZ({})", a),
            Call(id, args) => {
                write!(f, "CALL({}", id)?;
                for arg in args.iter() {
                    match arg {
                        Arg::Value => write!(f, ",V")?,
                        Arg::Array(a) => write!(f, ",A{}", a)?,
                    }
                }
                write!(f, ")")
            }
            Return => write!(f, "RETURN"),

            Print => write!(f, "PRINT"),
            PrintInline => write!(f, "PRINTI"),
            Write(s) => write!(f, "WRITE({:?})", s),
            Halt => write!(f, "HALT"),

            Neg => write!(f, "NEG"),
            Pow => write!(f, "POW"),
            Mul => write!(f, "MUL"),
            Div => write!(f, "DIV"),
            Mod => write!(f, "MOD"),
            Add => write!(f, "ADD"),
            Sub => write!(f, "SUB"),
            Eq => write!(f, "EQ"),
            Ne => write!(f, "NE"),
            Lt => write!(f, "LT"),
            Le => write!(f, "LE"),
            Gt => write!(f, "GT"),
            Ge => write!(f, "GE"),
            Not => write!(f, "NOT"),

            Length => write!(f, "LENGTH"),
            Scale => write!(f, "SCALE"),
            Sqrt => write!(f, "SQRT"),
        }
    }
}
