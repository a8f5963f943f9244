use super::Opcode;
use std::rc::Rc;

/// A parameter or auto local as declared by a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    Scalar(usize),
    Array(usize),
}

/// What a call site passes for each parameter. Scalar values travel on
/// the operand stack; arrays are named by the caller's array id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arg {
    Value,
    Array(usize),
}

/// ## User defined function
///
/// Replaced as a whole when the function is defined again.

#[derive(Debug, Clone)]
pub struct Function {
    name: Rc<str>,
    defined: bool,
    params: Rc<[Param]>,
    autos: Rc<[Param]>,
    code: Rc<[Opcode]>,
}

impl Function {
    pub fn undefined(name: &str) -> Function {
        Function {
            name: name.into(),
            defined: false,
            params: Rc::from(vec![]),
            autos: Rc::from(vec![]),
            code: Rc::from(vec![]),
        }
    }

    pub fn new(name: &str, params: Vec<Param>, autos: Vec<Param>, code: Vec<Opcode>) -> Function {
        Function {
            name: name.into(),
            defined: true,
            params: params.into(),
            autos: autos.into(),
            code: code.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_defined(&self) -> bool {
        self.defined
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn autos(&self) -> &[Param] {
        &self.autos
    }

    pub fn code(&self) -> &Rc<[Opcode]> {
        &self.code
    }
}
