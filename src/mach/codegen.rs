use super::var::{BASE_MAX, DIM_MAX, IBASE, LAST, OBASE, SCALE, SCALE_MAX};
use super::{Arg, Namespace, Opcode, Param, Runtime, Symbol, MAX_STORE};
use crate::error;
use crate::lang::ast::{self, Argument, Declared, Expression, PrintItem, Statement, Variable};
use crate::lang::token::Operator;
use crate::lang::{Error, ErrorCode};
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// Compiles one parsed unit into the runtime. Statement lists are queued
/// for execution; definitions replace the function record. Nothing is
/// kept when an error is returned.
pub fn codegen(runtime: &mut Runtime, unit: &ast::Unit) -> Result<()> {
    let result = match unit {
        ast::Unit::Statements(statements) => {
            Generator::new(runtime, false).statements(statements)
        }
        ast::Unit::Define(define) => Generator::new(runtime, true).define(define),
    };
    if result.is_err() {
        runtime.discard();
    }
    result
}

struct Generator<'a> {
    rt: &'a mut Runtime,
    /// (continue, break) targets of the enclosing loops.
    loops: Vec<(Symbol, Symbol)>,
    in_function: bool,
}

impl<'a> Generator<'a> {
    fn new(rt: &'a mut Runtime, in_function: bool) -> Generator<'a> {
        Generator {
            rt,
            loops: vec![],
            in_function,
        }
    }

    fn statements(mut self, statements: &[Statement]) -> Result<()> {
        for statement in statements {
            self.statement(statement)?;
        }
        self.rt.commit()
    }

    fn define(mut self, define: &ast::Define) -> Result<()> {
        let err = |code: ErrorCode| -> Result<()> {
            Err(Error::new(code).in_line_number(define.line))
        };
        for (i, p) in define.params.iter().enumerate() {
            if define.params[..i].contains(p) {
                return err(ErrorCode::DuplicateParameter);
            }
        }
        for (i, a) in define.autos.iter().enumerate() {
            if define.autos[..i].contains(a) {
                return err(ErrorCode::DuplicateAuto);
            }
            if define.params.contains(a) {
                return err(ErrorCode::ParameterAndAuto);
            }
        }
        let fid = self.rt.register_identifier(&define.name, Namespace::Function)?;
        let params = self.declarations(&define.params)?;
        let autos = self.declarations(&define.autos)?;
        for statement in &define.body {
            self.statement(statement)?;
        }
        self.rt.emit(Opcode::Zero);
        self.rt.emit(Opcode::Return);
        self.rt.define(fid, params, autos)
    }

    fn declarations(&mut self, declared: &[Declared]) -> Result<Vec<Param>> {
        let mut v = Vec::with_capacity(declared.len());
        for d in declared {
            v.push(match d {
                Declared::Scalar(name) => {
                    Param::Scalar(self.rt.register_identifier(name, Namespace::Scalar)?)
                }
                Declared::Array(name) => {
                    Param::Array(self.rt.register_identifier(name, Namespace::Array)?)
                }
            });
        }
        Ok(v)
    }

    fn statement(&mut self, statement: &Statement) -> Result<()> {
        match statement {
            Statement::Expression(_, expr) => {
                self.expression(expr)?;
                if expr.is_assignment() {
                    self.rt.emit(Opcode::Pop);
                } else {
                    self.rt.emit(Opcode::Print);
                }
            }
            Statement::String(_, s) => self.rt.emit(Opcode::Write(s.as_str().into())),
            Statement::Print(_, items) => {
                for item in items {
                    match item {
                        PrintItem::String(s) => {
                            self.rt.emit(Opcode::Write(unescape(s).into()))
                        }
                        PrintItem::Expression(expr) => {
                            self.expression(expr)?;
                            self.rt.emit(Opcode::PrintInline);
                        }
                    }
                }
            }
            Statement::Block(_, list) => {
                for statement in list {
                    self.statement(statement)?;
                }
            }
            Statement::If(_, cond, then, otherwise) => self.r#if(cond, then, otherwise)?,
            Statement::While(_, cond, body) => self.r#while(cond, body)?,
            Statement::For(_, init, cond, step, body) => self.r#for(init, cond, step, body)?,
            Statement::Break(line) => match self.loops.last() {
                Some(&(_, exit)) => self.rt.emit_jump(Opcode::Jump(0), exit),
                None => return Err(error!(BreakOutsideLoop, *line)),
            },
            Statement::Continue(line) => match self.loops.last() {
                Some(&(next, _)) => self.rt.emit_jump(Opcode::Jump(0), next),
                None => return Err(error!(ContinueOutsideLoop, *line)),
            },
            Statement::Return(line, expr) => {
                if !self.in_function {
                    return Err(error!(ReturnOutsideFunction, *line));
                }
                match expr {
                    Some(expr) => self.expression(expr)?,
                    None => self.rt.emit(Opcode::Zero),
                }
                self.rt.emit(Opcode::Return);
            }
            Statement::Halt(_) => self.rt.emit(Opcode::Halt),
            Statement::Limits(_) => self.rt.emit(Opcode::Write(limits().into())),
            Statement::Empty(_) => {}
        }
        Ok(())
    }

    fn r#if(
        &mut self,
        cond: &Expression,
        then: &Statement,
        otherwise: &Option<Box<Statement>>,
    ) -> Result<()> {
        let else_sym = self.rt.label();
        self.expression(cond)?;
        self.rt.emit_jump(Opcode::JumpIfZero(0), else_sym);
        self.statement(then)?;
        match otherwise {
            Some(otherwise) => {
                let done = self.rt.label();
                self.rt.emit_jump(Opcode::Jump(0), done);
                self.rt.place(else_sym);
                self.statement(otherwise)?;
                self.rt.place(done);
            }
            None => self.rt.place(else_sym),
        }
        Ok(())
    }

    fn r#while(&mut self, cond: &Expression, body: &Statement) -> Result<()> {
        let top = self.rt.label();
        let done = self.rt.label();
        self.rt.place(top);
        self.expression(cond)?;
        self.rt.emit_jump(Opcode::JumpIfZero(0), done);
        self.loops.push((top, done));
        let result = self.statement(body);
        self.loops.pop();
        result?;
        self.rt.emit_jump(Opcode::Jump(0), top);
        self.rt.place(done);
        Ok(())
    }

    fn r#for(
        &mut self,
        init: &Option<Expression>,
        cond: &Option<Expression>,
        step: &Option<Expression>,
        body: &Statement,
    ) -> Result<()> {
        let top = self.rt.label();
        let next = self.rt.label();
        let done = self.rt.label();
        if let Some(init) = init {
            self.expression(init)?;
            self.rt.emit(Opcode::Pop);
        }
        self.rt.place(top);
        match cond {
            Some(cond) => self.expression(cond)?,
            None => self.rt.emit(Opcode::One),
        }
        self.rt.emit_jump(Opcode::JumpIfZero(0), done);
        self.loops.push((next, done));
        let result = self.statement(body);
        self.loops.pop();
        result?;
        self.rt.place(next);
        if let Some(step) = step {
            self.expression(step)?;
            self.rt.emit(Opcode::Pop);
        }
        self.rt.emit_jump(Opcode::Jump(0), top);
        self.rt.place(done);
        Ok(())
    }

    fn expression(&mut self, expr: &Expression) -> Result<()> {
        fn unary(this: &mut Generator, expr: &Expression, op: Opcode) -> Result<()> {
            this.expression(expr)?;
            this.rt.emit(op);
            Ok(())
        }
        fn binary(
            this: &mut Generator,
            lhs: &Expression,
            rhs: &Expression,
            op: Opcode,
        ) -> Result<()> {
            this.expression(lhs)?;
            this.expression(rhs)?;
            this.rt.emit(op);
            Ok(())
        }
        // The left value decides when it is already the answer.
        fn logical(
            this: &mut Generator,
            lhs: &Expression,
            rhs: &Expression,
            jump: Opcode,
        ) -> Result<()> {
            let done = this.rt.label();
            this.expression(lhs)?;
            this.rt.emit(Opcode::Dup);
            this.rt.emit_jump(jump, done);
            this.rt.emit(Opcode::Pop);
            this.expression(rhs)?;
            this.rt.place(done);
            this.rt.emit(Opcode::Not);
            this.rt.emit(Opcode::Not);
            Ok(())
        }
        match expr {
            Expression::Number(s) => self.rt.emit(match s.as_str() {
                "0" => Opcode::Zero,
                "1" => Opcode::One,
                _ => Opcode::ConstRadix(s.as_str().into()),
            }),
            Expression::Variable(var) => self.load(var)?,
            Expression::Paren(expr) => self.expression(expr)?,
            Expression::Call(name, args) => self.call(name, args)?,
            Expression::Length(expr) => unary(self, expr, Opcode::Length)?,
            Expression::Scale(expr) => unary(self, expr, Opcode::Scale)?,
            Expression::Sqrt(expr) => unary(self, expr, Opcode::Sqrt)?,
            Expression::Negation(expr) => unary(self, expr, Opcode::Neg)?,
            Expression::Not(expr) => unary(self, expr, Opcode::Not)?,
            Expression::Power(l, r) => binary(self, l, r, Opcode::Pow)?,
            Expression::Multiply(l, r) => binary(self, l, r, Opcode::Mul)?,
            Expression::Divide(l, r) => binary(self, l, r, Opcode::Div)?,
            Expression::Modulo(l, r) => binary(self, l, r, Opcode::Mod)?,
            Expression::Add(l, r) => binary(self, l, r, Opcode::Add)?,
            Expression::Subtract(l, r) => binary(self, l, r, Opcode::Sub)?,
            Expression::Equal(l, r) => binary(self, l, r, Opcode::Eq)?,
            Expression::NotEqual(l, r) => binary(self, l, r, Opcode::Ne)?,
            Expression::Less(l, r) => binary(self, l, r, Opcode::Lt)?,
            Expression::LessEqual(l, r) => binary(self, l, r, Opcode::Le)?,
            Expression::Greater(l, r) => binary(self, l, r, Opcode::Gt)?,
            Expression::GreaterEqual(l, r) => binary(self, l, r, Opcode::Ge)?,
            Expression::And(l, r) => logical(self, l, r, Opcode::JumpIfZero(0))?,
            Expression::Or(l, r) => logical(self, l, r, Opcode::JumpIfNonZero(0))?,
            Expression::Assign(var, op, rhs) => self.assign(var, *op, rhs)?,
            Expression::PreIncrement(var) => self.step(var, true, true)?,
            Expression::PreDecrement(var) => self.step(var, false, true)?,
            Expression::PostIncrement(var) => self.step(var, true, false)?,
            Expression::PostDecrement(var) => self.step(var, false, false)?,
        }
        Ok(())
    }

    fn scalar_id(&mut self, var: &Variable) -> Result<Option<usize>> {
        Ok(Some(match var {
            Variable::Scalar(name) => self.rt.register_identifier(name, Namespace::Scalar)?,
            Variable::Ibase => IBASE,
            Variable::Obase => OBASE,
            Variable::Scale => SCALE,
            Variable::Last => LAST,
            Variable::Array(..) => return Ok(None),
        }))
    }

    // Pushes the element index and returns the array id.
    fn array_element(&mut self, name: &str, index: &Expression) -> Result<usize> {
        let id = self.rt.register_identifier(name, Namespace::Array)?;
        self.expression(index)?;
        Ok(id)
    }

    fn load(&mut self, var: &Variable) -> Result<()> {
        match var {
            Variable::Array(name, index) => {
                let id = self.array_element(name, index)?;
                self.rt.emit(Opcode::LoadArray(id));
            }
            _ => {
                if let Some(id) = self.scalar_id(var)? {
                    self.rt.emit(Opcode::Load(id));
                }
            }
        }
        Ok(())
    }

    fn assign(&mut self, var: &Variable, op: Option<Operator>, rhs: &Expression) -> Result<()> {
        let op = match op {
            None => None,
            Some(Operator::Plus) => Some(Opcode::Add),
            Some(Operator::Minus) => Some(Opcode::Sub),
            Some(Operator::Multiply) => Some(Opcode::Mul),
            Some(Operator::Divide) => Some(Opcode::Div),
            Some(Operator::Modulo) => Some(Opcode::Mod),
            Some(Operator::Caret) => Some(Opcode::Pow),
            Some(_) => return Err(error!(InternalError; "BAD ASSIGNMENT OPERATOR")),
        };
        match var {
            Variable::Array(name, index) => {
                let id = self.array_element(name, index)?;
                if let Some(op) = op {
                    self.rt.emit(Opcode::Dup);
                    self.rt.emit(Opcode::LoadArray(id));
                    self.expression(rhs)?;
                    self.rt.emit(op);
                } else {
                    self.expression(rhs)?;
                }
                self.rt.emit(Opcode::StoreArray(id));
            }
            _ => {
                let id = match self.scalar_id(var)? {
                    Some(id) => id,
                    None => return Err(error!(InternalError)),
                };
                if let Some(op) = op {
                    self.rt.emit(Opcode::Load(id));
                    self.expression(rhs)?;
                    self.rt.emit(op);
                } else {
                    self.expression(rhs)?;
                }
                self.rt.emit(Opcode::Store(id));
            }
        }
        Ok(())
    }

    fn step(&mut self, var: &Variable, up: bool, pre: bool) -> Result<()> {
        match var {
            Variable::Array(name, index) => {
                let id = self.array_element(name, index)?;
                let op = if up {
                    Opcode::IncrArray(id)
                } else {
                    Opcode::DecrArray(id)
                };
                self.rt.emit(Opcode::Dup);
                if pre {
                    self.rt.emit(op);
                    self.rt.emit(Opcode::LoadArray(id));
                } else {
                    self.rt.emit(Opcode::LoadArray(id));
                    self.rt.emit(Opcode::Swap);
                    self.rt.emit(op);
                }
            }
            _ => {
                let id = match self.scalar_id(var)? {
                    Some(id) => id,
                    None => return Err(error!(InternalError)),
                };
                let op = if up { Opcode::Incr(id) } else { Opcode::Decr(id) };
                if pre {
                    self.rt.emit(op);
                    self.rt.emit(Opcode::Load(id));
                } else {
                    self.rt.emit(Opcode::Load(id));
                    self.rt.emit(op);
                }
            }
        }
        Ok(())
    }

    fn call(&mut self, name: &str, args: &[Argument]) -> Result<()> {
        let fid = self.rt.register_identifier(name, Namespace::Function)?;
        let mut kinds = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                Argument::Value(expr) => {
                    self.expression(expr)?;
                    kinds.push(Arg::Value);
                }
                Argument::Array(name) => {
                    let id = self.rt.register_identifier(name, Namespace::Array)?;
                    kinds.push(Arg::Array(id));
                }
            }
        }
        let kinds: Rc<[Arg]> = kinds.into();
        self.rt.emit(Opcode::Call(fid, kinds));
        Ok(())
    }
}

/// Expands the escapes recognized in `print` strings.
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('a') => out.push('\x07'),
            Some('b') => out.push('\x08'),
            Some('f') => out.push('\x0c'),
            Some('n') => out.push('\n'),
            Some('q') => out.push('"'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn limits() -> String {
    format!(
        "BC_BASE_MAX     = {}\n\
         BC_DIM_MAX      = {}\n\
         BC_SCALE_MAX    = {}\n\
         MAX Exponent    = {}\n\
         Number of vars  = {}\n",
        BASE_MAX,
        DIM_MAX,
        SCALE_MAX,
        i64::MAX,
        MAX_STORE
    )
}
