use super::codegen::codegen;
use super::var::LAST;
use super::{
    Address, Arg, Config, Function, Namespace, Number, Opcode, Operation, Output, Param,
    Portability, Program, Stack, Symbol, SymbolTable, Var,
};
use crate::error;
use crate::lang::ast::{self, Parsed};
use crate::lang::{lex, parse, Error};
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use tracing::{debug, trace};

type Result<T> = std::result::Result<T, Error>;

/// Call depth at which a runaway recursion is stopped.
const FRAME_LIMIT: usize = 10_000;

/// ## Events
///
/// `execute` returns after at most `cycles` instructions or as soon as
/// something must be shown to the user.
#[derive(Debug)]
pub enum Event {
    /// Nothing is queued. More input is needed.
    Stopped,
    /// The cycle budget ran out; call `execute` again.
    Running,
    Print(String),
    Errors(Arc<Vec<Error>>),
    /// `quit` was compiled or `halt` executed.
    Quit,
}

/// Where a unit is in its life: code is emitted while compiling, waits in
/// the queue when ready, then runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Compiling,
    Ready,
    Executing,
}

#[derive(Debug)]
enum Unit {
    Run(Rc<[Opcode]>),
    Define(usize, Function),
    Listing(String),
    Errors(Vec<Error>),
    Quit,
}

#[derive(Debug)]
struct Frame {
    function: usize,
    code: Rc<[Opcode]>,
    pc: Address,
    ibase: u32,
}

enum Flow {
    Next,
    Warn(Error),
    Halt,
}

/// ## Virtual machine
///
/// Source text goes in through `enter`. Each complete unit is compiled
/// and queued, then `execute` runs the queue in order.

pub struct Runtime {
    config: Config,
    symbols: SymbolTable,
    functions: Vec<Function>,
    var: Var,
    program: Program,
    queue: VecDeque<Unit>,
    stack: Stack<Number>,
    frames: Stack<Frame>,
    function: usize,
    code: Rc<[Opcode]>,
    pc: Address,
    running: bool,
    output: Output,
    errors: Vec<Error>,
    source: Option<String>,
    pending: String,
    line: usize,
    interrupted: Arc<AtomicBool>,
}

impl Default for Runtime {
    fn default() -> Self {
        Runtime::new(Config::default())
    }
}

impl Runtime {
    pub fn new(config: Config) -> Runtime {
        Runtime {
            config,
            symbols: SymbolTable::new(),
            functions: vec![Function::undefined("(main)")],
            var: Var::new(),
            program: Program::new(),
            queue: VecDeque::new(),
            stack: Stack::new("Expression stack overflow."),
            frames: Stack::with_limit("Function call nesting too deep.", FRAME_LIMIT),
            function: 0,
            code: Rc::from(vec![]),
            pc: 0,
            running: false,
            output: Output::new(),
            errors: vec![],
            source: None,
            pending: String::new(),
            line: 1,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Names the input that following lines come from. Line numbers
    /// restart at one; `None` is standard input.
    pub fn set_source(&mut self, name: Option<&str>) {
        self.end_of_input();
        self.source = name.map(|s| s.to_string());
        self.line = 1;
    }

    /// Accepts more source text. Complete units are compiled right away;
    /// an unfinished one waits for the next call.
    pub fn enter(&mut self, text: &str) {
        self.pending.push_str(text);
        if !self.pending.ends_with('\n') {
            self.pending.push('\n');
        }
        let lexemes = lex(&self.pending, self.line);
        let mut consumed = self.pending.len();
        let mut next_line = self.line + self.pending.matches('\n').count();
        for parsed in parse(&lexemes) {
            match parsed {
                Parsed::Unit(unit, notices) => self.compile(unit, notices),
                Parsed::Error(e) => {
                    let e = self.sourced(e);
                    self.queue.push_back(Unit::Errors(vec![e]));
                }
                Parsed::Quit => {
                    self.queue.push_back(Unit::Quit);
                    break;
                }
                Parsed::Incomplete(offset, line) => {
                    consumed = offset;
                    next_line = line;
                }
            }
        }
        self.pending.drain(..consumed);
        self.line = next_line;
    }

    /// Reports a unit left open at the end of a file or of standard input.
    pub fn end_of_input(&mut self) {
        if self.pending.trim().is_empty() {
            self.pending.clear();
            return;
        }
        let line = self.line + self.pending.trim_end().matches('\n').count();
        let e = self.sourced(error!(SyntaxError, line; "unexpected end of file"));
        self.queue.push_back(Unit::Errors(vec![e]));
        self.pending.clear();
    }

    /// True when input ended inside a unit.
    pub fn is_incomplete(&self) -> bool {
        !self.pending.is_empty()
    }

    fn sourced(&self, e: Error) -> Error {
        let e = match e.line_number() {
            Some(_) => e,
            None => e.in_line_number(self.line),
        };
        match &self.source {
            Some(name) => e.in_source(name),
            None => e,
        }
    }

    fn compile(&mut self, unit: ast::Unit, notices: Vec<Error>) {
        let notices: Vec<Error> = notices.into_iter().map(|n| self.sourced(n)).collect();
        if !notices.is_empty() {
            match self.config.portability {
                Portability::Ignore => {}
                Portability::Warn => self.queue.push_back(Unit::Errors(notices)),
                Portability::Error => {
                    let errors = notices.into_iter().map(Error::escalate).collect();
                    self.queue.push_back(Unit::Errors(errors));
                    return;
                }
            }
        }
        if let Err(e) = codegen(self, &unit) {
            let e = self.sourced(e);
            self.queue.push_back(Unit::Errors(vec![e]));
        }
    }

    /// Returns the id of `name` in `ns`, creating it on first use.
    pub fn register_identifier(&mut self, name: &str, ns: Namespace) -> Result<usize> {
        let id = self.symbols.lookup(name, ns)?;
        match ns {
            Namespace::Scalar => self.var.reserve_scalar(id),
            Namespace::Array => self.var.reserve_array(id),
            Namespace::Function => {
                while self.functions.len() <= id {
                    let name = self
                        .symbols
                        .name(Namespace::Function, self.functions.len())
                        .unwrap_or_default();
                    self.functions.push(Function::undefined(name));
                }
            }
        }
        Ok(id)
    }

    pub fn emit(&mut self, op: Opcode) {
        self.program.push(op);
    }

    pub fn emit_jump(&mut self, op: Opcode, sym: Symbol) {
        self.program.push_jump(op, sym);
    }

    pub fn label(&mut self) -> Symbol {
        self.program.label()
    }

    pub fn place(&mut self, sym: Symbol) {
        self.program.place(sym);
    }

    /// Drops code emitted since the last commit.
    pub fn discard(&mut self) {
        self.program.clear();
    }

    /// Queues the emitted code as a unit of the main program.
    pub fn commit(&mut self) -> Result<()> {
        let code = self.program.finish()?;
        debug!(ops = code.len(), "compiled unit");
        if self.config.compile_only {
            self.queue.push_back(Unit::Listing(listing(None, &code)));
        } else if !code.is_empty() {
            self.queue.push_back(Unit::Run(code.into()));
        }
        Ok(())
    }

    /// Turns the emitted code into the body of function `fid`.
    pub fn define(&mut self, fid: usize, params: Vec<Param>, autos: Vec<Param>) -> Result<()> {
        let code = self.program.finish()?;
        let name = self
            .symbols
            .name(Namespace::Function, fid)
            .unwrap_or_default()
            .to_string();
        debug!(function = %name, ops = code.len(), "compiled function");
        if self.config.compile_only {
            self.queue.push_back(Unit::Listing(listing(Some(&name), &code)));
        } else {
            let function = Function::new(&name, params, autos, code);
            self.queue.push_back(Unit::Define(fid, function));
        }
        Ok(())
    }

    pub fn state(&self) -> State {
        if self.running {
            State::Executing
        } else if !self.program.is_empty() {
            State::Compiling
        } else if !self.queue.is_empty() {
            State::Ready
        } else {
            State::Idle
        }
    }

    /// Flag that stops the running unit when set, for signal handlers.
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupted)
    }

    pub fn interrupt(&mut self) {
        self.interrupted.store(true, AtomicOrdering::SeqCst);
    }

    pub fn format_number(&self, number: &Number, base: u64) -> String {
        number.to_string_radix(base)
    }

    pub fn execute(&mut self, cycles: usize) -> Event {
        let mut budget = cycles;
        loop {
            if !self.output.is_empty() {
                return Event::Print(self.output.take());
            }
            if !self.errors.is_empty() {
                return Event::Errors(Arc::new(std::mem::take(&mut self.errors)));
            }
            if !self.running {
                self.interrupted.store(false, AtomicOrdering::SeqCst);
                match self.queue.pop_front() {
                    None => return Event::Stopped,
                    Some(Unit::Run(code)) => self.begin(code),
                    Some(Unit::Define(fid, function)) => {
                        debug!(function = function.name(), "defined function");
                        self.functions[fid] = function;
                        continue;
                    }
                    Some(Unit::Listing(text)) => {
                        self.output.push_str(&text);
                        continue;
                    }
                    Some(Unit::Errors(errors)) => return Event::Errors(Arc::new(errors)),
                    Some(Unit::Quit) => {
                        self.queue.clear();
                        return Event::Quit;
                    }
                }
            }
            if budget == 0 {
                return Event::Running;
            }
            while self.running && budget > 0 {
                budget -= 1;
                if self.interrupted.swap(false, AtomicOrdering::SeqCst) {
                    self.fail(error!(Interrupted));
                    break;
                }
                match self.step() {
                    Ok(Flow::Next) => {}
                    Ok(Flow::Warn(warning)) => self.errors.push(warning),
                    Ok(Flow::Halt) => {
                        self.abort();
                        self.queue.clear();
                        self.queue.push_back(Unit::Quit);
                    }
                    Err(e) => self.fail(e),
                }
                if !self.output.is_empty() || !self.errors.is_empty() {
                    break;
                }
            }
        }
    }

    fn begin(&mut self, code: Rc<[Opcode]>) {
        debug!(ops = code.len(), "executing unit");
        self.code = code;
        self.pc = 0;
        self.function = 0;
        self.stack.clear();
        self.running = true;
    }

    fn located(&self, e: Error) -> Error {
        if e.location().is_some() {
            return e;
        }
        let name = self
            .symbols
            .name(Namespace::Function, self.function)
            .unwrap_or_default();
        e.at(name, self.pc)
    }

    fn fail(&mut self, e: Error) {
        let e = self.located(e);
        debug!(error = %e, "unit aborted");
        self.errors.push(e);
        self.abort();
    }

    // Unwinds every call so the globals are visible again.
    fn abort(&mut self) {
        while let Ok(frame) = self.frames.pop() {
            self.var.set_ibase(frame.ibase);
        }
        while self.var.depth() > 0 {
            if self.var.pop_frame().is_err() {
                break;
            }
        }
        self.stack.clear();
        self.code = Rc::from(vec![]);
        self.pc = 0;
        self.function = 0;
        self.running = false;
    }

    fn step(&mut self) -> Result<Flow> {
        let code = Rc::clone(&self.code);
        let op = match code.get(self.pc) {
            Some(op) => op,
            None => {
                self.running = false;
                return Ok(Flow::Next);
            }
        };
        let scale = self.var.scale();
        let mut flow = Flow::Next;
        match op {
            Opcode::Const(n) => self.stack.push(n.clone())?,
            Opcode::ConstRadix(s) => self.stack.push(Number::parse_radix(s, self.var.ibase())?)?,
            Opcode::Zero => self.stack.push(Number::zero())?,
            Opcode::One => self.stack.push(Number::one())?,
            Opcode::Load(id) => self.stack.push(self.var.fetch(*id))?,
            Opcode::Store(id) => {
                let value = self.stack.pop()?;
                if let Some(warning) = self.var.store(*id, value) {
                    flow = Flow::Warn(self.located(warning));
                }
                self.stack.push(self.var.fetch(*id))?;
            }
            Opcode::LoadArray(id) => {
                let index = self.stack.pop()?;
                let value = self.var.fetch_array(*id, &index)?;
                self.stack.push(value)?;
            }
            Opcode::StoreArray(id) => {
                let (index, value) = self.stack.pop_2()?;
                self.var.store_array(*id, &index, value.clone())?;
                self.stack.push(value)?;
            }
            Opcode::Incr(id) => {
                self.var.increment(*id);
            }
            Opcode::Decr(id) => {
                self.var.decrement(*id);
            }
            Opcode::IncrArray(id) => {
                let index = self.stack.pop()?;
                self.var.increment_array(*id, &index)?;
            }
            Opcode::DecrArray(id) => {
                let index = self.stack.pop()?;
                self.var.decrement_array(*id, &index)?;
            }
            Opcode::Dup => {
                let value = self.stack.peek()?.clone();
                self.stack.push(value)?;
            }
            Opcode::Pop => {
                self.stack.pop()?;
            }
            Opcode::Swap => {
                let (a, b) = self.stack.pop_2()?;
                self.stack.push(b)?;
                self.stack.push(a)?;
            }
            Opcode::Jump(addr) => {
                self.pc = *addr;
                return Ok(flow);
            }
            Opcode::JumpIfZero(addr) => {
                if self.stack.pop()?.is_zero() {
                    self.pc = *addr;
                    return Ok(flow);
                }
            }
            Opcode::JumpIfNonZero(addr) => {
                if !self.stack.pop()?.is_zero() {
                    self.pc = *addr;
                    return Ok(flow);
                }
            }
            Opcode::Call(fid, args) => {
                self.call(*fid, args)?;
                return Ok(flow);
            }
            Opcode::Return => {
                self.r#return()?;
                return Ok(flow);
            }
            Opcode::Print | Opcode::PrintInline => {
                let value = self.stack.pop()?;
                let output = &mut self.output;
                value.format(self.var.obase(), &mut |ch| output.push(ch));
                if let Opcode::Print = op {
                    self.output.push('\n');
                }
                self.var.store(LAST, value);
            }
            Opcode::Write(s) => self.output.push_str(s),
            Opcode::Halt => return Ok(Flow::Halt),
            Opcode::Neg => {
                let value = self.stack.pop()?;
                self.stack.push(Operation::negate(&value))?;
            }
            Opcode::Pow => {
                let (a, b) = self.stack.pop_2()?;
                self.stack.push(Operation::raise(&a, &b, scale)?)?;
            }
            Opcode::Mul => {
                let (a, b) = self.stack.pop_2()?;
                let rscale = Number::product_scale(&a, &b, scale);
                self.stack.push(Operation::multiply(&a, &b, rscale))?;
            }
            Opcode::Div => {
                let (a, b) = self.stack.pop_2()?;
                self.stack.push(Operation::divide(&a, &b, scale)?)?;
            }
            Opcode::Mod => {
                let (a, b) = self.stack.pop_2()?;
                self.stack.push(Operation::modulo(&a, &b, scale)?)?;
            }
            Opcode::Add => {
                let (a, b) = self.stack.pop_2()?;
                self.stack.push(Operation::add(&a, &b))?;
            }
            Opcode::Sub => {
                let (a, b) = self.stack.pop_2()?;
                self.stack.push(Operation::subtract(&a, &b))?;
            }
            Opcode::Eq => self.relation(|o| o == Ordering::Equal)?,
            Opcode::Ne => self.relation(|o| o != Ordering::Equal)?,
            Opcode::Lt => self.relation(|o| o == Ordering::Less)?,
            Opcode::Le => self.relation(|o| o != Ordering::Greater)?,
            Opcode::Gt => self.relation(|o| o == Ordering::Greater)?,
            Opcode::Ge => self.relation(|o| o != Ordering::Less)?,
            Opcode::Not => {
                let value = self.stack.pop()?;
                self.stack.push(truth(value.is_zero()))?;
            }
            Opcode::Length => {
                let value = self.stack.pop()?;
                self.stack.push(Number::from(value.length()))?;
            }
            Opcode::Scale => {
                let value = self.stack.pop()?;
                self.stack.push(Number::from(value.scale()))?;
            }
            Opcode::Sqrt => {
                let value = self.stack.pop()?;
                self.stack.push(Operation::sqrt(&value, scale)?)?;
            }
        }
        self.pc += 1;
        Ok(flow)
    }

    fn relation(&mut self, test: impl Fn(Ordering) -> bool) -> Result<()> {
        let (a, b) = self.stack.pop_2()?;
        self.stack.push(truth(test(Operation::compare(&a, &b))))
    }

    fn call(&mut self, fid: usize, args: &[Arg]) -> Result<()> {
        let function = match self.functions.get(fid) {
            Some(f) if f.is_defined() => f.clone(),
            Some(f) => {
                return Err(error!(UndefinedFunction; format!("Function {} not defined.", f.name())))
            }
            None => return Err(error!(UndefinedFunction)),
        };
        let count = args.iter().filter(|arg| **arg == Arg::Value).count();
        let values = self.stack.pop_n(count)?;
        self.var.push_frame(&function, args, values)?;
        let frame = Frame {
            function: self.function,
            code: Rc::clone(&self.code),
            pc: self.pc + 1,
            ibase: self.var.ibase(),
        };
        if let Err(e) = self.frames.push(frame) {
            self.var.pop_frame()?;
            return Err(e);
        }
        trace!(function = function.name(), depth = self.frames.len(), "call");
        self.function = fid;
        self.code = Rc::clone(function.code());
        self.pc = 0;
        Ok(())
    }

    fn r#return(&mut self) -> Result<()> {
        let value = self.stack.pop()?;
        let frame = match self.frames.pop() {
            Ok(frame) => frame,
            Err(_) => return Err(error!(ReturnFromMain)),
        };
        self.var.pop_frame()?;
        trace!(depth = self.frames.len(), "return");
        self.var.set_ibase(frame.ibase);
        self.function = frame.function;
        self.code = frame.code;
        self.pc = frame.pc;
        self.stack.push(value)
    }
}

fn truth(b: bool) -> Number {
    if b {
        Number::one()
    } else {
        Number::zero()
    }
}

/// Printable code of a compiled unit, as shown by `--compile`.
fn listing(function: Option<&str>, code: &[Opcode]) -> String {
    let mut s = String::from("@i");
    if let Some(name) = function {
        s.push_str(&format!("DEFINE({}) ", name));
    }
    let ops: Vec<String> = code.iter().map(|op| op.to_string()).collect();
    s.push_str(&ops.join(" "));
    s.push_str("@r\n");
    s
}
