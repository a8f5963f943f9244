use super::{Arg, Function, Number, Operation, Param};
use crate::error;
use crate::lang::Error;
use std::collections::BTreeMap;

type Result<T> = std::result::Result<T, Error>;

pub const IBASE: usize = 0;
pub const OBASE: usize = 1;
pub const SCALE: usize = 2;
pub const LAST: usize = 3;

pub const IBASE_MAX: u32 = 16;
pub const BASE_MAX: u64 = i32::MAX as u64;
pub const SCALE_MAX: usize = i32::MAX as usize;
pub const DIM_MAX: usize = 65535;

const BATCH: usize = 32;

#[derive(Debug, Clone, Copy)]
enum Local {
    Scalar(usize),
    Array(usize, bool),
}

/// ## Variable memory
///
/// Every scalar and array id owns a stack; the top is the visible value.
/// Arrays are handles into a shared heap so a parameter can alias the
/// caller's array.

#[derive(Debug)]
pub struct Var {
    ibase: u32,
    obase: u64,
    scale: usize,
    scalars: Vec<Vec<Number>>,
    arrays: Vec<Vec<usize>>,
    heap: Vec<BTreeMap<usize, Number>>,
    free: Vec<usize>,
    frames: Vec<Vec<Local>>,
}

impl Default for Var {
    fn default() -> Self {
        Var {
            ibase: 10,
            obase: 10,
            scale: 0,
            scalars: vec![vec![]; BATCH],
            arrays: vec![vec![]; BATCH],
            heap: vec![],
            free: vec![],
            frames: vec![],
        }
    }
}

impl Var {
    pub fn new() -> Var {
        Var::default()
    }

    pub fn ibase(&self) -> u32 {
        self.ibase
    }

    pub fn obase(&self) -> u64 {
        self.obase
    }

    pub fn scale(&self) -> usize {
        self.scale
    }

    /// Restores `ibase` when a call returns.
    pub fn set_ibase(&mut self, ibase: u32) {
        self.ibase = ibase;
    }

    /// Grows scalar storage to hold `id`.
    pub fn reserve_scalar(&mut self, id: usize) {
        if id >= self.scalars.len() {
            self.scalars.resize(batch(id), vec![]);
        }
    }

    /// Grows array storage to hold `id`.
    pub fn reserve_array(&mut self, id: usize) {
        if id >= self.arrays.len() {
            self.arrays.resize(batch(id), vec![]);
        }
    }

    pub fn fetch(&self, id: usize) -> Number {
        match id {
            IBASE => Number::from(self.ibase as usize),
            OBASE => Number::from(self.obase as usize),
            SCALE => Number::from(self.scale),
            _ => self
                .scalars
                .get(id)
                .and_then(|stack| stack.last())
                .cloned()
                .unwrap_or_default(),
        }
    }

    /// Stores a value. Registers clamp out of range values and return the
    /// warning describing what was stored instead.
    pub fn store(&mut self, id: usize, value: Number) -> Option<Error> {
        match id {
            IBASE => {
                let (v, warning) = clamp(&value, 2, IBASE_MAX as i64, "ibase too small", "ibase too large");
                self.ibase = v as u32;
                warning
            }
            OBASE => {
                let (v, warning) = clamp(&value, 2, BASE_MAX as i64, "obase too small", "obase too large");
                self.obase = v as u64;
                warning
            }
            SCALE => {
                let (v, warning) = clamp(&value, 0, SCALE_MAX as i64, "negative scale", "scale too large");
                self.scale = v as usize;
                warning
            }
            _ => {
                self.reserve_scalar(id);
                let stack = &mut self.scalars[id];
                match stack.last_mut() {
                    Some(top) => *top = value,
                    None => stack.push(value),
                }
                None
            }
        }
    }

    pub fn increment(&mut self, id: usize) -> Number {
        self.step(id, true)
    }

    pub fn decrement(&mut self, id: usize) -> Number {
        self.step(id, false)
    }

    fn step(&mut self, id: usize, up: bool) -> Number {
        match id {
            IBASE => self.ibase = step_within(self.ibase as i64, up, 2, IBASE_MAX as i64) as u32,
            OBASE => self.obase = step_within(self.obase as i64, up, 2, BASE_MAX as i64) as u64,
            SCALE => self.scale = step_within(self.scale as i64, up, 0, SCALE_MAX as i64) as usize,
            _ => {
                let value = nudge(&self.fetch(id), up);
                self.store(id, value);
            }
        }
        self.fetch(id)
    }

    pub fn fetch_array(&mut self, id: usize, index: &Number) -> Result<Number> {
        let index = subscript(index)?;
        let handle = self.handle(id);
        Ok(self.heap[handle].get(&index).cloned().unwrap_or_default())
    }

    pub fn store_array(&mut self, id: usize, index: &Number, value: Number) -> Result<()> {
        let index = subscript(index)?;
        let handle = self.handle(id);
        self.heap[handle].insert(index, value);
        Ok(())
    }

    pub fn increment_array(&mut self, id: usize, index: &Number) -> Result<Number> {
        self.step_array(id, index, true)
    }

    pub fn decrement_array(&mut self, id: usize, index: &Number) -> Result<Number> {
        self.step_array(id, index, false)
    }

    fn step_array(&mut self, id: usize, index: &Number, up: bool) -> Result<Number> {
        let index = subscript(index)?;
        let handle = self.handle(id);
        let slot = self.heap[handle].entry(index).or_default();
        *slot = nudge(slot, up);
        Ok(slot.clone())
    }

    /// Binds parameters and autos of `function` for a call. Nothing is
    /// pushed when the arguments do not fit the declaration.
    pub fn push_frame(&mut self, function: &Function, args: &[Arg], values: Vec<Number>) -> Result<()> {
        let params = function.params();
        if params.len() != args.len() {
            return Err(error!(ArgumentCountMismatch));
        }
        let mut handles = vec![];
        for (param, arg) in params.iter().zip(args) {
            match (param, arg) {
                (Param::Scalar(_), Arg::Value) => {}
                (Param::Array(_), Arg::Array(id)) => handles.push(self.handle(*id)),
                _ => return Err(error!(ParameterTypeMismatch)),
            }
        }
        let mut locals = Vec::with_capacity(params.len() + function.autos().len());
        let mut values = values.into_iter();
        let mut handles = handles.into_iter();
        for param in params {
            match *param {
                Param::Scalar(id) => {
                    self.reserve_scalar(id);
                    self.scalars[id].push(values.next().unwrap_or_default());
                    locals.push(Local::Scalar(id));
                }
                Param::Array(id) => {
                    self.reserve_array(id);
                    let handle = handles.next().unwrap_or_else(|| self.allocate());
                    self.arrays[id].push(handle);
                    locals.push(Local::Array(id, false));
                }
            }
        }
        for auto in function.autos() {
            match *auto {
                Param::Scalar(id) => {
                    self.reserve_scalar(id);
                    self.scalars[id].push(Number::zero());
                    locals.push(Local::Scalar(id));
                }
                Param::Array(id) => {
                    self.reserve_array(id);
                    let handle = self.allocate();
                    self.arrays[id].push(handle);
                    locals.push(Local::Array(id, true));
                }
            }
        }
        self.frames.push(locals);
        Ok(())
    }

    /// Undoes the most recent `push_frame`, restoring the caller's values.
    pub fn pop_frame(&mut self) -> Result<()> {
        let locals = match self.frames.pop() {
            Some(locals) => locals,
            None => return Err(error!(StackUnderflow)),
        };
        for local in locals.into_iter().rev() {
            match local {
                Local::Scalar(id) => {
                    self.scalars[id].pop();
                }
                Local::Array(id, owned) => {
                    if let Some(handle) = self.arrays[id].pop() {
                        if owned {
                            self.heap[handle].clear();
                            self.free.push(handle);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Depth of the value stack for a scalar id; globals sit at depth one
    /// once assigned.
    pub fn scalar_depth(&self, id: usize) -> usize {
        self.scalars.get(id).map_or(0, |s| s.len())
    }

    fn handle(&mut self, id: usize) -> usize {
        self.reserve_array(id);
        if let Some(handle) = self.arrays[id].last() {
            return *handle;
        }
        let handle = self.allocate();
        self.arrays[id].push(handle);
        handle
    }

    fn allocate(&mut self) -> usize {
        match self.free.pop() {
            Some(handle) => handle,
            None => {
                self.heap.push(BTreeMap::new());
                self.heap.len() - 1
            }
        }
    }
}

fn batch(id: usize) -> usize {
    (id / BATCH + 1) * BATCH
}

fn subscript(index: &Number) -> Result<usize> {
    match index.to_i64() {
        Some(i) if i >= 0 && i as usize <= DIM_MAX => Ok(i as usize),
        _ => Err(error!(SubscriptOutOfRange)),
    }
}

fn nudge(value: &Number, up: bool) -> Number {
    if up {
        Operation::add(value, &Number::one())
    } else {
        Operation::subtract(value, &Number::one())
    }
}

fn step_within(value: i64, up: bool, min: i64, max: i64) -> i64 {
    if up {
        (value + 1).min(max)
    } else {
        (value - 1).max(min)
    }
}

fn clamp(value: &Number, min: i64, max: i64, low: &str, high: &str) -> (i64, Option<Error>) {
    let v = match value.to_i64() {
        Some(v) => v,
        None if value.is_negative() => i64::MIN,
        None => i64::MAX,
    };
    if v < min {
        let msg = format!("{}, set to {}", low, min);
        (min, Some(error!(RegisterClamped; msg)))
    } else if v > max {
        let msg = format!("{}, set to {}", high, max);
        (max, Some(error!(RegisterClamped; msg)))
    } else {
        (v, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(v: i64) -> Number {
        Number::from(v)
    }

    #[test]
    fn test_unset_reads_zero() {
        let mut var = Var::new();
        assert!(var.fetch(4).is_zero());
        assert!(var.fetch(1000).is_zero());
        assert!(var.fetch_array(7, &num(3)).unwrap().is_zero());
    }

    #[test]
    fn test_store_grows_in_batches() {
        let mut var = Var::new();
        var.store(40, num(9));
        assert_eq!(var.scalars.len(), 64);
        assert_eq!(var.fetch(40), num(9));
        var.reserve_array(100);
        assert_eq!(var.arrays.len(), 128);
    }

    #[test]
    fn test_register_clamping() {
        let mut var = Var::new();
        let w = var.store(IBASE, num(1)).unwrap();
        assert_eq!(w.text(), "ibase too small, set to 2");
        assert_eq!(var.ibase(), 2);
        let w = var.store(IBASE, num(17)).unwrap();
        assert_eq!(w.text(), "ibase too large, set to 16");
        let w = var.store(SCALE, num(-3)).unwrap();
        assert_eq!(w.text(), "negative scale, set to 0");
        let w = var.store(OBASE, Number::parse("99999999999999999999", 0).unwrap()).unwrap();
        assert_eq!(w.text(), "obase too large, set to 2147483647");
        assert!(var.store(SCALE, Number::parse("5.9", 1).unwrap()).is_none());
        assert_eq!(var.scale(), 5);
        assert_eq!(var.fetch(SCALE), num(5));
    }

    #[test]
    fn test_register_increment_stays_in_range() {
        let mut var = Var::new();
        var.store(IBASE, num(16));
        assert_eq!(var.increment(IBASE), num(16));
        assert_eq!(var.decrement(SCALE), num(0));
        assert_eq!(var.increment(SCALE), num(1));
    }

    #[test]
    fn test_increment_scalar_and_element() {
        let mut var = Var::new();
        assert_eq!(var.increment(5), num(1));
        assert_eq!(var.decrement(5), num(0));
        assert_eq!(var.decrement(5), num(-1));
        assert_eq!(var.increment_array(1, &num(2)).unwrap(), num(1));
        assert_eq!(var.fetch_array(1, &num(2)).unwrap(), num(1));
    }

    #[test]
    fn test_subscript_range() {
        let mut var = Var::new();
        assert!(var.store_array(1, &num(65535), num(1)).is_ok());
        assert!(var.store_array(1, &num(65536), num(1)).is_err());
        assert!(var.fetch_array(1, &num(-1)).is_err());
        assert_eq!(var.fetch_array(1, &Number::parse("65535.7", 1).unwrap()).unwrap(), num(1));
    }

    #[test]
    fn test_frame_shadows_and_restores() {
        let mut var = Var::new();
        var.store(4, num(42));
        var.store_array(2, &num(0), num(7));
        let f = Function::new(
            "f",
            vec![Param::Scalar(4)],
            vec![Param::Scalar(5), Param::Array(2)],
            vec![],
        );
        var.push_frame(&f, &[Arg::Value], vec![num(3)]).unwrap();
        assert_eq!(var.fetch(4), num(3));
        assert!(var.fetch(5).is_zero());
        assert!(var.fetch_array(2, &num(0)).unwrap().is_zero());
        var.store(4, num(100));
        var.store_array(2, &num(0), num(1));
        var.pop_frame().unwrap();
        assert_eq!(var.fetch(4), num(42));
        assert_eq!(var.fetch_array(2, &num(0)).unwrap(), num(7));
        assert_eq!(var.depth(), 0);
    }

    #[test]
    fn test_array_parameter_is_a_reference() {
        let mut var = Var::new();
        var.store_array(1, &num(0), num(5));
        let f = Function::new("f", vec![Param::Array(2)], vec![], vec![]);
        var.push_frame(&f, &[Arg::Array(1)], vec![]).unwrap();
        assert_eq!(var.fetch_array(2, &num(0)).unwrap(), num(5));
        var.store_array(2, &num(1), num(6));
        var.pop_frame().unwrap();
        assert_eq!(var.fetch_array(1, &num(1)).unwrap(), num(6));
    }

    #[test]
    fn test_mismatched_call_pushes_nothing() {
        let mut var = Var::new();
        var.store(4, num(1));
        let f = Function::new(
            "f",
            vec![Param::Scalar(4), Param::Scalar(5), Param::Scalar(6)],
            vec![],
            vec![],
        );
        let e = var.push_frame(&f, &[Arg::Value, Arg::Value], vec![num(1), num(2)]).unwrap_err();
        assert_eq!(e.code(), crate::lang::ErrorCode::ArgumentCountMismatch);
        let g = Function::new("g", vec![Param::Array(1)], vec![], vec![]);
        let e = var.push_frame(&g, &[Arg::Value], vec![num(1)]).unwrap_err();
        assert_eq!(e.code(), crate::lang::ErrorCode::ParameterTypeMismatch);
        assert_eq!(var.depth(), 0);
        assert_eq!(var.scalar_depth(4), 1);
    }
}
