//! # bc
//!
//! An arbitrary precision calculator language in the manner of POSIX
//! `bc`: decimal numbers of any length with a settable number of
//! fraction digits, input and output in other bases, arrays, and user
//! defined functions with local variables.
//!
//! ```
//! use bc::mach::{Event, Runtime};
//!
//! let mut runtime = Runtime::default();
//! runtime.enter("scale=3; 7/2");
//! match runtime.execute(5000) {
//!     Event::Print(s) => assert_eq!(s, "3.500\n"),
//!     _ => unreachable!(),
//! }
//! ```
//!
//! The [`lang`] module turns source text into a syntax tree. The
//! [`mach`] module compiles that tree to stack machine code, runs it,
//! and holds the number engine and variable storage.

pub mod lang;
pub mod mach;
