//! # PL/0C
//!
//! A compiler and stack-machine interpreter for PL/0C: Wirth's PL/0
//! with C-style operators, explicit `procedure` and `function`
//! declarations with parenthesised argument lists, and `if/else`,
//! `while`, `repeat/until`, and `begin/end` control flow.
//!
//! Source text is scanned into tokens by [`lang`], compiled in a
//! single pass into instructions for a stack machine with lexically
//! nested activation frames, and executed by the interpreter in
//! [`mach`].

pub mod lang;
pub mod mach;
pub mod term;
