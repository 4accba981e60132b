#![allow(dead_code)]

use pl0c::mach::{compile, Instr, Runtime};
use std::io::Cursor;

/// Compile a source string, returning the code and the error count.
pub fn assemble(source: &str) -> (Vec<Instr>, usize) {
    let mut code = vec![];
    let nerrors = compile(
        "test",
        Box::new(Cursor::new(source.to_string())),
        &mut code,
        false,
    );
    (code, nerrors)
}

/// Compile and execute a program, returning the machine so tests can
/// inspect the final stack.
pub fn run(source: &str) -> Runtime {
    let (code, nerrors) = assemble(source);
    assert_eq!(0, nerrors, "compile errors in {:?}", source);
    let mut runtime = Runtime::default();
    if let Err(error) = runtime.run(&code, false) {
        panic!("runtime error in {:?}: {}", source, error);
    }
    runtime
}
