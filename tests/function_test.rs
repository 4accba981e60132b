mod common;
use common::*;
use pl0c::lang::ErrorCode;
use pl0c::mach::Runtime;

#[test]
fn test_procedure_reads_enclosing_constant() {
    let r = run("const n = 5; var f; procedure set() f = n; set().");
    assert_eq!(5, r.stack()[4]);
}

#[test]
fn test_function_called_as_statement() {
    let r = run("var x; function sq(a) x = a * a; sq(4).");
    assert_eq!(16, r.stack()[4]);
}

#[test]
fn test_function_return_value() {
    let r = run("var x; function sq(a) sq = a * a; x = sq(4).");
    assert_eq!(16, r.stack()[4]);
    // the return slot of sq's frame still holds the result
    assert_eq!(16, r.stack()[9]);
}

#[test]
fn test_argument_order() {
    let r = run("var r; function sub2(a, b) sub2 = a - b; r = sub2(10, 4).");
    assert_eq!(6, r.stack()[4]);
}

#[test]
fn test_call_in_expression() {
    let r = run(
        "var x; \
         function inc(n) inc = n + 1; \
         x = inc(1) + inc(2) * 10.",
    );
    assert_eq!(32, r.stack()[4]);
}

#[test]
fn test_recursion() {
    let r = run(
        "var r; \
         function fact(n) \
           if n <= 1 then fact = 1 else fact = n * fact(n - 1); \
         r = fact(5).",
    );
    assert_eq!(120, r.stack()[4]);
}

#[test]
fn test_static_links() {
    let r = run(
        "var g; \
         procedure outer() \
         var t; \
           procedure inner() \
             g = t; \
         begin t = 9; inner() end; \
         outer().",
    );
    assert_eq!(9, r.stack()[4]);
}

#[test]
fn test_parameter_shadows_global() {
    let r = run(
        "var x, r; \
         function id(x) id = x; \
         begin x = 1; r = id(7) end.",
    );
    assert_eq!(1, r.stack()[4]);
    assert_eq!(7, r.stack()[5]);
}

#[test]
fn test_unbounded_recursion_overflows() {
    let (code, nerrors) = assemble("procedure p() p(); p().");
    assert_eq!(0, nerrors);
    let mut runtime = Runtime::default();
    let error = runtime.run(&code, false).unwrap_err();
    assert_eq!(ErrorCode::StackOverflow, error.code());
}
