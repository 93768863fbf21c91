//! Evaluator module stand-ins in WebAssembly text.

#![allow(dead_code)]

const PRELUDE: &str = r#"
  (import "env" "print" (func $print (param i32)))
  (memory (export "memory") 1)
  (global $next (mut i32) (i32.const 1024))
  (func (export "alloc") (param $size i32) (result i32)
    (local $ptr i32)
    (local.set $ptr (global.get $next))
    (global.set $next (i32.add (global.get $next) (local.get $size)))
    (local.get $ptr))
  (func (export "dealloc") (param $ptr i32) (param $size i32))"#;

/// `eval` and `format` hand back their input.
pub fn echo() -> String {
    format!(
        r#"(module {PRELUDE}
  (func (export "eval") (param $ptr i32) (result i32) (local.get $ptr))
  (func (export "format") (param $ptr i32) (result i32) (local.get $ptr)))"#
    )
}

/// `eval` prints two lines before returning "null".
/// `format` reports a parse error through print and returns empty text.
pub fn printer() -> String {
    format!(
        r#"(module {PRELUDE}
  (data (i32.const 16) "Output values\00true\00null\00")
  (data (i32.const 48) "expected next token to be ), got EOF instead\00")
  (func (export "eval") (param $ptr i32) (result i32)
    (call $print (i32.const 16))
    (call $print (i32.const 30))
    (i32.const 35))
  (func (export "format") (param $ptr i32) (result i32)
    (call $print (i32.const 48))
    (i32.const 8)))"#
    )
}
