//! WebAssembly text fixtures standing in for the evaluator module.

#![allow(dead_code)]

/// Wrap `body` in a module with memory, the print import and a bump
/// allocator starting at 1024.
pub fn module(body: &str) -> String {
    format!(
        r#"(module
  (import "env" "print" (func $print (param i32)))
  (memory (export "memory") 1)
  (global $next (mut i32) (i32.const 1024))
  (func (export "alloc") (param $size i32) (result i32)
    (local $ptr i32)
    (local.set $ptr (global.get $next))
    (global.set $next (i32.add (global.get $next) (local.get $size)))
    (local.get $ptr))
  {body})"#
    )
}

/// `eval` and `format` return their input location unchanged.
pub fn echo() -> String {
    module(
        r#"
  (func (export "dealloc") (param i32))
  (func (export "eval") (param $ptr i32) (result i32) (local.get $ptr))
  (func (export "format") (param $ptr i32) (result i32) (local.get $ptr))"#,
    )
}

/// `eval` prints "first" then "second" and returns "done".
/// `format` prints a parse error and returns empty text.
pub fn printer() -> String {
    module(
        r#"
  (data (i32.const 16) "first\00second\00done\00")
  (data (i32.const 40) "parse error\00")
  (func (export "dealloc") (param i32))
  (func (export "eval") (param $ptr i32) (result i32)
    (call $print (i32.const 16))
    (call $print (i32.const 22))
    (i32.const 29))
  (func (export "format") (param $ptr i32) (result i32)
    (call $print (i32.const 40))
    (i32.const 60))"#,
    )
}

/// `eval` returns a fixed "ok" buffer that is not the input.
pub fn constant() -> String {
    module(
        r#"
  (data (i32.const 16) "ok\00")
  (func (export "dealloc") (param i32))
  (func (export "eval") (param $ptr i32) (result i32) (i32.const 16))
  (func (export "format") (param $ptr i32) (result i32) (i32.const 16))"#,
    )
}

/// `eval` returns a location whose bytes run into the end of memory.
pub fn unterminated() -> String {
    module(
        r#"
  (data (i32.const 65532) "tail")
  (func (export "dealloc") (param i32))
  (func (export "eval") (param $ptr i32) (result i32) (i32.const 65532))
  (func (export "format") (param $ptr i32) (result i32) (local.get $ptr))"#,
    )
}

/// `eval` grows memory by a page and returns "ok" written into the new page.
pub fn grower() -> String {
    module(
        r#"
  (func (export "dealloc") (param i32))
  (func (export "eval") (param $ptr i32) (result i32)
    (drop (memory.grow (i32.const 1)))
    (i32.store8 (i32.const 65536) (i32.const 111))
    (i32.store8 (i32.const 65537) (i32.const 107))
    (i32.const 65536))
  (func (export "format") (param $ptr i32) (result i32) (local.get $ptr))"#,
    )
}

/// Everything but `format`.
pub fn missing_format() -> String {
    module(
        r#"
  (func (export "dealloc") (param i32))
  (func (export "eval") (param $ptr i32) (result i32) (local.get $ptr))"#,
    )
}

/// `alloc` hands out a location past the end of memory.
pub fn bad_alloc() -> String {
    r#"(module
  (memory (export "memory") 1)
  (func (export "alloc") (param i32) (result i32) (i32.const 70000))
  (func (export "dealloc") (param i32))
  (func (export "eval") (param $ptr i32) (result i32) (local.get $ptr))
  (func (export "format") (param $ptr i32) (result i32) (local.get $ptr)))"#
        .to_string()
}
