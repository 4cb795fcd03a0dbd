use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

fn ifjc() -> Command {
    Command::cargo_bin("ifjc").unwrap()
}

fn run(src: &str) -> assert_cmd::assert::Assert {
    let mut cmd = ifjc();
    cmd.write_stdin(src);
    cmd.assert()
}

#[test]
fn hello_world_exits_zero_and_calls_write() {
    let src = r#"
    const ifj = @import("ifj24.zig");
    pub fn main() void {
        ifj.write("hello world");
    }
    "#;
    run(src)
        .success()
        .stdout(predicate::str::contains("WRITE string@hello\\032world"));
}

#[test]
fn mutual_function_reference_compiles() {
    let src = r#"
    const ifj = @import("ifj24.zig");
    pub fn isEven(n: i32) i32 {
        if (n == 0) {
            return 1;
        } else {
            return isOdd(n - 1);
        }
    }
    pub fn isOdd(n: i32) i32 {
        if (n == 0) {
            return 0;
        } else {
            return isEven(n - 1);
        }
    }
    pub fn main() void {
        var r = isEven(4);
        ifj.write(r);
    }
    "#;
    run(src).success().stdout(predicate::str::contains("CALL isEven")).stdout(predicate::str::contains("CALL isOdd"));
}

#[test]
fn nullable_unwrap_emits_guard_sequence() {
    let src = r#"
    const ifj = @import("ifj24.zig");
    pub fn main() void {
        var v: ?i32 = null;
        if (v) |value| {
            ifj.write(value);
        } else {
            ifj.write("none");
        }
    }
    "#;
    run(src)
        .success()
        .stdout(predicate::str::contains("JUMPIFEQ else0 LF@v nil@nil"))
        .stdout(predicate::str::contains("DEFVAR LF@value"));
}

#[test]
fn integer_promotion_emits_int2floats() {
    let src = r#"
    const ifj = @import("ifj24.zig");
    pub fn main() void {
        var x: f64 = 1 + 2.0;
        ifj.write(x);
    }
    "#;
    run(src).success().stdout(predicate::str::contains("INT2FLOATS"));
}

#[test]
fn mismatched_return_exits_with_code_six() {
    let src = r#"
    const ifj = @import("ifj24.zig");
    pub fn f() i32 {
        return;
    }
    pub fn main() void { }
    "#;
    run(src).code(6);
}

#[test]
fn unused_variable_exits_with_code_nine_and_names_it() {
    let src = r#"
    const ifj = @import("ifj24.zig");
    pub fn main() void {
        var unused_thing: i32 = 1;
    }
    "#;
    run(src).code(9).stderr(predicate::str::contains("unused_thing"));
}

#[test]
fn float_literal_with_zero_fraction_is_accepted() {
    let src = r#"
    const ifj = @import("ifj24.zig");
    pub fn main() void {
        var x: i32 = 3.0;
        ifj.write(x);
    }
    "#;
    run(src).success().stdout(predicate::str::contains("FLOAT2INTS"));
}

#[test]
fn float_literal_with_fraction_is_rejected_with_code_seven() {
    let src = r#"
    const ifj = @import("ifj24.zig");
    pub fn main() void {
        var x: i32 = 3.5;
        ifj.write(x);
    }
    "#;
    run(src).code(7);
}

#[test]
fn const_reassignment_exits_with_code_five() {
    let src = r#"
    const ifj = @import("ifj24.zig");
    pub fn main() void {
        const x: i32 = 1;
        x = 2;
        ifj.write(x);
    }
    "#;
    run(src).code(5);
}

#[test]
fn empty_stdin_fails_with_missing_main() {
    let mut cmd = ifjc();
    cmd.write_stdin("");
    cmd.assert().code(3);
}

#[test]
fn binary_refuses_to_hang_on_malformed_source() {
    let mut cmd = ifjc();
    cmd.write_stdin("pub fn main( void {");
    let assert = cmd.assert();
    assert.failure();
}
