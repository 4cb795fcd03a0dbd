//! Driver crate: wires the lexer, the two parser passes, and the code
//! emitter into the single entry point the `ifjc` binary (and the
//! integration tests below `tests/`) both call.
//!
//! This is the one place in the workspace that owns a [`std::process::exit`]
//! call — everywhere else, failure is an ordinary `Result` propagated with
//! `?`. Keeping every other module exit-free is what makes them testable as
//! plain library code.

use ifjc_gen::AsmEmitter;
use ifjc_lex::Lexer;
use ifjc_par::Compiler;
use ifjc_util::CompileError;

/// Lexes, pre-passes, and body-compiles `source`, returning the emitted
/// TARGET assembly as bytes on success.
pub fn compile(source: &str) -> Result<Vec<u8>, CompileError> {
    let tokens = Lexer::new(source).tokenize()?;

    let emit = AsmEmitter::new(Vec::new());
    let mut compiler = Compiler::new(emit)?;

    ifjc_par::run_prepass(&mut compiler, &tokens)?;

    compiler.emit.header();
    compiler.emit.init_registers();
    compiler.emit.jump("main");

    ifjc_par::run_body_pass(&mut compiler, &tokens)?;

    Ok(compiler.emit.into_inner())
}

/// Installs the `tracing` subscriber the binary entry point uses. Level is
/// controlled by `IFJC_LOG` (falls back to `RUST_LOG`, then `error`); this
/// never affects the assembly written to stdout or the process exit code,
/// only the diagnostic trace written to stderr.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("IFJC_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("error"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn out(src: &str) -> String {
        String::from_utf8(compile(src).unwrap()).unwrap()
    }

    #[test]
    fn minimal_program_jumps_to_main() {
        let src = r#"
        const ifj = @import("ifj24.zig");
        pub fn main() void {
        }
        "#;
        let text = out(src);
        assert!(text.starts_with(".IFJcode24"));
        assert!(text.contains("JUMP main"));
        assert!(text.contains("LABEL main"));
    }

    #[test]
    fn lexical_error_surfaces_as_compile_error() {
        let err = compile("pub fn main() void { var x = !; }").unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn undefined_main_is_rejected() {
        let err = compile(r#"const ifj = @import("ifj24.zig"); pub fn f() void { }"#).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
