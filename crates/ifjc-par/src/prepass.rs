use ifjc_gen::Emit;
use ifjc_lex::{Keyword, TokenKind, TokenVector};
use ifjc_sem::{DataType, FunctionSymbol, Symbol, VariableSymbol};
use ifjc_util::{CompileError, FxHashSet};

use crate::compiler::Compiler;
use crate::cursor::TokenCursor;
use crate::typeparse::parse_type;

/// Walks the whole token vector once, registering every top-level
/// function's signature in the global table before any body is parsed.
/// Embedded functions must already be present (see
/// [`ifjc_sem::register_embedded`]) so user code can never collide with
/// the `ifj.`-namespaced built-ins.
pub fn run_prepass<E: Emit>(compiler: &mut Compiler<E>, tokens: &TokenVector) -> Result<(), CompileError> {
    let mut cursor = TokenCursor::new(tokens);
    let mut depth: i32 = 0;
    let mut saw_main = false;

    loop {
        match cursor.kind() {
            TokenKind::Eof => break,
            TokenKind::LBrace => {
                depth += 1;
                cursor.advance();
            }
            TokenKind::RBrace => {
                depth -= 1;
                cursor.advance();
            }
            TokenKind::Keyword(Keyword::Pub) => {
                if depth > 0 {
                    return Err(CompileError::Syntactic {
                        line: cursor.line(),
                        message: "nested function definitions are not allowed".into(),
                    });
                }
                let name = parse_signature(compiler, &mut cursor)?;
                // `parse_signature` already consumed the function's opening
                // `{`; account for it here so the matching `}` brings depth
                // back to 0 instead of drifting negative.
                depth += 1;
                if name == "main" {
                    saw_main = true;
                }
            }
            _ => {
                cursor.advance();
            }
        }
    }

    if !saw_main {
        return Err(CompileError::UndefinedIdentifier {
            line: cursor.line(),
            message: "program has no \"main\" function".into(),
        });
    }
    let main = compiler
        .global
        .get("main")
        .and_then(Symbol::as_function)
        .expect("saw_main implies the symbol was installed");
    if !main.parameters.is_empty() || main.return_type != DataType::Void {
        return Err(CompileError::SignatureMismatch {
            line: 0,
            message: "\"main\" must take no parameters and return void".into(),
        });
    }

    Ok(())
}

/// Parses `pub fn name(params) returnType {` starting at `pub` (already
/// peeked, not yet consumed) and installs the resulting `FunctionSymbol`.
/// Leaves the cursor just past the opening `{`; the caller's brace-depth
/// tracking picks the body back up from there.
fn parse_signature<E: Emit>(compiler: &mut Compiler<E>, cursor: &mut TokenCursor<'_>) -> Result<String, CompileError> {
    cursor.advance(); // pub
    expect(cursor, TokenKind::Keyword(Keyword::Fn))?;

    let name_tok = expect(cursor, TokenKind::Identifier)?;
    let name = name_tok.attribute.clone();
    let line = name_tok.line;

    expect(cursor, TokenKind::LParen)?;
    let mut parameters = Vec::new();
    let mut seen = FxHashSet::default();
    if cursor.kind() != TokenKind::RParen {
        loop {
            let pname_tok = expect(cursor, TokenKind::Identifier)?;
            let pname = pname_tok.attribute.clone();
            if !seen.insert(pname.clone()) {
                return Err(CompileError::Redefinition {
                    line: pname_tok.line,
                    message: format!("duplicate parameter name \"{pname}\" in signature of \"{name}\""),
                });
            }
            expect(cursor, TokenKind::Colon)?;
            let ty_tok = cursor.advance().clone();
            let ty = parse_type(&ty_tok)?;
            let mut symbol = VariableSymbol::new(pname, ty, false, pname_tok.line);
            symbol.defined = true;
            parameters.push(symbol);

            if cursor.kind() == TokenKind::Comma {
                cursor.advance();
                continue;
            }
            break;
        }
    }
    expect(cursor, TokenKind::RParen)?;

    let ret_tok = cursor.advance().clone();
    let return_type = parse_type(&ret_tok)?;

    expect(cursor, TokenKind::LBrace)?;

    compiler.global.insert(
        name.clone(),
        Symbol::Function(FunctionSymbol::new(name.clone(), parameters, return_type)),
        line,
    )?;

    Ok(name)
}

fn expect<'a>(cursor: &mut TokenCursor<'a>, kind: TokenKind) -> Result<&'a ifjc_lex::Token, CompileError> {
    if cursor.kind() == kind {
        Ok(cursor.advance())
    } else {
        Err(CompileError::Syntactic {
            line: cursor.line(),
            message: format!("expected {kind:?}, found \"{}\"", cursor.peek().attribute),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifjc_gen::AsmEmitter;
    use ifjc_lex::Lexer;

    fn prepass(src: &str) -> Result<Compiler<AsmEmitter<Vec<u8>>>, CompileError> {
        let tokens = Lexer::new(src).tokenize().unwrap();
        let mut compiler = Compiler::new(AsmEmitter::new(Vec::new())).unwrap();
        run_prepass(&mut compiler, &tokens)?;
        Ok(compiler)
    }

    #[test]
    fn registers_main() {
        let compiler = prepass("pub fn main() void { }").unwrap();
        assert!(compiler.global.get("main").is_some());
    }

    #[test]
    fn mutual_reference_is_fine() {
        let src = "pub fn a() i32 { return b(); } pub fn b() i32 { return 1; } pub fn main() void { }";
        let compiler = prepass(src).unwrap();
        assert!(compiler.global.get("a").is_some());
        assert!(compiler.global.get("b").is_some());
    }

    #[test]
    fn missing_main_is_an_error() {
        assert!(prepass("pub fn a() void { }").is_err());
    }

    #[test]
    fn duplicate_parameter_name_is_an_error() {
        let src = "pub fn f(a: i32, a: i32) void { } pub fn main() void { }";
        assert!(prepass(src).is_err());
    }

    #[test]
    fn redefinition_is_an_error() {
        let src = "pub fn f() void { } pub fn f() void { } pub fn main() void { }";
        let err = prepass(src).unwrap_err();
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn nested_function_definition_is_rejected() {
        let src = "pub fn a() void { pub fn b() void { } } pub fn main() void { }";
        let err = prepass(src).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn sibling_functions_after_a_body_are_still_top_level() {
        // Regression: a prior depth-tracking bug drifted negative across
        // function bodies, which would have also broken this case silently
        // rather than rejecting it outright.
        let src = "pub fn a() void { } pub fn b() void { } pub fn main() void { }";
        let compiler = prepass(src).unwrap();
        assert!(compiler.global.get("a").is_some());
        assert!(compiler.global.get("b").is_some());
    }
}
