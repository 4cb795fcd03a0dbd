//! Body parser (component I): the second pass over the token stream.
//!
//! Where the pre-pass only records signatures, this pass walks each
//! function's `{ ... }` a statement at a time, emitting code as it goes and
//! running every semantic check the signature alone can't: variable
//! declaration and assignment, call statements (user and `ifj.`-prefixed),
//! `if`/`while` in both their boolean and nullable-unwrap forms, and
//! `return`. It shares the `Compiler` context the pre-pass populated, so
//! forward references to functions declared later in the file just work.

use ifjc_gen::{Emit, Frame, LiteralValue, Operand};
use ifjc_lex::{Keyword, Token, TokenKind, TokenVector};
use ifjc_sem::{DataType, Symbol, VariableSymbol};
use ifjc_util::CompileError;

use crate::compiler::Compiler;
use crate::cursor::TokenCursor;
use crate::expr;

/// Runs the body pass over the whole program: skips the `const ifj = ...`
/// import header, then compiles each `pub fn` in file order. The pre-pass
/// must already have populated `compiler.global` with every signature.
pub fn run_body_pass<E: Emit>(compiler: &mut Compiler<E>, tokens: &TokenVector) -> Result<(), CompileError> {
    let mut cursor = TokenCursor::new(tokens);

    if cursor.kind() == TokenKind::Keyword(Keyword::Const) && is_import_header(&cursor) {
        parse_import_header(&mut cursor)?;
    }

    while !cursor.at_eof() {
        match cursor.kind() {
            TokenKind::Keyword(Keyword::Pub) => parse_function(compiler, &mut cursor)?,
            TokenKind::Eof => break,
            _ => {
                return Err(CompileError::Syntactic {
                    line: cursor.line(),
                    message: format!("expected a function definition, found \"{}\"", cursor.peek().attribute),
                })
            }
        }
    }

    Ok(())
}

fn is_import_header(cursor: &TokenCursor<'_>) -> bool {
    cursor.peek_at(1).map(|t| t.attribute.as_str()) == Some("ifj")
}

/// `const ifj = @import("ifj24.zig");` — the header every program starts
/// with. It binds no real symbol; the `ifj` name is reserved instead and
/// recognized directly by the call-parsing code below.
fn parse_import_header(cursor: &mut TokenCursor<'_>) -> Result<(), CompileError> {
    expect(cursor, TokenKind::Keyword(Keyword::Const))?;
    expect(cursor, TokenKind::Identifier)?;
    expect(cursor, TokenKind::Assign)?;
    expect(cursor, TokenKind::Import)?;
    expect(cursor, TokenKind::LParen)?;
    expect(cursor, TokenKind::StringLiteral)?;
    expect(cursor, TokenKind::RParen)?;
    expect(cursor, TokenKind::Semicolon)?;
    Ok(())
}

/// Compiles one `pub fn name(params) returnType { ... }`. The signature is
/// looked up rather than re-validated — the pre-pass already owns that —
/// but the parameter list and return type are still walked token-by-token
/// so the cursor lands on the opening `{` in lockstep with the pre-pass.
fn parse_function<E: Emit>(compiler: &mut Compiler<E>, cursor: &mut TokenCursor<'_>) -> Result<(), CompileError> {
    expect(cursor, TokenKind::Keyword(Keyword::Pub))?;
    expect(cursor, TokenKind::Keyword(Keyword::Fn))?;
    let name_tok = expect(cursor, TokenKind::Identifier)?.clone();

    let func = compiler
        .global
        .get(&name_tok.attribute)
        .and_then(Symbol::as_function)
        .cloned()
        .ok_or_else(|| CompileError::Internal {
            message: format!("function \"{}\" missing from pre-pass output", name_tok.attribute),
        })?;

    expect(cursor, TokenKind::LParen)?;
    while cursor.kind() != TokenKind::RParen {
        cursor.advance();
    }
    expect(cursor, TokenKind::RParen)?;
    cursor.advance(); // return type token, already resolved into `func.return_type`
    expect(cursor, TokenKind::LBrace)?;

    compiler.current_function = func.name.clone();
    compiler.current_return_type = func.return_type;

    if func.name == "main" {
        // Every other function's frame is created by its caller ahead of
        // `CALL`, before `PUSHFRAME` runs as part of the label sequence;
        // `main` has no caller, so it must create its own frame first.
        compiler.emit.createframe();
    }
    compiler.emit.function_label(&func.name);

    compiler.scopes.push_scope();
    for (i, param) in func.parameters.iter().enumerate() {
        compiler.emit.define_var(&param.name, Frame::Local);
        compiler
            .emit
            .move_to(Operand::var(&param.name, Frame::Local), Operand::var(format!("%param{i}"), Frame::Local));
        let bound = param.fresh_binding(name_tok.line);
        compiler.scopes.current_scope_mut().insert(param.name.clone(), Symbol::Variable(bound), name_tok.line)?;
    }

    let returns = parse_statements_until_rbrace(compiler, cursor)?;

    if compiler.current_return_type != DataType::Void && !returns {
        return Err(CompileError::MissingOrExtraReturn {
            line: name_tok.line,
            message: format!("function \"{}\" does not return a value on every path", func.name),
        });
    }
    if !returns {
        compiler.emit.popframe();
        compiler.emit.return_instr();
    }

    Ok(())
}

/// Parses statements up to the closing `}`, popping the scope the caller
/// pushed. Returns whether the block is guaranteed to return on every path
/// reaching its end — true as soon as any statement in it does, since later
/// statements are then unreachable.
fn parse_statements_until_rbrace<E: Emit>(compiler: &mut Compiler<E>, cursor: &mut TokenCursor<'_>) -> Result<bool, CompileError> {
    let mut returns = false;
    loop {
        match cursor.kind() {
            TokenKind::RBrace => {
                cursor.advance();
                compiler.scopes.pop_scope()?;
                return Ok(returns);
            }
            TokenKind::Eof => {
                return Err(CompileError::Syntactic {
                    line: cursor.line(),
                    message: "unexpected end of input inside a block".into(),
                })
            }
            _ => {
                if parse_statement(compiler, cursor)? {
                    returns = true;
                }
            }
        }
    }
}

fn parse_braced_block<E: Emit>(compiler: &mut Compiler<E>, cursor: &mut TokenCursor<'_>) -> Result<bool, CompileError> {
    expect(cursor, TokenKind::LBrace)?;
    compiler.scopes.push_scope();
    parse_statements_until_rbrace(compiler, cursor)
}

/// Parses one statement and reports whether it is guaranteed to return
/// (directly, or because every branch of a nested `if`/`else` does —
/// `while` never counts, since its body may run zero times).
fn parse_statement<E: Emit>(compiler: &mut Compiler<E>, cursor: &mut TokenCursor<'_>) -> Result<bool, CompileError> {
    match cursor.kind() {
        TokenKind::Keyword(Keyword::Const) => {
            parse_var_decl(compiler, cursor, true)?;
            Ok(false)
        }
        TokenKind::Keyword(Keyword::Var) => {
            parse_var_decl(compiler, cursor, false)?;
            Ok(false)
        }
        TokenKind::Keyword(Keyword::If) => parse_if(compiler, cursor),
        TokenKind::Keyword(Keyword::While) => {
            parse_while(compiler, cursor)?;
            Ok(false)
        }
        TokenKind::Keyword(Keyword::Return) => {
            parse_return(compiler, cursor)?;
            Ok(true)
        }
        TokenKind::Identifier => {
            parse_identifier_statement(compiler, cursor)?;
            Ok(false)
        }
        TokenKind::Underscore => {
            parse_discard_statement(compiler, cursor)?;
            Ok(false)
        }
        _ => Err(CompileError::Syntactic {
            line: cursor.line(),
            message: format!("unexpected token \"{}\" at the start of a statement", cursor.peek().attribute),
        }),
    }
}

// --- variable declaration -------------------------------------------------

fn parse_var_decl<E: Emit>(compiler: &mut Compiler<E>, cursor: &mut TokenCursor<'_>, is_const: bool) -> Result<(), CompileError> {
    let kw = if is_const { Keyword::Const } else { Keyword::Var };
    expect(cursor, TokenKind::Keyword(kw))?;
    let name_tok = expect(cursor, TokenKind::Identifier)?.clone();
    if name_tok.attribute == "ifj" {
        return Err(CompileError::Syntactic {
            line: name_tok.line,
            message: "\"ifj\" is reserved for the embedded-function import".into(),
        });
    }

    let mut annotation = None;
    if cursor.kind() == TokenKind::Colon {
        cursor.advance();
        let ty_tok = cursor.advance().clone();
        annotation = Some(crate::typeparse::parse_type(&ty_tok)?);
    }
    expect(cursor, TokenKind::Assign)?;

    compiler.emit.define_var(&name_tok.attribute, Frame::Local);

    let (final_ty, literal) = if peek_is_call(cursor) {
        let ret_ty = parse_call_and_emit(compiler, cursor, name_tok.line)?;
        if ret_ty == DataType::Void {
            return Err(CompileError::TypeCompatibility {
                line: name_tok.line,
                message: "cannot assign the result of a void function to a variable".into(),
            });
        }
        let declared = resolve_declared_type(annotation, ret_ty, name_tok.line)?;
        compiler
            .emit
            .move_to(Operand::var(&name_tok.attribute, Frame::Local), ifjc_gen::scratch_register(ret_ty, 0));
        (declared, None)
    } else {
        let (expr_ty, lit) = expr::parse_expression_with_literal(compiler, cursor)?;
        let coerced_ty = maybe_coerce_bare_literal(compiler, annotation, expr_ty, lit.as_deref(), name_tok.line)?;
        let declared = resolve_declared_type(annotation, coerced_ty, name_tok.line)?;
        compiler.emit.pops(Operand::var(&name_tok.attribute, Frame::Local));
        let keep_literal = is_const && coerced_ty == expr_ty;
        (declared, if keep_literal { lit } else { None })
    };

    expect(cursor, TokenKind::Semicolon)?;

    let mut symbol = VariableSymbol::new(name_tok.attribute.clone(), final_ty, is_const, name_tok.line);
    symbol.defined = true;
    if let Some(text) = literal {
        if matches!(final_ty, DataType::I32 | DataType::F64) {
            symbol.constant_literal = Some((final_ty, text));
        }
    }
    compiler.scopes.current_scope_mut().insert(name_tok.attribute, Symbol::Variable(symbol), name_tok.line)?;
    Ok(())
}

/// Settles a declaration or assignment's final type against an optional
/// annotation/lvalue type, applying the two permitted widenings: a bare
/// `null` literal into any `?T`, and `T` into `?T`. Anything else is a
/// hard type mismatch.
fn resolve_declared_type(annotation: Option<DataType>, value_ty: DataType, line: u32) -> Result<DataType, CompileError> {
    match annotation {
        None => {
            if value_ty == DataType::Null {
                return Err(CompileError::TypeDerivation {
                    line,
                    message: "cannot infer the type of \"null\" without an explicit \"?T\" annotation".into(),
                });
            }
            Ok(value_ty)
        }
        Some(declared) => {
            if declared == value_ty {
                Ok(declared)
            } else if value_ty == DataType::Null && declared.is_nullable() {
                Ok(declared)
            } else if declared.is_nullable() && declared.to_normal() == value_ty {
                Ok(declared)
            } else {
                Err(CompileError::TypeCompatibility {
                    line,
                    message: format!("cannot assign a value of type {value_ty:?} to a {declared:?}"),
                })
            }
        }
    }
}

/// A bare numeric literal with no combining operator never passes through
/// [`promote_numeric_pair`][crate::expr], so the int\<->float coercion the
/// expression parser applies mid-arithmetic has to be reapplied here for a
/// single-literal initializer/return (`var x: i32 = 3.0;`,
/// `var y: f64 = 3;`). Only fires when the RHS reduced to one immediate
/// literal; a variable read of a mismatched numeric type is still a hard
/// error.
fn maybe_coerce_bare_literal<E: Emit>(
    compiler: &mut Compiler<E>,
    declared: Option<DataType>,
    ty: DataType,
    literal: Option<&str>,
    line: u32,
) -> Result<DataType, CompileError> {
    let (Some(declared), Some(text)) = (declared, literal) else {
        return Ok(ty);
    };
    let target = if declared.is_nullable() { declared.to_normal() } else { declared };
    match (target, ty) {
        (DataType::I32, DataType::F64) => {
            let value: f64 = text.parse().unwrap_or(0.0);
            if value.fract() != 0.0 {
                return Err(CompileError::TypeCompatibility {
                    line,
                    message: format!("float literal \"{text}\" has a fractional part and cannot be assigned to an i32 lvalue"),
                });
            }
            compiler.emit.float_to_int_stack();
            Ok(DataType::I32)
        }
        (DataType::F64, DataType::I32) => {
            compiler.emit.int_to_float_stack();
            Ok(DataType::F64)
        }
        _ => Ok(ty),
    }
}

// --- assignment / call statements -----------------------------------------

fn parse_identifier_statement<E: Emit>(compiler: &mut Compiler<E>, cursor: &mut TokenCursor<'_>) -> Result<(), CompileError> {
    let name_tok = cursor.peek().clone();

    if name_tok.attribute == "ifj" {
        let ret_ty = parse_call_and_emit(compiler, cursor, name_tok.line)?;
        expect(cursor, TokenKind::Semicolon)?;
        return require_void_statement(ret_ty, name_tok.line);
    }

    match cursor.peek_at(1).map(|t| t.kind) {
        Some(TokenKind::LParen) => {
            let ret_ty = parse_call_and_emit(compiler, cursor, name_tok.line)?;
            expect(cursor, TokenKind::Semicolon)?;
            require_void_statement(ret_ty, name_tok.line)
        }
        Some(TokenKind::Assign) => {
            cursor.advance(); // name
            cursor.advance(); // =
            parse_assignment_rhs(compiler, cursor, name_tok)
        }
        _ => Err(CompileError::Syntactic {
            line: name_tok.line,
            message: format!("expected \"(\" or \"=\" after \"{}\"", name_tok.attribute),
        }),
    }
}

fn require_void_statement(ret_ty: DataType, line: u32) -> Result<(), CompileError> {
    if ret_ty != DataType::Void {
        return Err(CompileError::OtherSemantic {
            line,
            message: "a non-void function call used as a statement must be discarded with \"_ = ...\"".into(),
        });
    }
    Ok(())
}

fn parse_assignment_rhs<E: Emit>(compiler: &mut Compiler<E>, cursor: &mut TokenCursor<'_>, name_tok: Token) -> Result<(), CompileError> {
    let var = compiler
        .scopes
        .find_variable(&name_tok.attribute)
        .cloned()
        .ok_or_else(|| CompileError::UndefinedIdentifier {
            line: name_tok.line,
            message: format!("undefined variable \"{}\"", name_tok.attribute),
        })?;
    if var.is_const {
        return Err(CompileError::Redefinition {
            line: name_tok.line,
            message: format!("\"{}\" is a constant and cannot be reassigned", name_tok.attribute),
        });
    }

    if peek_is_call(cursor) {
        let ret_ty = parse_call_and_emit(compiler, cursor, name_tok.line)?;
        if ret_ty == DataType::Void {
            return Err(CompileError::TypeCompatibility {
                line: name_tok.line,
                message: "cannot assign the result of a void function to a variable".into(),
            });
        }
        resolve_declared_type(Some(var.ty), ret_ty, name_tok.line)?;
        compiler
            .emit
            .move_to(Operand::var(&name_tok.attribute, Frame::Local), ifjc_gen::scratch_register(ret_ty, 0));
    } else {
        let (expr_ty, lit) = expr::parse_expression_with_literal(compiler, cursor)?;
        let coerced_ty = maybe_coerce_bare_literal(compiler, Some(var.ty), expr_ty, lit.as_deref(), name_tok.line)?;
        resolve_declared_type(Some(var.ty), coerced_ty, name_tok.line)?;
        compiler.emit.pops(Operand::var(&name_tok.attribute, Frame::Local));
    }

    expect(cursor, TokenKind::Semicolon)?;
    if let Some(v) = compiler.scopes.find_variable_mut(&name_tok.attribute) {
        v.defined = true;
    }
    Ok(())
}

fn parse_discard_statement<E: Emit>(compiler: &mut Compiler<E>, cursor: &mut TokenCursor<'_>) -> Result<(), CompileError> {
    let line = cursor.line();
    expect(cursor, TokenKind::Underscore)?;
    expect(cursor, TokenKind::Assign)?;

    if peek_is_call(cursor) {
        parse_call_and_emit(compiler, cursor, line)?;
    } else {
        let ty = expr::parse_expression(compiler, cursor)?;
        compiler.emit.pops(discard_slot(ty));
    }

    expect(cursor, TokenKind::Semicolon)?;
    Ok(())
}

fn discard_slot(ty: DataType) -> Operand {
    match ty {
        DataType::Null => Operand::var("R0", Frame::Global),
        other => ifjc_gen::scratch_register(other, 0),
    }
}

/// True when the cursor sits on an identifier that begins a call: either
/// `ifj.<name>(` or `<user fn>(`. Pure lookahead — never advances.
fn peek_is_call(cursor: &TokenCursor<'_>) -> bool {
    if cursor.kind() != TokenKind::Identifier {
        return false;
    }
    if cursor.peek().attribute == "ifj" {
        matches!(cursor.peek_at(1).map(|t| t.kind), Some(TokenKind::Dot))
    } else {
        matches!(cursor.peek_at(1).map(|t| t.kind), Some(TokenKind::LParen))
    }
}

/// Parses a call (assumes [`peek_is_call`] already returned true) and
/// returns the callee's return type. User-defined functions and the one
/// embedded function with no native TARGET instruction (`ifj.string`) go
/// through the generic `CREATEFRAME` + argument-move + `CALL` convention;
/// every other embedded function compiles straight to the native
/// instruction(s) component F's helpers already know how to emit — the
/// runtime never sees a `CALL write`/`CALL readi32`/etc. The result, if
/// any, is left in the TARGET register matching the return type
/// (`R0`/`F0`/`S0`); nothing is pushed to the operand stack.
fn parse_call_and_emit<E: Emit>(compiler: &mut Compiler<E>, cursor: &mut TokenCursor<'_>, call_line: u32) -> Result<DataType, CompileError> {
    let name_tok = cursor.peek().clone();
    let (func, embedded_name) = if name_tok.attribute == "ifj" {
        cursor.advance();
        expect(cursor, TokenKind::Dot)?;
        let fname_tok = expect(cursor, TokenKind::Identifier)?.clone();
        let key = format!("ifj.{}", fname_tok.attribute);
        let func = compiler
            .global
            .get(&key)
            .and_then(Symbol::as_function)
            .cloned()
            .ok_or_else(|| CompileError::Syntactic {
                line: fname_tok.line,
                message: format!("\"{}\" is not an embedded function", fname_tok.attribute),
            })?;
        (func, Some(fname_tok.attribute))
    } else {
        cursor.advance();
        let func = compiler
            .global
            .get(&name_tok.attribute)
            .and_then(Symbol::as_function)
            .cloned()
            .ok_or_else(|| CompileError::UndefinedIdentifier {
                line: name_tok.line,
                message: format!("undefined function \"{}\"", name_tok.attribute),
            })?;
        (func, None)
    };

    expect(cursor, TokenKind::LParen)?;
    let mut args: Vec<(Operand, DataType)> = Vec::new();
    if cursor.kind() != TokenKind::RParen {
        loop {
            let arg_tok = cursor.peek().clone();
            let (operand, ty) = match arg_tok.kind {
                TokenKind::IntLiteral => (Operand::Literal(LiteralValue::Int(arg_tok.attribute.clone())), DataType::I32),
                TokenKind::FloatLiteral => {
                    let value: f64 = arg_tok.attribute.parse().unwrap_or(0.0);
                    (
                        Operand::Literal(LiteralValue::Float(ifjc_gen::format_float_literal(value))),
                        DataType::F64,
                    )
                }
                TokenKind::StringLiteral => {
                    let unquoted = &arg_tok.attribute[1..arg_tok.attribute.len() - 1];
                    (
                        Operand::Literal(LiteralValue::Str(ifjc_gen::escape_string_literal(unquoted))),
                        DataType::U8Array,
                    )
                }
                TokenKind::Keyword(Keyword::Null) => (Operand::Literal(LiteralValue::Nil), DataType::Null),
                TokenKind::Identifier => {
                    let var = compiler
                        .scopes
                        .find_variable(&arg_tok.attribute)
                        .cloned()
                        .ok_or_else(|| CompileError::UndefinedIdentifier {
                            line: arg_tok.line,
                            message: format!("undefined variable \"{}\"", arg_tok.attribute),
                        })?;
                    if let Some(v) = compiler.scopes.find_variable_mut(&arg_tok.attribute) {
                        v.was_used = true;
                    }
                    (Operand::var(arg_tok.attribute.clone(), Frame::Local), var.ty)
                }
                _ => {
                    return Err(CompileError::Syntactic {
                        line: arg_tok.line,
                        message: "call arguments must be a literal or an identifier".into(),
                    })
                }
            };
            cursor.advance();

            let index = args.len();
            if index >= func.parameters.len() {
                return Err(CompileError::SignatureMismatch {
                    line: arg_tok.line,
                    message: format!("\"{}\" takes {} argument(s), more were supplied", func.name, func.parameters.len()),
                });
            }
            let expected = func.parameters[index].ty;
            if !arg_compatible(expected, ty) {
                return Err(CompileError::SignatureMismatch {
                    line: arg_tok.line,
                    message: format!("argument {} of \"{}\" expects {expected:?}, found {ty:?}", index + 1, func.name),
                });
            }
            args.push((operand, ty));

            if cursor.kind() == TokenKind::Comma {
                cursor.advance();
                continue;
            }
            break;
        }
    }
    expect(cursor, TokenKind::RParen)?;

    if args.len() != func.parameters.len() {
        return Err(CompileError::SignatureMismatch {
            line: call_line,
            message: format!("\"{}\" takes {} argument(s), {} were supplied", func.name, func.parameters.len(), args.len()),
        });
    }

    if let Some(name) = embedded_name.as_deref() {
        if let Some(ty) = emit_embedded_builtin(compiler, name, &args) {
            return Ok(ty);
        }
    }

    compiler.emit.createframe();
    for (index, (operand, _)) in args.into_iter().enumerate() {
        compiler.emit.set_param(index as u32, operand);
    }
    compiler.emit.call(&func.name);
    Ok(func.return_type)
}

/// Compiles the embedded functions the TARGET instruction set can express
/// directly, skipping the `CREATEFRAME`/`CALL` convention entirely.
/// Returns `None` for the one embedded function left on the generic call
/// path (`string`, which has no native TARGET opcode and is left to the
/// VM's own runtime, per spec.md's out-of-scope embedded-runtime
/// carve-out).
fn emit_embedded_builtin<E: Emit>(compiler: &mut Compiler<E>, name: &str, args: &[(Operand, DataType)]) -> Option<DataType> {
    let r0 = || Operand::var("R0", Frame::Global);
    let f0 = || Operand::var("F0", Frame::Global);
    let s0 = || Operand::var("S0", Frame::Global);

    match name {
        "readstr" => {
            compiler.emit.read(s0(), DataType::NullableU8Array);
            Some(DataType::NullableU8Array)
        }
        "readi32" => {
            compiler.emit.read(r0(), DataType::NullableI32);
            Some(DataType::NullableI32)
        }
        "readf64" => {
            compiler.emit.read(f0(), DataType::NullableF64);
            Some(DataType::NullableF64)
        }
        "write" => {
            compiler.emit.write_instr(args[0].0.clone());
            Some(DataType::Void)
        }
        "i2f" => {
            compiler.emit.int2float(f0(), args[0].0.clone());
            Some(DataType::F64)
        }
        "f2i" => {
            compiler.emit.float2int(r0(), args[0].0.clone());
            Some(DataType::I32)
        }
        "length" => {
            compiler.emit.strlen(r0(), args[0].0.clone());
            Some(DataType::I32)
        }
        "concat" => {
            compiler.emit.concat(s0(), args[0].0.clone(), args[1].0.clone());
            Some(DataType::U8Array)
        }
        "chr" => {
            compiler.emit.int2char(s0(), args[0].0.clone());
            Some(DataType::U8Array)
        }
        "ord" => {
            let n = compiler.labels.next_ord();
            compiler.emit.ord_helper(args[0].0.clone(), args[1].0.clone(), n);
            Some(DataType::I32)
        }
        "strcmp" => {
            let n = compiler.labels.next_strcmp();
            compiler.emit.strcmp_helper(args[0].0.clone(), args[1].0.clone(), n);
            Some(DataType::I32)
        }
        "substring" => {
            let n = compiler.labels.next_substring();
            compiler.emit.substring_helper(args[0].0.clone(), args[1].0.clone(), args[2].0.clone(), n);
            compiler.emit.pops(s0());
            Some(DataType::NullableU8Array)
        }
        _ => None,
    }
}

fn arg_compatible(expected: DataType, got: DataType) -> bool {
    if expected == got {
        return true;
    }
    if expected == DataType::Term {
        return matches!(got, DataType::I32 | DataType::F64 | DataType::U8Array | DataType::Bool);
    }
    if expected.is_nullable() && (got == DataType::Null || got == expected.to_normal()) {
        return true;
    }
    false
}

// --- if / while ------------------------------------------------------------

/// Checkpoints past a balanced `( ... )` starting at the cursor's current
/// position and reports whether a `|` immediately follows — the
/// distinguishing mark of the nullable-unwrap form of `if`/`while`. Always
/// restores the cursor before returning.
fn peek_has_binder(cursor: &mut TokenCursor<'_>) -> Result<bool, CompileError> {
    let checkpoint = cursor.checkpoint();
    expect(cursor, TokenKind::LParen)?;
    let mut depth = 1i32;
    loop {
        match cursor.kind() {
            TokenKind::LParen => {
                depth += 1;
                cursor.advance();
            }
            TokenKind::RParen => {
                cursor.advance();
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            TokenKind::Eof => {
                return Err(CompileError::Syntactic {
                    line: cursor.line(),
                    message: "unterminated condition".into(),
                })
            }
            _ => {
                cursor.advance();
            }
        }
    }
    let has_binder = cursor.kind() == TokenKind::VerticalBar;
    cursor.restore(checkpoint);
    Ok(has_binder)
}

fn parse_if<E: Emit>(compiler: &mut Compiler<E>, cursor: &mut TokenCursor<'_>) -> Result<bool, CompileError> {
    expect(cursor, TokenKind::Keyword(Keyword::If))?;
    let n = compiler.labels.next_if();
    let else_label = format!("else{n}");
    let endif_label = format!("endif{n}");

    let then_returns = if peek_has_binder(cursor)? {
        parse_nullable_guard(compiler, cursor, &else_label)?;
        parse_braced_block_in_current_scope(compiler, cursor)?
    } else {
        parse_boolean_guard(compiler, cursor, &else_label)?;
        parse_braced_block(compiler, cursor)?
    };

    compiler.emit.jump(&endif_label);
    compiler.emit.label(&else_label);
    expect(cursor, TokenKind::Keyword(Keyword::Else))?;
    let else_returns = parse_braced_block(compiler, cursor)?;
    compiler.emit.label(&endif_label);
    Ok(then_returns && else_returns)
}

fn parse_while<E: Emit>(compiler: &mut Compiler<E>, cursor: &mut TokenCursor<'_>) -> Result<(), CompileError> {
    expect(cursor, TokenKind::Keyword(Keyword::While))?;
    let n = compiler.labels.next_while();
    let while_label = format!("while{n}");
    let endwhile_label = format!("endwhile{n}");
    compiler.emit.label(&while_label);

    if peek_has_binder(cursor)? {
        parse_nullable_guard(compiler, cursor, &endwhile_label)?;
        parse_braced_block_in_current_scope(compiler, cursor)?;
    } else {
        parse_boolean_guard(compiler, cursor, &endwhile_label)?;
        parse_braced_block(compiler, cursor)?;
    };

    compiler.emit.jump(&while_label);
    compiler.emit.label(&endwhile_label);
    Ok(())
}

/// `(boolExpr)`: evaluates the condition, pops it into `GF@B0`, and jumps
/// to `fail_label` when it is false.
fn parse_boolean_guard<E: Emit>(compiler: &mut Compiler<E>, cursor: &mut TokenCursor<'_>, fail_label: &str) -> Result<(), CompileError> {
    expect(cursor, TokenKind::LParen)?;
    let ty = expr::parse_expression(compiler, cursor)?;
    expect(cursor, TokenKind::RParen)?;
    if ty != DataType::Bool {
        return Err(CompileError::TypeCompatibility {
            line: cursor.line(),
            message: "condition must be a boolean expression".into(),
        });
    }
    compiler.emit.pops(Operand::var("B0", Frame::Global));
    compiler.emit.jumpifeq(fail_label, Operand::var("B0", Frame::Global), Operand::Literal(LiteralValue::Bool(false)));
    Ok(())
}

/// `(identifier) |binder|`: jumps to `fail_label` if the nullable variable
/// is `null`, otherwise pushes a scope binding `binder` to its unwrapped
/// value. The caller finishes the scope by parsing the block body directly
/// into it (no further `push_scope`) via
/// [`parse_braced_block_in_current_scope`].
fn parse_nullable_guard<E: Emit>(compiler: &mut Compiler<E>, cursor: &mut TokenCursor<'_>, fail_label: &str) -> Result<(), CompileError> {
    expect(cursor, TokenKind::LParen)?;
    let id_tok = expect(cursor, TokenKind::Identifier)?.clone();
    let var = compiler
        .scopes
        .find_variable(&id_tok.attribute)
        .cloned()
        .ok_or_else(|| CompileError::UndefinedIdentifier {
            line: id_tok.line,
            message: format!("undefined variable \"{}\"", id_tok.attribute),
        })?;
    if !var.ty.is_nullable() {
        return Err(CompileError::TypeCompatibility {
            line: id_tok.line,
            message: format!("\"{}\" is not a nullable type", id_tok.attribute),
        });
    }
    if let Some(v) = compiler.scopes.find_variable_mut(&id_tok.attribute) {
        v.was_used = true;
    }
    expect(cursor, TokenKind::RParen)?;
    expect(cursor, TokenKind::VerticalBar)?;
    let binder_tok = expect(cursor, TokenKind::Identifier)?.clone();
    expect(cursor, TokenKind::VerticalBar)?;

    compiler
        .emit
        .jumpifeq(fail_label, Operand::var(&id_tok.attribute, Frame::Local), Operand::Literal(LiteralValue::Nil));

    compiler.scopes.push_scope();
    let mut binder = VariableSymbol::new(binder_tok.attribute.clone(), var.ty.to_normal(), false, binder_tok.line);
    binder.defined = true;
    compiler
        .scopes
        .current_scope_mut()
        .insert(binder_tok.attribute.clone(), Symbol::Variable(binder), binder_tok.line)?;
    compiler.emit.define_var(&binder_tok.attribute, Frame::Local);
    compiler
        .emit
        .move_to(Operand::var(&binder_tok.attribute, Frame::Local), Operand::var(&id_tok.attribute, Frame::Local));
    Ok(())
}

/// Parses `{ ... }` assuming the current scope was already pushed and
/// populated by the caller (the nullable-unwrap binder).
fn parse_braced_block_in_current_scope<E: Emit>(compiler: &mut Compiler<E>, cursor: &mut TokenCursor<'_>) -> Result<bool, CompileError> {
    expect(cursor, TokenKind::LBrace)?;
    parse_statements_until_rbrace(compiler, cursor)
}

// --- return ------------------------------------------------------------

fn parse_return<E: Emit>(compiler: &mut Compiler<E>, cursor: &mut TokenCursor<'_>) -> Result<(), CompileError> {
    let line = cursor.line();
    expect(cursor, TokenKind::Keyword(Keyword::Return))?;

    if compiler.current_return_type == DataType::Void {
        if cursor.kind() != TokenKind::Semicolon {
            return Err(CompileError::MissingOrExtraReturn {
                line,
                message: format!("function \"{}\" is void but \"return\" has a trailing expression", compiler.current_function),
            });
        }
        cursor.advance();
    } else {
        if cursor.kind() == TokenKind::Semicolon {
            return Err(CompileError::MissingOrExtraReturn {
                line,
                message: format!("function \"{}\" must return a value", compiler.current_function),
            });
        }
        let declared = compiler.current_return_type;
        let ty = if peek_is_call(cursor) {
            let ret_ty = parse_call_and_emit(compiler, cursor, line)?;
            if ret_ty == DataType::Void {
                return Err(CompileError::TypeCompatibility {
                    line,
                    message: "cannot return the result of a void function call".into(),
                });
            }
            // The call convention and the return convention share the same
            // per-type scratch register, so the value is already in place.
            ret_ty
        } else {
            let (raw_ty, lit) = expr::parse_expression_with_literal(compiler, cursor)?;
            let coerced = maybe_coerce_bare_literal(compiler, Some(declared), raw_ty, lit.as_deref(), line)?;
            compiler.emit.pops(ifjc_gen::scratch_register(coerced, 0));
            coerced
        };
        expect(cursor, TokenKind::Semicolon)?;
        let ok = ty == declared || (ty == DataType::Null && declared.is_nullable()) || (declared.is_nullable() && declared.to_normal() == ty);
        if !ok {
            return Err(CompileError::TypeCompatibility {
                line,
                message: format!("function \"{}\" declared to return {declared:?}, found {ty:?}", compiler.current_function),
            });
        }
    }

    compiler.emit.popframe();
    compiler.emit.return_instr();
    Ok(())
}

fn expect<'a>(cursor: &mut TokenCursor<'a>, kind: TokenKind) -> Result<&'a Token, CompileError> {
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
    use crate::prepass::run_prepass;
    use ifjc_gen::AsmEmitter;
    use ifjc_lex::Lexer;

    fn compile(src: &str) -> Result<String, CompileError> {
        let tokens = Lexer::new(src).tokenize().unwrap();
        let mut compiler = Compiler::new(AsmEmitter::new(Vec::new())).unwrap();
        run_prepass(&mut compiler, &tokens)?;
        run_body_pass(&mut compiler, &tokens)?;
        Ok(String::from_utf8(compiler.emit.into_inner()).unwrap())
    }

    #[test]
    fn hello_world_calls_write() {
        let out = compile(
            r#"
            const ifj = @import("ifj24.zig");
            pub fn main() void {
                ifj.write("hello");
            }
            "#,
        )
        .unwrap();
        assert!(out.contains("LABEL main"));
        assert!(out.contains("WRITE string@hello"));
    }

    #[test]
    fn var_decl_and_return_roundtrip() {
        let out = compile(
            r#"
            const ifj = @import("ifj24.zig");
            pub fn answer() i32 {
                var x: i32 = 41;
                return x + 1;
            }
            pub fn main() void {
                var y = answer();
                ifj.write(y);
            }
            "#,
        )
        .unwrap();
        assert!(out.contains("CALL answer"));
        assert!(out.contains("MOVE LF@y GF@R0"));
    }

    #[test]
    fn mutual_reference_works() {
        let out = compile(
            r#"
            const ifj = @import("ifj24.zig");
            pub fn a(n: i32) i32 { return b(n); }
            pub fn b(n: i32) i32 { return n; }
            pub fn main() void { var z = a(1); ifj.write(z); }
            "#,
        )
        .unwrap();
        assert!(out.contains("CALL a"));
        assert!(out.contains("CALL b"));
    }

    #[test]
    fn nullable_unwrap_if_emits_guard_and_binder() {
        let out = compile(
            r#"
            const ifj = @import("ifj24.zig");
            pub fn main() void {
                var maybe: ?i32 = null;
                if (maybe) |value| {
                    ifj.write(value);
                } else {
                    ifj.write("nothing");
                }
            }
            "#,
        )
        .unwrap();
        assert!(out.contains("JUMPIFEQ else0 LF@maybe nil@nil"));
        assert!(out.contains("DEFVAR LF@value"));
    }

    #[test]
    fn int_literal_promotion_emits_int2floats() {
        let out = compile(
            r#"
            const ifj = @import("ifj24.zig");
            pub fn main() void {
                var x: f64 = 1 + 2.0;
                ifj.write(x);
            }
            "#,
        )
        .unwrap();
        assert!(out.contains("INT2FLOATS"));
    }

    #[test]
    fn mismatched_return_count_is_an_error() {
        let err = compile(
            r#"
            const ifj = @import("ifj24.zig");
            pub fn f() i32 { return; }
            pub fn main() void { }
            "#,
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 6);
    }

    #[test]
    fn return_in_every_if_else_branch_satisfies_the_function() {
        let out = compile(
            r#"
            const ifj = @import("ifj24.zig");
            pub fn f(c: i32) i32 {
                if (c < 1) {
                    return 1;
                } else {
                    return 2;
                }
            }
            pub fn main() void {
                var x = f(0);
                ifj.write(x);
            }
            "#,
        )
        .unwrap();
        assert!(out.contains("CALL f"));
    }

    #[test]
    fn while_body_return_does_not_satisfy_the_function() {
        let err = compile(
            r#"
            const ifj = @import("ifj24.zig");
            pub fn f(c: i32) i32 {
                while (c < 1) {
                    return 1;
                }
            }
            pub fn main() void { }
            "#,
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 6);
    }

    #[test]
    fn unused_variable_is_an_error() {
        let err = compile(
            r#"
            const ifj = @import("ifj24.zig");
            pub fn main() void {
                var x: i32 = 1;
            }
            "#,
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 9);
    }

    #[test]
    fn float_with_zero_fraction_is_accepted_as_int() {
        let out = compile(
            r#"
            const ifj = @import("ifj24.zig");
            pub fn main() void {
                var x: i32 = 3.0;
                ifj.write(x);
            }
            "#,
        )
        .unwrap();
        assert!(out.contains("FLOAT2INTS"));
    }

    #[test]
    fn float_with_nonzero_fraction_is_rejected() {
        let err = compile(
            r#"
            const ifj = @import("ifj24.zig");
            pub fn main() void {
                var x: i32 = 3.5;
                ifj.write(x);
            }
            "#,
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 7);
    }

    #[test]
    fn const_reassignment_is_rejected() {
        let err = compile(
            r#"
            const ifj = @import("ifj24.zig");
            pub fn main() void {
                const x: i32 = 1;
                x = 2;
                ifj.write(x);
            }
            "#,
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn const_literal_is_inlined() {
        let out = compile(
            r#"
            const ifj = @import("ifj24.zig");
            pub fn main() void {
                const x: i32 = 7;
                var y: i32 = x + 1;
                ifj.write(y);
            }
            "#,
        )
        .unwrap();
        assert!(out.contains("PUSHS int@7"));
    }

    #[test]
    fn while_loop_emits_back_edge() {
        let out = compile(
            r#"
            const ifj = @import("ifj24.zig");
            pub fn main() void {
                var i: i32 = 0;
                while (i < 3) {
                    i = i + 1;
                }
                ifj.write(i);
            }
            "#,
        )
        .unwrap();
        assert!(out.contains("LABEL while0"));
        assert!(out.contains("JUMP while0"));
    }

    #[test]
    fn embedded_call_without_discard_is_rejected() {
        let err = compile(
            r#"
            const ifj = @import("ifj24.zig");
            pub fn main() void {
                ifj.length("hi");
            }
            "#,
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 10);
    }

    #[test]
    fn embedded_builtins_compile_to_native_instructions_not_calls() {
        let out = compile(
            r#"
            const ifj = @import("ifj24.zig");
            pub fn main() void {
                var n = ifj.length("hi");
                var c = ifj.concat("a", "b");
                var ch = ifj.chr(65);
                var o = ifj.ord("a", 0);
                var cmp = ifj.strcmp("a", "b");
                var sub = ifj.substring("abc", 0, 1);
                var f = ifj.i2f(1);
                var i = ifj.f2i(1.0);
                ifj.write(n);
                ifj.write(c);
                ifj.write(ch);
                ifj.write(o);
                ifj.write(cmp);
                ifj.write(f);
                ifj.write(i);
                if (sub) |s| { ifj.write(s); } else { ifj.write("none"); }
            }
            "#,
        )
        .unwrap();
        assert!(out.contains("STRLEN GF@R0 string@hi"));
        assert!(out.contains("CONCAT GF@S0"));
        assert!(out.contains("INT2CHAR GF@S0 int@65"));
        assert!(out.contains("INT2FLOAT GF@F0 int@1"));
        assert!(out.contains("FLOAT2INT GF@R0 float@"));
        assert!(!out.contains("CALL length"));
        assert!(!out.contains("CALL concat"));
        assert!(!out.contains("CALL chr"));
        assert!(!out.contains("CALL ord"));
        assert!(!out.contains("CALL strcmp"));
        assert!(!out.contains("CALL substring"));
        assert!(!out.contains("CALL i2f"));
        assert!(!out.contains("CALL f2i"));
    }

    #[test]
    fn readi32_emits_read_instruction_into_scratch_register() {
        let out = compile(
            r#"
            const ifj = @import("ifj24.zig");
            pub fn main() void {
                var x: ?i32 = ifj.readi32();
                if (x) |v| { ifj.write(v); } else { ifj.write(0); }
            }
            "#,
        )
        .unwrap();
        assert!(out.contains("READ GF@R0 int"));
        assert!(!out.contains("CALL readi32"));
    }
}
