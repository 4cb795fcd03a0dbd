//! Expression sub-parser (component G): Shunting-Yard infix→postfix
//! conversion, followed by a postfix walk that emits TARGET code and
//! tracks the static type of the result, applying the promotion and
//! nullability rules as it goes.

use ifjc_gen::{format_float_literal, ArithOp, Emit, Frame, LiteralValue, Operand, RelOp};
use ifjc_lex::{Keyword, Token, TokenKind};
use ifjc_sem::DataType;
use ifjc_util::CompileError;

use crate::compiler::Compiler;
use crate::cursor::TokenCursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Assoc {
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Mul,
    Div,
    Add,
    Sub,
    Eq,
    NotEq,
    Lt,
    Gt,
    Le,
    Ge,
}

impl Op {
    fn from_kind(kind: TokenKind) -> Option<Op> {
        Some(match kind {
            TokenKind::Star => Op::Mul,
            TokenKind::Slash => Op::Div,
            TokenKind::Plus => Op::Add,
            TokenKind::Minus => Op::Sub,
            TokenKind::Eq => Op::Eq,
            TokenKind::NotEq => Op::NotEq,
            TokenKind::Lt => Op::Lt,
            TokenKind::Gt => Op::Gt,
            TokenKind::Le => Op::Le,
            TokenKind::Ge => Op::Ge,
            _ => return None,
        })
    }

    fn precedence(self) -> u8 {
        match self {
            Op::Mul | Op::Div => 3,
            Op::Add | Op::Sub => 2,
            Op::Eq | Op::NotEq | Op::Lt | Op::Gt | Op::Le | Op::Ge => 1,
        }
    }

    fn is_relational(self) -> bool {
        self.precedence() == 1
    }

    fn assoc(self) -> Assoc {
        Assoc::Left
    }
}

enum ShuntItem {
    Operand(Token),
    Op(Op, u32), // operator + source line, for diagnostics
}

enum StackSlot {
    Op(Op, u32),
    LeftParen,
}

/// Converts the infix token run starting at the cursor into postfix order.
/// Stops at `;` or at an unmatched `)` (the enclosing `if`/`while`'s own
/// closing paren), leaving that terminator unconsumed.
fn to_postfix(cursor: &mut TokenCursor<'_>) -> Result<Vec<ShuntItem>, CompileError> {
    let mut output = Vec::new();
    let mut op_stack: Vec<StackSlot> = Vec::new();
    let mut paren_depth: i32 = 0;
    let mut relational_seen = false;
    let start_line = cursor.line();

    loop {
        let tok = cursor.peek().clone();
        if tok.line != start_line {
            return Err(CompileError::Syntactic {
                line: tok.line,
                message: "expression must not span multiple lines".into(),
            });
        }

        match tok.kind {
            TokenKind::Semicolon => break,
            TokenKind::RParen if paren_depth == 0 => break,
            TokenKind::LParen => {
                paren_depth += 1;
                op_stack.push(StackSlot::LeftParen);
                cursor.advance();
            }
            TokenKind::RParen => {
                paren_depth -= 1;
                cursor.advance();
                loop {
                    match op_stack.pop() {
                        Some(StackSlot::LeftParen) => break,
                        Some(StackSlot::Op(op, line)) => output.push(ShuntItem::Op(op, line)),
                        None => {
                            return Err(CompileError::Syntactic {
                                line: tok.line,
                                message: "unmatched ')' in expression".into(),
                            })
                        }
                    }
                }
            }
            TokenKind::IntLiteral
            | TokenKind::FloatLiteral
            | TokenKind::StringLiteral
            | TokenKind::Identifier
            | TokenKind::Keyword(Keyword::Null) => {
                output.push(ShuntItem::Operand(tok));
                cursor.advance();
            }
            _ => {
                if let Some(op) = Op::from_kind(tok.kind) {
                    if op.is_relational() {
                        if relational_seen {
                            return Err(CompileError::Syntactic {
                                line: tok.line,
                                message: "at most one relational operator is allowed per expression".into(),
                            });
                        }
                        relational_seen = true;
                    }
                    while let Some(StackSlot::Op(top, _)) = op_stack.last() {
                        let pops = top.precedence() > op.precedence()
                            || (top.precedence() == op.precedence() && op.assoc() == Assoc::Left);
                        if pops {
                            match op_stack.pop() {
                                Some(StackSlot::Op(top, line)) => output.push(ShuntItem::Op(top, line)),
                                _ => unreachable!("peeked an Op slot above"),
                            }
                        } else {
                            break;
                        }
                    }
                    op_stack.push(StackSlot::Op(op, tok.line));
                    cursor.advance();
                } else {
                    break;
                }
            }
        }
    }

    while let Some(slot) = op_stack.pop() {
        match slot {
            StackSlot::Op(op, line) => output.push(ShuntItem::Op(op, line)),
            StackSlot::LeftParen => {
                return Err(CompileError::Syntactic {
                    line: start_line,
                    message: "unmatched '(' in expression".into(),
                })
            }
        }
    }

    if relational_seen {
        // The relational operator must be outermost: exactly one Op item
        // of relational kind, and it must be the very last item emitted.
        if !matches!(output.last(), Some(ShuntItem::Op(op, _)) if op.is_relational()) {
            let line = output
                .iter()
                .find_map(|i| match i {
                    ShuntItem::Op(op, line) if op.is_relational() => Some(*line),
                    _ => None,
                })
                .unwrap_or(start_line);
            return Err(CompileError::Syntactic {
                line,
                message: "relational operator must be the outermost operation in an expression".into(),
            });
        }
    }

    Ok(output)
}

#[derive(Clone)]
struct StackItem {
    ty: DataType,
    literal: Option<String>,
}

impl StackItem {
    fn is_literal(&self) -> bool {
        self.literal.is_some()
    }
}

/// Parses and emits one expression, returning its static result type.
/// `line` is the line the expression starts on, used for diagnostics that
/// aren't naturally anchored to a specific token.
pub fn parse_expression<E: Emit>(compiler: &mut Compiler<E>, cursor: &mut TokenCursor<'_>) -> Result<DataType, CompileError> {
    parse_expression_impl(compiler, cursor).map(|item| item.ty)
}

/// As [`parse_expression`], but also reports whether the whole expression
/// reduced to a single immediate literal (no operator touched it) and, if
/// so, its textual form. Used by the body parser to decide whether a
/// `const`'s initializer qualifies for literal inlining.
pub fn parse_expression_with_literal<E: Emit>(
    compiler: &mut Compiler<E>,
    cursor: &mut TokenCursor<'_>,
) -> Result<(DataType, Option<String>), CompileError> {
    let item = parse_expression_impl(compiler, cursor)?;
    Ok((item.ty, item.literal))
}

fn parse_expression_impl<E: Emit>(compiler: &mut Compiler<E>, cursor: &mut TokenCursor<'_>) -> Result<StackItem, CompileError> {
    let postfix = to_postfix(cursor)?;
    let mut stack: Vec<StackItem> = Vec::new();

    for item in postfix {
        match item {
            ShuntItem::Operand(tok) => {
                let item = push_operand(compiler, &tok)?;
                stack.push(item);
            }
            ShuntItem::Op(op, line) => {
                let right = stack.pop().ok_or_else(|| internal(line, "operand stack underflow"))?;
                let left = stack.pop().ok_or_else(|| internal(line, "operand stack underflow"))?;
                let result = if op.is_relational() {
                    emit_relational(compiler, op, left, right, line)?
                } else {
                    emit_arithmetic(compiler, op, left, right, line)?
                };
                stack.push(result);
            }
        }
    }

    let result = stack.pop().ok_or_else(|| internal(cursor.line(), "empty expression"))?;
    if !stack.is_empty() {
        return Err(internal(cursor.line(), "expression left extra operands on the stack"));
    }
    Ok(result)
}

fn internal(line: u32, message: &str) -> CompileError {
    CompileError::Internal {
        message: format!("line {line}: {message}"),
    }
}

/// Pushes one postfix operand (literal or identifier) onto the VM operand
/// stack and records its static type for the combining operator above it.
/// Constant-variable reads are inlined here: the identifier is resolved to
/// its stored literal and the literal is what actually gets pushed, while
/// the source variable is still marked used.
fn push_operand<E: Emit>(compiler: &mut Compiler<E>, tok: &Token) -> Result<StackItem, CompileError> {
    match tok.kind {
        TokenKind::IntLiteral => {
            compiler.emit.push(Operand::Literal(LiteralValue::Int(tok.attribute.clone())));
            Ok(StackItem {
                ty: DataType::I32,
                literal: Some(tok.attribute.clone()),
            })
        }
        TokenKind::FloatLiteral => {
            let value: f64 = tok.attribute.parse().map_err(|_| CompileError::Internal {
                message: format!("line {}: malformed float literal \"{}\"", tok.line, tok.attribute),
            })?;
            compiler
                .emit
                .push(Operand::Literal(LiteralValue::Float(format_float_literal(value))));
            Ok(StackItem {
                ty: DataType::F64,
                literal: Some(tok.attribute.clone()),
            })
        }
        TokenKind::StringLiteral => {
            let unquoted = &tok.attribute[1..tok.attribute.len() - 1];
            compiler.emit.push(Operand::Literal(LiteralValue::Str(
                ifjc_gen::escape_string_literal(unquoted),
            )));
            Ok(StackItem {
                ty: DataType::U8Array,
                literal: None,
            })
        }
        TokenKind::Keyword(Keyword::Null) => {
            compiler.emit.push(Operand::Literal(LiteralValue::Nil));
            Ok(StackItem {
                ty: DataType::Null,
                literal: None,
            })
        }
        TokenKind::Identifier => {
            let symbol = compiler
                .scopes
                .find_variable(&tok.attribute)
                .cloned()
                .ok_or_else(|| CompileError::UndefinedIdentifier {
                    line: tok.line,
                    message: format!("undefined variable \"{}\"", tok.attribute),
                })?;

            if let Some((ty, text)) = symbol.constant_literal.clone() {
                compiler
                    .emit
                    .push(literal_operand(ty, &text));
                mark_used(compiler, &tok.attribute);
                return Ok(StackItem {
                    ty,
                    literal: Some(text),
                });
            }

            compiler.emit.push(Operand::var(tok.attribute.clone(), Frame::Local));
            mark_used(compiler, &tok.attribute);
            Ok(StackItem {
                ty: symbol.ty,
                literal: None,
            })
        }
        _ => Err(internal(tok.line, "unexpected token in expression operand position")),
    }
}

fn literal_operand(ty: DataType, text: &str) -> Operand {
    match ty {
        DataType::I32 => Operand::Literal(LiteralValue::Int(text.to_string())),
        DataType::F64 => Operand::Literal(LiteralValue::Float(format_float_literal(
            text.parse().unwrap_or(0.0),
        ))),
        _ => Operand::Literal(LiteralValue::Int(text.to_string())),
    }
}

fn mark_used<E: Emit>(compiler: &mut Compiler<E>, name: &str) {
    if let Some(var) = compiler.scopes.find_variable_mut(name) {
        var.was_used = true;
    }
}

/// Determines, for a numeric operand pair, whether one side needs
/// promotion and emits it. Returns the common result type. Follows the
/// reference's `FloatExpression`: a mismatched literal promotes/demotes,
/// a mismatched variable pair is a type-compatibility error.
fn promote_numeric_pair<E: Emit>(
    compiler: &mut Compiler<E>,
    left: &StackItem,
    right: &StackItem,
    line: u32,
) -> Result<DataType, CompileError> {
    if left.ty == right.ty {
        return Ok(left.ty);
    }

    let (int_side, float_side, int_is_right) = if left.ty == DataType::I32 && right.ty == DataType::F64 {
        (left, right, false)
    } else if left.ty == DataType::F64 && right.ty == DataType::I32 {
        (right, left, true)
    } else {
        return Err(CompileError::TypeCompatibility {
            line,
            message: format!("incompatible operand types {:?} and {:?}", left.ty, right.ty),
        });
    };

    if int_side.is_literal() {
        // Promote the int literal to float.
        if int_is_right {
            compiler.emit.int_to_float_stack();
        } else {
            let scratch = Operand::var("F0", Frame::Global);
            compiler.emit.pops(scratch.clone());
            compiler.emit.int_to_float_stack();
            compiler.emit.push(scratch);
        }
        return Ok(DataType::F64);
    }

    if float_side.is_literal() {
        let text = float_side.literal.as_deref().unwrap_or("0");
        let value: f64 = text.parse().unwrap_or(0.0);
        if value.fract() != 0.0 {
            return Err(CompileError::TypeCompatibility {
                line,
                message: format!("float literal \"{text}\" has a fractional part and cannot combine with an i32 operand"),
            });
        }
        // Demote the float literal to int.
        if !int_is_right {
            compiler.emit.float_to_int_stack();
        } else {
            let scratch = Operand::var("R0", Frame::Global);
            compiler.emit.pops(scratch.clone());
            compiler.emit.float_to_int_stack();
            compiler.emit.push(scratch);
        }
        return Ok(DataType::I32);
    }

    Err(CompileError::TypeCompatibility {
        line,
        message: "cannot combine i32 and f64 variables without an explicit conversion".into(),
    })
}

fn emit_arithmetic<E: Emit>(
    compiler: &mut Compiler<E>,
    op: Op,
    left: StackItem,
    right: StackItem,
    line: u32,
) -> Result<StackItem, CompileError> {
    if left.ty.is_nullable() || right.ty.is_nullable() || left.ty == DataType::Null || right.ty == DataType::Null {
        return Err(CompileError::TypeCompatibility {
            line,
            message: "nullable operands are not allowed in arithmetic".into(),
        });
    }
    if !left.ty.is_numeric() || !right.ty.is_numeric() {
        return Err(CompileError::TypeCompatibility {
            line,
            message: format!("operator requires numeric operands, found {:?} and {:?}", left.ty, right.ty),
        });
    }

    let result_ty = promote_numeric_pair(compiler, &left, &right, line)?;
    let is_float = result_ty == DataType::F64;
    let arith_op = match op {
        Op::Add => ArithOp::Add,
        Op::Sub => ArithOp::Sub,
        Op::Mul => ArithOp::Mul,
        Op::Div => ArithOp::Div,
        _ => unreachable!("non-arithmetic op reached emit_arithmetic"),
    };
    compiler.emit.arith(arith_op, is_float);
    Ok(StackItem {
        ty: result_ty,
        literal: None,
    })
}

fn emit_relational<E: Emit>(
    compiler: &mut Compiler<E>,
    op: Op,
    left: StackItem,
    right: StackItem,
    line: u32,
) -> Result<StackItem, CompileError> {
    let nullable_case = left.ty.is_nullable() || right.ty.is_nullable() || left.ty == DataType::Null || right.ty == DataType::Null;

    if nullable_case {
        let compatible = match op {
            Op::Eq | Op::NotEq => {
                let l = if left.ty == DataType::Null { right.ty } else { left.ty };
                let r = if right.ty == DataType::Null { left.ty } else { right.ty };
                l == r || left.ty == DataType::Null || right.ty == DataType::Null
            }
            _ => false,
        };
        if !compatible {
            return Err(CompileError::TypeCompatibility {
                line,
                message: "nullable operands only support '==' / '!=' against the same nullable type".into(),
            });
        }
        compiler.emit.relational(RelOp::Eq);
        if matches!(op, Op::NotEq) {
            compiler.emit.complement();
        }
        return Ok(StackItem {
            ty: DataType::Bool,
            literal: None,
        });
    }

    if !left.ty.is_numeric() || !right.ty.is_numeric() {
        return Err(CompileError::TypeCompatibility {
            line,
            message: format!("relational operator requires numeric operands, found {:?} and {:?}", left.ty, right.ty),
        });
    }

    promote_numeric_pair(compiler, &left, &right, line)?;

    match op {
        Op::Eq => compiler.emit.relational(RelOp::Eq),
        Op::NotEq => {
            compiler.emit.relational(RelOp::Eq);
            compiler.emit.complement();
        }
        Op::Lt => compiler.emit.relational(RelOp::Lt),
        Op::Gt => compiler.emit.relational(RelOp::Gt),
        Op::Le => {
            compiler.emit.relational(RelOp::Gt);
            compiler.emit.complement();
        }
        Op::Ge => {
            compiler.emit.relational(RelOp::Lt);
            compiler.emit.complement();
        }
        Op::Add | Op::Sub | Op::Mul | Op::Div => unreachable!("arithmetic op reached emit_relational"),
    }

    Ok(StackItem {
        ty: DataType::Bool,
        literal: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifjc_gen::AsmEmitter;
    use ifjc_lex::Lexer;

    fn run(src: &str) -> (DataType, String) {
        let tokens = Lexer::new(src).tokenize().unwrap();
        let mut compiler = Compiler::new(AsmEmitter::new(Vec::new())).unwrap();
        compiler.scopes.push_scope();
        let mut cursor = TokenCursor::new(&tokens);
        let ty = parse_expression(&mut compiler, &mut cursor).unwrap();
        let out = String::from_utf8(compiler.emit.into_inner()).unwrap();
        (ty, out)
    }

    #[test]
    fn simple_int_addition() {
        let (ty, out) = run("1 + 2;");
        assert_eq!(ty, DataType::I32);
        assert!(out.contains("ADD GF@R0 GF@R1 GF@R2"));
    }

    #[test]
    fn int_literal_promoted_to_float() {
        let (ty, out) = run("1 + 2.0;");
        assert_eq!(ty, DataType::F64);
        assert!(out.contains("INT2FLOATS"));
    }

    #[test]
    fn relational_result_is_bool() {
        let (ty, _) = run("1 < 2;");
        assert_eq!(ty, DataType::Bool);
    }

    #[test]
    fn parens_override_precedence() {
        let (ty, out) = run("(1 + 2) * 3;");
        assert_eq!(ty, DataType::I32);
        // the addition must be evaluated (and pushed) before the multiplication
        let add_pos = out.find("ADD").unwrap();
        let mul_pos = out.find("MUL").unwrap();
        assert!(add_pos < mul_pos);
    }

    #[test]
    fn two_relational_operators_is_an_error() {
        let tokens = Lexer::new("1 < 2 < 3;").tokenize().unwrap();
        let mut compiler = Compiler::new(AsmEmitter::new(Vec::new())).unwrap();
        compiler.scopes.push_scope();
        let mut cursor = TokenCursor::new(&tokens);
        assert!(parse_expression(&mut compiler, &mut cursor).is_err());
    }
}
