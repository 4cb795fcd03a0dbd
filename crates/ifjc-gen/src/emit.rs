use std::io::Write;

use ifjc_sem::DataType;

use crate::operand::{Frame, LiteralValue, Operand};

/// Arithmetic family the expression evaluator dispatches on after the
/// promotion rule has settled both operands to the same concrete type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Base relational comparisons TARGET exposes directly; `!=`, `<=`, `>=`
/// are built by the caller as `NOTS` applied to one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    Eq,
    Lt,
    Gt,
}

/// One method per TARGET instruction family. A concrete [`AsmEmitter`]
/// writes these to a buffered sink; tests substitute an in-memory `Vec<u8>`
/// sink to assert on emitted text without spinning up the driver.
pub trait Emit {
    fn raw_line(&mut self, line: &str);

    fn header(&mut self) {
        self.raw_line(".IFJcode24");
    }

    fn init_registers(&mut self) {
        for letter in ['R', 'F', 'B', 'S'] {
            for i in 0..3 {
                self.define_var(&format!("{letter}{i}"), Frame::Global);
            }
        }
    }

    fn define_var(&mut self, name: &str, frame: Frame) {
        self.raw_line(&format!("DEFVAR {}{name}", frame.prefix()));
    }

    fn push(&mut self, operand: Operand) {
        self.raw_line(&format!("PUSHS {}", operand.rendered()));
    }

    fn pops(&mut self, dst: Operand) {
        self.raw_line(&format!("POPS {}", dst.rendered()));
    }

    fn move_to(&mut self, dst: Operand, src: Operand) {
        self.raw_line(&format!("MOVE {} {}", dst.rendered(), src.rendered()));
    }

    fn createframe(&mut self) {
        self.raw_line("CREATEFRAME");
    }

    fn pushframe(&mut self) {
        self.raw_line("PUSHFRAME");
    }

    fn popframe(&mut self) {
        self.raw_line("POPFRAME");
    }

    /// Writes argument `order` (0-based) into the open temporary frame's
    /// conventionally-named parameter slot, ahead of `CALL`.
    fn set_param(&mut self, order: u32, value: Operand) {
        self.raw_line(&format!("MOVE TF@%param{order} {}", value.rendered()));
    }

    fn call(&mut self, name: &str) {
        self.raw_line(&format!("CALL {name}"));
    }

    fn return_instr(&mut self) {
        self.raw_line("RETURN");
    }

    fn function_label(&mut self, name: &str) {
        self.raw_line(&format!("LABEL {name}"));
        self.raw_line("PUSHFRAME");
    }

    fn jump(&mut self, label: &str) {
        self.raw_line(&format!("JUMP {label}"));
    }

    fn jumpifeq(&mut self, label: &str, a: Operand, b: Operand) {
        self.raw_line(&format!("JUMPIFEQ {label} {} {}", a.rendered(), b.rendered()));
    }

    fn label(&mut self, name: &str) {
        self.raw_line(&format!("LABEL {name}"));
    }

    fn read(&mut self, dst: Operand, read_type: DataType) {
        let ty_str = match read_type {
            DataType::NullableI32 | DataType::I32 => "int",
            DataType::NullableF64 | DataType::F64 => "float",
            DataType::NullableU8Array | DataType::U8Array => "string",
            other => unreachable!("READ has no TARGET type for {other:?}"),
        };
        self.raw_line(&format!("READ {} {ty_str}", dst.rendered()));
    }

    fn write_instr(&mut self, operand: Operand) {
        self.raw_line(&format!("WRITE {}", operand.rendered()));
    }

    /// Pops two operands into the named int/float register pair (`R1`/
    /// `R2` or `F1`/`F2`), applies `op`, and leaves the result in the
    /// matching `*0` register. `SUB`/`DIV` reverse the register order
    /// relative to pop order so the result reads left-operand-first:
    /// the first operand pushed is popped second, so subtraction/division
    /// must compute `second_popped OP first_popped`.
    fn arith(&mut self, op: ArithOp, is_float: bool) {
        let letter = if is_float { 'F' } else { 'R' };
        let r0 = Operand::var(format!("{letter}0"), Frame::Global);
        let r1 = Operand::var(format!("{letter}1"), Frame::Global);
        let r2 = Operand::var(format!("{letter}2"), Frame::Global);
        self.pops(r2.clone());
        self.pops(r1.clone());
        let mnemonic = match (op, is_float) {
            (ArithOp::Add, _) => "ADD",
            (ArithOp::Sub, _) => "SUB",
            (ArithOp::Mul, _) => "MUL",
            (ArithOp::Div, false) => "IDIV",
            (ArithOp::Div, true) => "DIV",
        };
        match op {
            ArithOp::Add | ArithOp::Mul => {
                self.raw_line(&format!(
                    "{mnemonic} {} {} {}",
                    r0.rendered(),
                    r1.rendered(),
                    r2.rendered()
                ));
            }
            ArithOp::Sub | ArithOp::Div => {
                self.raw_line(&format!(
                    "{mnemonic} {} {} {}",
                    r0.rendered(),
                    r2.rendered(),
                    r1.rendered()
                ));
            }
        }
        self.push(r0);
    }

    /// Stack-form comparison: `EQS`/`LTS`/`GTS` pop two and push a bool
    /// without touching named registers.
    fn relational(&mut self, op: RelOp) {
        let mnemonic = match op {
            RelOp::Eq => "EQS",
            RelOp::Lt => "LTS",
            RelOp::Gt => "GTS",
        };
        self.raw_line(mnemonic);
    }

    fn complement(&mut self) {
        self.raw_line("NOTS");
    }

    fn int_to_float_stack(&mut self) {
        self.raw_line("INT2FLOATS");
    }

    fn float_to_int_stack(&mut self) {
        self.raw_line("FLOAT2INTS");
    }

    /// Named-operand form of the int/float conversion, used when
    /// compiling `ifj.i2f`/`ifj.f2i` directly to a single TARGET
    /// instruction rather than through the operand-stack pair above.
    fn int2float(&mut self, dst: Operand, src: Operand) {
        self.raw_line(&format!("INT2FLOAT {} {}", dst.rendered(), src.rendered()));
    }

    fn float2int(&mut self, dst: Operand, src: Operand) {
        self.raw_line(&format!("FLOAT2INT {} {}", dst.rendered(), src.rendered()));
    }

    fn strlen(&mut self, dst: Operand, src: Operand) {
        self.raw_line(&format!("STRLEN {} {}", dst.rendered(), src.rendered()));
    }

    fn concat(&mut self, dst: Operand, a: Operand, b: Operand) {
        self.raw_line(&format!(
            "CONCAT {} {} {}",
            dst.rendered(),
            a.rendered(),
            b.rendered()
        ));
    }

    fn getchar(&mut self, dst: Operand, src: Operand, index: Operand) {
        self.raw_line(&format!(
            "GETCHAR {} {} {}",
            dst.rendered(),
            src.rendered(),
            index.rendered()
        ));
    }

    fn stri2int(&mut self, dst: Operand, src: Operand, index: Operand) {
        self.raw_line(&format!(
            "STRI2INT {} {} {}",
            dst.rendered(),
            src.rendered(),
            index.rendered()
        ));
    }

    fn int2char(&mut self, dst: Operand, src: Operand) {
        self.raw_line(&format!("INT2CHAR {} {}", dst.rendered(), src.rendered()));
    }

    fn greater_than(&mut self, dst: Operand, a: Operand, b: Operand) {
        self.raw_line(&format!("GT {} {} {}", dst.rendered(), a.rendered(), b.rendered()));
    }

    /// `substring(s, start, end)`: returns the bytes `s[start..end)`, or
    /// `null` if the range is out of bounds (`start < 0`, `end > len(s)`,
    /// or `start > end`). Built as an explicit bounds check followed by a
    /// `GETCHAR`/`CONCAT` copy loop, gated by its own monotonic `count` so
    /// repeated calls in one program get disjoint labels.
    fn substring_helper(&mut self, s: Operand, start: Operand, end: Operand, count: u32) {
        let r0 = Operand::var("R0", Frame::Global); // length
        let r1 = Operand::var("R1", Frame::Global); // cursor index
        let b0 = Operand::var("B0", Frame::Global);
        let s0 = Operand::var("S0", Frame::Global); // accumulator
        let s1 = Operand::var("S1", Frame::Global); // one-char scratch
        let null_label = format!("substrnull{count}");
        let loop_label = format!("substrloop{count}");
        let done_label = format!("substrdone{count}");
        let zero = Operand::Literal(LiteralValue::Int("0".into()));

        self.strlen(r0.clone(), s.clone());
        self.raw_line(&format!("LT {} {} {}", b0.rendered(), start.rendered(), zero.rendered()));
        self.jumpifeq(&null_label, b0.clone(), Operand::Literal(LiteralValue::Bool(true)));
        self.greater_than(b0.clone(), end.clone(), r0);
        self.jumpifeq(&null_label, b0.clone(), Operand::Literal(LiteralValue::Bool(true)));
        self.greater_than(b0.clone(), start.clone(), end.clone());
        self.jumpifeq(&null_label, b0, Operand::Literal(LiteralValue::Bool(true)));

        self.move_to(s0.clone(), Operand::Literal(LiteralValue::Str(String::new())));
        self.move_to(r1.clone(), start);
        self.label(&loop_label);
        self.raw_line(&format!(
            "JUMPIFEQ {} {} {}",
            done_label,
            r1.rendered(),
            end.rendered()
        ));
        self.getchar(s1.clone(), s.clone(), r1.clone());
        self.concat(s0.clone(), s0.clone(), s1.clone());
        self.raw_line(&format!("ADD {} {} {}", r1.rendered(), r1.rendered(), Operand::Literal(LiteralValue::Int("1".into())).rendered()));
        self.jump(&loop_label);

        self.label(&done_label);
        self.push(s0);
        self.jump(&format!("endsubstr{count}"));
        self.label(&null_label);
        self.push(Operand::Literal(LiteralValue::Nil));
        self.label(&format!("endsubstr{count}"));
    }

    /// Three-way string compare: `R0` ends up `-1`/`0`/`1`. Mirrors the
    /// reference's `GT`/`EQ`-chained branch ladder, gated by its own
    /// monotonic `count` so nested/sequential calls get disjoint labels.
    fn strcmp_helper(&mut self, a: Operand, b: Operand, count: u32) {
        let b1 = Operand::var("B1", Frame::Global);
        let b2 = Operand::var("B2", Frame::Global);
        let result = Operand::var("R0", Frame::Global);

        self.greater_than(b1.clone(), a.clone(), b.clone());
        self.greater_than(b2.clone(), b, a);
        self.jumpifeq(
            &format!("firstgreater{count}"),
            b1.clone(),
            Operand::Literal(LiteralValue::Bool(true)),
        );
        self.jumpifeq(
            &format!("secondgreater{count}"),
            b2,
            Operand::Literal(LiteralValue::Bool(true)),
        );
        self.move_to(result.clone(), Operand::Literal(LiteralValue::Int("0".into())));
        self.jump(&format!("endstrcmp{count}"));
        self.label(&format!("firstgreater{count}"));
        self.move_to(result.clone(), Operand::Literal(LiteralValue::Int("1".into())));
        self.jump(&format!("endstrcmp{count}"));
        self.label(&format!("secondgreater{count}"));
        self.move_to(result, Operand::Literal(LiteralValue::Int("-1".into())));
        self.label(&format!("endstrcmp{count}"));
    }

    /// `ord(s, i)`: returns `0` when `s` is empty or `i` is out of range,
    /// otherwise the byte value at `i` via `STRI2INT`.
    fn ord_helper(&mut self, s: Operand, i: Operand, count: u32) {
        let r0 = Operand::var("R0", Frame::Global);
        let b0 = Operand::var("B0", Frame::Global);
        self.strlen(r0.clone(), s.clone());
        self.jumpifeq(
            &format!("ordreturn0_{count}"),
            r0.clone(),
            Operand::Literal(LiteralValue::Int("0".into())),
        );
        self.greater_than(b0.clone(), i.clone(), r0);
        self.jumpifeq(
            &format!("ordreturn0_{count}"),
            b0,
            Operand::Literal(LiteralValue::Bool(true)),
        );
        self.stri2int(Operand::var("R0", Frame::Global), s, i);
        self.jump(&format!("endord{count}"));
        self.label(&format!("ordreturn0_{count}"));
        self.move_to(
            Operand::var("R0", Frame::Global),
            Operand::Literal(LiteralValue::Int("0".into())),
        );
        self.label(&format!("endord{count}"));
    }
}

/// Concrete `Emit` sink over any buffered writer — `stdout` in the driver,
/// an in-memory `Vec<u8>` in tests.
pub struct AsmEmitter<W: Write> {
    sink: W,
}

impl<W: Write> AsmEmitter<W> {
    pub fn new(sink: W) -> Self {
        AsmEmitter { sink }
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl<W: Write> Emit for AsmEmitter<W> {
    fn raw_line(&mut self, line: &str) {
        writeln!(self.sink, "{line}").expect("write to emission sink failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sink() -> AsmEmitter<Vec<u8>> {
        AsmEmitter::new(Vec::new())
    }

    fn text(e: AsmEmitter<Vec<u8>>) -> String {
        String::from_utf8(e.into_inner()).unwrap()
    }

    #[test]
    fn init_registers_defines_twelve_scratch_slots() {
        let mut e = sink();
        e.init_registers();
        let out = text(e);
        assert_eq!(out.lines().count(), 12);
        assert!(out.contains("DEFVAR GF@R0"));
        assert!(out.contains("DEFVAR GF@S2"));
    }

    #[test]
    fn sub_reverses_operand_order() {
        let mut e = sink();
        e.arith(ArithOp::Sub, false);
        let out = text(e);
        assert!(out.contains("SUB GF@R0 GF@R2 GF@R1"));
    }

    #[test]
    fn add_keeps_operand_order() {
        let mut e = sink();
        e.arith(ArithOp::Add, true);
        let out = text(e);
        assert!(out.contains("ADD GF@F0 GF@F1 GF@F2"));
    }

    #[test]
    fn jumpifeq_renders_nil_guard() {
        let mut e = sink();
        e.jumpifeq(
            "else0",
            Operand::var("x", Frame::Local),
            Operand::Literal(LiteralValue::Nil),
        );
        assert_eq!(text(e).trim(), "JUMPIFEQ else0 LF@x nil@nil");
    }
}
