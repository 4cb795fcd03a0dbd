use ifjc_sem::DataType;

/// One of the three addressable memory regions. Locals live on the
/// current call's frame; temporaries are created per-call for parameter
/// passing and torn down on return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    Global,
    Local,
    Temporary,
}

impl Frame {
    pub fn prefix(self) -> &'static str {
        match self {
            Frame::Global => "GF@",
            Frame::Local => "LF@",
            Frame::Temporary => "TF@",
        }
    }
}

/// A literal value ready for emission, already carrying its TARGET type
/// prefix (`int@`, `float@`, `bool@`, `string@`, `nil@nil`).
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Int(String),
    /// Stored as its own hex-float-suffixed text; callers build this via
    /// [`crate::escape::format_float_literal`].
    Float(String),
    Bool(bool),
    /// Already escaped per [`crate::escape::escape_string_literal`].
    Str(String),
    Nil,
}

impl LiteralValue {
    pub fn rendered(&self) -> String {
        match self {
            LiteralValue::Int(text) => format!("int@{text}"),
            LiteralValue::Float(text) => format!("float@{text}"),
            LiteralValue::Bool(b) => format!("bool@{b}"),
            LiteralValue::Str(escaped) => format!("string@{escaped}"),
            LiteralValue::Nil => "nil@nil".to_string(),
        }
    }
}

/// Anything that can appear on the right-hand side of a TARGET
/// instruction: a named slot in some frame, or an immediate literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Variable { name: String, frame: Frame },
    Literal(LiteralValue),
}

impl Operand {
    pub fn var(name: impl Into<String>, frame: Frame) -> Self {
        Operand::Variable {
            name: name.into(),
            frame,
        }
    }

    pub fn rendered(&self) -> String {
        match self {
            Operand::Variable { name, frame } => format!("{}{name}", frame.prefix()),
            Operand::Literal(lit) => lit.rendered(),
        }
    }
}

/// Maps a concrete (non-term, non-null) data type onto the scratch
/// register letter used when the emitter needs a spill register, per the
/// `R0..R2 / F0..F2 / B0..B2 / S0..S2` convention.
pub fn scratch_register(ty: DataType, index: u8) -> Operand {
    Operand::var(format!("{}{index}", ty.register_letter()), Frame::Global)
}
