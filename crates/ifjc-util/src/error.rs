use thiserror::Error;

/// The full taxonomy of compile-time failures, one variant per exit code.
///
/// Each variant owns the source line the failure was detected on (where a
/// line is meaningful) and a human-readable message. There is no recovery:
/// the pipeline abandons at the first `CompileError` it produces, and the
/// driver maps it to a process exit code via [`CompileError::exit_code`].
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Line {line}: {message}")]
    Lexical { line: u32, message: String },

    #[error("Line {line}: {message}")]
    Syntactic { line: u32, message: String },

    #[error("Line {line}: {message}")]
    UndefinedIdentifier { line: u32, message: String },

    #[error("Line {line}: {message}")]
    SignatureMismatch { line: u32, message: String },

    #[error("Line {line}: {message}")]
    Redefinition { line: u32, message: String },

    #[error("Line {line}: {message}")]
    MissingOrExtraReturn { line: u32, message: String },

    #[error("Line {line}: {message}")]
    TypeCompatibility { line: u32, message: String },

    #[error("Line {line}: {message}")]
    TypeDerivation { line: u32, message: String },

    #[error("Line {line}: {message}")]
    UnusedVariable { line: u32, message: String },

    #[error("Line {line}: {message}")]
    OtherSemantic { line: u32, message: String },

    #[error("{message}")]
    Internal { message: String },
}

impl CompileError {
    /// The fixed process exit code for this error kind. Stable across
    /// releases; downstream tooling is expected to branch on it.
    pub fn exit_code(&self) -> i32 {
        match self {
            CompileError::Lexical { .. } => 1,
            CompileError::Syntactic { .. } => 2,
            CompileError::UndefinedIdentifier { .. } => 3,
            CompileError::SignatureMismatch { .. } => 4,
            CompileError::Redefinition { .. } => 5,
            CompileError::MissingOrExtraReturn { .. } => 6,
            CompileError::TypeCompatibility { .. } => 7,
            CompileError::TypeDerivation { .. } => 8,
            CompileError::UnusedVariable { .. } => 9,
            CompileError::OtherSemantic { .. } => 10,
            CompileError::Internal { .. } => 99,
        }
    }

    /// The prefix printed to stderr ahead of the message, mirroring the
    /// three distinguished categories (lexical / syntactic / internal) that
    /// get their own banner, with everything else falling back to a generic
    /// "ERROR:" banner.
    pub fn banner(&self) -> &'static str {
        match self {
            CompileError::Lexical { .. } => "ERROR IN LEXICAL ANALYSIS: ",
            CompileError::Syntactic { .. } => "ERROR IN SYNTAX ANALYSIS: ",
            CompileError::Internal { .. } => "INTERNAL COMPILER ERROR: ",
            _ => "ERROR: ",
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;
