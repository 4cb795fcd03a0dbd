//! Shared plumbing for the compiler crates: the error taxonomy each phase
//! reports through, and the hash-map alias every symbol table is built on.
//!
//! Nothing in this crate knows about SRC syntax or TARGET instructions —
//! it exists so `ifjc-lex`, `ifjc-sem`, `ifjc-gen` and `ifjc-par` can share
//! one error type and one map implementation instead of each rolling their
//! own.

mod error;

pub use error::{CompileError, CompileResult};

/// Fast, non-cryptographic hash map used for every symbol table and
/// registry in the compiler. Iteration order is insertion-unrelated and
/// must never be relied on for anything observable (the emitter always
/// walks symbols in an explicit, recorded order instead of map order).
pub type FxHashMap<K, V> = rustc_hash::FxHashMap<K, V>;
pub type FxHashSet<T> = rustc_hash::FxHashSet<T>;
