/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! Error types for compilation.
//!
//! Every error here is fatal: there is no partial compilation or warning
//! mode. A malformed instruction or an unresolved exit indicates either a
//! structurally invalid input program or a code generator bug, and both
//! abort the whole run.

use thiserror::Error;

/// Result type for compilation.
pub type Result<T> = std::result::Result<T, CompileError>;

/// Errors that can occur while compiling a program.
#[derive(Error, Debug)]
pub enum CompileError {
    /// An opcode was constructed with the wrong count or kind of operands.
    /// This is a generator-internal contract violation.
    #[error("malformed operands for {opcode}: {message}")]
    MalformedInstruction {
        opcode: &'static str,
        message: String,
    },

    /// A break/continue/return/throw found no matching target frame on the
    /// block-label stack (e.g. `break` outside any loop or switch).
    #[error("no target for {kind} statement{}", label.as_deref().map(|l| format!(" (label `{l}`)")).unwrap_or_default())]
    UnresolvedExit {
        kind: &'static str,
        label: Option<String>,
    },

    /// A node kind or language feature with no lowering rule.
    #[error("unsupported construct: {0}")]
    UnsupportedConstruct(String),

    /// A name failed to resolve to a local slot or environment index after
    /// scope resolution. Indicates a resolver invariant breach.
    #[error("variable `{0}` not resolvable in the current scope")]
    UnresolvedVariable(String),

    /// The input was not a decodable ESTree JSON document.
    #[error("invalid ESTree input: {0}")]
    Ast(String),

    /// JSON parse failure on the input document.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File I/O failure (CLI only).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    pub fn ast(message: impl Into<String>) -> Self {
        CompileError::Ast(message.into())
    }
}
