/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! # linearjs
//!
//! Compiles an ESTree-shaped JavaScript AST to a linear register-based
//! instruction stream, serialized either as an interpreted instruction
//! program (JS backend) or as C source over a boxed `Value` runtime.
//!
//! ## Architecture
//!
//! ```text
//! ESTree JSON (external parser output)
//!     │
//!     ▼
//! ┌─────────────────────────────────────────────────────┐
//! │  AST arena (ast.rs)                                 │
//! │  Decodes JSON into a closed NodeKind enum           │
//! └──────────────────────┬──────────────────────────────┘
//!                        │ NodeIds
//!                        ▼
//! ┌─────────────────────────────────────────────────────┐
//! │  Resolver (resolver.rs, walk.rs, scope.rs)          │
//! │  Scope tree, catch-parameter alpha-renaming,        │
//! │  capture/environment propagation                    │
//! └──────────────────────┬──────────────────────────────┘
//!                        │ Resolution
//!                        ▼
//! ┌─────────────────────────────────────────────────────┐
//! │  Codegen (codegen.rs)                               │
//! │  Lowers statements to flat labeled instructions,    │
//! │  one stream per function                            │
//! └──────────────────────┬──────────────────────────────┘
//!                        │ FunctionTable
//!                        ▼
//! ┌─────────────────────────────────────────────────────┐
//! │  Emitter (ir/emit.rs, backend.rs)                   │
//! │  Renders per target: switch dispatch (JS) or        │
//! │  labels and gotos (C)                               │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module overview
//!
//! - `lib.rs`: entry point ([`compile`])
//! - `ast.rs`: arena-allocated AST and ESTree JSON decoding
//! - `walk.rs`: generic tree traversal and value-context classification
//! - `scope.rs`: scope tree, variable classification, capture threading
//! - `resolver.rs`: the multi-pass name resolution driver
//! - `ir/`: instruction set, function builder, and textual emission
//! - `codegen.rs`: AST-to-instruction lowering
//! - `backend.rs`: target selection and generated-name conventions
//! - `error.rs`: the crate error type

pub mod ast;
pub mod backend;
pub mod codegen;
pub mod error;
pub mod ir;
pub mod resolver;
pub mod scope;
pub mod walk;

use tracing::info;

use crate::ast::{Arena, Literal, NodeId, NodeKind};
use crate::backend::{Target, TargetConfig};
use crate::error::Result;

/// Convert a `usize` to `u32`, panicking if the value exceeds `u32::MAX`.
/// Prefer this over `as u32` which silently truncates on 64-bit platforms.
pub(crate) fn u32_from_usize(value: usize) -> u32 {
    u32::try_from(value).expect("value exceeds u32::MAX")
}

/// Everything [`compile`] needs besides the program itself.
pub struct CompileOptions<'a> {
    pub target: Target,
    /// Emit as an importable module instead of a standalone driver.
    /// Only affects the C target.
    pub as_module: bool,
    /// Basename of the source file; namespaces C function names.
    pub module_name: &'a str,
    /// ESTree JSON of the bundled library, spliced in front of the
    /// program body before resolution.
    pub prelude: Option<&'a str>,
    /// Runtime source prepended to the output (JS target only), making
    /// the result self-contained.
    pub runtime: Option<&'a str>,
}

/// Compile an ESTree JSON document to target source text.
pub fn compile(source: &str, options: &CompileOptions) -> Result<String> {
    let cfg = TargetConfig::new(options.target, options.as_module, options.module_name);

    let mut arena = Arena::new();
    let root = arena.decode_document(source)?;
    info!(nodes = arena.len(), "decoded program");

    splice_prelude(&mut arena, root, options, &cfg)?;

    let resolution = resolver::resolve(&arena, root, &cfg);
    info!(scopes = resolution.scopes.len(), "resolved names");

    let table = codegen::lower(&resolution, root, &cfg)?;
    info!(functions = table.len(), "lowered functions");

    Ok(ir::emit(&table, &cfg, options.runtime))
}

/// Prepend the bundled library to the program body, and in C module mode
/// surround it with the `exports` plumbing: an `exports` object up front
/// and a native statement publishing it through `JS_Return` at the end.
fn splice_prelude(
    arena: &mut Arena,
    root: NodeId,
    options: &CompileOptions,
    cfg: &TargetConfig,
) -> Result<()> {
    let NodeKind::Program { body } = arena.kind(root).clone() else {
        return Err(crate::error::CompileError::ast("document root is not a Program"));
    };

    let mut spliced = Vec::new();
    if let Some(prelude) = options.prelude {
        let prelude_root = arena.decode_document(prelude)?;
        let NodeKind::Program {
            body: prelude_body,
        } = arena.kind(prelude_root).clone()
        else {
            return Err(crate::error::CompileError::ast("prelude root is not a Program"));
        };
        spliced.extend(prelude_body);
    }
    let c_module = cfg.target == Target::C && options.as_module;
    if c_module {
        spliced.push(exports_declaration(arena));
    }
    spliced.extend(body);
    if c_module {
        spliced.push(exports_publication(arena, cfg));
    }

    arena.set_program_body(root, spliced);
    Ok(())
}

/// `var exports = {};`
fn exports_declaration(arena: &mut Arena) -> NodeId {
    let id = arena.push(NodeKind::Identifier {
        name: "exports".to_string(),
    });
    let init = arena.push(NodeKind::ObjectExpression {
        properties: Vec::new(),
    });
    let declarator = arena.push(NodeKind::VariableDeclarator {
        id,
        init: Some(init),
    });
    arena.push(NodeKind::VariableDeclaration {
        declarations: vec![declarator],
    })
}

/// The trailing native statement handing the module's `exports` object to
/// the importer.
fn exports_publication(arena: &mut Arena, cfg: &TargetConfig) -> NodeId {
    let expression = arena.push(NodeKind::Literal(Literal::String(format!(
        "{} JS_Return = OP_GETVARSTAR( exports )",
        cfg.native_marker
    ))));
    arena.push(NodeKind::ExpressionStatement { expression })
}
