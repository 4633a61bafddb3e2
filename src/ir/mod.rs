/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! The linear instruction stream.
//!
//! Lowering produces flat lists of [`Line`]s per function: opcode
//! applications over virtual registers, raw assignments between named
//! slots, and numeric labels. The same stream serializes to either
//! backend; only the textual rendering differs (switch dispatch for the
//! interpreted target, real labels and gotos for C).

mod emit;
mod function;
mod instruction;

pub use emit::emit;
pub use function::{
    CompiledFunction, ExitKey, ExitKind, ExitPath, Frame, FrameKind, FunctionBuilder,
    FunctionTable,
};
pub use instruction::{format_number, Arg, Instruction, Line, Op};
