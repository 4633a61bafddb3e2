/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! Per-function lowering state.
//!
//! A [`FunctionBuilder`] accumulates the instruction lines of one compiled
//! function together with everything label-shaped: the block frame stack
//! that `break`/`continue`/`return`/`throw` resolve against, the label
//! counter, and the pending exits routed through `finally` blocks.
//!
//! ## Labels
//!
//! Labels are plain numbers, allocated in blocks of [`N_JUMP_TYPES`] so a
//! frame's one allocation yields its `BEGIN`, `CONTINUE` and `END` labels
//! at fixed offsets, with the `IF` offset left for free-standing labels.
//!
//! ## Pending exits
//!
//! An abrupt exit crossing a `finally` cannot jump to its target directly:
//! it stores a per-exit id in the finally's completion-jump variable and
//! enters the finalizer. When the finalizer's lowering completes, every
//! pending exit recorded against the function is drained into a dispatch
//! chain that re-issues the original exit. Re-issuing may route through
//! the next enclosing `finally`, re-registering the same id against it, so
//! one runtime variable comparison per hop suffices.

use std::collections::{BTreeMap, BTreeSet};

use crate::backend::{
    BEGIN_OFFSET, CONTINUE_OFFSET, END_OFFSET, IF_OFFSET, N_JUMP_TYPES, TMP_VAR_PREFIX,
};
use crate::error::{CompileError, Result};
use crate::ir::instruction::{Arg, Instruction, Line, Op};

/// Kinds of block frames abrupt exits resolve against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Function body; `return` (and uncaught `throw`) target its end.
    Return,
    Loop,
    Switch,
    /// A labeled non-loop statement; only a labeled `break` targets it.
    Named,
    Catch,
    Finally,
}

/// One entry of the block frame stack.
#[derive(Debug, Clone)]
pub struct Frame {
    pub kind: FrameKind,
    /// Base label of the frame's allocation block.
    pub label: u32,
    /// Source labels naming this frame (`outer: while ...`).
    pub names: BTreeSet<String>,
}

/// Exit statement kinds, used to key pending exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExitKind {
    Break,
    Continue,
    Return,
    Throw,
}

impl ExitKind {
    pub fn keyword(self) -> &'static str {
        match self {
            ExitKind::Break => "break",
            ExitKind::Continue => "continue",
            ExitKind::Return => "return",
            ExitKind::Throw => "throw",
        }
    }
}

/// Identity of an abrupt exit: its kind plus the source label, if any.
/// All exits sharing a key reuse one pending id per finally hop.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExitKey {
    pub kind: ExitKind,
    pub label: Option<String>,
}

/// How an exit reaches its target from the current frame stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitPath {
    /// No intervening `finally`; jump straight to the target label.
    Direct(u32),
    /// An intervening `finally`; enter it at the given label.
    ViaFinally(u32),
}

/// Builder for one compiled function.
#[derive(Debug)]
pub struct FunctionBuilder {
    /// Emitted (mangled) function name.
    pub name: String,
    /// Source-level name, kept for the emitted comment.
    pub jsname: String,
    /// Slot in the function table, reserved at creation.
    pub slot: usize,
    register_count: u32,
    tmp_count: u32,
    block_label_count: u32,
    frames: Vec<Frame>,
    finally_labels: BTreeSet<u32>,
    pending: BTreeMap<ExitKey, i64>,
    jump_counter: i64,
    pub lines: Vec<Line>,
}

impl FunctionBuilder {
    pub fn new(name: String, jsname: String, slot: usize) -> Self {
        Self {
            name,
            jsname,
            slot,
            register_count: 0,
            tmp_count: 0,
            block_label_count: 0,
            frames: Vec::new(),
            finally_labels: BTreeSet::new(),
            pending: BTreeMap::new(),
            jump_counter: 0,
            lines: Vec::new(),
        }
    }

    /// Reference register `n`, growing the declaration high-water mark.
    pub fn reg(&mut self, n: u32) -> Arg {
        if self.register_count < n {
            self.register_count = n;
        }
        Arg::Reg(n)
    }

    /// Allocate a statement-lifetime temporary local.
    pub fn alloc_tmp(&mut self) -> String {
        let n = self.tmp_count;
        self.tmp_count += 1;
        format!("{TMP_VAR_PREFIX}{n}")
    }

    /// Allocate a free-standing label.
    pub fn fresh_label(&mut self) -> u32 {
        let base = self.block_label_count;
        self.block_label_count += N_JUMP_TYPES;
        base + IF_OFFSET
    }

    /// Push a block frame, allocating its label block. Returns the base
    /// label; the frame's begin/continue/end labels are at the fixed
    /// offsets from it.
    pub fn push_frame(&mut self, kind: FrameKind, names: BTreeSet<String>) -> u32 {
        let base = self.block_label_count;
        self.block_label_count += N_JUMP_TYPES;
        self.frames.push(Frame {
            kind,
            label: base,
            names,
        });
        base
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// Record that `label` heads a finally block, so the emitter declares
    /// its completion shadow variables.
    pub fn register_finally(&mut self, label: u32) {
        self.finally_labels.insert(label);
    }

    /// Resolve an abrupt exit against the frame stack, innermost first.
    pub fn resolve_exit(&self, kind: ExitKind, label: Option<&str>) -> Result<ExitPath> {
        let mut finally: Option<u32> = None;
        for frame in self.frames.iter().rev() {
            let name_matches =
                || label.is_none() || label.is_some_and(|l| frame.names.contains(l));
            let target = match (kind, frame.kind) {
                (ExitKind::Break, FrameKind::Loop | FrameKind::Switch | FrameKind::Named)
                    if name_matches() =>
                {
                    Some(frame.label + END_OFFSET)
                }
                (ExitKind::Continue, FrameKind::Loop) if name_matches() => {
                    Some(frame.label + CONTINUE_OFFSET)
                }
                (ExitKind::Return, FrameKind::Return) => Some(frame.label + END_OFFSET),
                (ExitKind::Throw, FrameKind::Catch) => Some(frame.label + BEGIN_OFFSET),
                (ExitKind::Throw, FrameKind::Return) => Some(frame.label + END_OFFSET),
                _ => None,
            };
            if let Some(target) = target {
                return Ok(match finally {
                    Some(finally) => ExitPath::ViaFinally(finally + BEGIN_OFFSET),
                    None => ExitPath::Direct(target),
                });
            }
            if frame.kind == FrameKind::Finally && finally.is_none() {
                finally = Some(frame.label);
            }
        }
        Err(CompileError::UnresolvedExit {
            kind: kind.keyword(),
            label: label.map(str::to_string),
        })
    }

    /// The pending id for an exit routed through a finally. Exits sharing
    /// a key share one id; `preset` re-registers a drained id when a
    /// finally dispatch chain re-routes through an outer finally.
    pub fn pending_exit_id(&mut self, key: ExitKey, preset: Option<i64>) -> i64 {
        if let Some(&id) = self.pending.get(&key) {
            return id;
        }
        let id = preset.unwrap_or_else(|| {
            self.jump_counter += 1;
            self.jump_counter
        });
        self.pending.insert(key, id);
        id
    }

    /// Drain every pending exit for dispatch at the end of a finalizer.
    pub fn take_pending_exits(&mut self) -> Vec<(ExitKey, i64)> {
        std::mem::take(&mut self.pending).into_iter().collect()
    }

    pub fn has_pending_exits(&self) -> bool {
        !self.pending.is_empty()
    }

    // === Line emission ===

    pub fn push_line(&mut self, line: Line) {
        self.lines.push(line);
    }

    pub fn instr(&mut self, op: Op, dst: Option<Arg>, args: Vec<Arg>) -> Result<()> {
        self.lines.push(Line::Instr(Instruction::new(op, dst, args)?));
        Ok(())
    }

    pub fn assign(&mut self, dst: Arg, src: Arg) {
        self.lines.push(Line::Assign { dst, src });
    }

    pub fn label(&mut self, label: u32) {
        self.lines.push(Line::Label(label));
    }

    pub fn comment(&mut self, text: impl Into<String>) {
        self.lines.push(Line::Comment(text.into()));
    }

    pub fn verbatim(&mut self, code: impl Into<String>) {
        self.lines.push(Line::Verbatim(code.into()));
    }

    pub fn finish(self) -> CompiledFunction {
        CompiledFunction {
            name: self.name,
            jsname: self.jsname,
            register_count: self.register_count,
            tmp_count: self.tmp_count,
            finally_labels: self.finally_labels,
            lines: self.lines,
        }
    }
}

/// A finished function, ready for serialization.
#[derive(Debug)]
pub struct CompiledFunction {
    pub name: String,
    pub jsname: String,
    /// Highest register index referenced; the emitter declares registers
    /// `0..=register_count` unconditionally.
    pub register_count: u32,
    pub tmp_count: u32,
    /// Finally base labels needing completion shadow variables.
    pub finally_labels: BTreeSet<u32>,
    pub lines: Vec<Line>,
}

/// The compilation's functions in creation order (the entry function is
/// always first). Slots are reserved when lowering of a function begins
/// and filled when it ends, so nested functions keep stable positions.
#[derive(Debug, Default)]
pub struct FunctionTable {
    slots: Vec<Option<CompiledFunction>>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reserve(&mut self) -> usize {
        self.slots.push(None);
        self.slots.len() - 1
    }

    pub fn fill(&mut self, slot: usize, function: CompiledFunction) {
        debug_assert!(self.slots[slot].is_none(), "function slot filled twice");
        self.slots[slot] = Some(function);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn functions(&self) -> impl Iterator<Item = &CompiledFunction> {
        self.slots
            .iter()
            .map(|slot| slot.as_ref().expect("unfilled function slot"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> FunctionBuilder {
        FunctionBuilder::new("JS_Fun1".into(), "main".into(), 0)
    }

    #[test]
    fn labels_are_allocated_in_blocks() {
        let mut fun = builder();
        assert_eq!(fun.fresh_label(), IF_OFFSET);
        assert_eq!(fun.fresh_label(), N_JUMP_TYPES + IF_OFFSET);
        let frame = fun.push_frame(FrameKind::Loop, BTreeSet::new());
        assert_eq!(frame, 2 * N_JUMP_TYPES);
        assert_eq!(fun.fresh_label(), 3 * N_JUMP_TYPES + IF_OFFSET);
    }

    #[test]
    fn break_targets_innermost_loop() {
        let mut fun = builder();
        fun.push_frame(FrameKind::Return, BTreeSet::new());
        let outer = fun.push_frame(FrameKind::Loop, BTreeSet::new());
        let inner = fun.push_frame(FrameKind::Loop, BTreeSet::new());
        assert_eq!(
            fun.resolve_exit(ExitKind::Break, None).unwrap(),
            ExitPath::Direct(inner + END_OFFSET)
        );
        let _ = outer;
    }

    #[test]
    fn labeled_break_skips_unnamed_frames() {
        let mut fun = builder();
        fun.push_frame(FrameKind::Return, BTreeSet::new());
        let outer = fun.push_frame(
            FrameKind::Loop,
            BTreeSet::from(["outer".to_string()]),
        );
        fun.push_frame(FrameKind::Loop, BTreeSet::new());
        assert_eq!(
            fun.resolve_exit(ExitKind::Break, Some("outer")).unwrap(),
            ExitPath::Direct(outer + END_OFFSET)
        );
    }

    #[test]
    fn continue_ignores_switch_frames() {
        let mut fun = builder();
        fun.push_frame(FrameKind::Return, BTreeSet::new());
        let looop = fun.push_frame(FrameKind::Loop, BTreeSet::new());
        fun.push_frame(FrameKind::Switch, BTreeSet::new());
        assert_eq!(
            fun.resolve_exit(ExitKind::Continue, None).unwrap(),
            ExitPath::Direct(looop + CONTINUE_OFFSET)
        );
    }

    #[test]
    fn exits_route_through_intervening_finally() {
        let mut fun = builder();
        fun.push_frame(FrameKind::Return, BTreeSet::new());
        fun.push_frame(FrameKind::Loop, BTreeSet::new());
        let finally = fun.push_frame(FrameKind::Finally, BTreeSet::new());
        assert_eq!(
            fun.resolve_exit(ExitKind::Break, None).unwrap(),
            ExitPath::ViaFinally(finally + BEGIN_OFFSET)
        );
        // The loop sits inside the try; break out of it is direct.
        fun.pop_frame();
        fun.pop_frame();
        let outer_loop = fun.push_frame(FrameKind::Loop, BTreeSet::new());
        assert_eq!(
            fun.resolve_exit(ExitKind::Break, None).unwrap(),
            ExitPath::Direct(outer_loop + END_OFFSET)
        );
    }

    #[test]
    fn throw_prefers_catch_over_function_end() {
        let mut fun = builder();
        let ret = fun.push_frame(FrameKind::Return, BTreeSet::new());
        assert_eq!(
            fun.resolve_exit(ExitKind::Throw, None).unwrap(),
            ExitPath::Direct(ret + END_OFFSET)
        );
        let catch = fun.push_frame(FrameKind::Catch, BTreeSet::new());
        assert_eq!(
            fun.resolve_exit(ExitKind::Throw, None).unwrap(),
            ExitPath::Direct(catch + BEGIN_OFFSET)
        );
    }

    #[test]
    fn break_without_target_is_an_error() {
        let mut fun = builder();
        fun.push_frame(FrameKind::Return, BTreeSet::new());
        assert!(fun.resolve_exit(ExitKind::Break, None).is_err());
    }

    #[test]
    fn pending_exits_share_ids_per_key() {
        let mut fun = builder();
        let key = ExitKey {
            kind: ExitKind::Break,
            label: None,
        };
        let a = fun.pending_exit_id(key.clone(), None);
        let b = fun.pending_exit_id(key.clone(), None);
        assert_eq!(a, b);
        let other = fun.pending_exit_id(
            ExitKey {
                kind: ExitKind::Return,
                label: None,
            },
            None,
        );
        assert_ne!(a, other);

        let drained = fun.take_pending_exits();
        assert_eq!(drained.len(), 2);
        assert!(!fun.has_pending_exits());

        // Re-registering a drained exit keeps its id.
        let again = fun.pending_exit_id(key, Some(a));
        assert_eq!(again, a);
    }

    #[test]
    fn register_high_water_mark_grows_monotonically() {
        let mut fun = builder();
        fun.reg(3);
        fun.reg(1);
        let compiled = fun.finish();
        assert_eq!(compiled.register_count, 3);
    }
}
