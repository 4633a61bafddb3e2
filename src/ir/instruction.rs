/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! Instruction encoding and rendering.
//!
//! Every opcode has a fixed operand shape, checked at construction time
//! so a lowering bug surfaces as a [`CompileError::MalformedInstruction`]
//! instead of silently emitting text the runtime cannot execute.
//!
//! Operand positions are typed loosely on purpose: a `Value` position
//! accepts either a virtual register or any named slot (`JS_Base`,
//! `JS_Return`, a local variable), because lowering freely threads named
//! locals through the same positions registers go.

use crate::ast::BinaryOp;
use crate::backend::{Target, TargetConfig, LABEL_PREFIX, REGISTER_PREFIX};
use crate::error::{CompileError, Result};

/// Opcodes understood by both runtimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    // Argument stack.
    ClearArgs,
    PushArg,
    PopArg,
    // Constants and allocation.
    Nan,
    Undef,
    Nonexistent,
    Infinity,
    Null,
    Number,
    String,
    Boolean,
    NewObject,
    NewArray,
    NewArguments,
    NewRegexp,
    NewBox,
    NewEnv,
    // Unary operators.
    Typeof,
    Pos,
    Neg,
    Inc,
    Dec,
    BitNot,
    LogNot,
    // Binary operators.
    Eq,
    Ne,
    StrictEq,
    StrictNe,
    Lt,
    Gt,
    Le,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Ushr,
    Instanceof,
    In,
    // Property and variable access.
    GetProp,
    SetProp,
    DelProp,
    SetGetter,
    SetSetter,
    GetVar,
    GetVarStar,
    SetVar,
    SetVarStar,
    GetIndex,
    GetIndexStar,
    SetIndex,
    SetIndexStar,
    InitVar,
    // Closures and calls.
    Function,
    Call,
    New,
    // Enumeration.
    Iterator,
    NextKey,
    // Control flow.
    Jump,
    IfTrue,
    IfFalse,
    JumpNe,
}

/// What an operand position accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperandKind {
    /// A register or named slot.
    Value,
    /// A bare name (variable slot, never a register).
    Name,
    Num,
    Str,
    Bool,
    Label,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DstRule {
    Required,
    Forbidden,
    Optional,
}

struct Shape {
    dst: DstRule,
    operands: &'static [OperandKind],
}

impl Op {
    pub fn mnemonic(self) -> &'static str {
        use Op::*;
        match self {
            ClearArgs => "OP_CLEARARGS",
            PushArg => "OP_PUSHARG",
            PopArg => "OP_POPARG",
            Nan => "OP_NAN",
            Undef => "OP_UNDEF",
            Nonexistent => "OP_NONEXISTENT",
            Infinity => "OP_INFINITY",
            Null => "OP_NULL",
            Number => "OP_NUMBER",
            String => "OP_STRING",
            Boolean => "OP_BOOLEAN",
            NewObject => "OP_NEWOBJECT",
            NewArray => "OP_NEWARRAY",
            NewArguments => "OP_NEWARGUMENTS",
            NewRegexp => "OP_NEWREGEXP",
            NewBox => "OP_NEWBOX",
            NewEnv => "OP_NEWENV",
            Typeof => "OP_TYPEOF",
            Pos => "OP_POS",
            Neg => "OP_NEG",
            Inc => "OP_INC",
            Dec => "OP_DEC",
            BitNot => "OP_BITNOT",
            LogNot => "OP_LOGNOT",
            Eq => "OP_EQ",
            Ne => "OP_NE",
            StrictEq => "OP_STRICTEQ",
            StrictNe => "OP_STRICTNE",
            Lt => "OP_LT",
            Gt => "OP_GT",
            Le => "OP_LE",
            Ge => "OP_GE",
            Add => "OP_ADD",
            Sub => "OP_SUB",
            Mul => "OP_MUL",
            Div => "OP_DIV",
            Mod => "OP_MOD",
            BitAnd => "OP_BITAND",
            BitOr => "OP_BITOR",
            BitXor => "OP_BITXOR",
            Shl => "OP_SHL",
            Shr => "OP_SHR",
            Ushr => "OP_USHR",
            Instanceof => "OP_INSTANCEOF",
            In => "OP_IN",
            GetProp => "OP_GETPROP",
            SetProp => "OP_SETPROP",
            DelProp => "OP_DELPROP",
            SetGetter => "OP_SETGETTER",
            SetSetter => "OP_SETSETTER",
            GetVar => "OP_GETVAR",
            GetVarStar => "OP_GETVARSTAR",
            SetVar => "OP_SETVAR",
            SetVarStar => "OP_SETVARSTAR",
            GetIndex => "OP_GETINDEX",
            GetIndexStar => "OP_GETINDEXSTAR",
            SetIndex => "OP_SETINDEX",
            SetIndexStar => "OP_SETINDEXSTAR",
            InitVar => "OP_INITVAR",
            Function => "OP_FUNCTION",
            Call => "OP_CALL",
            New => "OP_NEW",
            Iterator => "OP_ITERATOR",
            NextKey => "OP_NEXTKEY",
            Jump => "OP_JUMP",
            IfTrue => "OP_IFTRUE",
            IfFalse => "OP_IFFALSE",
            JumpNe => "OP_JUMPNE",
        }
    }

    /// The opcode computing `op` over two already-lowered operands.
    pub fn from_binary(op: BinaryOp) -> Op {
        match op {
            BinaryOp::BitOr => Op::BitOr,
            BinaryOp::BitXor => Op::BitXor,
            BinaryOp::BitAnd => Op::BitAnd,
            BinaryOp::Eq => Op::Eq,
            BinaryOp::Ne => Op::Ne,
            BinaryOp::StrictEq => Op::StrictEq,
            BinaryOp::StrictNe => Op::StrictNe,
            BinaryOp::Lt => Op::Lt,
            BinaryOp::Gt => Op::Gt,
            BinaryOp::Le => Op::Le,
            BinaryOp::Ge => Op::Ge,
            BinaryOp::Instanceof => Op::Instanceof,
            BinaryOp::In => Op::In,
            BinaryOp::Shl => Op::Shl,
            BinaryOp::Shr => Op::Shr,
            BinaryOp::Ushr => Op::Ushr,
            BinaryOp::Add => Op::Add,
            BinaryOp::Sub => Op::Sub,
            BinaryOp::Mul => Op::Mul,
            BinaryOp::Div => Op::Div,
            BinaryOp::Mod => Op::Mod,
        }
    }

    pub fn is_jump(self) -> bool {
        matches!(self, Op::Jump | Op::IfTrue | Op::IfFalse | Op::JumpNe)
    }

    fn shapes(self) -> &'static [Shape] {
        use DstRule::*;
        use Op::*;
        use OperandKind as K;
        const NO_DST_NO_ARGS: &[Shape] = &[Shape {
            dst: Forbidden,
            operands: &[],
        }];
        const DST_NO_ARGS: &[Shape] = &[Shape {
            dst: Required,
            operands: &[],
        }];
        const NO_DST_VALUE: &[Shape] = &[Shape {
            dst: Forbidden,
            operands: &[K::Value],
        }];
        const UNOP: &[Shape] = &[Shape {
            dst: Required,
            operands: &[K::Value],
        }];
        const BINOP: &[Shape] = &[Shape {
            dst: Required,
            operands: &[K::Value, K::Value],
        }];
        const NUMBER: &[Shape] = &[Shape {
            dst: Required,
            operands: &[K::Num],
        }];
        const STRING: &[Shape] = &[Shape {
            dst: Required,
            operands: &[K::Str],
        }];
        const NAMED: &[Shape] = &[Shape {
            dst: Required,
            operands: &[K::Name],
        }];
        const BOOLEAN: &[Shape] = &[Shape {
            dst: Required,
            operands: &[K::Bool],
        }];
        const REGEXP: &[Shape] = &[Shape {
            dst: Required,
            operands: &[K::Str, K::Str],
        }];
        const NAMED_VALUE: &[Shape] = &[Shape {
            dst: Required,
            operands: &[K::Name, K::Value],
        }];
        const INDEXED: &[Shape] = &[Shape {
            dst: Required,
            operands: &[K::Value, K::Num],
        }];
        const INDEXED_STORE: &[Shape] = &[Shape {
            dst: Optional,
            operands: &[K::Value, K::Num, K::Value],
        }];
        const TRIOP: &[Shape] = &[Shape {
            dst: Required,
            operands: &[K::Value, K::Value, K::Value],
        }];
        const TRIOP_NO_DST: &[Shape] = &[Shape {
            dst: Forbidden,
            operands: &[K::Value, K::Value, K::Value],
        }];
        const INITVAR: &[Shape] = &[Shape {
            dst: Forbidden,
            operands: &[K::Name, K::Value],
        }];
        const JUMP: &[Shape] = &[Shape {
            dst: Forbidden,
            operands: &[K::Label],
        }];
        const JUMP_COND: &[Shape] = &[Shape {
            dst: Forbidden,
            operands: &[K::Value, K::Label],
        }];
        const JUMP_NE: &[Shape] = &[Shape {
            dst: Forbidden,
            operands: &[K::Name, K::Num, K::Label],
        }];
        match self {
            ClearArgs => NO_DST_NO_ARGS,
            PopArg | Nan | Undef | Nonexistent | Infinity | Null | NewObject | NewArray
            | NewArguments | NewBox => DST_NO_ARGS,
            PushArg | Call | New => NO_DST_VALUE,
            Typeof | Pos | Neg | Inc | Dec | BitNot | LogNot | Iterator | NextKey => UNOP,
            Eq | Ne | StrictEq | StrictNe | Lt | Gt | Le | Ge | Add | Sub | Mul | Div | Mod
            | BitAnd | BitOr | BitXor | Shl | Shr | Ushr | Instanceof | In | GetProp
            | DelProp => BINOP,
            Number | NewEnv => NUMBER,
            String => STRING,
            GetVar | GetVarStar => NAMED,
            Boolean => BOOLEAN,
            NewRegexp => REGEXP,
            Function | SetVar | SetVarStar => NAMED_VALUE,
            GetIndex | GetIndexStar => INDEXED,
            SetIndex | SetIndexStar => INDEXED_STORE,
            SetProp => TRIOP,
            SetGetter | SetSetter => TRIOP_NO_DST,
            InitVar => INITVAR,
            Jump => JUMP,
            IfTrue | IfFalse => JUMP_COND,
            JumpNe => JUMP_NE,
        }
    }
}

/// One operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// Virtual register.
    Reg(u32),
    /// Named slot, emitted verbatim.
    Name(String),
    Num(f64),
    Str(String),
    Bool(bool),
    Label(u32),
}

impl Arg {
    pub fn name(s: impl Into<String>) -> Arg {
        Arg::Name(s.into())
    }

    fn matches(&self, kind: OperandKind) -> bool {
        match kind {
            OperandKind::Value => matches!(self, Arg::Reg(_) | Arg::Name(_)),
            OperandKind::Name => matches!(self, Arg::Name(_)),
            OperandKind::Num => matches!(self, Arg::Num(_)),
            OperandKind::Str => matches!(self, Arg::Str(_)),
            OperandKind::Bool => matches!(self, Arg::Bool(_)),
            OperandKind::Label => matches!(self, Arg::Label(_)),
        }
    }

    fn render(&self, cfg: &TargetConfig) -> String {
        match self {
            Arg::Reg(n) => format!("{REGISTER_PREFIX}{n}"),
            Arg::Name(name) => name.clone(),
            Arg::Num(n) => format_number(*n),
            Arg::Str(s) => {
                let quoted =
                    serde_json::to_string(s).expect("string serialization cannot fail");
                match cfg.target {
                    Target::Js => quoted,
                    Target::C => format!("L{quoted}"),
                }
            }
            Arg::Bool(b) => b.to_string(),
            Arg::Label(l) => match cfg.target {
                Target::Js => l.to_string(),
                Target::C => format!("{LABEL_PREFIX}{l}"),
            },
        }
    }
}

/// Render a numeric operand. Integral values print without a fraction so
/// index and jump-type operands stay integer-typed in C.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 9.0e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// A shape-checked opcode application.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub op: Op,
    pub dst: Option<Arg>,
    pub args: Vec<Arg>,
}

impl Instruction {
    pub fn new(op: Op, dst: Option<Arg>, args: Vec<Arg>) -> Result<Instruction> {
        let malformed = |message: String| CompileError::MalformedInstruction {
            opcode: op.mnemonic(),
            message,
        };
        if let Some(dst) = &dst {
            if !matches!(dst, Arg::Reg(_) | Arg::Name(_)) {
                return Err(malformed(format!("destination {dst:?} is not a place")));
            }
        }
        let shape_ok = op.shapes().iter().any(|shape| {
            let dst_ok = match shape.dst {
                DstRule::Required => dst.is_some(),
                DstRule::Forbidden => dst.is_none(),
                DstRule::Optional => true,
            };
            dst_ok
                && shape.operands.len() == args.len()
                && args
                    .iter()
                    .zip(shape.operands)
                    .all(|(arg, kind)| arg.matches(*kind))
        });
        if !shape_ok {
            return Err(malformed(format!(
                "operands {args:?} (dst: {}) do not fit any shape",
                dst.is_some()
            )));
        }
        Ok(Instruction { op, dst, args })
    }

    fn render(&self, cfg: &TargetConfig) -> String {
        // `OP_SETVAR` and `OP_INITVAR` are pseudo-ops: they render as plain
        // assignments (respectively a declaration) rather than opcode calls.
        match self.op {
            Op::SetVar => {
                let dst = self.dst.as_ref().expect("shape-checked").render(cfg);
                return format!(
                    "{dst} = {} = {}",
                    self.args[0].render(cfg),
                    self.args[1].render(cfg)
                );
            }
            Op::InitVar => {
                return format!(
                    "{} {} = {}",
                    cfg.value_type,
                    self.args[0].render(cfg),
                    self.args[1].render(cfg)
                );
            }
            _ => {}
        }
        let rendered: Vec<String> = self.args.iter().map(|arg| arg.render(cfg)).collect();
        let call = if rendered.is_empty() {
            format!("{}()", self.op.mnemonic())
        } else {
            format!("{}( {} )", self.op.mnemonic(), rendered.join(", "))
        };
        let call = if self.op.is_jump() && cfg.target == Target::Js {
            // Interpreted jumps set the dispatch target and bail out of the
            // current switch arm.
            format!("if ({call}) break")
        } else {
            call
        };
        match &self.dst {
            Some(dst) => format!("{} = {call}", dst.render(cfg)),
            None => call,
        }
    }
}

/// One emitted line of a function body.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    Instr(Instruction),
    /// A raw assignment between places (saving completion state, binding
    /// catch parameters).
    Assign { dst: Arg, src: Arg },
    Label(u32),
    Comment(String),
    /// Inline native code carried over from a `"use js:"` / `"use C:"`
    /// string literal.
    Verbatim(String),
}

impl Line {
    /// Render with the emitter's indentation conventions: labels sit at
    /// the dispatch level, everything else one level deeper, statements
    /// get terminated.
    pub fn render(&self, cfg: &TargetConfig) -> String {
        match (self, cfg.target) {
            (Line::Instr(instr), _) => format!("        {};", instr.render(cfg)),
            (Line::Assign { dst, src }, _) => {
                format!("        {} = {};", dst.render(cfg), src.render(cfg))
            }
            (Line::Label(l), Target::Js) => format!("    case {l}:"),
            (Line::Label(l), Target::C) => format!("    {LABEL_PREFIX}{l}:"),
            (Line::Comment(text), _) => format!("        // {text}"),
            (Line::Verbatim(code), _) => format!("        {code};"),
        }
    }
}
