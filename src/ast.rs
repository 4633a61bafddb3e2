/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! The AST arena.
//!
//! The compiler consumes a standard ESTree-shaped AST produced by an
//! external parser, ingested here from its JSON serialization. Nodes live
//! in an arena and are addressed by `NodeId`; anything a pass wants to
//! record about a node (its scope, a pending rename) goes in a side table
//! keyed by `NodeId` rather than on the node itself.
//!
//! The node kinds form a closed enum covering exactly the ES5 surface the
//! instruction set encodes. Unknown kinds are rejected at decode time, so
//! later passes can match exhaustively.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{CompileError, Result};
use crate::u32_from_usize;

/// Index of a node in the [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A literal value carried by a `Literal` node.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
    Boolean(bool),
    Null,
    Regex { pattern: String, flags: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Init,
    Get,
    Set,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    BitOr,
    BitXor,
    BitAnd,
    Eq,
    Ne,
    StrictEq,
    StrictNe,
    Lt,
    Gt,
    Le,
    Ge,
    Instanceof,
    In,
    Shl,
    Shr,
    Ushr,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "|" => Self::BitOr,
            "^" => Self::BitXor,
            "&" => Self::BitAnd,
            "==" => Self::Eq,
            "!=" => Self::Ne,
            "===" => Self::StrictEq,
            "!==" => Self::StrictNe,
            "<" => Self::Lt,
            ">" => Self::Gt,
            "<=" => Self::Le,
            ">=" => Self::Ge,
            "instanceof" => Self::Instanceof,
            "in" => Self::In,
            "<<" => Self::Shl,
            ">>" => Self::Shr,
            ">>>" => Self::Ushr,
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            "/" => Self::Div,
            "%" => Self::Mod,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,
    Plus,
    Not,
    BitNot,
    Typeof,
    Void,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

/// Either plain `=` or a compound assignment carrying its binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOp {
    Assign,
    Compound(BinaryOp),
}

/// One AST node. The variants mirror the ESTree node kinds of the ES5
/// subset this compiler accepts.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Program {
        body: Vec<NodeId>,
    },
    FunctionDeclaration {
        id: NodeId,
        params: Vec<NodeId>,
        body: NodeId,
    },
    FunctionExpression {
        id: Option<NodeId>,
        params: Vec<NodeId>,
        body: NodeId,
    },
    Identifier {
        name: String,
    },
    Literal(Literal),
    ThisExpression,
    ArrayExpression {
        /// `None` entries are elisions (`[1, , 3]`).
        elements: Vec<Option<NodeId>>,
    },
    ObjectExpression {
        properties: Vec<NodeId>,
    },
    Property {
        key: NodeId,
        value: NodeId,
        kind: PropertyKind,
    },
    MemberExpression {
        object: NodeId,
        property: NodeId,
        computed: bool,
    },
    CallExpression {
        callee: NodeId,
        arguments: Vec<NodeId>,
    },
    NewExpression {
        callee: NodeId,
        arguments: Vec<NodeId>,
    },
    AssignmentExpression {
        operator: AssignmentOp,
        left: NodeId,
        right: NodeId,
    },
    UpdateExpression {
        operator: UpdateOp,
        prefix: bool,
        argument: NodeId,
    },
    UnaryExpression {
        operator: UnaryOp,
        argument: NodeId,
    },
    BinaryExpression {
        operator: BinaryOp,
        left: NodeId,
        right: NodeId,
    },
    LogicalExpression {
        operator: LogicalOp,
        left: NodeId,
        right: NodeId,
    },
    ConditionalExpression {
        test: NodeId,
        consequent: NodeId,
        alternate: NodeId,
    },
    SequenceExpression {
        expressions: Vec<NodeId>,
    },
    ExpressionStatement {
        expression: NodeId,
    },
    BlockStatement {
        body: Vec<NodeId>,
    },
    IfStatement {
        test: NodeId,
        consequent: NodeId,
        alternate: Option<NodeId>,
    },
    LabeledStatement {
        label: NodeId,
        body: NodeId,
    },
    BreakStatement {
        label: Option<NodeId>,
    },
    ContinueStatement {
        label: Option<NodeId>,
    },
    ReturnStatement {
        argument: Option<NodeId>,
    },
    ThrowStatement {
        argument: NodeId,
    },
    TryStatement {
        block: NodeId,
        handler: Option<NodeId>,
        finalizer: Option<NodeId>,
    },
    CatchClause {
        param: NodeId,
        body: NodeId,
    },
    SwitchStatement {
        discriminant: NodeId,
        cases: Vec<NodeId>,
    },
    SwitchCase {
        test: Option<NodeId>,
        consequent: Vec<NodeId>,
    },
    WhileStatement {
        test: NodeId,
        body: NodeId,
    },
    DoWhileStatement {
        body: NodeId,
        test: NodeId,
    },
    ForStatement {
        init: Option<NodeId>,
        test: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    },
    ForInStatement {
        left: NodeId,
        right: NodeId,
        body: NodeId,
    },
    VariableDeclaration {
        declarations: Vec<NodeId>,
    },
    VariableDeclarator {
        id: NodeId,
        init: Option<NodeId>,
    },
    EmptyStatement,
    DebuggerStatement,
    WithStatement {
        object: NodeId,
        body: NodeId,
    },
}

impl NodeKind {
    /// The ESTree kind name, for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Program { .. } => "Program",
            NodeKind::FunctionDeclaration { .. } => "FunctionDeclaration",
            NodeKind::FunctionExpression { .. } => "FunctionExpression",
            NodeKind::Identifier { .. } => "Identifier",
            NodeKind::Literal(_) => "Literal",
            NodeKind::ThisExpression => "ThisExpression",
            NodeKind::ArrayExpression { .. } => "ArrayExpression",
            NodeKind::ObjectExpression { .. } => "ObjectExpression",
            NodeKind::Property { .. } => "Property",
            NodeKind::MemberExpression { .. } => "MemberExpression",
            NodeKind::CallExpression { .. } => "CallExpression",
            NodeKind::NewExpression { .. } => "NewExpression",
            NodeKind::AssignmentExpression { .. } => "AssignmentExpression",
            NodeKind::UpdateExpression { .. } => "UpdateExpression",
            NodeKind::UnaryExpression { .. } => "UnaryExpression",
            NodeKind::BinaryExpression { .. } => "BinaryExpression",
            NodeKind::LogicalExpression { .. } => "LogicalExpression",
            NodeKind::ConditionalExpression { .. } => "ConditionalExpression",
            NodeKind::SequenceExpression { .. } => "SequenceExpression",
            NodeKind::ExpressionStatement { .. } => "ExpressionStatement",
            NodeKind::BlockStatement { .. } => "BlockStatement",
            NodeKind::IfStatement { .. } => "IfStatement",
            NodeKind::LabeledStatement { .. } => "LabeledStatement",
            NodeKind::BreakStatement { .. } => "BreakStatement",
            NodeKind::ContinueStatement { .. } => "ContinueStatement",
            NodeKind::ReturnStatement { .. } => "ReturnStatement",
            NodeKind::ThrowStatement { .. } => "ThrowStatement",
            NodeKind::TryStatement { .. } => "TryStatement",
            NodeKind::CatchClause { .. } => "CatchClause",
            NodeKind::SwitchStatement { .. } => "SwitchStatement",
            NodeKind::SwitchCase { .. } => "SwitchCase",
            NodeKind::WhileStatement { .. } => "WhileStatement",
            NodeKind::DoWhileStatement { .. } => "DoWhileStatement",
            NodeKind::ForStatement { .. } => "ForStatement",
            NodeKind::ForInStatement { .. } => "ForInStatement",
            NodeKind::VariableDeclaration { .. } => "VariableDeclaration",
            NodeKind::VariableDeclarator { .. } => "VariableDeclarator",
            NodeKind::EmptyStatement => "EmptyStatement",
            NodeKind::DebuggerStatement => "DebuggerStatement",
            NodeKind::WithStatement { .. } => "WithStatement",
        }
    }
}

/// Named child slot of a node. `Element` identifies one entry of a list
/// slot together with its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Field(Field),
    Element(Field, usize),
}

impl Edge {
    pub fn field(self) -> Field {
        match self {
            Edge::Field(field) | Edge::Element(field, _) => field,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Body,
    Params,
    Id,
    Left,
    Right,
    Key,
    Value,
    Object,
    Property,
    Callee,
    Arguments,
    Argument,
    Test,
    Consequent,
    Alternate,
    Expressions,
    Expression,
    Label,
    Block,
    Handler,
    Finalizer,
    Param,
    Discriminant,
    Cases,
    Init,
    Update,
    Declarations,
    Elements,
    Properties,
}

/// The node arena. Append-only; `NodeId`s are stable for the arena's life.
#[derive(Debug, Clone, Default)]
pub struct Arena {
    nodes: Vec<NodeKind>,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(u32_from_usize(self.nodes.len()));
        self.nodes.push(kind);
        id
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()]
    }

    /// The name of an `Identifier` node. Callers use this only in positions
    /// the decoder guarantees to hold identifiers.
    pub fn identifier_name(&self, id: NodeId) -> &str {
        match self.kind(id) {
            NodeKind::Identifier { name } => name,
            other => unreachable!("expected Identifier, found {}", other.name()),
        }
    }

    /// Replace the body of a `Program` node (used for library splicing).
    pub fn set_program_body(&mut self, id: NodeId, new_body: Vec<NodeId>) {
        match &mut self.nodes[id.index()] {
            NodeKind::Program { body } => *body = new_body,
            other => unreachable!("expected Program, found {}", other.name()),
        }
    }

    /// Produce a new arena with the given `Identifier` nodes renamed.
    /// All other nodes are copied unchanged; `NodeId`s carry over.
    pub fn renamed(&self, renames: &HashMap<NodeId, String>) -> Arena {
        let mut nodes = self.nodes.clone();
        for (&id, new_name) in renames {
            match &mut nodes[id.index()] {
                NodeKind::Identifier { name } => *name = new_name.clone(),
                other => unreachable!("rename target is {}, not Identifier", other.name()),
            }
        }
        Arena { nodes }
    }

    /// Enumerate the children of `id` in source field order, the order the
    /// tree walker visits them.
    pub fn for_each_child(&self, id: NodeId, mut f: impl FnMut(Edge, NodeId)) {
        use NodeKind::*;
        let f = &mut f as &mut dyn FnMut(Edge, NodeId);
        let field = |fld, child: &NodeId, f: &mut dyn FnMut(Edge, NodeId)| {
            f(Edge::Field(fld), *child);
        };
        let opt = |fld, child: &Option<NodeId>, f: &mut dyn FnMut(Edge, NodeId)| {
            if let Some(child) = child {
                f(Edge::Field(fld), *child);
            }
        };
        let list = |fld, children: &[NodeId], f: &mut dyn FnMut(Edge, NodeId)| {
            for (i, child) in children.iter().enumerate() {
                f(Edge::Element(fld, i), *child);
            }
        };
        match self.kind(id) {
            Program { body } => list(Field::Body, body, f),
            FunctionDeclaration { id, params, body } => {
                field(Field::Id, id, f);
                list(Field::Params, params, f);
                field(Field::Body, body, f);
            }
            FunctionExpression { id, params, body } => {
                opt(Field::Id, id, f);
                list(Field::Params, params, f);
                field(Field::Body, body, f);
            }
            Identifier { .. } | Literal(_) | ThisExpression | EmptyStatement
            | DebuggerStatement => {}
            ArrayExpression { elements } => {
                for (i, element) in elements.iter().enumerate() {
                    if let Some(element) = element {
                        f(Edge::Element(Field::Elements, i), *element);
                    }
                }
            }
            ObjectExpression { properties } => list(Field::Properties, properties, f),
            Property { key, value, .. } => {
                field(Field::Key, key, f);
                field(Field::Value, value, f);
            }
            MemberExpression {
                object, property, ..
            } => {
                field(Field::Object, object, f);
                field(Field::Property, property, f);
            }
            CallExpression { callee, arguments } | NewExpression { callee, arguments } => {
                field(Field::Callee, callee, f);
                list(Field::Arguments, arguments, f);
            }
            AssignmentExpression { left, right, .. }
            | BinaryExpression { left, right, .. }
            | LogicalExpression { left, right, .. } => {
                field(Field::Left, left, f);
                field(Field::Right, right, f);
            }
            UpdateExpression { argument, .. } | UnaryExpression { argument, .. } => {
                field(Field::Argument, argument, f);
            }
            ConditionalExpression {
                test,
                consequent,
                alternate,
            } => {
                field(Field::Test, test, f);
                field(Field::Consequent, consequent, f);
                field(Field::Alternate, alternate, f);
            }
            SequenceExpression { expressions } => list(Field::Expressions, expressions, f),
            ExpressionStatement { expression } => field(Field::Expression, expression, f),
            BlockStatement { body } => list(Field::Body, body, f),
            IfStatement {
                test,
                consequent,
                alternate,
            } => {
                field(Field::Test, test, f);
                field(Field::Consequent, consequent, f);
                opt(Field::Alternate, alternate, f);
            }
            LabeledStatement { label, body } => {
                field(Field::Label, label, f);
                field(Field::Body, body, f);
            }
            BreakStatement { label } | ContinueStatement { label } => {
                opt(Field::Label, label, f)
            }
            ReturnStatement { argument } => opt(Field::Argument, argument, f),
            ThrowStatement { argument } => field(Field::Argument, argument, f),
            TryStatement {
                block,
                handler,
                finalizer,
            } => {
                field(Field::Block, block, f);
                opt(Field::Handler, handler, f);
                opt(Field::Finalizer, finalizer, f);
            }
            CatchClause { param, body } => {
                field(Field::Param, param, f);
                field(Field::Body, body, f);
            }
            SwitchStatement {
                discriminant,
                cases,
            } => {
                field(Field::Discriminant, discriminant, f);
                list(Field::Cases, cases, f);
            }
            SwitchCase { test, consequent } => {
                opt(Field::Test, test, f);
                list(Field::Consequent, consequent, f);
            }
            WhileStatement { test, body } => {
                field(Field::Test, test, f);
                field(Field::Body, body, f);
            }
            DoWhileStatement { body, test } => {
                field(Field::Body, body, f);
                field(Field::Test, test, f);
            }
            ForStatement {
                init,
                test,
                update,
                body,
            } => {
                opt(Field::Init, init, f);
                opt(Field::Test, test, f);
                opt(Field::Update, update, f);
                field(Field::Body, body, f);
            }
            ForInStatement { left, right, body } => {
                field(Field::Left, left, f);
                field(Field::Right, right, f);
                field(Field::Body, body, f);
            }
            VariableDeclaration { declarations } => {
                list(Field::Declarations, declarations, f)
            }
            VariableDeclarator { id, init } => {
                field(Field::Id, id, f);
                opt(Field::Init, init, f);
            }
            WithStatement { object, body } => {
                field(Field::Object, object, f);
                field(Field::Body, body, f);
            }
        }
    }

    // =========================================================================
    // ESTree JSON decoding
    // =========================================================================

    /// Decode an ESTree JSON document into this arena, returning the root.
    pub fn decode_document(&mut self, source: &str) -> Result<NodeId> {
        let value: Value = serde_json::from_str(source)?;
        self.decode(&value)
    }

    /// Decode one ESTree node (and its subtree) into the arena.
    pub fn decode(&mut self, v: &Value) -> Result<NodeId> {
        let ty = str_field(v, "type")?;
        let kind = match ty {
            "Program" => NodeKind::Program {
                body: self.decode_list(v, "body")?,
            },
            "FunctionDeclaration" => NodeKind::FunctionDeclaration {
                id: self.decode_field(v, "id")?,
                params: self.decode_params(v)?,
                body: self.decode_field(v, "body")?,
            },
            "FunctionExpression" => NodeKind::FunctionExpression {
                id: self.decode_opt_field(v, "id")?,
                params: self.decode_params(v)?,
                body: self.decode_field(v, "body")?,
            },
            "Identifier" => NodeKind::Identifier {
                name: str_field(v, "name")?.to_string(),
            },
            "Literal" => NodeKind::Literal(decode_literal(v)?),
            "ThisExpression" => NodeKind::ThisExpression,
            "ArrayExpression" => {
                let raw = list_field(v, "elements")?;
                let mut elements = Vec::with_capacity(raw.len());
                for element in raw {
                    if element.is_null() {
                        elements.push(None);
                    } else {
                        elements.push(Some(self.decode(element)?));
                    }
                }
                NodeKind::ArrayExpression { elements }
            }
            "ObjectExpression" => NodeKind::ObjectExpression {
                properties: self.decode_list(v, "properties")?,
            },
            "Property" => NodeKind::Property {
                key: self.decode_field(v, "key")?,
                value: self.decode_field(v, "value")?,
                kind: match str_field(v, "kind")? {
                    "init" => PropertyKind::Init,
                    "get" => PropertyKind::Get,
                    "set" => PropertyKind::Set,
                    other => {
                        return Err(CompileError::ast(format!("unknown property kind `{other}`")))
                    }
                },
            },
            "MemberExpression" => NodeKind::MemberExpression {
                object: self.decode_field(v, "object")?,
                property: self.decode_field(v, "property")?,
                computed: bool_field(v, "computed"),
            },
            "CallExpression" => NodeKind::CallExpression {
                callee: self.decode_field(v, "callee")?,
                arguments: self.decode_list(v, "arguments")?,
            },
            "NewExpression" => NodeKind::NewExpression {
                callee: self.decode_field(v, "callee")?,
                arguments: self.decode_list(v, "arguments")?,
            },
            "AssignmentExpression" => {
                let op = str_field(v, "operator")?;
                let operator = if op == "=" {
                    AssignmentOp::Assign
                } else {
                    let stripped = op.strip_suffix('=').unwrap_or(op);
                    AssignmentOp::Compound(BinaryOp::from_str(stripped).ok_or_else(|| {
                        CompileError::ast(format!("unknown assignment operator `{op}`"))
                    })?)
                };
                NodeKind::AssignmentExpression {
                    operator,
                    left: self.decode_field(v, "left")?,
                    right: self.decode_field(v, "right")?,
                }
            }
            "UpdateExpression" => NodeKind::UpdateExpression {
                operator: match str_field(v, "operator")? {
                    "++" => UpdateOp::Increment,
                    "--" => UpdateOp::Decrement,
                    other => {
                        return Err(CompileError::ast(format!("unknown update operator `{other}`")))
                    }
                },
                prefix: bool_field(v, "prefix"),
                argument: self.decode_field(v, "argument")?,
            },
            "UnaryExpression" => NodeKind::UnaryExpression {
                operator: match str_field(v, "operator")? {
                    "-" => UnaryOp::Minus,
                    "+" => UnaryOp::Plus,
                    "!" => UnaryOp::Not,
                    "~" => UnaryOp::BitNot,
                    "typeof" => UnaryOp::Typeof,
                    "void" => UnaryOp::Void,
                    "delete" => UnaryOp::Delete,
                    other => {
                        return Err(CompileError::ast(format!("unknown unary operator `{other}`")))
                    }
                },
                argument: self.decode_field(v, "argument")?,
            },
            "BinaryExpression" => {
                let op = str_field(v, "operator")?;
                NodeKind::BinaryExpression {
                    operator: BinaryOp::from_str(op).ok_or_else(|| {
                        CompileError::ast(format!("unknown binary operator `{op}`"))
                    })?,
                    left: self.decode_field(v, "left")?,
                    right: self.decode_field(v, "right")?,
                }
            }
            "LogicalExpression" => NodeKind::LogicalExpression {
                operator: match str_field(v, "operator")? {
                    "&&" => LogicalOp::And,
                    "||" => LogicalOp::Or,
                    other => {
                        return Err(CompileError::ast(format!(
                            "unknown logical operator `{other}`"
                        )))
                    }
                },
                left: self.decode_field(v, "left")?,
                right: self.decode_field(v, "right")?,
            },
            "ConditionalExpression" => NodeKind::ConditionalExpression {
                test: self.decode_field(v, "test")?,
                consequent: self.decode_field(v, "consequent")?,
                alternate: self.decode_field(v, "alternate")?,
            },
            "SequenceExpression" => NodeKind::SequenceExpression {
                expressions: self.decode_list(v, "expressions")?,
            },
            "ExpressionStatement" => NodeKind::ExpressionStatement {
                expression: self.decode_field(v, "expression")?,
            },
            "BlockStatement" => NodeKind::BlockStatement {
                body: self.decode_list(v, "body")?,
            },
            "IfStatement" => NodeKind::IfStatement {
                test: self.decode_field(v, "test")?,
                consequent: self.decode_field(v, "consequent")?,
                alternate: self.decode_opt_field(v, "alternate")?,
            },
            "LabeledStatement" => NodeKind::LabeledStatement {
                label: self.decode_field(v, "label")?,
                body: self.decode_field(v, "body")?,
            },
            "BreakStatement" => NodeKind::BreakStatement {
                label: self.decode_opt_field(v, "label")?,
            },
            "ContinueStatement" => NodeKind::ContinueStatement {
                label: self.decode_opt_field(v, "label")?,
            },
            "ReturnStatement" => NodeKind::ReturnStatement {
                argument: self.decode_opt_field(v, "argument")?,
            },
            "ThrowStatement" => NodeKind::ThrowStatement {
                argument: self.decode_field(v, "argument")?,
            },
            "TryStatement" => NodeKind::TryStatement {
                block: self.decode_field(v, "block")?,
                handler: self.decode_opt_field(v, "handler")?,
                finalizer: self.decode_opt_field(v, "finalizer")?,
            },
            "CatchClause" => NodeKind::CatchClause {
                param: self.decode_field(v, "param")?,
                body: self.decode_field(v, "body")?,
            },
            "SwitchStatement" => NodeKind::SwitchStatement {
                discriminant: self.decode_field(v, "discriminant")?,
                cases: self.decode_list(v, "cases")?,
            },
            "SwitchCase" => NodeKind::SwitchCase {
                test: self.decode_opt_field(v, "test")?,
                consequent: self.decode_list(v, "consequent")?,
            },
            "WhileStatement" => NodeKind::WhileStatement {
                test: self.decode_field(v, "test")?,
                body: self.decode_field(v, "body")?,
            },
            "DoWhileStatement" => NodeKind::DoWhileStatement {
                body: self.decode_field(v, "body")?,
                test: self.decode_field(v, "test")?,
            },
            "ForStatement" => NodeKind::ForStatement {
                init: self.decode_opt_field(v, "init")?,
                test: self.decode_opt_field(v, "test")?,
                update: self.decode_opt_field(v, "update")?,
                body: self.decode_field(v, "body")?,
            },
            "ForInStatement" => NodeKind::ForInStatement {
                left: self.decode_field(v, "left")?,
                right: self.decode_field(v, "right")?,
                body: self.decode_field(v, "body")?,
            },
            "VariableDeclaration" => {
                match str_field(v, "kind") {
                    Ok("var") | Err(_) => {}
                    Ok(other) => {
                        return Err(CompileError::ast(format!(
                            "unsupported declaration kind `{other}`"
                        )))
                    }
                }
                NodeKind::VariableDeclaration {
                    declarations: self.decode_list(v, "declarations")?,
                }
            }
            "VariableDeclarator" => NodeKind::VariableDeclarator {
                id: self.decode_field(v, "id")?,
                init: self.decode_opt_field(v, "init")?,
            },
            "EmptyStatement" => NodeKind::EmptyStatement,
            "DebuggerStatement" => NodeKind::DebuggerStatement,
            "WithStatement" => NodeKind::WithStatement {
                object: self.decode_field(v, "object")?,
                body: self.decode_field(v, "body")?,
            },
            other => return Err(CompileError::ast(format!("unknown node kind `{other}`"))),
        };
        Ok(self.push(kind))
    }

    fn decode_field(&mut self, v: &Value, field: &str) -> Result<NodeId> {
        let child = v
            .get(field)
            .filter(|c| !c.is_null())
            .ok_or_else(|| missing(v, field))?;
        self.decode(child)
    }

    fn decode_opt_field(&mut self, v: &Value, field: &str) -> Result<Option<NodeId>> {
        match v.get(field) {
            Some(child) if !child.is_null() => Ok(Some(self.decode(child)?)),
            _ => Ok(None),
        }
    }

    fn decode_list(&mut self, v: &Value, field: &str) -> Result<Vec<NodeId>> {
        let raw = list_field(v, field)?;
        let mut out = Vec::with_capacity(raw.len());
        for child in raw {
            out.push(self.decode(child)?);
        }
        Ok(out)
    }

    fn decode_params(&mut self, v: &Value) -> Result<Vec<NodeId>> {
        let params = self.decode_list(v, "params")?;
        for &param in &params {
            if !matches!(self.kind(param), NodeKind::Identifier { .. }) {
                return Err(CompileError::ast(
                    "function parameters must be plain identifiers",
                ));
            }
        }
        Ok(params)
    }
}

fn missing(v: &Value, field: &str) -> CompileError {
    let ty = v.get("type").and_then(Value::as_str).unwrap_or("<node>");
    CompileError::ast(format!("{ty} is missing required field `{field}`"))
}

fn str_field<'a>(v: &'a Value, field: &str) -> Result<&'a str> {
    v.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| missing(v, field))
}

fn bool_field(v: &Value, field: &str) -> bool {
    v.get(field).and_then(Value::as_bool).unwrap_or(false)
}

fn list_field<'a>(v: &'a Value, field: &str) -> Result<&'a Vec<Value>> {
    v.get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| missing(v, field))
}

fn decode_literal(v: &Value) -> Result<Literal> {
    if let Some(regex) = v.get("regex").filter(|r| !r.is_null()) {
        return Ok(Literal::Regex {
            pattern: str_field(regex, "pattern")?.to_string(),
            flags: str_field(regex, "flags")?.to_string(),
        });
    }
    match v.get("value") {
        Some(Value::Number(n)) => Ok(Literal::Number(n.as_f64().unwrap_or(f64::NAN))),
        Some(Value::String(s)) => Ok(Literal::String(s.clone())),
        Some(Value::Bool(b)) => Ok(Literal::Boolean(*b)),
        Some(Value::Null) | None => Ok(Literal::Null),
        Some(other) => Err(CompileError::ast(format!(
            "unsupported literal value: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> (Arena, NodeId) {
        let mut arena = Arena::new();
        let root = arena.decode_document(json).expect("decode failed");
        (arena, root)
    }

    #[test]
    fn decodes_a_minimal_program() {
        let (arena, root) = decode(
            r#"{"type":"Program","body":[
                {"type":"ExpressionStatement","expression":
                    {"type":"Literal","value":42}}]}"#,
        );
        let NodeKind::Program { body } = arena.kind(root) else {
            panic!("root is not a Program");
        };
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn array_elisions_become_holes() {
        let (arena, root) = decode(
            r#"{"type":"Program","body":[
                {"type":"ExpressionStatement","expression":
                    {"type":"ArrayExpression","elements":[
                        {"type":"Literal","value":1},
                        null,
                        {"type":"Literal","value":3}]}}]}"#,
        );
        let mut holes = 0;
        for i in 0..arena.len() {
            if let NodeKind::ArrayExpression { elements } = arena.kind(NodeId(i as u32)) {
                holes = elements.iter().filter(|e| e.is_none()).count();
            }
        }
        assert_eq!(holes, 1);
        let _ = root;
    }

    #[test]
    fn compound_assignment_carries_binary_operator() {
        let (arena, _) = decode(
            r#"{"type":"Program","body":[
                {"type":"ExpressionStatement","expression":
                    {"type":"AssignmentExpression","operator":"+=",
                     "left":{"type":"Identifier","name":"x"},
                     "right":{"type":"Literal","value":1}}}]}"#,
        );
        let found = (0..arena.len()).any(|i| {
            matches!(
                arena.kind(NodeId(i as u32)),
                NodeKind::AssignmentExpression {
                    operator: AssignmentOp::Compound(BinaryOp::Add),
                    ..
                }
            )
        });
        assert!(found);
    }

    #[test]
    fn rejects_unknown_node_kinds() {
        let mut arena = Arena::new();
        let err = arena
            .decode_document(r#"{"type":"ArrowFunctionExpression","body":[]}"#)
            .unwrap_err();
        assert!(matches!(err, CompileError::Ast(_)));
    }

    #[test]
    fn regex_literals_keep_pattern_and_flags() {
        let (arena, _) = decode(
            r#"{"type":"Program","body":[
                {"type":"ExpressionStatement","expression":
                    {"type":"Literal","regex":{"pattern":"a+","flags":"g"}}}]}"#,
        );
        let found = (0..arena.len()).any(|i| {
            matches!(
                arena.kind(NodeId(i as u32)),
                NodeKind::Literal(Literal::Regex { pattern, flags })
                    if pattern == "a+" && flags == "g"
            )
        });
        assert!(found);
    }
}
