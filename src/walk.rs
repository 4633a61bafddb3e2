/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! Generic tree walking and identifier-position classification.
//!
//! All resolution passes are expressed as [`Pass`] implementations driven
//! by [`walk`]. A pass sees every node twice, on the way down (`enter`)
//! and on the way up (`leave`), together with a [`WalkContext`] linking
//! back through the ancestor chain.
//!
//! [`value_context`] answers the one question every pass keeps asking
//! about an `Identifier`: is this a value read, or does the grammar give
//! the name some other role (declaration, label, property name, ...)?

use crate::ast::{Arena, Edge, Field, NodeId, NodeKind, PropertyKind, UnaryOp};

/// Position of a node relative to its ancestors. Contexts are chained on
/// the stack during a walk; `parent` is `None` at the root.
#[derive(Clone, Copy)]
pub struct WalkContext<'a> {
    /// The parent node and the edge leading from it to the current node.
    pub link: Option<(NodeId, Edge)>,
    pub parent: Option<&'a WalkContext<'a>>,
}

impl WalkContext<'_> {
    pub const ROOT: WalkContext<'static> = WalkContext {
        link: None,
        parent: None,
    };
}

/// One traversal over the tree. Both hooks default to doing nothing so a
/// pass only implements the direction it cares about.
pub trait Pass {
    fn enter(&mut self, arena: &Arena, node: NodeId, ctx: &WalkContext) {
        let _ = (arena, node, ctx);
    }

    fn leave(&mut self, arena: &Arena, node: NodeId, ctx: &WalkContext) {
        let _ = (arena, node, ctx);
    }
}

/// Drive `pass` over the subtree rooted at `root`, depth first, children
/// in source field order.
pub fn walk(arena: &Arena, root: NodeId, pass: &mut impl Pass) {
    walk_inner(arena, root, &WalkContext::ROOT, pass);
}

fn walk_inner(arena: &Arena, node: NodeId, ctx: &WalkContext, pass: &mut impl Pass) {
    pass.enter(arena, node, ctx);
    let mut children = Vec::new();
    arena.for_each_child(node, |edge, child| children.push((edge, child)));
    for (edge, child) in children {
        let child_ctx = WalkContext {
            link: Some((node, edge)),
            parent: Some(ctx),
        };
        walk_inner(arena, child, &child_ctx, pass);
    }
    pass.leave(arena, node, ctx);
}

/// How an identifier position relates to the value namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueContext {
    /// A value read; resolution and lowering treat it as a variable use.
    Rhs,
    /// A grammatical name, not a variable use (declaration targets,
    /// labels, non-computed property names, ...).
    Ignore,
    /// The value of a `get` property.
    Getter,
    /// The value of a `set` property.
    Setter,
}

/// Classify the position of `node` given the edge from its parent.
pub fn value_context(arena: &Arena, node: NodeId, link: Option<(NodeId, Edge)>) -> ValueContext {
    let Some((parent, edge)) = link else {
        return ValueContext::Rhs;
    };
    let field = edge.field();
    match arena.kind(parent) {
        NodeKind::AssignmentExpression { .. } if field == Field::Left => ValueContext::Ignore,
        NodeKind::UpdateExpression { .. } if field == Field::Argument => ValueContext::Ignore,
        NodeKind::UnaryExpression {
            operator: UnaryOp::Delete,
            ..
        } if field == Field::Argument => ValueContext::Ignore,
        NodeKind::ForInStatement { .. } if field == Field::Left => ValueContext::Ignore,
        NodeKind::Property { kind, .. } => match field {
            Field::Key => ValueContext::Ignore,
            Field::Value => match kind {
                PropertyKind::Get => ValueContext::Getter,
                PropertyKind::Set => ValueContext::Setter,
                PropertyKind::Init => ValueContext::Rhs,
            },
            _ => ValueContext::Rhs,
        },
        NodeKind::FunctionDeclaration { .. } | NodeKind::FunctionExpression { .. } => {
            match field {
                Field::Id | Field::Params => ValueContext::Ignore,
                _ => ValueContext::Rhs,
            }
        }
        NodeKind::LabeledStatement { .. }
        | NodeKind::BreakStatement { .. }
        | NodeKind::ContinueStatement { .. }
            if field == Field::Label =>
        {
            ValueContext::Ignore
        }
        NodeKind::CatchClause { .. } if field == Field::Param => ValueContext::Ignore,
        NodeKind::VariableDeclarator { .. } if field == Field::Id => ValueContext::Ignore,
        NodeKind::MemberExpression { computed, .. } if field == Field::Property => {
            if *computed {
                ValueContext::Rhs
            } else {
                ValueContext::Ignore
            }
        }
        // Direct `eval` and method calls must not lift the callee into a
        // register: lowering needs the uncompiled callee shape to pick the
        // `this` value.
        NodeKind::CallExpression { .. } | NodeKind::NewExpression { .. }
            if field == Field::Callee =>
        {
            let is_member = matches!(arena.kind(node), NodeKind::MemberExpression { .. });
            let is_eval = matches!(
                arena.kind(node),
                NodeKind::Identifier { name } if name == "eval"
            );
            if is_member || is_eval {
                ValueContext::Ignore
            } else {
                ValueContext::Rhs
            }
        }
        _ => ValueContext::Rhs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Arena;

    struct Collector {
        names: Vec<(String, ValueContext)>,
    }

    impl Pass for Collector {
        fn enter(&mut self, arena: &Arena, node: NodeId, ctx: &WalkContext) {
            if let NodeKind::Identifier { name } = arena.kind(node) {
                self.names
                    .push((name.clone(), value_context(arena, node, ctx.link)));
            }
        }
    }

    fn classify(json: &str) -> Vec<(String, ValueContext)> {
        let mut arena = Arena::new();
        let root = arena.decode_document(json).expect("decode failed");
        let mut collector = Collector { names: Vec::new() };
        walk(&arena, root, &mut collector);
        collector.names
    }

    fn context_of(names: &[(String, ValueContext)], name: &str) -> ValueContext {
        names
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| *c)
            .unwrap_or_else(|| panic!("identifier `{name}` not visited"))
    }

    #[test]
    fn assignment_target_is_not_a_read() {
        let names = classify(
            r#"{"type":"Program","body":[
                {"type":"ExpressionStatement","expression":
                    {"type":"AssignmentExpression","operator":"=",
                     "left":{"type":"Identifier","name":"x"},
                     "right":{"type":"Identifier","name":"y"}}}]}"#,
        );
        assert_eq!(context_of(&names, "x"), ValueContext::Ignore);
        assert_eq!(context_of(&names, "y"), ValueContext::Rhs);
    }

    #[test]
    fn member_property_depends_on_computed() {
        let names = classify(
            r#"{"type":"Program","body":[
                {"type":"ExpressionStatement","expression":
                    {"type":"MemberExpression","computed":false,
                     "object":{"type":"Identifier","name":"o"},
                     "property":{"type":"Identifier","name":"p"}}},
                {"type":"ExpressionStatement","expression":
                    {"type":"MemberExpression","computed":true,
                     "object":{"type":"Identifier","name":"o2"},
                     "property":{"type":"Identifier","name":"k"}}}]}"#,
        );
        assert_eq!(context_of(&names, "p"), ValueContext::Ignore);
        assert_eq!(context_of(&names, "k"), ValueContext::Rhs);
    }

    #[test]
    fn function_name_and_params_are_declarations() {
        let names = classify(
            r#"{"type":"Program","body":[
                {"type":"FunctionDeclaration",
                 "id":{"type":"Identifier","name":"f"},
                 "params":[{"type":"Identifier","name":"a"}],
                 "body":{"type":"BlockStatement","body":[
                    {"type":"ReturnStatement","argument":
                        {"type":"Identifier","name":"a"}}]}}]}"#,
        );
        assert_eq!(context_of(&names, "f"), ValueContext::Ignore);
        // Both occurrences of `a`, in order: the parameter then the read.
        let contexts: Vec<_> = names
            .iter()
            .filter(|(n, _)| n == "a")
            .map(|(_, c)| *c)
            .collect();
        assert_eq!(contexts, [ValueContext::Ignore, ValueContext::Rhs]);
    }

    #[test]
    fn member_callee_is_not_lifted() {
        let names = classify(
            r#"{"type":"Program","body":[
                {"type":"ExpressionStatement","expression":
                    {"type":"CallExpression",
                     "callee":{"type":"MemberExpression","computed":false,
                        "object":{"type":"Identifier","name":"o"},
                        "property":{"type":"Identifier","name":"m"}},
                     "arguments":[{"type":"Identifier","name":"x"}]}},
                {"type":"ExpressionStatement","expression":
                    {"type":"CallExpression",
                     "callee":{"type":"Identifier","name":"g"},
                     "arguments":[]}}]}"#,
        );
        assert_eq!(context_of(&names, "o"), ValueContext::Rhs);
        assert_eq!(context_of(&names, "x"), ValueContext::Rhs);
        assert_eq!(context_of(&names, "g"), ValueContext::Rhs);
    }

    #[test]
    fn getter_and_setter_values_are_flagged() {
        let names = classify(
            r#"{"type":"Program","body":[
                {"type":"ExpressionStatement","expression":
                    {"type":"ObjectExpression","properties":[
                        {"type":"Property","kind":"get",
                         "key":{"type":"Identifier","name":"p"},
                         "value":{"type":"Identifier","name":"gv"}},
                        {"type":"Property","kind":"set",
                         "key":{"type":"Identifier","name":"q"},
                         "value":{"type":"Identifier","name":"sv"}}]}}]}"#,
        );
        assert_eq!(context_of(&names, "p"), ValueContext::Ignore);
        assert_eq!(context_of(&names, "gv"), ValueContext::Getter);
        assert_eq!(context_of(&names, "sv"), ValueContext::Setter);
    }

    #[test]
    fn labels_are_opaque() {
        let names = classify(
            r#"{"type":"Program","body":[
                {"type":"LabeledStatement",
                 "label":{"type":"Identifier","name":"outer"},
                 "body":{"type":"WhileStatement",
                    "test":{"type":"Literal","value":true},
                    "body":{"type":"BreakStatement",
                        "label":{"type":"Identifier","name":"outer"}}}}]}"#,
        );
        for (_, ctx) in names.iter().filter(|(n, _)| n == "outer") {
            assert_eq!(*ctx, ValueContext::Ignore);
        }
    }
}
