/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! Name resolution.
//!
//! Resolution runs four passes over the tree and leaves the AST free of
//! catch-scoped names, so lowering only ever deals with function scopes:
//!
//! 1. Build the scope tree, giving every catch clause a transient scope
//!    whose parameter carries a program-unique numeric id.
//! 2. Alpha-rename every use of a catch parameter to `#<id>_<name>`,
//!    producing a new arena. After this pass catch scopes are obsolete:
//!    no name in a catch body can collide with an enclosing binding.
//! 3. Rebuild the scope tree without catch scopes; renamed catch
//!    parameters become ordinary function-scope bindings.
//! 4. Propagate captures: promote undeclared names to global variables,
//!    thread closure environments through intermediate functions, and
//!    track `arguments` usage. A fixed set of runtime globals is touched
//!    in every function so library bootstrap objects stay reachable.

use std::collections::HashMap;

use tracing::debug;

use crate::ast::{Arena, NodeId, NodeKind};
use crate::backend::TargetConfig;
use crate::scope::{ScopeId, ScopeTree, VarKind};
use crate::walk::{value_context, walk, Pass, ValueContext, WalkContext};

/// Everything lowering needs to know about names.
pub struct Resolution {
    /// The alpha-renamed AST.
    pub ast: Arena,
    pub scopes: ScopeTree,
    /// Scope owned by each node (`Program` and function nodes only).
    pub scope_of: Vec<Option<ScopeId>>,
}

/// Resolve all names in the program rooted at `root`.
pub fn resolve(arena: &Arena, root: NodeId, cfg: &TargetConfig) -> Resolution {
    let mut collect = CollectScopes::new(arena.len(), true);
    walk(arena, root, &mut collect);

    let mut rename = RenameCatchParams {
        scopes: collect.tree,
        stack: collect_stack(&collect.scope_of, root),
        scope_of: collect.scope_of,
        renames: HashMap::new(),
    };
    walk(arena, root, &mut rename);
    let renamed = arena.renamed(&rename.renames);

    let mut rebuild = CollectScopes::new(renamed.len(), false);
    walk(&renamed, root, &mut rebuild);

    let global = rebuild.scope_of[root.index()].expect("program node owns the global scope");
    let mut capture = PropagateCaptures {
        scopes: rebuild.tree,
        scope_of: &rebuild.scope_of,
        stack: Vec::new(),
        global,
        cfg,
    };
    walk(&renamed, root, &mut capture);

    let scopes = capture.scopes;
    for id in 0..scopes.len() {
        let scope = scopes.scope(ScopeId(id as u32));
        debug!(
            scope = id,
            vars = ?scope.vars,
            captured = ?scope.captured,
            environment = ?scope.environment,
            uses_arguments = scope.uses_arguments,
            "resolved scope"
        );
    }

    Resolution {
        ast: renamed,
        scopes,
        scope_of: rebuild.scope_of,
    }
}

fn collect_stack(scope_of: &[Option<ScopeId>], root: NodeId) -> Vec<ScopeId> {
    // The rename pass starts from the root, which always owns a scope.
    vec![scope_of[root.index()].expect("program node owns the global scope")]
}

/// Passes 1 and 3: build the scope tree. `with_catch_scopes` selects
/// whether catch clauses get transient scopes (pass 1) or bind their
/// parameter in the enclosing function scope (pass 3).
struct CollectScopes {
    tree: ScopeTree,
    scope_of: Vec<Option<ScopeId>>,
    stack: Vec<ScopeId>,
    with_catch_scopes: bool,
}

impl CollectScopes {
    fn new(node_count: usize, with_catch_scopes: bool) -> Self {
        Self {
            tree: ScopeTree::new(),
            scope_of: vec![None; node_count],
            stack: Vec::new(),
            with_catch_scopes,
        }
    }

    fn current(&self) -> ScopeId {
        *self.stack.last().expect("scope stack is never empty mid-walk")
    }

    fn enter_function(&mut self, arena: &Arena, node: NodeId) {
        let parent = self.stack.last().copied();
        let scope = self.tree.push_scope(parent, false);
        self.scope_of[node.index()] = Some(scope);
        self.stack.push(scope);

        match arena.kind(node) {
            NodeKind::Program { .. } => {}
            NodeKind::FunctionDeclaration { id, params, .. } => {
                let parent = parent.expect("function declaration outside any scope");
                self.tree
                    .declare(parent, arena.identifier_name(*id), VarKind::Defun);
                self.tree.declare_in(scope, "arguments", VarKind::Special);
                for &param in params {
                    self.tree
                        .declare_in(scope, arena.identifier_name(param), VarKind::Arg);
                }
            }
            NodeKind::FunctionExpression { id, params, .. } => {
                self.tree.declare_in(scope, "arguments", VarKind::Special);
                if let Some(id) = id {
                    self.tree
                        .declare_in(scope, arena.identifier_name(*id), VarKind::Lambda);
                }
                for &param in params {
                    self.tree
                        .declare_in(scope, arena.identifier_name(param), VarKind::Arg);
                }
            }
            other => unreachable!("not a scope-owning node: {}", other.name()),
        }
    }
}

impl Pass for CollectScopes {
    fn enter(&mut self, arena: &Arena, node: NodeId, _ctx: &WalkContext) {
        match arena.kind(node) {
            NodeKind::Program { .. }
            | NodeKind::FunctionDeclaration { .. }
            | NodeKind::FunctionExpression { .. } => self.enter_function(arena, node),
            NodeKind::VariableDeclarator { id, .. } => {
                let current = self.current();
                self.tree
                    .declare(current, arena.identifier_name(*id), VarKind::Var);
            }
            NodeKind::CatchClause { param, .. } => {
                let name = arena.identifier_name(*param);
                if self.with_catch_scopes {
                    let parent = self.current();
                    let scope = self.tree.push_scope(Some(parent), true);
                    self.scope_of[node.index()] = Some(scope);
                    self.stack.push(scope);
                    let id = self.tree.next_catch_id();
                    self.tree.declare_in(scope, name, VarKind::CatchTmp(id));
                } else {
                    let current = self.current();
                    self.tree.declare(current, name, VarKind::Catch);
                }
            }
            _ => {}
        }
    }

    fn leave(&mut self, arena: &Arena, node: NodeId, _ctx: &WalkContext) {
        match arena.kind(node) {
            NodeKind::Program { .. }
            | NodeKind::FunctionDeclaration { .. }
            | NodeKind::FunctionExpression { .. } => {
                self.stack.pop();
            }
            NodeKind::CatchClause { .. } if self.with_catch_scopes => {
                self.stack.pop();
            }
            _ => {}
        }
    }
}

/// Pass 2: collect the `#<id>_<name>` renames for catch-scoped names.
struct RenameCatchParams {
    scopes: ScopeTree,
    scope_of: Vec<Option<ScopeId>>,
    stack: Vec<ScopeId>,
    renames: HashMap<NodeId, String>,
}

impl RenameCatchParams {
    fn maybe_rename(&mut self, arena: &Arena, identifier: NodeId) {
        let name = arena.identifier_name(identifier);
        let current = *self.stack.last().expect("scope stack is never empty mid-walk");
        if let Some((_, VarKind::CatchTmp(id))) = self.scopes.has_var(current, name) {
            self.renames.insert(identifier, format!("#{id}_{name}"));
        }
    }
}

impl Pass for RenameCatchParams {
    fn enter(&mut self, _arena: &Arena, node: NodeId, _ctx: &WalkContext) {
        if let Some(scope) = self.scope_of[node.index()] {
            // The root's scope is pre-seeded on the stack.
            if self.stack.last() != Some(&scope) {
                self.stack.push(scope);
            }
        }
    }

    fn leave(&mut self, arena: &Arena, node: NodeId, ctx: &WalkContext) {
        match arena.kind(node) {
            NodeKind::Identifier { .. } => {
                if value_context(arena, node, ctx.link) == ValueContext::Rhs {
                    self.maybe_rename(arena, node);
                }
            }
            NodeKind::AssignmentExpression { left, .. } => {
                if matches!(arena.kind(*left), NodeKind::Identifier { .. }) {
                    self.maybe_rename(arena, *left);
                }
            }
            NodeKind::UpdateExpression { argument, .. } => {
                if matches!(arena.kind(*argument), NodeKind::Identifier { .. }) {
                    self.maybe_rename(arena, *argument);
                }
            }
            NodeKind::CatchClause { param, .. } => {
                self.maybe_rename(arena, *param);
                if self.scope_of[node.index()].is_some() {
                    self.stack.pop();
                }
            }
            NodeKind::FunctionDeclaration { .. } | NodeKind::FunctionExpression { .. } => {
                self.stack.pop();
            }
            _ => {}
        }
    }
}

/// Pass 4: captures, globals, `arguments`.
struct PropagateCaptures<'a> {
    scopes: ScopeTree,
    scope_of: &'a [Option<ScopeId>],
    stack: Vec<ScopeId>,
    global: ScopeId,
    cfg: &'a TargetConfig,
}

impl PropagateCaptures<'_> {
    fn current(&self) -> ScopeId {
        *self.stack.last().expect("scope stack is never empty mid-walk")
    }

    fn touch(&mut self, name: &str) {
        let current = self.current();
        if self.scopes.has_var(current, name).is_none() {
            self.scopes.declare(self.global, name, VarKind::Var);
        }
        // A name can stay undeclared after the global promotion (`arguments`
        // never enters a scope as a plain variable); nothing to capture then.
        if self.scopes.has_own_var(current, name).is_none()
            && self.scopes.has_var(current, name).is_some()
        {
            self.scopes.record_capture(current, name);
        }
        if name == "arguments" {
            let base = self.scopes.base_scope(current);
            self.scopes.scope_mut(base).uses_arguments = true;
        }
    }
}

impl Pass for PropagateCaptures<'_> {
    fn enter(&mut self, arena: &Arena, node: NodeId, _ctx: &WalkContext) {
        if matches!(
            arena.kind(node),
            NodeKind::Program { .. }
                | NodeKind::FunctionDeclaration { .. }
                | NodeKind::FunctionExpression { .. }
        ) {
            let scope = self.scope_of[node.index()].expect("function scope missing");
            self.stack.push(scope);
            for global in self.cfg.forced_globals() {
                self.touch(global);
            }
        }
    }

    fn leave(&mut self, arena: &Arena, node: NodeId, ctx: &WalkContext) {
        match arena.kind(node) {
            NodeKind::Identifier { name } => {
                if value_context(arena, node, ctx.link) == ValueContext::Rhs {
                    let name = name.clone();
                    self.touch(&name);
                }
            }
            NodeKind::AssignmentExpression { left, .. } => {
                if let NodeKind::Identifier { name } = arena.kind(*left) {
                    let name = name.clone();
                    self.touch(&name);
                }
            }
            NodeKind::UpdateExpression { argument, .. } => {
                if let NodeKind::Identifier { name } = arena.kind(*argument) {
                    let name = name.clone();
                    self.touch(&name);
                }
            }
            NodeKind::Program { .. }
            | NodeKind::FunctionDeclaration { .. }
            | NodeKind::FunctionExpression { .. } => {
                self.stack.pop();
            }
            _ => {}
        }
    }
}

/// Map a source-level name to the identifier used in emitted code.
///
/// Names beginning with the reserved prefix are escaped by doubling it,
/// and renamed catch parameters swap their `#` marker for the prefix, so
/// neither can collide with compiler-generated locals. The implicit
/// `arguments` binding maps to the arguments-object local when it is the
/// real thing, and to a reserved plain name when a user declared it.
pub fn escaped_var_name(scopes: &ScopeTree, scope: ScopeId, name: &str) -> String {
    use crate::backend::{ARGS_VAR_NAME, ARGUMENTS_VAR_NAME, PREFIX};
    if name.starts_with(PREFIX) {
        format!("{PREFIX}{name}")
    } else if let Some(rest) = name.strip_prefix('#') {
        format!("{PREFIX}{rest}")
    } else if scopes.scope(scope).vars.get(name) == Some(&VarKind::Special) {
        ARGS_VAR_NAME.to_string()
    } else if name == "arguments" {
        ARGUMENTS_VAR_NAME.to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Target;

    fn resolve_source(json: &str) -> (Resolution, NodeId) {
        let mut arena = Arena::new();
        let root = arena.decode_document(json).expect("decode failed");
        let cfg = TargetConfig::new(Target::Js, false, "test.js");
        (resolve(&arena, root, &cfg), root)
    }

    fn identifier_names(arena: &Arena) -> Vec<String> {
        (0..arena.len())
            .filter_map(|i| match arena.kind(NodeId(i as u32)) {
                NodeKind::Identifier { name } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn catch_parameters_are_alpha_renamed() {
        // try {} catch (e) { e; }, renaming both the parameter and the use.
        let (resolution, _) = resolve_source(
            r#"{"type":"Program","body":[
                {"type":"TryStatement",
                 "block":{"type":"BlockStatement","body":[]},
                 "handler":{"type":"CatchClause",
                    "param":{"type":"Identifier","name":"e"},
                    "body":{"type":"BlockStatement","body":[
                        {"type":"ExpressionStatement","expression":
                            {"type":"Identifier","name":"e"}}]}}}]}"#,
        );
        let names = identifier_names(&resolution.ast);
        assert_eq!(names.iter().filter(|n| *n == "#1_e").count(), 2);
        assert!(!names.iter().any(|n| n == "e"));
    }

    #[test]
    fn renamed_catch_parameter_is_a_function_scope_binding() {
        let (resolution, root) = resolve_source(
            r#"{"type":"Program","body":[
                {"type":"TryStatement",
                 "block":{"type":"BlockStatement","body":[]},
                 "handler":{"type":"CatchClause",
                    "param":{"type":"Identifier","name":"e"},
                    "body":{"type":"BlockStatement","body":[]}}}]}"#,
        );
        let global = resolution.scope_of[root.index()].expect("global scope");
        assert_eq!(
            resolution.scopes.has_own_var(global, "#1_e"),
            Some(VarKind::Catch)
        );
    }

    #[test]
    fn sibling_catch_clauses_get_distinct_ids() {
        let (resolution, _) = resolve_source(
            r#"{"type":"Program","body":[
                {"type":"TryStatement",
                 "block":{"type":"BlockStatement","body":[]},
                 "handler":{"type":"CatchClause",
                    "param":{"type":"Identifier","name":"e"},
                    "body":{"type":"BlockStatement","body":[]}}},
                {"type":"TryStatement",
                 "block":{"type":"BlockStatement","body":[]},
                 "handler":{"type":"CatchClause",
                    "param":{"type":"Identifier","name":"e"},
                    "body":{"type":"BlockStatement","body":[]}}}]}"#,
        );
        let names = identifier_names(&resolution.ast);
        assert!(names.iter().any(|n| n == "#1_e"));
        assert!(names.iter().any(|n| n == "#2_e"));
    }

    #[test]
    fn undeclared_names_become_globals() {
        let (resolution, root) = resolve_source(
            r#"{"type":"Program","body":[
                {"type":"ExpressionStatement","expression":
                    {"type":"AssignmentExpression","operator":"=",
                     "left":{"type":"Identifier","name":"leak"},
                     "right":{"type":"Literal","value":1}}}]}"#,
        );
        let global = resolution.scope_of[root.index()].expect("global scope");
        assert_eq!(
            resolution.scopes.has_own_var(global, "leak"),
            Some(VarKind::Var)
        );
    }

    #[test]
    fn forced_globals_are_always_declared() {
        let (resolution, root) = resolve_source(r#"{"type":"Program","body":[]}"#);
        let global = resolution.scope_of[root.index()].expect("global scope");
        for name in ["Object", "Function", "Array", "RegExp"] {
            assert_eq!(
                resolution.scopes.has_own_var(global, name),
                Some(VarKind::Var),
                "missing forced global {name}"
            );
        }
    }

    #[test]
    fn captured_variable_is_boxed_and_threaded() {
        // function outer() { var x; return function () { return x; }; }
        let (resolution, _) = resolve_source(
            r#"{"type":"Program","body":[
                {"type":"FunctionDeclaration",
                 "id":{"type":"Identifier","name":"outer"},
                 "params":[],
                 "body":{"type":"BlockStatement","body":[
                    {"type":"VariableDeclaration","kind":"var","declarations":[
                        {"type":"VariableDeclarator",
                         "id":{"type":"Identifier","name":"x"},"init":null}]},
                    {"type":"ReturnStatement","argument":
                        {"type":"FunctionExpression","id":null,"params":[],
                         "body":{"type":"BlockStatement","body":[
                            {"type":"ReturnStatement","argument":
                                {"type":"Identifier","name":"x"}}]}}}]}}]}"#,
        );
        let outer = (0..resolution.ast.len())
            .find_map(|i| {
                let id = NodeId(i as u32);
                matches!(
                    resolution.ast.kind(id),
                    NodeKind::FunctionDeclaration { .. }
                )
                .then(|| resolution.scope_of[id.index()].expect("function scope"))
            })
            .expect("outer function present");
        let inner = (0..resolution.ast.len())
            .find_map(|i| {
                let id = NodeId(i as u32);
                matches!(resolution.ast.kind(id), NodeKind::FunctionExpression { .. })
                    .then(|| resolution.scope_of[id.index()].expect("function scope"))
            })
            .expect("inner function present");

        assert!(resolution.scopes.is_boxed(outer, "x"));
        // The first environment slots hold the runtime globals touched in
        // every function; user captures follow them.
        assert_eq!(resolution.scopes.environment_index(inner, "Object"), Some(0));
        assert_eq!(resolution.scopes.environment_index(inner, "x"), Some(4));
    }

    #[test]
    fn reading_arguments_marks_the_function() {
        let (resolution, _) = resolve_source(
            r#"{"type":"Program","body":[
                {"type":"FunctionDeclaration",
                 "id":{"type":"Identifier","name":"f"},
                 "params":[{"type":"Identifier","name":"a"}],
                 "body":{"type":"BlockStatement","body":[
                    {"type":"ReturnStatement","argument":
                        {"type":"Identifier","name":"arguments"}}]}}]}"#,
        );
        let f = (0..resolution.ast.len())
            .find_map(|i| {
                let id = NodeId(i as u32);
                matches!(
                    resolution.ast.kind(id),
                    NodeKind::FunctionDeclaration { .. }
                )
                .then(|| resolution.scope_of[id.index()].expect("function scope"))
            })
            .expect("function present");
        assert!(resolution.scopes.scope(f).uses_arguments);
        assert!(resolution.scopes.is_boxed(f, "a"));
    }

    #[test]
    fn escaping_protects_reserved_names() {
        let mut scopes = ScopeTree::new();
        let scope = scopes.push_scope(None, false);
        scopes.declare_in(scope, "arguments", VarKind::Special);

        assert_eq!(escaped_var_name(&scopes, scope, "JS_x"), "JSJS_x");
        assert_eq!(escaped_var_name(&scopes, scope, "#3_e"), "JS3_e");
        assert_eq!(escaped_var_name(&scopes, scope, "arguments"), "JS_Args");
        assert_eq!(escaped_var_name(&scopes, scope, "plain"), "plain");
    }
}
