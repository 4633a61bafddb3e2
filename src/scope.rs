/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! Scope model.
//!
//! Scopes form a tree mirroring function nesting, plus transient catch
//! scopes that exist only during the renaming phase. Each scope tracks
//! three things lowering needs:
//!
//! - `vars`: the names declared in the scope, with their declaration kind.
//! - `captured`: names owned here but read by an inner function. A
//!   captured variable is boxed so closures share one cell.
//! - `environment`: outer names this function reaches through its closure
//!   environment. The position in this list is the environment slot index
//!   baked into the emitted instructions.
//!
//! `var` hoisting is modelled by [`ScopeTree::declare`], which skips catch
//! scopes so a `var` inside a catch block still lands on the enclosing
//! function scope.

use std::collections::BTreeMap;

use crate::u32_from_usize;

/// Index of a scope in the [`ScopeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// How a name entered its scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    /// `var` declaration.
    Var,
    /// Function parameter.
    Arg,
    /// Compiler-introduced binding (`arguments`).
    Special,
    /// Function expression bound by name.
    Lambda,
    /// Function declaration.
    Defun,
    /// Catch parameter after renaming.
    Catch,
    /// Catch parameter before renaming; the id feeds the rename.
    CatchTmp(u32),
}

#[derive(Debug, Default)]
pub struct Scope {
    pub vars: BTreeMap<String, VarKind>,
    pub captured: Vec<String>,
    pub environment: Vec<String>,
    pub uses_arguments: bool,
    pub is_catch: bool,
    pub parent: Option<ScopeId>,
}

/// All scopes of one compilation, plus the global catch-parameter counter
/// that makes catch renames unique across the whole program.
#[derive(Debug, Default)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    catch_count: u32,
}

impl ScopeTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn push_scope(&mut self, parent: Option<ScopeId>, is_catch: bool) -> ScopeId {
        let id = ScopeId(u32_from_usize(self.scopes.len()));
        self.scopes.push(Scope {
            is_catch,
            parent,
            ..Scope::default()
        });
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index()]
    }

    pub fn next_catch_id(&mut self) -> u32 {
        self.catch_count += 1;
        self.catch_count
    }

    /// The nearest enclosing non-catch scope (possibly `scope` itself).
    pub fn base_scope(&self, mut scope: ScopeId) -> ScopeId {
        while self.scope(scope).is_catch {
            scope = self
                .scope(scope)
                .parent
                .expect("catch scope without parent");
        }
        scope
    }

    /// Declare `name` in the function scope enclosing `scope`, honoring
    /// `var` hoisting past catch scopes.
    ///
    /// An existing parameter entry is never downgraded (a `var` that
    /// shadows a parameter keeps the parameter binding). A declaration
    /// named `arguments` is dropped unless it is itself a parameter or
    /// compiler-introduced, so the implicit arguments object stays
    /// addressable.
    pub fn declare(&mut self, scope: ScopeId, name: &str, kind: VarKind) {
        let base = self.base_scope(scope);
        self.declare_in(base, name, kind);
    }

    /// Declare `name` directly in `scope`, without hoisting. Used for
    /// catch parameters, which bind in the catch scope itself.
    pub fn declare_in(&mut self, scope: ScopeId, name: &str, kind: VarKind) {
        if name == "arguments" && !matches!(kind, VarKind::Arg | VarKind::Special) {
            return;
        }
        let vars = &mut self.scope_mut(scope).vars;
        if let Some(existing) = vars.get(name) {
            if *existing == VarKind::Arg {
                return;
            }
        }
        vars.insert(name.to_string(), kind);
    }

    /// Look up `name` in `scope`'s own bindings. Catch scopes are
    /// transparent down to their base function scope, matching where a
    /// non-parameter name inside a catch block actually lives.
    pub fn has_own_var(&self, scope: ScopeId, name: &str) -> Option<VarKind> {
        let mut current = scope;
        loop {
            let s = self.scope(current);
            if let Some(kind) = s.vars.get(name) {
                return Some(*kind);
            }
            if !s.is_catch {
                return None;
            }
            current = s.parent.expect("catch scope without parent");
        }
    }

    /// Look up `name` along the whole scope chain.
    pub fn has_var(&self, scope: ScopeId, name: &str) -> Option<(ScopeId, VarKind)> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(kind) = self.scope(id).vars.get(name) {
                return Some((id, *kind));
            }
            current = self.scope(id).parent;
        }
        None
    }

    /// Record that `scope` reads `name` from an enclosing function.
    ///
    /// Every function scope between the use and the owner gains an
    /// `environment` slot for the name, and every enclosing scope up to
    /// and including the owner marks it `captured`. Idempotent.
    pub fn record_capture(&mut self, scope: ScopeId, name: &str) {
        if self.has_own_var(scope, name).is_some() {
            return;
        }
        let base = self.base_scope(scope);
        push_unique(&mut self.scope_mut(base).environment, name);
        let parent = self
            .scope(base)
            .parent
            .expect("capture recorded at the global scope");
        let parent_base = self.base_scope(parent);
        push_unique(&mut self.scope_mut(parent_base).captured, name);
        self.record_capture(parent_base, name);
    }

    /// Whether the function owning `scope` materializes its arguments
    /// object: it must both read `arguments` and own the implicit binding
    /// (program scopes have none, so a stray top-level read is inert).
    pub fn arguments_used(&self, scope: ScopeId) -> bool {
        let base = self.base_scope(scope);
        let s = self.scope(base);
        s.uses_arguments && s.vars.get("arguments") == Some(&VarKind::Special)
    }

    /// Whether `name`, owned by `scope`, must live in a box. Captured
    /// variables are boxed so closures alias one cell; if the function
    /// materializes `arguments`, every parameter is boxed so the arguments
    /// object aliases them too.
    pub fn is_boxed(&self, scope: ScopeId, name: &str) -> bool {
        let base = self.base_scope(scope);
        let s = self.scope(base);
        if s.captured.iter().any(|c| c == name) {
            return true;
        }
        self.arguments_used(base) && s.vars.get(name) == Some(&VarKind::Arg)
    }

    /// The environment slot of `name` in `scope`'s closure environment.
    pub fn environment_index(&self, scope: ScopeId, name: &str) -> Option<usize> {
        let base = self.base_scope(scope);
        self.scope(base).environment.iter().position(|e| e == name)
    }
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|e| e == name) {
        list.push(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_in_catch_block_hoists_to_function_scope() {
        let mut tree = ScopeTree::new();
        let global = tree.push_scope(None, false);
        let function = tree.push_scope(Some(global), false);
        let catch = tree.push_scope(Some(function), true);

        tree.declare(catch, "x", VarKind::Var);
        assert!(tree.scope(catch).vars.is_empty());
        assert_eq!(tree.has_own_var(function, "x"), Some(VarKind::Var));
    }

    #[test]
    fn catch_param_binds_in_catch_scope_only() {
        let mut tree = ScopeTree::new();
        let global = tree.push_scope(None, false);
        let function = tree.push_scope(Some(global), false);
        let catch = tree.push_scope(Some(function), true);

        tree.declare_in(catch, "e", VarKind::CatchTmp(1));
        assert_eq!(tree.has_own_var(catch, "e"), Some(VarKind::CatchTmp(1)));
        assert_eq!(tree.has_own_var(function, "e"), None);
    }

    #[test]
    fn var_does_not_shadow_parameter() {
        let mut tree = ScopeTree::new();
        let global = tree.push_scope(None, false);
        let function = tree.push_scope(Some(global), false);

        tree.declare(function, "a", VarKind::Arg);
        tree.declare(function, "a", VarKind::Var);
        assert_eq!(tree.has_own_var(function, "a"), Some(VarKind::Arg));
    }

    #[test]
    fn capture_threads_environment_through_intermediate_scopes() {
        let mut tree = ScopeTree::new();
        let global = tree.push_scope(None, false);
        let outer = tree.push_scope(Some(global), false);
        let middle = tree.push_scope(Some(outer), false);
        let inner = tree.push_scope(Some(middle), false);

        tree.declare(outer, "x", VarKind::Var);
        tree.record_capture(inner, "x");

        assert_eq!(tree.environment_index(inner, "x"), Some(0));
        assert_eq!(tree.environment_index(middle, "x"), Some(0));
        assert_eq!(tree.environment_index(outer, "x"), None);
        assert!(tree.is_boxed(outer, "x"));
        assert!(tree.scope(middle).captured.iter().any(|c| c == "x"));
    }

    #[test]
    fn capture_is_idempotent() {
        let mut tree = ScopeTree::new();
        let global = tree.push_scope(None, false);
        let outer = tree.push_scope(Some(global), false);
        let inner = tree.push_scope(Some(outer), false);

        tree.declare(outer, "x", VarKind::Var);
        tree.record_capture(inner, "x");
        tree.record_capture(inner, "x");

        assert_eq!(tree.scope(inner).environment.len(), 1);
        assert_eq!(tree.scope(outer).captured.len(), 1);
    }

    #[test]
    fn arguments_use_boxes_every_parameter() {
        let mut tree = ScopeTree::new();
        let global = tree.push_scope(None, false);
        let function = tree.push_scope(Some(global), false);

        tree.declare_in(function, "arguments", VarKind::Special);
        tree.declare(function, "a", VarKind::Arg);
        tree.declare(function, "b", VarKind::Var);
        tree.scope_mut(function).uses_arguments = true;

        assert!(tree.arguments_used(function));
        assert!(tree.is_boxed(function, "a"));
        assert!(!tree.is_boxed(function, "b"));
        assert!(!tree.arguments_used(global));
    }

    #[test]
    fn declared_arguments_variable_is_dropped() {
        let mut tree = ScopeTree::new();
        let global = tree.push_scope(None, false);
        let function = tree.push_scope(Some(global), false);

        tree.declare(function, "arguments", VarKind::Var);
        assert_eq!(tree.has_own_var(function, "arguments"), None);

        tree.declare(function, "arguments", VarKind::Special);
        assert_eq!(
            tree.has_own_var(function, "arguments"),
            Some(VarKind::Special)
        );
    }
}
