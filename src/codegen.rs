/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! Lowering from the resolved AST to linear instruction streams.
//!
//! Expression visitors thread an explicit register index `nt`: a visitor
//! leaves its value in register `nt` and may scratch registers above it.
//! Statement visitors restart at register 0, so register pressure is
//! bounded by the deepest expression, not the function size.
//!
//! Abrupt completions (`break`, `continue`, `return`, `throw`) never
//! unwind at runtime; they are jumps resolved against the block frame
//! stack, and `JS_JumpType`/`JS_Return` carry the completion record
//! across call boundaries and through `finally` blocks.

use std::collections::BTreeSet;

use crate::ast::{
    AssignmentOp, Literal, LogicalOp, NodeId, NodeKind, PropertyKind, UnaryOp, UpdateOp,
};
use crate::backend::{
    TargetConfig, ARGS_VAR_NAME, BASE_VAR_NAME, BEGIN_OFFSET, COMPLETION_JUMP_VAR_NAME_PREFIX,
    COMPLETION_RETURN_VAR_NAME_PREFIX, COMPLETION_TYPE_VAR_NAME_PREFIX, CONTINUE_OFFSET,
    END_OFFSET, ENV_VAR_NAME, FUN_VAR_NAME, JUMP_TYPE_EXCEPTION, JUMP_TYPE_NORMAL,
    JUMP_TYPE_RETURN, JUMP_TYPE_VAR_NAME, RETURN_VAR_NAME,
};
use crate::error::{CompileError, Result};
use crate::ir::{
    format_number, Arg, ExitKey, ExitKind, ExitPath, FrameKind, FunctionBuilder, FunctionTable,
    Op,
};
use crate::resolver::{escaped_var_name, Resolution};
use crate::scope::{ScopeId, VarKind};

/// Lower the resolved program rooted at `root` into a function table.
pub fn lower(resolution: &Resolution, root: NodeId, cfg: &TargetConfig) -> Result<FunctionTable> {
    let mut cg = Codegen {
        resolution,
        cfg,
        table: FunctionTable::new(),
        builders: Vec::new(),
        scopes: Vec::new(),
        label_set: BTreeSet::new(),
        bootstrap_done: false,
    };
    cg.begin_function("main");
    cg.visit(root, 0)?;
    cg.end_function();
    Ok(cg.table)
}

struct Codegen<'a> {
    resolution: &'a Resolution,
    cfg: &'a TargetConfig,
    table: FunctionTable,
    /// Stack of functions being lowered; nested function literals suspend
    /// their enclosing function's builder.
    builders: Vec<FunctionBuilder>,
    scopes: Vec<ScopeId>,
    /// Source labels collected from enclosing labeled statements, consumed
    /// by the next frame-pushing statement.
    label_set: BTreeSet<String>,
    /// The very first function declaration is the library's `Function`
    /// bootstrap; its prototype object cannot be created yet.
    bootstrap_done: bool,
}

impl Codegen<'_> {
    // === Function and scope bookkeeping ===

    fn begin_function(&mut self, jsname: &str) {
        let slot = self.table.reserve();
        let name = format!("{}{}", self.cfg.fun_name_prefix, slot + 1);
        self.builders
            .push(FunctionBuilder::new(name, jsname.to_string(), slot));
    }

    fn end_function(&mut self) -> String {
        let builder = self.builders.pop().expect("no function under construction");
        let name = builder.name.clone();
        let slot = builder.slot;
        self.table.fill(slot, builder.finish());
        name
    }

    fn fun(&mut self) -> &mut FunctionBuilder {
        self.builders.last_mut().expect("no function under construction")
    }

    fn nt(&mut self, n: u32) -> Arg {
        self.fun().reg(n)
    }

    fn scope(&self) -> ScopeId {
        *self.scopes.last().expect("no scope entered")
    }

    fn scope_of(&self, node: NodeId) -> ScopeId {
        self.resolution.scope_of[node.index()].expect("node does not own a scope")
    }

    fn kind(&self, node: NodeId) -> NodeKind {
        self.resolution.ast.kind(node).clone()
    }

    fn escaped(&self, name: &str) -> String {
        escaped_var_name(&self.resolution.scopes, self.scope(), name)
    }

    fn push_frame(&mut self, kind: FrameKind) -> u32 {
        let names = std::mem::take(&mut self.label_set);
        self.fun().push_frame(kind, names)
    }

    // === Variable access ===

    fn add_get_var(&mut self, lhs: Arg, name: &str) -> Result<()> {
        self.fun().comment(name);
        let escaped = self.escaped(name);
        let scopes = &self.resolution.scopes;
        if scopes.has_own_var(self.scope(), name).is_some() {
            let op = if scopes.is_boxed(self.scope(), name) {
                Op::GetVarStar
            } else {
                Op::GetVar
            };
            self.fun().instr(op, Some(lhs), vec![Arg::Name(escaped)])
        } else {
            let index = self.environment_index(name)?;
            self.fun().instr(
                Op::GetIndexStar,
                Some(lhs),
                vec![Arg::name(ENV_VAR_NAME), Arg::Num(index)],
            )
        }
    }

    fn add_set_var(&mut self, lhs: Arg, name: &str, rhs: Arg) -> Result<()> {
        self.fun().comment(name);
        let escaped = self.escaped(name);
        let scopes = &self.resolution.scopes;
        if scopes.has_own_var(self.scope(), name).is_some() {
            let op = if scopes.is_boxed(self.scope(), name) {
                Op::SetVarStar
            } else {
                Op::SetVar
            };
            self.fun().instr(op, Some(lhs), vec![Arg::Name(escaped), rhs])
        } else {
            let index = self.environment_index(name)?;
            self.fun().instr(
                Op::SetIndexStar,
                Some(lhs),
                vec![Arg::name(ENV_VAR_NAME), Arg::Num(index), rhs],
            )
        }
    }

    /// Read the box holding `name` rather than its value, for threading
    /// cells into a closure environment.
    fn add_get_var_ref(&mut self, lhs: Arg, name: &str) -> Result<()> {
        self.fun().comment(name);
        let escaped = self.escaped(name);
        if self
            .resolution
            .scopes
            .has_own_var(self.scope(), name)
            .is_some()
        {
            self.fun().instr(Op::GetVar, Some(lhs), vec![Arg::Name(escaped)])
        } else {
            let index = self.environment_index(name)?;
            self.fun().instr(
                Op::GetIndex,
                Some(lhs),
                vec![Arg::name(ENV_VAR_NAME), Arg::Num(index)],
            )
        }
    }

    fn environment_index(&self, name: &str) -> Result<f64> {
        self.resolution
            .scopes
            .environment_index(self.scope(), name)
            .map(|i| i as f64)
            .ok_or_else(|| CompileError::UnresolvedVariable(name.to_string()))
    }

    /// Wire `__proto__` of the value in register `nt` to `<class>.prototype`.
    /// When a function declaration literally named `Function` is being
    /// bootstrapped, its prototype chain is made circular instead.
    fn set_prototype(&mut self, class_name: &str, nt: u32, declared_name: Option<&str>) -> Result<()> {
        if declared_name == Some("Function") {
            let r1 = self.nt(nt + 1);
            self.fun()
                .instr(Op::String, Some(r1.clone()), vec![Arg::Str("__proto__".into())])?;
            let r0 = self.nt(nt);
            self.fun()
                .instr(Op::SetProp, Some(r1.clone()), vec![r0.clone(), r1, r0])?;
            return Ok(());
        }
        let r1 = self.nt(nt + 1);
        self.add_get_var(r1.clone(), class_name)?;
        let r2 = self.nt(nt + 2);
        self.fun()
            .instr(Op::String, Some(r2.clone()), vec![Arg::Str("prototype".into())])?;
        self.fun()
            .instr(Op::GetProp, Some(r2.clone()), vec![r1.clone(), r2.clone()])?;
        self.fun()
            .instr(Op::String, Some(r1.clone()), vec![Arg::Str("__proto__".into())])?;
        let r0 = self.nt(nt);
        self.fun().instr(Op::SetProp, Some(r1.clone()), vec![r0, r1, r2])?;
        Ok(())
    }

    // === Abrupt exits ===

    fn lower_exit(&mut self, kind: ExitKind, label: Option<&str>, preset: Option<i64>) -> Result<()> {
        match self.fun().resolve_exit(kind, label)? {
            ExitPath::Direct(target) => {
                self.fun().instr(Op::Jump, None, vec![Arg::Label(target)])
            }
            ExitPath::ViaFinally(entry) => {
                let base = entry - BEGIN_OFFSET;
                let key = ExitKey {
                    kind,
                    label: label.map(str::to_string),
                };
                let id = self.fun().pending_exit_id(key, preset);
                self.fun().register_finally(base);
                self.fun().assign(
                    Arg::name(format!("{COMPLETION_JUMP_VAR_NAME_PREFIX}{base}")),
                    Arg::Num(id as f64),
                );
                self.fun().instr(Op::Jump, None, vec![Arg::Label(entry)])
            }
        }
    }

    /// Dispatch chain at the end of a finalizer: every exit that entered
    /// this `finally` is re-issued with its saved completion state.
    fn add_finally_end_instructions(&mut self, flabel: u32) -> Result<()> {
        let end_label = self.fun().fresh_label();
        for (key, id) in self.fun().take_pending_exits() {
            let skip_label = self.fun().fresh_label();
            self.fun().instr(
                Op::JumpNe,
                None,
                vec![
                    Arg::name(format!("{COMPLETION_JUMP_VAR_NAME_PREFIX}{flabel}")),
                    Arg::Num(id as f64),
                    Arg::Label(skip_label),
                ],
            )?;
            self.fun().assign(
                Arg::name(JUMP_TYPE_VAR_NAME),
                Arg::name(format!("{COMPLETION_TYPE_VAR_NAME_PREFIX}{flabel}")),
            );
            self.fun().assign(
                Arg::name(RETURN_VAR_NAME),
                Arg::name(format!("{COMPLETION_RETURN_VAR_NAME_PREFIX}{flabel}")),
            );
            self.lower_exit(key.kind, key.label.as_deref(), Some(id))?;
            self.fun().instr(Op::Jump, None, vec![Arg::Label(end_label)])?;
            self.fun().label(skip_label);
        }
        self.fun().label(end_label);
        Ok(())
    }

    // === Function prologues ===

    /// Environment setup of the entry function: the global environment is
    /// built inline instead of being received through the argument stack.
    fn visit_globals(&mut self, node: NodeId, nt: u32) -> Result<()> {
        let scope = self.scope_of(node);
        let env = self.resolution.scopes.scope(scope).environment.clone();
        self.fun().comment("Creating env, base");
        let r0 = self.nt(nt);
        self.fun()
            .instr(Op::NewEnv, Some(r0.clone()), vec![Arg::Num(env.len() as f64)])?;
        for (i, name) in env.iter().enumerate() {
            self.fun().comment(name.clone());
            let r1 = self.nt(nt + 1);
            self.fun().instr(Op::NewBox, Some(r1.clone()), vec![])?;
            self.fun().instr(
                Op::SetIndex,
                None,
                vec![r0.clone(), Arg::Num(i as f64), r1.clone()],
            )?;
            self.fun().instr(Op::Nonexistent, Some(r1.clone()), vec![])?;
            self.fun().instr(
                Op::SetIndexStar,
                None,
                vec![r0.clone(), Arg::Num(i as f64), r1],
            )?;
        }
        self.fun()
            .instr(Op::InitVar, None, vec![Arg::name(ENV_VAR_NAME), r0.clone()])?;
        self.fun().instr(Op::Undef, Some(r0.clone()), vec![])?;
        self.fun()
            .instr(Op::InitVar, None, vec![Arg::name(BASE_VAR_NAME), r0])?;
        self.fun().comment("Done creating env, base");
        Ok(())
    }

    fn visit_params(&mut self, params: &[NodeId], nt: u32) -> Result<()> {
        for local in [ENV_VAR_NAME, FUN_VAR_NAME, BASE_VAR_NAME] {
            let r0 = self.nt(nt);
            self.fun().instr(Op::PopArg, Some(r0.clone()), vec![])?;
            self.fun().instr(Op::InitVar, None, vec![Arg::name(local), r0])?;
        }
        let arguments_used = self.resolution.scopes.arguments_used(self.scope());
        if arguments_used {
            let r0 = self.nt(nt);
            self.fun().instr(Op::NewArguments, Some(r0.clone()), vec![])?;
            self.set_prototype("Object", nt, None)?;
            self.fun()
                .instr(Op::InitVar, None, vec![Arg::name(ARGS_VAR_NAME), r0])?;
        }
        for (i, &param) in params.iter().enumerate() {
            let name = self.resolution.ast.identifier_name(param).to_string();
            self.add_param(&name, nt, i)?;
        }
        Ok(())
    }

    fn add_param(&mut self, name: &str, nt: u32, index: usize) -> Result<()> {
        self.fun().comment(name);
        let escaped = self.escaped(name);
        let r0 = self.nt(nt);
        if self.resolution.scopes.is_boxed(self.scope(), name) {
            self.fun().instr(Op::NewBox, Some(r0.clone()), vec![])?;
            self.fun()
                .instr(Op::InitVar, None, vec![Arg::Name(escaped), r0.clone()])?;
            self.fun().instr(Op::PopArg, Some(r0.clone()), vec![])?;
            self.add_set_var(r0.clone(), name, r0.clone())?;
        } else {
            self.fun().instr(Op::PopArg, Some(r0.clone()), vec![])?;
            self.fun().instr(Op::InitVar, None, vec![Arg::Name(escaped), r0.clone()])?;
        }
        if self.resolution.scopes.arguments_used(self.scope()) {
            let r1 = self.nt(nt + 1);
            self.add_get_var(r1.clone(), "arguments")?;
            let r2 = self.nt(nt + 2);
            self.fun()
                .instr(Op::Number, Some(r2.clone()), vec![Arg::Num(index as f64)])?;
            self.fun()
                .instr(Op::SetProp, Some(r0.clone()), vec![r1, r2, r0])?;
        }
        Ok(())
    }

    /// Declare and initialize the function's hoisted locals.
    fn visit_vars(&mut self, nt: u32) -> Result<()> {
        let vars = self.resolution.scopes.scope(self.scope()).vars.clone();
        for (name, kind) in vars {
            if matches!(kind, VarKind::Arg | VarKind::Special) {
                continue;
            }
            self.fun().comment(name.clone());
            let escaped = self.escaped(&name);
            let boxed = self.resolution.scopes.is_boxed(self.scope(), &name);
            let r0 = self.nt(nt);
            if boxed && kind != VarKind::Catch {
                self.fun().instr(Op::NewBox, Some(r0.clone()), vec![])?;
            } else {
                self.fun().instr(Op::Undef, Some(r0.clone()), vec![])?;
            }
            self.fun().instr(Op::InitVar, None, vec![Arg::Name(escaped), r0])?;
        }
        Ok(())
    }

    /// Common lowering of function literals: thread the closure
    /// environment, compile the body into a fresh function, then
    /// materialize the function object and its prototype.
    fn lower_closure(
        &mut self,
        node: NodeId,
        nt: u32,
        id: Option<NodeId>,
        params: &[NodeId],
        body: NodeId,
        declaration: bool,
    ) -> Result<()> {
        let id_name = id.map(|id| self.resolution.ast.identifier_name(id).to_string());
        let scope = self.scope_of(node);
        let env = self.resolution.scopes.scope(scope).environment.clone();

        match &id_name {
            Some(name) => self.fun().comment(format!("Creating function {name}")),
            None => self.fun().comment("Creating function "),
        }
        let r0 = self.nt(nt);
        self.fun()
            .instr(Op::NewEnv, Some(r0.clone()), vec![Arg::Num(env.len() as f64)])?;
        for (i, name) in env.iter().enumerate() {
            let r1 = self.nt(nt + 1);
            self.add_get_var_ref(r1.clone(), name)?;
            self.fun()
                .instr(Op::SetIndex, None, vec![r0.clone(), Arg::Num(i as f64), r1])?;
        }

        self.scopes.push(scope);
        self.begin_function(id_name.as_deref().unwrap_or(""));

        let return_label = self.push_frame(FrameKind::Return);
        self.visit_params(params, 0)?;
        self.visit_vars(0)?;
        if let (false, Some(name)) = (declaration, &id_name) {
            let name = name.clone();
            let b0 = self.nt(0);
            self.fun().assign(b0.clone(), Arg::name(FUN_VAR_NAME));
            self.add_set_var(b0.clone(), &name, b0)?;
        }
        self.visit(body, 0)?;

        let b0 = self.nt(0);
        self.fun().instr(Op::Undef, Some(b0.clone()), vec![])?;
        self.fun().assign(Arg::name(RETURN_VAR_NAME), b0);
        self.fun()
            .assign(Arg::name(JUMP_TYPE_VAR_NAME), Arg::Num(JUMP_TYPE_RETURN as f64));
        self.fun().label(return_label + END_OFFSET);
        self.fun().pop_frame();

        let name = self.end_function();
        self.scopes.pop();

        let r0 = self.nt(nt);
        self.fun()
            .instr(Op::Function, Some(r0.clone()), vec![Arg::Name(name), r0.clone()])?;

        if declaration {
            let id_name = id_name.expect("function declarations are named");
            self.set_prototype("Function", nt, Some(&id_name))?;
            let r0 = self.nt(nt);
            self.add_set_var(r0.clone(), &id_name, r0)?;
            if self.bootstrap_done {
                self.create_prototype_object(nt, true)?;
            } else {
                self.bootstrap_done = true;
            }
        } else {
            self.set_prototype("Function", nt, None)?;
            self.create_prototype_object(nt, false)?;
        }
        self.fun().comment("Done creating function");
        Ok(())
    }

    /// Every function object gets a fresh `prototype` object pointing back
    /// at it through `constructor`.
    fn create_prototype_object(&mut self, nt: u32, declaration: bool) -> Result<()> {
        self.fun().comment("Create empty prototype object of the function");
        let r1 = self.nt(nt + 1);
        self.fun().instr(Op::NewObject, Some(r1.clone()), vec![])?;
        self.set_prototype("Object", nt + 1, None)?;
        let r2 = self.nt(nt + 2);
        self.fun()
            .instr(Op::String, Some(r2.clone()), vec![Arg::Str("constructor".into())])?;
        let r0 = self.nt(nt);
        let constructor_dst = if declaration { r0.clone() } else { r2.clone() };
        self.fun().instr(
            Op::SetProp,
            Some(constructor_dst),
            vec![r1.clone(), r2.clone(), r0.clone()],
        )?;
        self.fun()
            .instr(Op::String, Some(r2.clone()), vec![Arg::Str("prototype".into())])?;
        self.fun().instr(Op::SetProp, Some(r1.clone()), vec![r0, r2, r1])?;
        Ok(())
    }

    // === Expression helpers ===

    /// Lower a member access selector into register `nt`.
    fn visit_member_property(&mut self, property: NodeId, computed: bool, nt: u32) -> Result<()> {
        if computed {
            return self.visit(property, nt);
        }
        let name = match self.kind(property) {
            NodeKind::Identifier { name } => name,
            other => {
                return Err(CompileError::ast(format!(
                    "non-computed member selector is {}, not Identifier",
                    other.name()
                )))
            }
        };
        let r = self.nt(nt);
        self.fun().instr(Op::String, Some(r), vec![Arg::Str(name)])
    }

    /// Arguments are evaluated right to left into consecutive registers,
    /// then pushed in the same order so the callee pops them left to right.
    fn visit_arguments(&mut self, arguments: &[NodeId], nt: u32) -> Result<()> {
        for (j, &argument) in arguments.iter().rev().enumerate() {
            self.visit(argument, nt + j as u32)?;
        }
        for j in 0..arguments.len() {
            let r = self.nt(nt + j as u32);
            self.fun().instr(Op::PushArg, None, vec![r])?;
        }
        Ok(())
    }

    fn property_key_string(&self, key: NodeId) -> Result<String> {
        match self.kind(key) {
            NodeKind::Identifier { name } => Ok(name),
            NodeKind::Literal(literal) => Ok(match literal {
                Literal::String(s) => s,
                Literal::Number(n) => format_number(n),
                Literal::Boolean(b) => b.to_string(),
                Literal::Null => "null".to_string(),
                Literal::Regex { .. } => {
                    return Err(CompileError::ast("regex literal as property key"))
                }
            }),
            other => Err(CompileError::ast(format!(
                "property key is {}, not Identifier or Literal",
                other.name()
            ))),
        }
    }

    fn visit_properties(&mut self, properties: &[NodeId], nt: u32) -> Result<()> {
        for &property in properties {
            let NodeKind::Property { key, value, kind } = self.kind(property) else {
                return Err(CompileError::ast("object entry is not a Property"));
            };
            let key = self.property_key_string(key)?;
            let r1 = self.nt(nt + 1);
            self.fun().instr(Op::String, Some(r1.clone()), vec![Arg::Str(key)])?;
            self.visit(value, nt + 2)?;
            let r0 = self.nt(nt);
            let r2 = self.nt(nt + 2);
            match kind {
                PropertyKind::Init => {
                    self.fun()
                        .instr(Op::SetProp, Some(r1.clone()), vec![r0, r1, r2])?;
                }
                PropertyKind::Get => {
                    self.fun().instr(Op::SetGetter, None, vec![r0, r1, r2])?;
                }
                PropertyKind::Set => {
                    self.fun().instr(Op::SetSetter, None, vec![r0, r1, r2])?;
                }
            }
        }
        Ok(())
    }

    fn visit_elements(&mut self, elements: &[Option<NodeId>], nt: u32) -> Result<()> {
        for (i, element) in elements.iter().enumerate() {
            // Elisions keep their index but store nothing.
            let Some(element) = element else { continue };
            let r1 = self.nt(nt + 1);
            self.fun()
                .instr(Op::Number, Some(r1.clone()), vec![Arg::Num(i as f64)])?;
            self.visit(*element, nt + 2)?;
            let r0 = self.nt(nt);
            let r2 = self.nt(nt + 2);
            self.fun().instr(Op::SetProp, Some(r1.clone()), vec![r0, r1, r2])?;
        }
        Ok(())
    }

    /// The post-call completion check shared by calls and constructions:
    /// an exception completion in the callee resumes throwing here.
    fn add_call_completion_check(&mut self, nt: u32) -> Result<()> {
        let return_label = self.fun().fresh_label();
        self.fun().instr(
            Op::JumpNe,
            None,
            vec![
                Arg::name(JUMP_TYPE_VAR_NAME),
                Arg::Num(JUMP_TYPE_EXCEPTION as f64),
                Arg::Label(return_label),
            ],
        )?;
        self.fun().comment("throw after return");
        self.lower_exit(ExitKind::Throw, None, None)?;
        self.fun().label(return_label);
        let r0 = self.nt(nt);
        self.fun().assign(r0, Arg::name(RETURN_VAR_NAME));
        Ok(())
    }

    fn visit_statements(&mut self, statements: &[NodeId]) -> Result<()> {
        for &statement in statements {
            self.label_set.clear();
            self.visit(statement, 0)?;
        }
        Ok(())
    }

    // === The visitor ===

    fn visit(&mut self, node: NodeId, nt: u32) -> Result<()> {
        match self.kind(node) {
            NodeKind::Program { body } => {
                let return_label = self.push_frame(FrameKind::Return);
                self.visit_globals(node, nt)?;
                self.scopes.push(self.scope_of(node));
                self.visit_vars(0)?;
                self.visit_statements(&body)?;
                self.scopes.pop();
                self.fun().label(return_label + END_OFFSET);
                self.fun().pop_frame();
            }
            NodeKind::FunctionDeclaration { id, params, body } => {
                self.lower_closure(node, nt, Some(id), &params, body, true)?;
            }
            NodeKind::FunctionExpression { id, params, body } => {
                self.lower_closure(node, nt, id, &params, body, false)?;
            }
            NodeKind::VariableDeclarator { id, init } => {
                if let Some(init) = init {
                    self.visit(init, 0)?;
                    let name = self.resolution.ast.identifier_name(id).to_string();
                    let r = self.nt(nt);
                    self.add_set_var(r.clone(), &name, r)?;
                }
            }
            NodeKind::VariableDeclaration { declarations } => {
                self.visit_statements(&declarations)?;
            }
            NodeKind::ExpressionStatement { expression } => {
                self.label_set.clear();
                self.visit(expression, 0)?;
            }
            NodeKind::BinaryExpression {
                operator,
                left,
                right,
            } => {
                self.visit(left, nt)?;
                self.visit(right, nt + 1)?;
                let r0 = self.nt(nt);
                let r1 = self.nt(nt + 1);
                self.fun()
                    .instr(Op::from_binary(operator), Some(r0.clone()), vec![r0, r1])?;
            }
            NodeKind::LogicalExpression {
                operator,
                left,
                right,
            } => {
                self.visit(left, nt)?;
                let label = self.fun().fresh_label();
                let r0 = self.nt(nt);
                let op = match operator {
                    LogicalOp::And => Op::IfFalse,
                    LogicalOp::Or => Op::IfTrue,
                };
                self.fun().instr(op, None, vec![r0, Arg::Label(label)])?;
                self.visit(right, nt)?;
                self.fun().label(label);
            }
            NodeKind::UnaryExpression { operator, argument } => match operator {
                UnaryOp::Void => {
                    self.visit(argument, nt)?;
                    let r0 = self.nt(nt);
                    self.fun().instr(Op::Undef, Some(r0), vec![])?;
                }
                UnaryOp::Delete => {
                    let NodeKind::MemberExpression {
                        object,
                        property,
                        computed,
                    } = self.kind(argument)
                    else {
                        return Err(CompileError::UnsupportedConstruct(
                            "delete of a non-property".to_string(),
                        ));
                    };
                    self.visit(object, nt)?;
                    self.visit_member_property(property, computed, nt + 1)?;
                    let r0 = self.nt(nt);
                    let r1 = self.nt(nt + 1);
                    self.fun().instr(Op::DelProp, Some(r0.clone()), vec![r0, r1])?;
                }
                _ => {
                    self.visit(argument, nt)?;
                    let op = match operator {
                        UnaryOp::Minus => Op::Neg,
                        UnaryOp::Plus => Op::Pos,
                        UnaryOp::Not => Op::LogNot,
                        UnaryOp::BitNot => Op::BitNot,
                        UnaryOp::Typeof => Op::Typeof,
                        UnaryOp::Void | UnaryOp::Delete => unreachable!("handled above"),
                    };
                    let r0 = self.nt(nt);
                    self.fun().instr(op, Some(r0.clone()), vec![r0])?;
                }
            },
            NodeKind::Literal(literal) => match literal {
                Literal::Number(n) => {
                    let r0 = self.nt(nt);
                    self.fun().instr(Op::Number, Some(r0), vec![Arg::Num(n)])?;
                }
                Literal::String(s) => {
                    if let Some(native) = s.strip_prefix(self.cfg.native_marker) {
                        self.fun().verbatim(native);
                    } else {
                        let r0 = self.nt(nt);
                        self.fun().instr(Op::String, Some(r0), vec![Arg::Str(s)])?;
                    }
                }
                Literal::Boolean(b) => {
                    let r0 = self.nt(nt);
                    self.fun().instr(Op::Boolean, Some(r0), vec![Arg::Bool(b)])?;
                }
                Literal::Null => {
                    let r0 = self.nt(nt);
                    self.fun().instr(Op::Null, Some(r0), vec![])?;
                }
                Literal::Regex { pattern, flags } => {
                    let r0 = self.nt(nt);
                    self.fun()
                        .instr(Op::NewRegexp, Some(r0), vec![Arg::Str(pattern), Arg::Str(flags)])?;
                    self.set_prototype("RegExp", nt, None)?;
                }
            },
            NodeKind::ThisExpression => {
                let r0 = self.nt(nt);
                self.fun().assign(r0, Arg::name(BASE_VAR_NAME));
            }
            NodeKind::ObjectExpression { properties } => {
                let r0 = self.nt(nt);
                self.fun().instr(Op::NewObject, Some(r0), vec![])?;
                self.set_prototype("Object", nt, None)?;
                self.visit_properties(&properties, nt)?;
            }
            NodeKind::ArrayExpression { elements } => {
                let r0 = self.nt(nt);
                self.fun().instr(Op::NewArray, Some(r0), vec![])?;
                self.set_prototype("Array", nt, None)?;
                self.visit_elements(&elements, nt)?;
            }
            NodeKind::Identifier { name } => match name.as_str() {
                "undefined" => {
                    let r0 = self.nt(nt);
                    self.fun().instr(Op::Undef, Some(r0), vec![])?;
                }
                "NaN" => {
                    let r0 = self.nt(nt);
                    self.fun().instr(Op::Nan, Some(r0), vec![])?;
                }
                "Infinity" => {
                    let r0 = self.nt(nt);
                    self.fun().instr(Op::Infinity, Some(r0), vec![])?;
                }
                _ => {
                    let r0 = self.nt(nt);
                    self.add_get_var(r0, &name)?;
                }
            },
            NodeKind::MemberExpression {
                object,
                property,
                computed,
            } => {
                self.visit(object, nt)?;
                self.visit_member_property(property, computed, nt + 1)?;
                let r0 = self.nt(nt);
                let r1 = self.nt(nt + 1);
                self.fun().instr(Op::GetProp, Some(r0.clone()), vec![r0, r1])?;
            }
            NodeKind::AssignmentExpression {
                operator,
                left,
                right,
            } => match operator {
                AssignmentOp::Compound(binary) => match self.kind(left) {
                    NodeKind::Identifier { name } => {
                        let r0 = self.nt(nt);
                        self.add_get_var(r0.clone(), &name)?;
                        self.visit(right, nt + 1)?;
                        let r1 = self.nt(nt + 1);
                        self.fun().instr(
                            Op::from_binary(binary),
                            Some(r0.clone()),
                            vec![r0.clone(), r1],
                        )?;
                        self.add_set_var(r0.clone(), &name, r0)?;
                    }
                    NodeKind::MemberExpression {
                        object,
                        property,
                        computed,
                    } => {
                        self.visit(object, nt)?;
                        self.visit_member_property(property, computed, nt + 1)?;
                        let r0 = self.nt(nt);
                        let r1 = self.nt(nt + 1);
                        let r2 = self.nt(nt + 2);
                        self.fun()
                            .instr(Op::GetProp, Some(r2.clone()), vec![r0.clone(), r1.clone()])?;
                        self.visit(right, nt + 3)?;
                        let r3 = self.nt(nt + 3);
                        self.fun().instr(
                            Op::from_binary(binary),
                            Some(r2.clone()),
                            vec![r2.clone(), r3],
                        )?;
                        self.fun().instr(Op::SetProp, Some(r0.clone()), vec![r0, r1, r2])?;
                    }
                    other => {
                        return Err(CompileError::ast(format!(
                            "assignment target is {}",
                            other.name()
                        )))
                    }
                },
                AssignmentOp::Assign => match self.kind(left) {
                    NodeKind::Identifier { name } => {
                        self.visit(right, nt)?;
                        let r0 = self.nt(nt);
                        self.add_set_var(r0.clone(), &name, r0)?;
                    }
                    NodeKind::MemberExpression {
                        object,
                        property,
                        computed,
                    } => {
                        self.visit(object, nt)?;
                        self.visit_member_property(property, computed, nt + 1)?;
                        self.visit(right, nt + 2)?;
                        let r0 = self.nt(nt);
                        let r1 = self.nt(nt + 1);
                        let r2 = self.nt(nt + 2);
                        self.fun().instr(Op::SetProp, Some(r0.clone()), vec![r0, r1, r2])?;
                    }
                    other => {
                        return Err(CompileError::ast(format!(
                            "assignment target is {}",
                            other.name()
                        )))
                    }
                },
            },
            NodeKind::UpdateExpression {
                operator,
                prefix,
                argument,
            } => {
                let op = match operator {
                    UpdateOp::Increment => Op::Inc,
                    UpdateOp::Decrement => Op::Dec,
                };
                match self.kind(argument) {
                    NodeKind::Identifier { name } => {
                        let r0 = self.nt(nt);
                        self.add_get_var(r0.clone(), &name)?;
                        if prefix {
                            self.fun().instr(op, Some(r0.clone()), vec![r0.clone()])?;
                            self.add_set_var(r0.clone(), &name, r0)?;
                        } else {
                            let r1 = self.nt(nt + 1);
                            self.fun().instr(op, Some(r1.clone()), vec![r0])?;
                            self.add_set_var(r1.clone(), &name, r1)?;
                        }
                    }
                    NodeKind::MemberExpression {
                        object,
                        property,
                        computed,
                    } => {
                        self.visit(object, nt)?;
                        self.visit_member_property(property, computed, nt + 1)?;
                        let r0 = self.nt(nt);
                        let r1 = self.nt(nt + 1);
                        let r2 = self.nt(nt + 2);
                        self.fun()
                            .instr(Op::GetProp, Some(r2.clone()), vec![r0.clone(), r1.clone()])?;
                        if prefix {
                            self.fun().instr(op, Some(r2.clone()), vec![r2.clone()])?;
                            self.fun().instr(Op::SetProp, Some(r0.clone()), vec![r0, r1, r2])?;
                        } else {
                            let r3 = self.nt(nt + 3);
                            self.fun().instr(op, Some(r3.clone()), vec![r2.clone()])?;
                            self.fun()
                                .instr(Op::SetProp, Some(r0.clone()), vec![r0.clone(), r1, r3])?;
                            self.fun().assign(r0, r2);
                        }
                    }
                    other => {
                        return Err(CompileError::ast(format!(
                            "update target is {}",
                            other.name()
                        )))
                    }
                }
            }
            NodeKind::SequenceExpression { expressions } => {
                for expression in expressions {
                    self.visit(expression, nt)?;
                }
            }
            NodeKind::CallExpression { callee, arguments } => {
                if let NodeKind::MemberExpression {
                    object,
                    property,
                    computed,
                } = self.kind(callee)
                {
                    self.visit(object, nt + 1)?;
                    self.visit_member_property(property, computed, nt + 2)?;
                    let r0 = self.nt(nt);
                    let r1 = self.nt(nt + 1);
                    let r2 = self.nt(nt + 2);
                    self.fun().instr(Op::GetProp, Some(r0), vec![r1, r2])?;
                } else {
                    self.visit(callee, nt)?;
                    // Strict semantics: a bare call binds `this` to undefined.
                    let r1 = self.nt(nt + 1);
                    self.fun().instr(Op::Undef, Some(r1), vec![])?;
                }
                self.fun().instr(Op::ClearArgs, None, vec![])?;
                self.visit_arguments(&arguments, nt + 2)?;
                let r1 = self.nt(nt + 1);
                self.fun().instr(Op::PushArg, None, vec![r1])?;
                let r0 = self.nt(nt);
                self.fun().instr(Op::Call, None, vec![r0])?;
                self.add_call_completion_check(nt)?;
            }
            NodeKind::NewExpression { callee, arguments } => {
                self.visit(callee, nt)?;
                self.visit_arguments(&arguments, nt + 1)?;
                let r1 = self.nt(nt + 1);
                self.fun().instr(Op::NewObject, Some(r1.clone()), vec![])?;
                let r2 = self.nt(nt + 2);
                self.fun()
                    .instr(Op::String, Some(r2.clone()), vec![Arg::Str("prototype".into())])?;
                let r0 = self.nt(nt);
                self.fun()
                    .instr(Op::GetProp, Some(r2.clone()), vec![r0.clone(), r2.clone()])?;
                let r3 = self.nt(nt + 3);
                self.fun()
                    .instr(Op::String, Some(r3.clone()), vec![Arg::Str("__proto__".into())])?;
                self.fun()
                    .instr(Op::SetProp, Some(r2.clone()), vec![r1.clone(), r3, r2])?;
                self.fun().instr(Op::PushArg, None, vec![r1])?;
                self.fun().instr(Op::New, None, vec![r0])?;
                self.add_call_completion_check(nt)?;
            }
            NodeKind::ConditionalExpression {
                test,
                consequent,
                alternate,
            } => {
                let label = self.fun().fresh_label();
                let label2 = self.fun().fresh_label();
                self.visit(test, nt)?;
                let r0 = self.nt(nt);
                self.fun().instr(Op::IfFalse, None, vec![r0, Arg::Label(label)])?;
                self.visit(consequent, nt)?;
                self.fun().instr(Op::Jump, None, vec![Arg::Label(label2)])?;
                self.fun().label(label);
                self.visit(alternate, nt)?;
                self.fun().label(label2);
            }
            NodeKind::LabeledStatement { label, body } => {
                let name = self.resolution.ast.identifier_name(label).to_string();
                self.label_set.insert(name);
                self.visit(body, 0)?;
            }
            NodeKind::BreakStatement { label } => {
                self.fun().comment("break");
                let name = label.map(|l| self.resolution.ast.identifier_name(l).to_string());
                self.lower_exit(ExitKind::Break, name.as_deref(), None)?;
            }
            NodeKind::ContinueStatement { label } => {
                self.fun().comment("continue");
                let name = label.map(|l| self.resolution.ast.identifier_name(l).to_string());
                self.lower_exit(ExitKind::Continue, name.as_deref(), None)?;
            }
            NodeKind::ReturnStatement { argument } => {
                self.fun().comment("return");
                let r0 = if let Some(argument) = argument {
                    self.visit(argument, 0)?;
                    self.nt(0)
                } else {
                    let r0 = self.nt(0);
                    self.fun().instr(Op::Undef, Some(r0.clone()), vec![])?;
                    r0
                };
                self.fun().assign(Arg::name(RETURN_VAR_NAME), r0);
                self.fun()
                    .assign(Arg::name(JUMP_TYPE_VAR_NAME), Arg::Num(JUMP_TYPE_RETURN as f64));
                self.lower_exit(ExitKind::Return, None, None)?;
            }
            NodeKind::ThrowStatement { argument } => {
                self.fun().comment("throw");
                self.visit(argument, 0)?;
                let r0 = self.nt(0);
                self.fun().assign(Arg::name(RETURN_VAR_NAME), r0);
                self.fun().assign(
                    Arg::name(JUMP_TYPE_VAR_NAME),
                    Arg::Num(JUMP_TYPE_EXCEPTION as f64),
                );
                self.lower_exit(ExitKind::Throw, None, None)?;
            }
            NodeKind::IfStatement {
                test,
                consequent,
                alternate,
            } => {
                self.fun().comment("if");
                let label = self.fun().fresh_label();
                let label2 = self.fun().fresh_label();
                let named = if self.label_set.is_empty() {
                    None
                } else {
                    Some(self.push_frame(FrameKind::Named))
                };
                self.visit(test, 0)?;
                let r0 = self.nt(0);
                self.fun().instr(Op::IfFalse, None, vec![r0, Arg::Label(label)])?;
                self.visit(consequent, 0)?;
                self.fun().instr(Op::Jump, None, vec![Arg::Label(label2)])?;
                self.fun().label(label);
                if let Some(alternate) = alternate {
                    self.visit(alternate, 0)?;
                }
                self.fun().label(label2);
                if let Some(named) = named {
                    self.fun().label(named + END_OFFSET);
                    self.fun().pop_frame();
                }
            }
            NodeKind::SwitchStatement {
                discriminant,
                cases,
            } => {
                self.fun().comment("switch");
                let switch_label = self.push_frame(FrameKind::Switch);
                self.visit(discriminant, 0)?;
                let discriminant_var = self.fun().alloc_tmp();
                let r0 = self.nt(0);
                self.fun().assign(Arg::Name(discriminant_var.clone()), r0);

                let len = cases.len();
                let mut has_default = false;
                let mut next_begin = self.fun().fresh_label();
                let mut next_skip = self.fun().fresh_label();
                let default_label = self.fun().fresh_label();
                for (i, &case) in cases.iter().enumerate() {
                    self.fun().comment(format!("case {i}"));
                    let NodeKind::SwitchCase { test, consequent } = self.kind(case) else {
                        return Err(CompileError::ast("switch entry is not a SwitchCase"));
                    };
                    if let Some(test) = test {
                        let current_begin = next_begin;
                        next_begin = self.fun().fresh_label();
                        self.fun().label(current_begin);
                        self.visit(test, 0)?;
                        let r1 = self.nt(1);
                        self.fun()
                            .assign(r1.clone(), Arg::Name(discriminant_var.clone()));
                        let r0 = self.nt(0);
                        self.fun()
                            .instr(Op::StrictEq, Some(r0.clone()), vec![r0.clone(), r1])?;
                        let miss = if i == len - 1 { default_label } else { next_begin };
                        self.fun().instr(Op::IfFalse, None, vec![r0, Arg::Label(miss)])?;
                    } else {
                        self.fun().label(default_label);
                        has_default = true;
                    }
                    let current_skip = next_skip;
                    next_skip = self.fun().fresh_label();
                    self.fun().label(current_skip);
                    for &statement in &consequent {
                        self.visit(statement, 0)?;
                    }
                    if i != len - 1 {
                        self.fun().instr(Op::Jump, None, vec![Arg::Label(next_skip)])?;
                    }
                }
                if !has_default {
                    self.fun().label(default_label);
                }
                self.fun().label(switch_label + END_OFFSET);
                self.fun().pop_frame();
            }
            NodeKind::BlockStatement { body } => {
                let named = if self.label_set.is_empty() {
                    None
                } else {
                    self.fun().comment("labelled block");
                    Some(self.push_frame(FrameKind::Named))
                };
                self.visit_statements(&body)?;
                if let Some(named) = named {
                    self.fun().label(named + END_OFFSET);
                    self.fun().pop_frame();
                }
            }
            NodeKind::WhileStatement { test, body } => {
                self.fun().comment("while");
                let label = self.fun().fresh_label();
                let label2 = self.fun().fresh_label();
                let loop_label = self.push_frame(FrameKind::Loop);
                self.fun().label(loop_label + CONTINUE_OFFSET);
                self.fun().label(label);
                self.visit(test, 0)?;
                let r0 = self.nt(0);
                self.fun().instr(Op::IfFalse, None, vec![r0, Arg::Label(label2)])?;
                self.visit(body, 0)?;
                self.fun().instr(Op::Jump, None, vec![Arg::Label(label)])?;
                self.fun().label(label2);
                self.fun().label(loop_label + END_OFFSET);
                self.fun().pop_frame();
            }
            NodeKind::DoWhileStatement { body, test } => {
                self.fun().comment("do while");
                let loop_label = self.push_frame(FrameKind::Loop);
                let top = self.fun().fresh_label();
                self.fun().label(top);
                self.visit(body, 0)?;
                self.fun().label(loop_label + CONTINUE_OFFSET);
                self.visit(test, 0)?;
                let r0 = self.nt(0);
                self.fun().instr(Op::IfTrue, None, vec![r0, Arg::Label(top)])?;
                self.fun().label(loop_label + END_OFFSET);
                self.fun().pop_frame();
            }
            NodeKind::ForStatement {
                init,
                test,
                update,
                body,
            } => {
                self.fun().comment("for");
                let label = self.fun().fresh_label();
                let label2 = self.fun().fresh_label();
                let loop_label = self.push_frame(FrameKind::Loop);
                if let Some(init) = init {
                    self.visit(init, 0)?;
                }
                self.fun().label(label);
                if let Some(test) = test {
                    self.visit(test, 0)?;
                } else {
                    let r0 = self.nt(0);
                    self.fun().instr(Op::Boolean, Some(r0), vec![Arg::Bool(true)])?;
                }
                let r0 = self.nt(0);
                self.fun().instr(Op::IfFalse, None, vec![r0, Arg::Label(label2)])?;
                self.visit(body, 0)?;
                self.fun().label(loop_label + CONTINUE_OFFSET);
                if let Some(update) = update {
                    self.visit(update, 0)?;
                }
                self.fun().instr(Op::Jump, None, vec![Arg::Label(label)])?;
                self.fun().label(label2);
                self.fun().label(loop_label + END_OFFSET);
                self.fun().pop_frame();
            }
            NodeKind::ForInStatement { left, right, body } => {
                self.fun().comment("for in");
                let loop_label = self.push_frame(FrameKind::Loop);
                self.visit(right, 0)?;
                let r0 = self.nt(0);
                self.fun().instr(
                    Op::IfFalse,
                    None,
                    vec![r0.clone(), Arg::Label(loop_label + END_OFFSET)],
                )?;
                self.fun().instr(Op::Iterator, Some(r0.clone()), vec![r0.clone()])?;
                let iterator_var = self.fun().alloc_tmp();
                self.fun().assign(Arg::Name(iterator_var.clone()), r0.clone());

                self.fun().label(loop_label + CONTINUE_OFFSET);
                self.fun().assign(r0.clone(), Arg::Name(iterator_var));
                self.fun().instr(Op::NextKey, Some(r0.clone()), vec![r0.clone()])?;
                self.fun().instr(
                    Op::IfFalse,
                    None,
                    vec![r0.clone(), Arg::Label(loop_label + END_OFFSET)],
                )?;

                match self.kind(left) {
                    NodeKind::Identifier { name } => {
                        self.add_set_var(r0.clone(), &name, r0)?;
                    }
                    NodeKind::MemberExpression {
                        object,
                        property,
                        computed,
                    } => {
                        self.visit(object, 1)?;
                        self.visit_member_property(property, computed, 2)?;
                        let r1 = self.nt(1);
                        let r2 = self.nt(2);
                        self.fun().instr(Op::SetProp, Some(r0.clone()), vec![r1, r2, r0])?;
                    }
                    NodeKind::VariableDeclaration { declarations } => {
                        let declarator = declarations
                            .first()
                            .copied()
                            .ok_or_else(|| CompileError::ast("for-in declaration without declarator"))?;
                        let NodeKind::VariableDeclarator { id, .. } = self.kind(declarator) else {
                            return Err(CompileError::ast("for-in declaration without declarator"));
                        };
                        let name = self.resolution.ast.identifier_name(id).to_string();
                        self.add_set_var(r0.clone(), &name, r0)?;
                    }
                    other => {
                        return Err(CompileError::ast(format!(
                            "for-in target is {}",
                            other.name()
                        )))
                    }
                }

                self.visit(body, 0)?;
                self.fun()
                    .instr(Op::Jump, None, vec![Arg::Label(loop_label + CONTINUE_OFFSET)])?;
                self.fun().label(loop_label + END_OFFSET);
                self.fun().pop_frame();
            }
            NodeKind::TryStatement {
                block,
                handler,
                finalizer,
            } => {
                self.fun().comment("try-catch-finally");
                let end_label = self.fun().fresh_label();
                let named = if self.label_set.is_empty() {
                    None
                } else {
                    Some(self.push_frame(FrameKind::Named))
                };
                self.label_set.clear();
                let finally_label = finalizer.map(|_| {
                    let label = self.push_frame(FrameKind::Finally);
                    self.fun().register_finally(label);
                    label
                });
                let catch_label = handler.map(|_| self.push_frame(FrameKind::Catch));

                self.visit(block, 0)?;
                self.fun().instr(Op::Jump, None, vec![Arg::Label(end_label)])?;

                if let (Some(handler), Some(catch_label)) = (handler, catch_label) {
                    // The handler's own throws go to the enclosing target.
                    self.fun().pop_frame();
                    self.fun().comment("catch");
                    self.fun().label(catch_label + BEGIN_OFFSET);
                    self.fun().assign(
                        Arg::name(JUMP_TYPE_VAR_NAME),
                        Arg::Num(JUMP_TYPE_NORMAL as f64),
                    );

                    let NodeKind::CatchClause { param, body } = self.kind(handler) else {
                        return Err(CompileError::ast("try handler is not a CatchClause"));
                    };
                    let name = self.resolution.ast.identifier_name(param).to_string();
                    let escaped = self.escaped(&name);
                    let r0 = self.nt(0);
                    if self.resolution.scopes.is_boxed(self.scope(), &name) {
                        self.fun().instr(Op::NewBox, Some(r0.clone()), vec![])?;
                        self.fun().assign(Arg::Name(escaped), r0.clone());
                    }
                    self.fun().assign(r0.clone(), Arg::name(RETURN_VAR_NAME));
                    self.add_set_var(r0.clone(), &name, r0)?;

                    self.label_set.clear();
                    self.visit(body, 0)?;
                }

                self.fun().label(end_label);
                if let (Some(finalizer), Some(finally_label)) = (finalizer, finally_label) {
                    self.fun().comment("finally");
                    self.fun().label(finally_label + BEGIN_OFFSET);
                    self.fun().assign(
                        Arg::name(format!("{COMPLETION_TYPE_VAR_NAME_PREFIX}{finally_label}")),
                        Arg::name(JUMP_TYPE_VAR_NAME),
                    );
                    self.fun().assign(
                        Arg::name(format!("{COMPLETION_RETURN_VAR_NAME_PREFIX}{finally_label}")),
                        Arg::name(RETURN_VAR_NAME),
                    );
                    // The finalizer runs as normal code; calls inside it
                    // must not see a stale exception completion.
                    self.fun().assign(
                        Arg::name(JUMP_TYPE_VAR_NAME),
                        Arg::Num(JUMP_TYPE_NORMAL as f64),
                    );
                    // Exits inside the finalizer leave it directly.
                    self.fun().pop_frame();
                    self.label_set.clear();
                    self.visit(finalizer, 0)?;
                    self.add_finally_end_instructions(finally_label)?;
                }

                if let Some(named) = named {
                    self.fun().label(named + END_OFFSET);
                    self.fun().pop_frame();
                }
            }
            NodeKind::CatchClause { body, .. } => {
                // Parameter binding happens at the catch entry emitted by
                // the try statement; only the body lowers here.
                self.label_set.clear();
                self.visit(body, 0)?;
            }
            NodeKind::EmptyStatement | NodeKind::DebuggerStatement => {}
            NodeKind::WithStatement { .. } => {
                return Err(CompileError::UnsupportedConstruct("with statement".to_string()))
            }
            NodeKind::Property { .. } | NodeKind::SwitchCase { .. } => {
                return Err(CompileError::ast(format!(
                    "{} outside its parent construct",
                    self.resolution.ast.kind(node).name()
                )))
            }
        }
        Ok(())
    }
}
