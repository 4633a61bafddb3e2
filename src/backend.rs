/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! Backend selection and target-specific naming.
//!
//! Both backends share one namespace of generated identifiers, all rooted
//! at the `JS_` prefix (the runtime libraries reference these names, e.g.
//! `JS_Return` from inline native code in the bundled library). The C
//! backend additionally folds the source module's basename into function
//! names for link-time namespacing.

/// Compilation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Interpreted instruction stream, `switch`-dispatch skeleton.
    Js,
    /// Native C with labels and direct jumps, boxed `Value` runtime.
    C,
}

/// Prefix shared by every generated identifier.
pub const PREFIX: &str = "JS";

/// Closure environment local.
pub const ENV_VAR_NAME: &str = "JS_Env";
/// The `this` binding local.
pub const BASE_VAR_NAME: &str = "JS_Base";
/// The `arguments` object local.
pub const ARGS_VAR_NAME: &str = "JS_Args";
/// Rename target for `arguments` used outside a function scope.
pub const ARGUMENTS_VAR_NAME: &str = "JS_argumentsRenamed";
/// The callee itself (bound for named function expressions).
pub const FUN_VAR_NAME: &str = "JS_Fun";
/// Virtual register name prefix.
pub const REGISTER_PREFIX: &str = "JS_R";
/// Label name prefix (C backend).
pub const LABEL_PREFIX: &str = "JS_Label";
/// Completion-jump shadow variable prefix (one per finally label).
pub const COMPLETION_JUMP_VAR_NAME_PREFIX: &str = "JS_FinallyJump";
/// Saved return-value shadow variable prefix.
pub const COMPLETION_RETURN_VAR_NAME_PREFIX: &str = "JS_FinallyReturn";
/// Saved jump-type shadow variable prefix.
pub const COMPLETION_TYPE_VAR_NAME_PREFIX: &str = "JS_FinallyType";
/// The per-compilation return-value slot.
pub const RETURN_VAR_NAME: &str = "JS_Return";
/// The per-compilation jump-type slot.
pub const JUMP_TYPE_VAR_NAME: &str = "JS_JumpType";
/// Statement-scoped temporary prefix (for-in iterators, switch discriminants).
pub const TMP_VAR_PREFIX: &str = "JS_TmpLocal";

/// Completion-record jump types stored in `JS_JumpType`.
pub const JUMP_TYPE_NORMAL: i64 = 0;
pub const JUMP_TYPE_RETURN: i64 = 1;
pub const JUMP_TYPE_EXCEPTION: i64 = 2;

/// Labels are allocated in blocks of this size so the role offsets below
/// are always available from one allocation.
pub const N_JUMP_TYPES: u32 = 5;
pub const BEGIN_OFFSET: u32 = 0;
pub const CONTINUE_OFFSET: u32 = 1;
pub const END_OFFSET: u32 = 2;
pub const IF_OFFSET: u32 = 3;

/// Target-specific configuration, fixed for a whole compilation.
#[derive(Debug, Clone)]
pub struct TargetConfig {
    pub target: Target,
    pub as_module: bool,
    /// String-literal prefix marking inline native code (`"use js:"` /
    /// `"use C:"`). The remainder of such a literal is emitted verbatim.
    pub native_marker: &'static str,
    /// Declared type of value locals (`var` / `Value`).
    pub value_type: &'static str,
    /// Return type in function signatures (`function` / `void`).
    pub fun_return_type: &'static str,
    /// Compiled function name prefix (`JS_Fun`, or `JS_<base>_Fun` for C).
    pub fun_name_prefix: String,
    /// Fixed text emitted before the function table.
    pub header: String,
    /// Fixed text emitted after the function table (entry point).
    pub driver: String,
}

impl TargetConfig {
    /// Build the configuration for `target`. `module_name` is the source
    /// file's basename (a trailing `.js` is stripped); it namespaces C
    /// function names and the module entry point.
    pub fn new(target: Target, as_module: bool, module_name: &str) -> Self {
        let base = module_name.strip_suffix(".js").unwrap_or(module_name);
        match target {
            Target::C => {
                let fun_name_prefix = format!("{PREFIX}_{base}_Fun");
                let header = format!(
                    "#include \"interop_export.h\"\n\
                     extern Value {RETURN_VAR_NAME};\n\
                     int {JUMP_TYPE_VAR_NAME};\n\n"
                );
                let driver = if as_module {
                    format!(
                        "Value __untyped_import_{base}(){{\n\t{fun_name_prefix}1();\n\treturn {RETURN_VAR_NAME};\n}}"
                    )
                } else {
                    format!("int main(){{\n\tGC_INIT();\n\t{fun_name_prefix}1(); return 0;}}")
                };
                Self {
                    target,
                    as_module,
                    native_marker: "use C:",
                    value_type: "Value",
                    fun_return_type: "void",
                    fun_name_prefix,
                    header,
                    driver,
                }
            }
            Target::Js => {
                let fun_name_prefix = format!("{PREFIX}_Fun");
                let header = format!(
                    "var {RETURN_VAR_NAME};\nvar {JUMP_TYPE_VAR_NAME};\n\n"
                );
                let driver = format!("{fun_name_prefix}1();");
                Self {
                    target,
                    as_module,
                    native_marker: "use js:",
                    value_type: "var",
                    fun_return_type: "function",
                    fun_name_prefix,
                    header,
                    driver,
                }
            }
        }
    }

    /// The fixed set of global names every function scope must be able to
    /// resolve. These are touched during resolution so the library's
    /// bootstrap objects are always reachable.
    pub fn forced_globals(&self) -> Vec<&'static str> {
        let mut globals = vec!["Object", "Function", "Array", "RegExp"];
        if self.target == Target::C {
            globals.extend(["console", "Math", "Date", "Number"]);
            if self.as_module {
                globals.push("exports");
            }
        }
        globals
    }
}
