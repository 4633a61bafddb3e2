/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! Serialization of the function table.
//!
//! The interpreted target wraps each function body in a `while`/`switch`
//! dispatch loop: labels become `case` arms and jump opcodes set the
//! dispatch target, then break out of the switch. The C target emits the
//! same lines with real labels, plus forward declarations so closure
//! creation can reference functions defined later in the file.

use std::fmt::Write;

use crate::backend::{
    Target, TargetConfig, COMPLETION_JUMP_VAR_NAME_PREFIX, COMPLETION_RETURN_VAR_NAME_PREFIX,
    COMPLETION_TYPE_VAR_NAME_PREFIX, REGISTER_PREFIX, TMP_VAR_PREFIX,
};
use crate::ir::function::FunctionTable;

/// Serialize the whole compilation to target source text. For the
/// interpreted target, `runtime` is the opcode library prepended to the
/// output so the result is self-contained.
pub fn emit(table: &FunctionTable, cfg: &TargetConfig, runtime: Option<&str>) -> String {
    let mut out = String::new();

    if cfg.target == Target::Js {
        if let Some(runtime) = runtime {
            out.push_str(runtime);
            out.push('\n');
        }
    }
    out.push_str(&cfg.header);
    out.push('\n');

    if cfg.target == Target::C {
        for function in table.functions() {
            let _ = writeln!(out, "{} {}();", cfg.fun_return_type, function.name);
        }
    }

    for function in table.functions() {
        let _ = writeln!(out, "// {}", function.jsname);
        let _ = writeln!(out, "{} {}(){{", cfg.fun_return_type, function.name);

        if cfg.target == Target::Js {
            out.push_str(" while(true){\n  switch(OP_TARGET()) {\n    case -1:\n");
        }

        for k in 0..=function.register_count {
            let _ = writeln!(out, "        {} {REGISTER_PREFIX}{k};", cfg.value_type);
        }
        for k in 0..function.tmp_count {
            let _ = writeln!(out, "        {} {TMP_VAR_PREFIX}{k};", cfg.value_type);
        }
        // Completion shadows. The jump id variable starts at zero so the
        // dispatch chain never matches a pending id on normal entry.
        let int_type = match cfg.target {
            Target::C => "int",
            Target::Js => "var",
        };
        for label in &function.finally_labels {
            let _ = writeln!(
                out,
                "        {} {COMPLETION_RETURN_VAR_NAME_PREFIX}{label};",
                cfg.value_type
            );
            let _ = writeln!(out, "        {int_type} {COMPLETION_TYPE_VAR_NAME_PREFIX}{label};");
            let _ = writeln!(
                out,
                "        {int_type} {COMPLETION_JUMP_VAR_NAME_PREFIX}{label} = 0;"
            );
        }

        for line in &function.lines {
            out.push_str(&line.render(cfg));
            out.push('\n');
        }
        out.push_str("        return;\n");

        if cfg.target == Target::Js {
            out.push_str("  }\n }\n");
        }
        out.push_str("}\n");
    }

    out.push_str(&cfg.driver);
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::function::FunctionBuilder;
    use crate::ir::instruction::{Arg, Op};

    fn one_function_table(cfg: &TargetConfig) -> FunctionTable {
        let mut table = FunctionTable::new();
        let slot = table.reserve();
        let mut fun =
            FunctionBuilder::new(format!("{}{}", cfg.fun_name_prefix, slot + 1), "main".into(), slot);
        let r0 = fun.reg(0);
        fun.instr(Op::Undef, Some(r0), vec![]).expect("valid shape");
        let label = fun.fresh_label();
        fun.instr(Op::Jump, None, vec![Arg::Label(label)])
            .expect("valid shape");
        fun.label(label);
        table.fill(slot, fun.finish());
        table
    }

    #[test]
    fn js_output_wraps_bodies_in_dispatch_loops() {
        let cfg = TargetConfig::new(Target::Js, false, "t.js");
        let table = one_function_table(&cfg);
        let out = emit(&table, &cfg, Some("// runtime stub"));

        assert!(out.starts_with("// runtime stub\n"));
        assert!(out.contains("function JS_Fun1(){"));
        assert!(out.contains("switch(OP_TARGET()) {"));
        assert!(out.contains("        var JS_R0;"));
        assert!(out.contains("        if (OP_JUMP( 3 )) break;"));
        assert!(out.contains("    case 3:"));
        assert!(out.trim_end().ends_with("JS_Fun1();"));
    }

    #[test]
    fn c_output_has_forward_declarations_and_real_labels() {
        let cfg = TargetConfig::new(Target::C, false, "t.js");
        let table = one_function_table(&cfg);
        let out = emit(&table, &cfg, None);

        assert!(out.contains("#include \"interop_export.h\""));
        assert!(out.contains("void JS_t_Fun1();"));
        assert!(out.contains("void JS_t_Fun1(){"));
        assert!(!out.contains("switch(OP_TARGET())"));
        assert!(out.contains("        Value JS_R0;"));
        assert!(out.contains("        OP_JUMP( JS_Label3 );"));
        assert!(out.contains("    JS_Label3:"));
        assert!(out.contains("int main(){"));
    }

    #[test]
    fn finally_shadow_variables_are_declared() {
        let mut table = FunctionTable::new();
        let slot = table.reserve();
        let mut fun = FunctionBuilder::new("JS_Fun1".into(), "main".into(), slot);
        fun.register_finally(10);
        table.fill(slot, fun.finish());

        let cfg = TargetConfig::new(Target::Js, false, "t.js");
        let out = emit(&table, &cfg, None);
        assert!(out.contains("        var JS_FinallyReturn10;"));
        assert!(out.contains("        var JS_FinallyType10;"));
        assert!(out.contains("        var JS_FinallyJump10 = 0;"));
    }
}
