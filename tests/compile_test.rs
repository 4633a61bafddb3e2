/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! End-to-end compilation tests over the public API:
//! - Output skeletons of both targets
//! - Closure capture through boxes and environments
//! - The completion protocol around catch and finally
//! - Module mode, prelude splicing, native markers

use linearjs::backend::Target;
use linearjs::error::CompileError;
use linearjs::{compile, CompileOptions};

fn options(target: Target) -> CompileOptions<'static> {
    CompileOptions {
        target,
        as_module: false,
        module_name: "test.js",
        prelude: None,
        runtime: None,
    }
}

fn compile_js(statements: &str) -> String {
    compile(&program(statements), &options(Target::Js)).expect("compile failed")
}

fn compile_c(statements: &str) -> String {
    compile(&program(statements), &options(Target::C)).expect("compile failed")
}

fn program(statements: &str) -> String {
    format!(r#"{{"type":"Program","body":[{statements}]}}"#)
}

const VAR_X_IS_ONE: &str = r#"{"type":"VariableDeclaration","kind":"var","declarations":[
    {"type":"VariableDeclarator","id":{"type":"Identifier","name":"x"},
     "init":{"type":"Literal","value":1}}]}"#;

// =============================================================================
// Output skeletons
// =============================================================================

#[test]
fn js_output_is_a_dispatch_program() {
    let out = compile_js(VAR_X_IS_ONE);
    assert!(out.contains("var JS_Return;"));
    assert!(out.contains("var JS_JumpType;"));
    assert!(out.contains("// main"));
    assert!(out.contains("function JS_Fun1(){"));
    assert!(out.contains("switch(OP_TARGET()) {"));
    assert!(out.contains("    case -1:"));
    assert!(out.trim_end().ends_with("JS_Fun1();"));
}

#[test]
fn c_output_is_linkable_source() {
    let out = compile_c(VAR_X_IS_ONE);
    assert!(out.contains("#include \"interop_export.h\""));
    assert!(out.contains("extern Value JS_Return;"));
    assert!(out.contains("int JS_JumpType;"));
    // Forward declaration precedes the definition.
    assert!(out.contains("void JS_test_Fun1();"));
    assert!(out.contains("void JS_test_Fun1(){"));
    assert!(out.contains("        Value JS_R0;"));
    assert!(!out.contains("switch(OP_TARGET())"));
    assert!(out.contains("int main(){"));
}

#[test]
fn runtime_source_is_prepended_to_js_output() {
    let out = compile(
        &program(VAR_X_IS_ONE),
        &CompileOptions {
            runtime: Some("// opcode library"),
            ..options(Target::Js)
        },
    )
    .expect("compile failed");
    assert!(out.starts_with("// opcode library\n"));
}

// =============================================================================
// Closure capture
// =============================================================================

#[test]
fn captured_variables_round_trip_through_boxes() {
    let out = compile_js(&format!(
        r#"{VAR_X_IS_ONE},
           {{"type":"ExpressionStatement","expression":
             {{"type":"FunctionExpression","id":null,"params":[],
              "body":{{"type":"BlockStatement","body":[
                 {{"type":"ReturnStatement","argument":
                    {{"type":"Identifier","name":"x"}}}}]}}}}}}"#
    ));
    // Owner side: the slot is a box and writes go through it.
    assert!(out.contains("OP_NEWBOX()"));
    assert!(out.contains("JS_R0 = OP_SETVARSTAR( x, JS_R0 );"));
    // Closure side: reads go through the threaded environment cell.
    assert!(out.contains("OP_GETINDEXSTAR( JS_Env,"));
    // Two functions were compiled.
    assert!(out.contains("function JS_Fun1(){"));
    assert!(out.contains("function JS_Fun2(){"));
}

#[test]
fn arguments_object_boxes_every_parameter() {
    let out = compile_js(
        r#"{"type":"FunctionDeclaration","id":{"type":"Identifier","name":"f"},
            "params":[{"type":"Identifier","name":"a"}],
            "body":{"type":"BlockStatement","body":[
                {"type":"ReturnStatement","argument":
                    {"type":"Identifier","name":"arguments"}}]}}"#,
    );
    assert!(out.contains("OP_NEWARGUMENTS()"));
    assert!(out.contains("var JS_Args = JS_R0;"));
    // The parameter is boxed and mirrored onto the arguments object.
    assert!(out.contains("JS_R0 = OP_SETVARSTAR( a, JS_R0 );"));
    assert!(out.contains("OP_GETVAR( JS_Args )"));
}

// =============================================================================
// Completion protocol
// =============================================================================

#[test]
fn continue_through_finally_is_routed_once() {
    let out = compile_js(
        r#"{"type":"WhileStatement",
            "test":{"type":"Identifier","name":"x"},
            "body":{"type":"BlockStatement","body":[
                {"type":"TryStatement",
                 "block":{"type":"BlockStatement","body":[
                    {"type":"ContinueStatement","label":null}]},
                 "handler":null,
                 "finalizer":{"type":"BlockStatement","body":[
                    {"type":"ExpressionStatement","expression":
                        {"type":"AssignmentExpression","operator":"=",
                         "left":{"type":"Identifier","name":"y"},
                         "right":{"type":"Literal","value":1}}}]}}]}}"#,
    );
    // The continue parks an id and enters the finalizer.
    assert!(out.contains("JS_FinallyJump25 = 1;"));
    assert!(out.contains("var JS_FinallyJump25 = 0;"));
    // One dispatch arm re-issues it to the loop's continue label.
    assert_eq!(out.matches("OP_JUMPNE( JS_FinallyJump25").count(), 1);
    assert!(out.contains("if (OP_JUMPNE( JS_FinallyJump25, 1, 38 )) break;"));
    assert!(out.contains("JS_JumpType = JS_FinallyType25;"));
    assert!(out.contains("JS_Return = JS_FinallyReturn25;"));
    assert!(out.contains("if (OP_JUMP( 16 )) break;"));
}

#[test]
fn thrown_values_reach_the_catch_and_the_finally_runs() {
    let out = compile_js(
        r#"{"type":"TryStatement",
            "block":{"type":"BlockStatement","body":[
                {"type":"ThrowStatement","argument":{"type":"Literal","value":1}}]},
            "handler":{"type":"CatchClause",
                "param":{"type":"Identifier","name":"e"},
                "body":{"type":"BlockStatement","body":[
                    {"type":"ExpressionStatement","expression":
                        {"type":"AssignmentExpression","operator":"=",
                         "left":{"type":"Identifier","name":"y"},
                         "right":{"type":"Identifier","name":"e"}}}]}},
            "finalizer":{"type":"BlockStatement","body":[]}}"#,
    );
    // Throwing stores the completion and jumps straight to the catch.
    assert!(out.contains("JS_JumpType = 2;"));
    // The catch clears the completion and binds the renamed parameter.
    assert!(out.contains("JS_JumpType = 0;"));
    assert!(out.contains("JS_R0 = JS1_e = JS_R0;"));
    // The finalizer saves the live completion into its shadows.
    assert!(out.contains("JS_FinallyType10 = JS_JumpType;"));
    assert!(out.contains("JS_FinallyReturn10 = JS_Return;"));
    // Nothing was routed through the finally, so no dispatch arm exists.
    assert!(!out.contains("OP_JUMPNE( JS_FinallyJump10"));
}

#[test]
fn calls_repropagate_exceptions() {
    let out = compile_js(
        r#"{"type":"ExpressionStatement","expression":
            {"type":"CallExpression",
             "callee":{"type":"Identifier","name":"f"},"arguments":[]}}"#,
    );
    assert!(out.contains("OP_CALL( JS_R0 );"));
    assert!(out.contains("OP_JUMPNE( JS_JumpType, 2,"));
    assert!(out.contains("// throw after return"));
    assert!(out.contains("JS_R0 = JS_Return;"));
}

#[test]
fn labeled_break_exits_the_named_loop() {
    let out = compile_js(
        r#"{"type":"LabeledStatement",
            "label":{"type":"Identifier","name":"outer"},
            "body":{"type":"WhileStatement",
                "test":{"type":"Identifier","name":"a"},
                "body":{"type":"BlockStatement","body":[
                    {"type":"WhileStatement",
                     "test":{"type":"Identifier","name":"b"},
                     "body":{"type":"BlockStatement","body":[
                        {"type":"BreakStatement",
                         "label":{"type":"Identifier","name":"outer"}}]}}]}}}"#,
    );
    // The outer loop's frame ends at label 17; the inner one at 32.
    assert!(out.contains("if (OP_JUMP( 17 )) break;"));
    assert!(out.contains("    case 17:"));
}

#[test]
fn break_without_a_target_fails() {
    let err = compile(
        &program(r#"{"type":"BreakStatement","label":null}"#),
        &options(Target::Js),
    )
    .unwrap_err();
    assert!(matches!(err, CompileError::UnresolvedExit { kind: "break", .. }));
}

// =============================================================================
// Statement lowering
// =============================================================================

#[test]
fn switch_compares_with_strict_equality() {
    let out = compile_js(
        r#"{"type":"SwitchStatement",
            "discriminant":{"type":"Identifier","name":"x"},
            "cases":[
                {"type":"SwitchCase","test":{"type":"Literal","value":1},
                 "consequent":[]},
                {"type":"SwitchCase","test":null,
                 "consequent":[]}]}"#,
    );
    assert!(out.contains("// switch"));
    assert!(out.contains("JS_TmpLocal0 = JS_R0;"));
    assert!(out.contains("var JS_TmpLocal0;"));
    assert!(out.contains("OP_STRICTEQ( JS_R0, JS_R1 )"));
    assert!(out.contains("// case 0"));
    assert!(out.contains("// case 1"));
}

#[test]
fn for_in_loops_drive_an_iterator() {
    let out = compile_js(
        r#"{"type":"ForInStatement",
            "left":{"type":"Identifier","name":"k"},
            "right":{"type":"Identifier","name":"o"},
            "body":{"type":"BlockStatement","body":[]}}"#,
    );
    assert!(out.contains("// for in"));
    assert!(out.contains("OP_ITERATOR( JS_R0 )"));
    assert!(out.contains("OP_NEXTKEY( JS_R0 )"));
    assert!(out.contains("JS_TmpLocal0 = JS_R0;"));
}

#[test]
fn new_expressions_wire_the_prototype_chain() {
    let out = compile_js(
        r#"{"type":"ExpressionStatement","expression":
            {"type":"NewExpression",
             "callee":{"type":"Identifier","name":"F"},"arguments":[]}}"#,
    );
    assert!(out.contains("OP_NEWOBJECT()"));
    assert!(out.contains(r#"OP_STRING( "prototype" )"#));
    assert!(out.contains(r#"OP_STRING( "__proto__" )"#));
    assert!(out.contains("OP_NEW( JS_R0 );"));
}

// =============================================================================
// Native markers, prelude, module mode
// =============================================================================

#[test]
fn native_marker_strings_pass_through_verbatim() {
    let out = compile_js(
        r#"{"type":"ExpressionStatement","expression":
            {"type":"Literal","value":"use js:OP_DEBUG()"}}"#,
    );
    assert!(out.contains("        OP_DEBUG();"));
    assert!(!out.contains("use js:"));
}

#[test]
fn foreign_native_markers_stay_plain_strings() {
    // A C marker inside a JS compilation is just a string literal.
    let out = compile_js(
        r#"{"type":"ExpressionStatement","expression":
            {"type":"Literal","value":"use C:OP_DEBUG()"}}"#,
    );
    assert!(out.contains(r#"OP_STRING( "use C:OP_DEBUG()" )"#));
}

#[test]
fn prelude_is_compiled_in_front_of_the_program() {
    let prelude = program(
        r#"{"type":"VariableDeclaration","kind":"var","declarations":[
            {"type":"VariableDeclarator","id":{"type":"Identifier","name":"lib"},
             "init":{"type":"Literal","value":1}}]}"#,
    );
    let out = compile(
        &program(
            r#"{"type":"VariableDeclaration","kind":"var","declarations":[
                {"type":"VariableDeclarator","id":{"type":"Identifier","name":"app"},
                 "init":{"type":"Literal","value":2}}]}"#,
        ),
        &CompileOptions {
            prelude: Some(&prelude),
            ..options(Target::Js)
        },
    )
    .expect("compile failed");
    let lib = out.find("// lib").expect("prelude compiled");
    let app = out.find("// app").expect("program compiled");
    assert!(lib < app);
}

#[test]
fn c_module_mode_publishes_exports() {
    let out = compile(
        &program(""),
        &CompileOptions {
            as_module: true,
            ..options(Target::C)
        },
    )
    .expect("compile failed");
    assert!(out.contains("Value __untyped_import_test(){"));
    assert!(!out.contains("int main(){"));
    // The synthesized exports object and its publication to the importer.
    assert!(out.contains("Value exports = JS_R0;"));
    assert!(out.contains("JS_Return = OP_GETVARSTAR( exports );"));
}
