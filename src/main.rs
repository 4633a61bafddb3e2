/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

use std::fs;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use linearjs::backend::Target;
use linearjs::error::Result;
use linearjs::{compile, CompileOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TargetArg {
    Js,
    C,
}

/// Compile an ESTree JSON document to a linear instruction program.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// ESTree JSON file to compile.
    file: PathBuf,

    /// Target language to emit.
    #[arg(long, value_enum, default_value_t = TargetArg::Js)]
    target: TargetArg,

    /// Emit as a module, not a driver (only affects C compilation).
    #[arg(long)]
    as_module: bool,

    /// ESTree JSON of the bundled library, compiled in front of the program.
    #[arg(long)]
    prelude: Option<PathBuf>,

    /// Runtime source prepended to JS output, making it self-contained.
    #[arg(long)]
    runtime: Option<PathBuf>,

    /// Output file (stdout if omitted).
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let source = fs::read_to_string(&args.file)?;
    let prelude = args.prelude.as_deref().map(fs::read_to_string).transpose()?;
    let runtime = args.runtime.as_deref().map(fs::read_to_string).transpose()?;

    let module_name = args
        .file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let options = CompileOptions {
        target: match args.target {
            TargetArg::Js => Target::Js,
            TargetArg::C => Target::C,
        },
        as_module: args.as_module,
        module_name: &module_name,
        prelude: prelude.as_deref(),
        runtime: runtime.as_deref(),
    };

    let output = compile(&source, &options)?;
    match &args.output {
        Some(path) => fs::write(path, output)?,
        None => print!("{output}"),
    }
    Ok(())
}
