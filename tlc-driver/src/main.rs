//! Tiny Lang Compiler Driver
//!
//! Reads a JSON-serialized AST, lowers it to IR, assigns registers and
//! stack slots, and writes x86-64 assembly. With `--build` the assembly is
//! assembled and linked into an executable.

mod config;
mod demos;
mod toolchain;

use clap::{Args, Parser, Subcommand};
use config::Config;
use log::{info, LevelFilter};
use std::fs;
use std::path::{Path, PathBuf};
use tlc_backend::{write_assembly, AsmSyntax};
use tlc_common::CompilerError;
use tlc_frontend::{Frontend, Program};
use tlc_ir::transform_module;

#[derive(Parser)]
#[command(name = "tlc")]
#[command(about = "Tiny Lang Compiler")]
#[command(version = "0.1.0")]
struct Cli {
    /// Log pipeline stages to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a JSON AST file
    Compile {
        /// Input AST (JSON)
        input: PathBuf,

        #[command(flatten)]
        args: CompileArgs,
    },

    /// Compile a built-in sample program (return, count, hello)
    Demo {
        name: String,

        #[command(flatten)]
        args: CompileArgs,
    },
}

#[derive(Args, Debug, Default)]
struct CompileArgs {
    /// Output assembly file (default: <module>.s)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Assembly syntax: intel or att
    #[arg(long)]
    syntax: Option<AsmSyntax>,

    /// Annotate the assembly with the IR it came from
    #[arg(long)]
    comments: bool,

    /// Print IR to stdout before register assignment
    #[arg(long)]
    print_ir: bool,

    /// Print IR to stdout after register assignment
    #[arg(long)]
    print_transformed: bool,

    /// Save IR to a file with .ir extension
    #[arg(long)]
    save_ir: bool,

    /// Specify output path for IR file (used with --save-ir)
    #[arg(long)]
    ir_output: Option<PathBuf>,

    /// Write the transformed module as JSON
    #[arg(long)]
    emit_ir_json: Option<PathBuf>,

    /// Assemble and link an executable
    #[arg(long)]
    build: bool,

    /// Runtime object or library to link against (repeatable)
    #[arg(long)]
    runtime: Vec<PathBuf>,

    /// Executable path (used with --build)
    #[arg(long)]
    exe: Option<PathBuf>,

    /// JSON file with emit and build options; flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,
}

impl CompileArgs {
    /// The config file, if any, with command-line flags applied on top
    fn resolve_config(&self) -> Result<Config, CompilerError> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(syntax) = self.syntax {
            config.emit.syntax = syntax;
        }
        config.emit.comments |= self.comments;
        config.build.runtime.extend(self.runtime.iter().cloned());
        if let Some(exe) = &self.exe {
            config.build.output = Some(exe.clone());
        }
        Ok(config)
    }
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let result = match &cli.command {
        Commands::Compile { input, args } => compile_file(input, args),
        Commands::Demo { name, args } => demos::demo(name).and_then(|program| compile(&program, name, args)),
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn compile_file(input: &Path, args: &CompileArgs) -> Result<(), CompilerError> {
    let source = fs::read_to_string(input).map_err(|e| CompilerError::Io {
        message: format!("{}: {}", input.display(), e),
    })?;
    let program = Frontend::parse_json(&source)?;
    let module_name = input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("out");
    compile(&program, module_name, args)
}

fn write_file(path: &Path, contents: &str) -> Result<(), CompilerError> {
    fs::write(path, contents).map_err(|e| CompilerError::Io {
        message: format!("{}: {}", path.display(), e),
    })
}

/// Lower, transform and emit `program`, then optionally build it
fn compile(program: &Program, module_name: &str, args: &CompileArgs) -> Result<(), CompilerError> {
    let config = args.resolve_config()?;

    info!("Lowering module '{}'", module_name);
    let mut module = Frontend::lower(program, module_name)?;

    if args.print_ir {
        print!("{}", module);
    }
    if args.save_ir {
        let path = args
            .ir_output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.ir", module_name)));
        write_file(&path, &module.to_string())?;
        println!("IR saved to: {}", path.display());
    }

    transform_module(&mut module)?;

    if args.print_transformed {
        print!("{}", module);
    }
    if let Some(path) = &args.emit_ir_json {
        let json = serde_json::to_string_pretty(&module).map_err(|e| CompilerError::internal(e.to_string()))?;
        write_file(path, &json)?;
    }

    let asm_path = write_assembly(&module, &config.emit, args.output.as_deref())?;
    println!("Assembly written to: {}", asm_path.display());

    if args.build {
        let executable = toolchain::build_executable(&asm_path, &config.build)?;
        println!("Executable written to: {}", executable.display());
    }
    Ok(())
}
