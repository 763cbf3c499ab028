//! Loam interpreter CLI

use clap::{Parser, Subcommand};
use loam::ast::Program;
use loam::error::{report_error, report_runtime_error};
use loam::interp::Interpreter;
use loam::resolver::Resolutions;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "loam", version, about = "Loam - a small scripting language")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a loam source file
    Run {
        /// Source file to run
        file: PathBuf,
    },
    /// Start an interactive session
    Repl,
    /// Parse and dump AST (debug)
    Parse {
        /// Source file to parse
        file: PathBuf,
    },
    /// Tokenize and dump tokens (debug)
    Tokens {
        /// Source file to tokenize
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run { file } => run_file(&file),
        Command::Repl => run_repl(),
        Command::Parse { file } => parse_file(&file),
        Command::Tokens { file } => tokenize_file(&file),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Front half of the pipeline, shared by `run` and `parse`
fn compile(source: &str) -> loam::Result<(Program, Resolutions)> {
    let tokens = loam::lexer::tokenize(source)?;
    let program = loam::parser::parse(tokens)?;
    let resolutions = loam::resolver::resolve(&program)?;
    Ok((program, resolutions))
}

fn run_file(path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)?;
    let filename = path.display().to_string();

    let (program, resolutions) = match compile(&source) {
        Ok(compiled) => compiled,
        Err(err) => {
            report_error(&filename, &source, &err);
            std::process::exit(1);
        }
    };

    let mut interpreter = Interpreter::new();
    interpreter.add_resolutions(resolutions);
    if let Err(err) = interpreter.interpret(&program) {
        report_runtime_error(&filename, &source, &err);
        std::process::exit(1);
    }

    Ok(())
}

fn run_repl() -> Result<(), Box<dyn std::error::Error>> {
    let mut repl = loam::repl::Repl::new()?;
    repl.run()?;
    Ok(())
}

fn parse_file(path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)?;
    let filename = path.display().to_string();

    let tokens = match loam::lexer::tokenize(&source) {
        Ok(tokens) => tokens,
        Err(err) => {
            report_error(&filename, &source, &err);
            std::process::exit(1);
        }
    };
    let program = match loam::parser::parse(tokens) {
        Ok(program) => program,
        Err(err) => {
            report_error(&filename, &source, &err);
            std::process::exit(1);
        }
    };

    println!("{}", serde_json::to_string_pretty(&program)?);
    Ok(())
}

fn tokenize_file(path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)?;
    let filename = path.display().to_string();

    let tokens = match loam::lexer::tokenize(&source) {
        Ok(tokens) => tokens,
        Err(err) => {
            report_error(&filename, &source, &err);
            std::process::exit(1);
        }
    };
    for (tok, span) in &tokens {
        println!("{:?} @ {}..{}", tok, span.start, span.end);
    }

    Ok(())
}
