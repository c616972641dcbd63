use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser as ClapParser;

use salix::error::Diagnostics;
use salix::interpreter::Interpreter;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Script to execute; starts the interactive prompt when omitted
    script: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Cli = Cli::parse();

    match args.script.as_slice() {
        [] => run_prompt()?,

        [script] => run_file(script)?,

        _ => {
            println!("Usage: salix [script]");
            process::exit(64);
        }
    }

    Ok(())
}

fn run_file(path: &Path) -> anyhow::Result<()> {
    let source: String = fs::read_to_string(path)?;

    let mut interpreter = Interpreter::new();
    let mut diagnostics = Diagnostics::new();

    salix::run(&source, &mut interpreter, &mut diagnostics);

    if diagnostics.had_error() {
        process::exit(65);
    }

    if diagnostics.had_runtime_error() {
        process::exit(70);
    }

    Ok(())
}

fn run_prompt() -> anyhow::Result<()> {
    let stdin = io::stdin();

    let mut interpreter = Interpreter::new();
    let mut diagnostics = Diagnostics::new();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();

        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF ends the session.
            break;
        }

        salix::run(&line, &mut interpreter, &mut diagnostics);

        // One bad line must not poison the next.
        diagnostics.reset();
    }

    Ok(())
}
