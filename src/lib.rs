pub mod callable;
pub mod environment;
pub mod error;
pub mod expr;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod stmt;
pub mod token;
pub mod value;

use std::io::Write;

use log::info;

use crate::error::Diagnostics;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::stmt::Stmt;
use crate::token::Token;

/// Run one source text front to back: lex, parse, resolve, evaluate.
///
/// Each compile phase accumulates its errors into `diagnostics` and runs
/// to completion; a phase with errors gates the next one.  A runtime
/// error aborts the execution and is reported before returning.
pub fn run<W: Write>(source: &str, interpreter: &mut Interpreter<W>, diagnostics: &mut Diagnostics) {
    let mut tokens: Vec<Token> = Vec::new();

    for item in Scanner::new(source) {
        match item {
            Ok(token) => tokens.push(token),

            Err(error) => diagnostics.report(&error),
        }
    }

    let statements: Vec<Stmt> = Parser::new(tokens, diagnostics, interpreter.node_ids()).parse();

    if diagnostics.had_error() {
        return;
    }

    Resolver::new(interpreter, diagnostics).resolve(&statements);

    if diagnostics.had_error() {
        return;
    }

    info!("executing {} statement(s)", statements.len());

    if let Err(error) = interpreter.interpret(&statements) {
        diagnostics.report(&error);
    }
}
