//! Centralised error hierarchy and diagnostic sink for the interpreter.
//!
//! Every phase (scanner, parser, resolver, runtime) converts its failure
//! modes into a [`SalixError`] variant, which carries enough context to
//! render the user-facing diagnostic on its own.  The [`Diagnostics`]
//! collector is threaded through the phases by the driver; it prints each
//! error to stderr and tracks whether the current run may advance to the
//! next phase.  The drivers own its lifetime and reset it between
//! interactive lines.

use std::io;

use log::info;
use thiserror::Error;

use crate::token::Token;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SalixError {
    /// Lexical error, reported without a token context.
    #[error("[line {line}] Error: {message}")]
    Lex { message: String, line: usize },

    /// Syntactic error at an identified token (or at end of input).
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        line: usize,
        location: String,
    },

    /// Static-analysis failure from the resolution pass.
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        line: usize,
        location: String,
    },

    /// Runtime evaluation error.  Aborts the current top-level execution.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Wrapper around `std::io::Error`.  Enables `?` on output operations.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl SalixError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("lex error at line {}: {}", line, message);

        SalixError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("parse error at line {}: {}", token.line, message);

        SalixError::Parse {
            message,
            line: token.line,
            location: location_of(token),
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("resolve error at line {}: {}", token.line, message);

        SalixError::Resolve {
            message,
            line: token.line,
            location: location_of(token),
        }
    }

    /// Helper constructor for the **evaluator**.
    pub fn runtime<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("runtime error at line {}: {}", line, message);

        SalixError::Runtime { message, line }
    }
}

fn location_of(token: &Token) -> String {
    // Token's Display renders as `end` for EOF and `'lexeme'` otherwise.
    format!(" at {}", token)
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, SalixError>;

/// Accumulating diagnostic collector.
///
/// The compile phases report every error they find and run to completion;
/// the driver checks [`Diagnostics::had_error`] before advancing to the
/// next phase.  Runtime errors are fail-fast and arrive here only once,
/// from the driver.
#[derive(Debug, Default)]
pub struct Diagnostics {
    had_error: bool,
    had_runtime_error: bool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    /// Print `error` to stderr and record its phase.
    pub fn report(&mut self, error: &SalixError) {
        eprintln!("{}", error);

        match error {
            SalixError::Runtime { .. } | SalixError::Io(_) => self.had_runtime_error = true,
            _ => self.had_error = true,
        }
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Clear both flags.  The interactive prompt calls this between lines
    /// so one bad line does not poison the next.
    pub fn reset(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }
}
