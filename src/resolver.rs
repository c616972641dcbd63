//! Static resolution pass.
//!
//! A single walk over the statement tree that:
//! 1. **Builds lexical scopes**: maintains a stack of
//!    `HashMap<String, bool>` tracking declared (`false`) and fully
//!    defined (`true`) names in each nested block or function.
//! 2. **Enforces static rules**: reading a local in its own initializer,
//!    redeclaring a name in the same non-global scope, and `return`
//!    outside a function are all reported to the diagnostic sink.  The
//!    pass keeps going after an error so one bad line does not hide the
//!    next.
//! 3. **Records binding distances**: for every `Variable` and `Assign`
//!    occurrence found in some scope, tells the interpreter how many
//!    environment frames separate the use from its declaration.  The
//!    runtime then climbs exactly that many frames instead of searching
//!    by name, which is what makes closures capture by scope rather
//!    than by re-lookup.  Names found in no scope are left for the
//!    global frame.
//!
//! Runs after parsing and before interpretation:
//! ```ignore
//! Resolver::new(&mut interpreter, &mut diagnostics).resolve(&statements);
//! ```

use std::collections::HashMap;
use std::io::Write;

use log::debug;

use crate::error::{Diagnostics, SalixError};
use crate::expr::{Expr, ExprId};
use crate::interpreter::Interpreter;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::Token;

/// Are we inside a user function?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
}

pub struct Resolver<'a, W: Write> {
    interpreter: &'a mut Interpreter<W>,
    diagnostics: &'a mut Diagnostics,
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
}

impl<'a, W: Write> Resolver<'a, W> {
    pub fn new(interpreter: &'a mut Interpreter<W>, diagnostics: &'a mut Diagnostics) -> Self {
        Resolver {
            interpreter,
            diagnostics,
            scopes: Vec::new(),
            current_function: FunctionType::None,
        }
    }

    /// Walk all top-level statements.
    pub fn resolve(&mut self, statements: &[Stmt]) {
        for statement in statements {
            self.resolve_stmt(statement);
        }
    }

    // ─────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();

                for statement in statements {
                    self.resolve_stmt(statement);
                }

                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // Declare before the initializer runs so a self-read in
                // the initializer is detectable, define only after.
                self.declare(name);

                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }

                self.define(name);
            }

            Stmt::Function(declaration) => {
                // Declared and defined up front so the body may recurse.
                self.declare(&declaration.name);
                self.define(&declaration.name);

                self.resolve_function(declaration);
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);

                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    let error =
                        SalixError::resolve(keyword, "Can't return from top-level code.");
                    self.diagnostics.report(&error);
                }

                if let Some(expr) = value {
                    self.resolve_expr(expr);
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => {
                self.resolve_expr(inner);
            }

            Expr::Unary { right, .. } => {
                self.resolve_expr(right);
            }

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable { id, name } => {
                if self
                    .scopes
                    .last()
                    .is_some_and(|scope| scope.get(name.lexeme.as_str()) == Some(&false))
                {
                    let error = SalixError::resolve(
                        name,
                        "Can't read local variable in its own initializer.",
                    );
                    self.diagnostics.report(&error);
                }

                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                // Right-hand side first, then bind the target.
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);

                for argument in arguments {
                    self.resolve_expr(argument);
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function's parameters and body.
    fn resolve_function(&mut self, declaration: &FunctionDecl) {
        let enclosing: FunctionType = self.current_function;

        self.current_function = FunctionType::Function;

        self.begin_scope();

        for param in &declaration.params {
            self.declare(param);
            self.define(param);
        }

        for statement in &declaration.body {
            self.resolve_stmt(statement);
        }

        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        // The global scope is not tracked; redefinition is allowed there.
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                let error = SalixError::resolve(
                    name,
                    "Already a variable with this name in this scope.",
                );
                self.diagnostics.report(&error);
            }

            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    // ─────────────────────────────────────────────────────────────────
    // Binding-distance helper
    // ─────────────────────────────────────────────────────────────────

    /// Record this occurrence as a local at the depth of the innermost
    /// scope containing the name, or leave it for global lookup.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("resolved '{}' at depth {}", name.lexeme, depth);

                self.interpreter.note_local(id, depth);

                return;
            }
        }

        debug!("resolved '{}' as global", name.lexeme);
    }
}
