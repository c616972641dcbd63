use salix::error::{Diagnostics, SalixError};
use salix::expr::{Expr, LiteralValue};
use salix::parser::Parser;
use salix::scanner::Scanner;
use salix::stmt::Stmt;
use salix::token::{Token, TokenType};

fn parse_source(source: &str) -> (Vec<Stmt>, bool) {
    let mut diagnostics = Diagnostics::new();
    let mut next_id = 0;

    let tokens: Vec<Token> = Scanner::new(source).filter_map(Result::ok).collect();
    let statements = Parser::new(tokens, &mut diagnostics, &mut next_id).parse();

    (statements, diagnostics.had_error())
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let (statements, had_error) = parse_source("5 + 2 * 3;");

    assert!(!had_error);
    assert_eq!(statements.len(), 1);

    let Stmt::Expression(Expr::Binary {
        operator, right, ..
    }) = &statements[0]
    else {
        panic!("expected binary expression statement: {:?}", statements[0]);
    };

    assert_eq!(operator.token_type, TokenType::PLUS);

    let Expr::Binary { operator, .. } = right.as_ref() else {
        panic!("expected nested binary on the right: {:?}", right);
    };

    assert_eq!(operator.token_type, TokenType::STAR);
}

#[test]
fn grouping_overrides_precedence() {
    let (statements, had_error) = parse_source("(5 + 2) * 3;");

    assert!(!had_error);

    let Stmt::Expression(Expr::Binary { left, operator, .. }) = &statements[0] else {
        panic!("expected binary expression statement");
    };

    assert_eq!(operator.token_type, TokenType::STAR);
    assert!(matches!(left.as_ref(), Expr::Grouping(_)));
}

#[test]
fn and_or_produce_logical_nodes() {
    let (statements, had_error) = parse_source("true or false and nil;");

    assert!(!had_error);

    // `and` binds tighter, so the top node is `or`.
    let Stmt::Expression(Expr::Logical {
        operator, right, ..
    }) = &statements[0]
    else {
        panic!("expected logical expression statement");
    };

    assert_eq!(operator.token_type, TokenType::OR);
    assert!(matches!(right.as_ref(), Expr::Logical { .. }));
}

#[test]
fn assignment_is_right_associative() {
    let (statements, had_error) = parse_source("a = b = 1;");

    assert!(!had_error);

    let Stmt::Expression(Expr::Assign { name, value, .. }) = &statements[0] else {
        panic!("expected assignment statement");
    };

    assert_eq!(name.lexeme, "a");
    assert!(matches!(value.as_ref(), Expr::Assign { .. }));
}

#[test]
fn invalid_assignment_target_is_reported_without_unwinding() {
    let (statements, had_error) = parse_source("1 = 2; print 3;");

    assert!(had_error);

    // Parsing continued in place: both statements are present.
    assert_eq!(statements.len(), 2);
    assert!(matches!(statements[1], Stmt::Print(_)));
}

#[test]
fn for_loop_desugars_into_block_and_while() {
    let (statements, had_error) = parse_source("for (var i = 0; i < 3; i = i + 1) print i;");

    assert!(!had_error);
    assert_eq!(statements.len(), 1);

    let Stmt::Block(parts) = &statements[0] else {
        panic!("expected the initializer block: {:?}", statements[0]);
    };

    assert_eq!(parts.len(), 2);
    assert!(matches!(parts[0], Stmt::Var { .. }));

    let Stmt::While { body, .. } = &parts[1] else {
        panic!("expected while: {:?}", parts[1]);
    };

    // Body block runs the original statement, then the increment.
    let Stmt::Block(body_parts) = body.as_ref() else {
        panic!("expected body block: {:?}", body);
    };

    assert_eq!(body_parts.len(), 2);
    assert!(matches!(body_parts[0], Stmt::Print(_)));
    assert!(matches!(
        body_parts[1],
        Stmt::Expression(Expr::Assign { .. })
    ));
}

#[test]
fn for_loop_without_clauses_becomes_bare_while_true() {
    let (statements, had_error) = parse_source("for (;;) print 1;");

    assert!(!had_error);

    let Stmt::While { condition, body } = &statements[0] else {
        panic!("expected a bare while: {:?}", statements[0]);
    };

    assert!(matches!(condition, Expr::Literal(LiteralValue::True)));
    assert!(matches!(body.as_ref(), Stmt::Print(_)));
}

#[test]
fn call_arguments_are_collected() {
    let (statements, had_error) = parse_source("f(1, 2, 3);");

    assert!(!had_error);

    let Stmt::Expression(Expr::Call { arguments, .. }) = &statements[0] else {
        panic!("expected a call statement");
    };

    assert_eq!(arguments.len(), 3);
}

#[test]
fn calls_chain_left_to_right() {
    let (statements, had_error) = parse_source("f(1)(2);");

    assert!(!had_error);

    let Stmt::Expression(Expr::Call { callee, .. }) = &statements[0] else {
        panic!("expected a call statement");
    };

    assert!(matches!(callee.as_ref(), Expr::Call { .. }));
}

#[test]
fn function_declaration_collects_params_and_body() {
    let (statements, had_error) = parse_source("fun add(a, b) { return a + b; }");

    assert!(!had_error);

    let Stmt::Function(declaration) = &statements[0] else {
        panic!("expected a function declaration");
    };

    assert_eq!(declaration.name.lexeme, "add");
    assert_eq!(declaration.params.len(), 2);
    assert_eq!(declaration.body.len(), 1);
    assert!(matches!(declaration.body[0], Stmt::Return { .. }));
}

#[test]
fn var_declaration_initializer_is_optional() {
    let (statements, had_error) = parse_source("var a; var b = 2;");

    assert!(!had_error);

    assert!(matches!(
        &statements[0],
        Stmt::Var {
            initializer: None,
            ..
        }
    ));
    assert!(matches!(
        &statements[1],
        Stmt::Var {
            initializer: Some(_),
            ..
        }
    ));
}

#[test]
fn panic_mode_recovers_at_statement_boundary() {
    let (statements, had_error) = parse_source("var 1 = 2;\nprint 3;");

    assert!(had_error);

    // The bad declaration is discarded; the print statement survives.
    assert_eq!(statements.len(), 1);
    assert!(matches!(statements[0], Stmt::Print(_)));
}

#[test]
fn panic_mode_reports_later_errors_too() {
    // Two independent syntax errors separated by a statement boundary.
    let (statements, had_error) = parse_source("var 1;\nvar 2;\nprint 9;");

    assert!(had_error);
    assert_eq!(statements.len(), 1);
    assert!(matches!(statements[0], Stmt::Print(_)));
}

#[test]
fn variable_and_assign_nodes_get_distinct_ids() {
    let (statements, had_error) = parse_source("a = a + b;");

    assert!(!had_error);

    let Stmt::Expression(Expr::Assign { id, value, .. }) = &statements[0] else {
        panic!("expected assignment");
    };

    let Expr::Binary { left, right, .. } = value.as_ref() else {
        panic!("expected binary rhs");
    };

    let (Expr::Variable { id: left_id, .. }, Expr::Variable { id: right_id, .. }) =
        (left.as_ref(), right.as_ref())
    else {
        panic!("expected variable operands");
    };

    assert_ne!(id, left_id);
    assert_ne!(id, right_id);
    assert_ne!(left_id, right_id);
}

#[test]
fn missing_semicolon_is_an_error() {
    let (_, had_error) = parse_source("print 1");

    assert!(had_error);
}

#[test]
fn parse_errors_render_with_token_location() {
    let token = Token::new(TokenType::SEMICOLON, ";".to_string(), 3);
    let error = SalixError::parse(&token, "Expect expression.");

    assert_eq!(
        error.to_string(),
        "[line 3] Error at ';': Expect expression."
    );

    let eof = Token::new(TokenType::EOF, String::new(), 7);
    let error = SalixError::parse(&eof, "Expect ';' after value.");

    assert_eq!(
        error.to_string(),
        "[line 7] Error at end: Expect ';' after value."
    );
}

#[test]
fn runtime_errors_render_message_then_line() {
    let error = SalixError::runtime(2, "Operands must be numbers.");

    assert_eq!(error.to_string(), "Operands must be numbers.\n[line 2]");
}
