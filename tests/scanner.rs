use salix::scanner::Scanner;
use salix::token::{Token, TokenType};

fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
    let tokens: Vec<Token> = Scanner::new(source).filter_map(Result::ok).collect();

    assert_eq!(
        tokens.len(),
        expected.len(),
        "token count mismatch for {:?}: {:?}",
        source,
        tokens
    );

    for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
        assert_eq!(&actual.token_type, expected_type);
        assert_eq!(actual.lexeme, *expected_lexeme);
    }
}

#[test]
fn scans_punctuation() {
    assert_token_sequence(
        "({*.,+*})",
        &[
            (TokenType::LEFT_PAREN, "("),
            (TokenType::LEFT_BRACE, "{"),
            (TokenType::STAR, "*"),
            (TokenType::DOT, "."),
            (TokenType::COMMA, ","),
            (TokenType::PLUS, "+"),
            (TokenType::STAR, "*"),
            (TokenType::RIGHT_BRACE, "}"),
            (TokenType::RIGHT_PAREN, ")"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn scans_one_and_two_char_operators() {
    assert_token_sequence(
        "! != = == > >= < <= / -",
        &[
            (TokenType::BANG, "!"),
            (TokenType::BANG_EQUAL, "!="),
            (TokenType::EQUAL, "="),
            (TokenType::EQUAL_EQUAL, "=="),
            (TokenType::GREATER, ">"),
            (TokenType::GREATER_EQUAL, ">="),
            (TokenType::LESS, "<"),
            (TokenType::LESS_EQUAL, "<="),
            (TokenType::SLASH, "/"),
            (TokenType::MINUS, "-"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn scans_keywords_and_identifiers() {
    assert_token_sequence(
        "var foo = fun_2;",
        &[
            (TokenType::VAR, "var"),
            (TokenType::IDENTIFIER, "foo"),
            (TokenType::EQUAL, "="),
            (TokenType::IDENTIFIER, "fun_2"),
            (TokenType::SEMICOLON, ";"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn keywords_require_exact_match() {
    // A keyword prefix inside a longer identifier is just an identifier.
    assert_token_sequence(
        "orchid or nilly nil",
        &[
            (TokenType::IDENTIFIER, "orchid"),
            (TokenType::OR, "or"),
            (TokenType::IDENTIFIER, "nilly"),
            (TokenType::NIL, "nil"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn scans_number_literals() {
    let tokens: Vec<Token> = Scanner::new("12 3.5 7.")
        .filter_map(Result::ok)
        .collect();

    match &tokens[0].token_type {
        TokenType::NUMBER(n) => assert_eq!(*n, 12.0),
        other => panic!("expected NUMBER, got {:?}", other),
    }

    match &tokens[1].token_type {
        TokenType::NUMBER(n) => assert_eq!(*n, 3.5),
        other => panic!("expected NUMBER, got {:?}", other),
    }

    // A trailing dot is not part of the number.
    match &tokens[2].token_type {
        TokenType::NUMBER(n) => assert_eq!(*n, 7.0),
        other => panic!("expected NUMBER, got {:?}", other),
    }
    assert_eq!(tokens[3].token_type, TokenType::DOT);
}

#[test]
fn scans_string_literal_without_quotes_in_value() {
    let tokens: Vec<Token> = Scanner::new("\"hello\"").filter_map(Result::ok).collect();

    assert_eq!(tokens[0].lexeme, "\"hello\"");

    match &tokens[0].token_type {
        TokenType::STRING(s) => assert_eq!(s, "hello"),
        other => panic!("expected STRING, got {:?}", other),
    }
}

#[test]
fn strings_may_span_lines() {
    let tokens: Vec<Token> = Scanner::new("\"a\nb\" x").filter_map(Result::ok).collect();

    match &tokens[0].token_type {
        TokenType::STRING(s) => assert_eq!(s, "a\nb"),
        other => panic!("expected STRING, got {:?}", other),
    }

    // The line counter advanced through the string.
    assert_eq!(tokens[1].lexeme, "x");
    assert_eq!(tokens[1].line, 2);
}

#[test]
fn comments_run_to_end_of_line() {
    assert_token_sequence(
        "1 // the rest is ignored != ==\n2",
        &[
            (TokenType::NUMBER(0.0), "1"),
            (TokenType::NUMBER(0.0), "2"),
            (TokenType::EOF, ""),
        ],
    );

    let tokens: Vec<Token> = Scanner::new("1 // c\n2").filter_map(Result::ok).collect();

    assert_eq!(tokens[0].line, 1);
    assert_eq!(tokens[1].line, 2);
}

#[test]
fn unexpected_characters_are_reported_and_skipped() {
    let results: Vec<_> = Scanner::new(",.$(#").collect();

    // COMMA, DOT, error, LEFT_PAREN, error, EOF.
    assert_eq!(results.len(), 6);

    assert!(results[0].is_ok());
    assert!(results[1].is_ok());
    assert!(results[2].is_err());
    assert!(results[3].is_ok());
    assert!(results[4].is_err());
    assert!(results[5].is_ok());

    for error in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(
            error.to_string().contains("Unexpected character"),
            "unexpected message: {}",
            error
        );
    }
}

#[test]
fn unterminated_string_reports_opening_line() {
    let results: Vec<_> = Scanner::new("1\n\"abc\ndef").collect();

    let error = results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .next()
        .expect("expected a lex error");

    // Reported at the line of the opening quote, not where input ended.
    assert_eq!(
        error.to_string(),
        "[line 2] Error: Unterminated string."
    );

    // The scanner still finished with an EOF token.
    let last = results.last().expect("no tokens").as_ref().expect("EOF");
    assert_eq!(last.token_type, TokenType::EOF);
}

#[test]
fn eof_carries_final_line() {
    let tokens: Vec<Token> = Scanner::new("1\n2\n").filter_map(Result::ok).collect();

    let eof = tokens.last().expect("no tokens");
    assert_eq!(eof.token_type, TokenType::EOF);
    assert_eq!(eof.line, 3);
}
