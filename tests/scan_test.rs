use pl0c::lang::{Token, TokenStream};
use std::io::Cursor;

fn stream(source: &str) -> TokenStream {
    TokenStream::new(Box::new(Cursor::new(source.to_string())))
}

fn tokens(source: &str) -> Vec<Token> {
    let mut ts = stream(source);
    let mut tokens = vec![];
    loop {
        match ts.get() {
            Token::EndOfStream => break,
            token => tokens.push(token),
        }
    }
    tokens
}

#[test]
fn test_operators() {
    assert_eq!(
        tokens("<= < << >= > >> == = != ! ~ | || & && ^ + - * / % ( ) , . ;"),
        vec![
            Token::LessEqual,
            Token::Less,
            Token::ShiftLeft,
            Token::GreaterEqual,
            Token::Greater,
            Token::ShiftRight,
            Token::Equal,
            Token::Assign,
            Token::NotEqual,
            Token::Not,
            Token::Complement,
            Token::BitOr,
            Token::Or,
            Token::BitAnd,
            Token::And,
            Token::BitXor,
            Token::Add,
            Token::Subtract,
            Token::Multiply,
            Token::Divide,
            Token::Modulo,
            Token::LParen,
            Token::RParen,
            Token::Comma,
            Token::Period,
            Token::Semicolon,
        ]
    );
}

#[test]
fn test_adjacent_operators() {
    assert_eq!(
        tokens("<<="),
        vec![Token::ShiftLeft, Token::Assign]
    );
    assert_eq!(
        tokens("a==b"),
        vec![
            Token::Ident("a".to_string()),
            Token::Equal,
            Token::Ident("b".to_string()),
        ]
    );
}

#[test]
fn test_keywords_and_idents() {
    assert_eq!(
        tokens("if iffy _x x_1 repeat"),
        vec![
            Token::If,
            Token::Ident("iffy".to_string()),
            Token::Ident("_x".to_string()),
            Token::Ident("x_1".to_string()),
            Token::Repeat,
        ]
    );
}

#[test]
fn test_numbers() {
    assert_eq!(
        tokens("0 42 2147483647"),
        vec![Token::Number(0), Token::Number(42), Token::Number(2147483647)]
    );
}

#[test]
fn test_number_overflow_saturates() {
    let mut ts = stream("2147483648");
    assert_eq!(Token::Number(2147483647), ts.get());
    assert!(ts.take_overflow());
    assert!(!ts.take_overflow());

    let mut ts = stream("2147483647");
    assert_eq!(Token::Number(2147483647), ts.get());
    assert!(!ts.take_overflow());
}

#[test]
fn test_line_comment() {
    assert_eq!(
        tokens("1 // ignored ** /*\n2"),
        vec![Token::Number(1), Token::Number(2)]
    );
}

#[test]
fn test_block_comment() {
    assert_eq!(
        tokens("1 /* ignored\nstill ignored */ 2"),
        vec![Token::Number(1), Token::Number(2)]
    );
    // block comments do not nest
    assert_eq!(
        tokens("/* /* */ 2"),
        vec![Token::Number(2)]
    );
}

#[test]
fn test_unterminated_comment() {
    assert_eq!(
        tokens("1\n/* never closed\n\n"),
        vec![Token::Number(1), Token::BadComment(2)]
    );
}

#[test]
fn test_unknown_character() {
    assert_eq!(tokens("@"), vec![Token::Unknown('@')]);
}

#[test]
fn test_line_tracking() {
    let mut ts = stream("one\n\n  two\n");
    assert_eq!(Token::Ident("one".to_string()), ts.get());
    assert_eq!(1, ts.line());
    assert_eq!(Token::Ident("two".to_string()), ts.get());
    assert_eq!(3, ts.line());
}

#[test]
fn test_current() {
    let mut ts = stream("x = 1");
    assert_eq!(&Token::EndOfStream, ts.current());
    ts.get();
    assert_eq!(&Token::Ident("x".to_string()), ts.current());
    ts.get();
    assert_eq!(&Token::Assign, ts.current());
}

#[test]
fn test_end_of_stream_repeats() {
    let mut ts = stream("x");
    ts.get();
    assert_eq!(Token::EndOfStream, ts.get());
    assert_eq!(Token::EndOfStream, ts.get());
}

#[test]
fn test_set_input_restarts() {
    let mut ts = stream("one\ntwo");
    while ts.get() != Token::EndOfStream {}
    ts.set_input(Box::new(Cursor::new("three".to_string())));
    assert_eq!(Token::Ident("three".to_string()), ts.get());
    assert_eq!(1, ts.line());
}
