// minnow-parser - Property-based tests for the frontend
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Property-based tests for the literal pools and the lexer.
//!
//! Tests the following properties:
//! - Literal registration is idempotent: equal inputs map to equal indices
//! - Registered literals read back unchanged through their index
//! - Number and string literals survive a print/lex round trip

use minnow_parser::literals::Literals;
use minnow_parser::{Lexer, Token};
use proptest::prelude::*;

/// Finite doubles; NaN is excluded because it never interns.
fn arb_number() -> impl Strategy<Value = f64> {
    any::<f64>().prop_filter("must be finite", |f| f.is_finite())
}

/// Identifier-shaped strings for lexer round trips.
fn arb_ident() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,12}"
}

/// Printable string content without quotes or backslashes.
fn arb_plain_string() -> impl Strategy<Value = String> {
    "[ a-zA-Z0-9_,.!?]{0,40}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Registering the same number twice returns the same index.
    #[test]
    fn number_registration_idempotent(values in prop::collection::vec(arb_number(), 1..50)) {
        let mut pool = Literals::new();
        let first: Vec<usize> = values
            .iter()
            .map(|&v| pool.register_number(v).unwrap())
            .collect();
        let second: Vec<usize> = values
            .iter()
            .map(|&v| pool.register_number(v).unwrap())
            .collect();
        prop_assert_eq!(&first, &second);
        for (&value, &index) in values.iter().zip(&first) {
            prop_assert_eq!(pool.number(index), Some(value));
        }
    }

    /// Registering the same string twice returns the same index.
    #[test]
    fn string_registration_idempotent(values in prop::collection::vec(arb_plain_string(), 1..50)) {
        let mut pool = Literals::new();
        let first: Vec<usize> = values
            .iter()
            .map(|v| pool.register_string(v).unwrap())
            .collect();
        let second: Vec<usize> = values
            .iter()
            .map(|v| pool.register_string(v).unwrap())
            .collect();
        prop_assert_eq!(&first, &second);
        for (value, &index) in values.iter().zip(&first) {
            prop_assert_eq!(pool.string(index).map(|s| s.to_string()), Some(value.clone()));
        }
    }

    /// Distinct numbers never share an index.
    #[test]
    fn distinct_numbers_get_distinct_indices(a in arb_number(), b in arb_number()) {
        prop_assume!(a != b);
        let mut pool = Literals::new();
        let ia = pool.register_number(a).unwrap();
        let ib = pool.register_number(b).unwrap();
        prop_assert_ne!(ia, ib);
    }

    /// A non-negative integer literal lexes back to the same value.
    #[test]
    fn integer_literals_round_trip(n in 0u32..1_000_000) {
        let source = format!("{}", n);
        let mut lexer = Lexer::new(&source);
        prop_assert_eq!(lexer.next_token().unwrap(), Token::Number(n as f64));
        prop_assert_eq!(lexer.next_token().unwrap(), Token::Eof);
    }

    /// Identifiers lex as a single token with the same spelling.
    #[test]
    fn identifiers_round_trip(ident in arb_ident()) {
        let mut lexer = Lexer::new(&ident);
        let token = lexer.next_token().unwrap();
        match Token::keyword(&ident) {
            Some(keyword) => prop_assert_eq!(token, keyword),
            None => prop_assert_eq!(token, Token::Ident(ident.clone())),
        }
        prop_assert_eq!(lexer.next_token().unwrap(), Token::Eof);
    }

    /// Quoted plain strings lex back to their content.
    #[test]
    fn plain_strings_round_trip(content in arb_plain_string()) {
        let source = format!("\"{}\"", content);
        let mut lexer = Lexer::new(&source);
        prop_assert_eq!(lexer.next_token().unwrap(), Token::Str(content.clone()));
        prop_assert_eq!(lexer.next_token().unwrap(), Token::Eof);
    }
}
