use calib_reader::{is_numeric_literal, lexical_cast, tokenize_on, tokenize_ws, Error};

#[test]
fn tokenizes_and_trims_on_comma() {
    let expr = " one, two three\n ,four,\nfive\n\tsix";
    assert_eq!(
        tokenize_on(expr, ','),
        vec!["one", "two three", "four", "five\n\tsix"]
    );
}

#[test]
fn tokenize_on_keeps_empty_tokens() {
    assert_eq!(tokenize_on("a,,b", ','), vec!["a", "", "b"]);
}

#[test]
fn tokenizes_on_whitespace() {
    let expr = " one, two three\n ,four,\nfive\n\tsix";
    assert_eq!(
        tokenize_ws(expr),
        vec!["one,", "two", "three", ",four,", "five", "six"]
    );
}

#[test]
fn matches_numeric_literals() {
    for literal in ["0", "1", "42", "-0", "-1", "-.033e-64", "nan", "NaN"] {
        assert!(is_numeric_literal(literal), "{literal}");
    }
}

#[test]
fn does_not_match_non_numeric_literals() {
    for expr in ["", "a", "abc", "e", "-e", "--0", "--1", "2+3", "inf", "+inf", "-INF"] {
        assert!(!is_numeric_literal(expr), "{expr}");
    }
}

#[test]
fn casts_boolean_vocabularies() {
    for literal in ["true", "True", "TRUE", "yes", "1"] {
        assert!(lexical_cast::<bool>(literal).unwrap(), "{literal}");
    }
    for literal in ["false", "False", "FALSE", "no", "0"] {
        assert!(!lexical_cast::<bool>(literal).unwrap(), "{literal}");
    }
    for expr in ["TrUe", "2", "on", ""] {
        assert!(matches!(
            lexical_cast::<bool>(expr),
            Err(Error::Parse { .. })
        ));
    }
}

#[test]
fn casts_integers() {
    assert_eq!(lexical_cast::<i32>("-12").unwrap(), -12);
    assert_eq!(lexical_cast::<u64>("12345678901").unwrap(), 12_345_678_901);
    assert_eq!(lexical_cast::<usize>("7").unwrap(), 7);
    assert!(matches!(lexical_cast::<i32>("12.5"), Err(Error::Parse { .. })));
    assert!(matches!(lexical_cast::<u32>("-1"), Err(Error::Parse { .. })));
    assert!(matches!(lexical_cast::<i32>("abc"), Err(Error::Parse { .. })));
}

#[test]
fn casts_floats() {
    assert_eq!(lexical_cast::<f64>("4.56").unwrap(), 4.56);
    assert_eq!(lexical_cast::<f32>("-.5e2").unwrap(), -50.0);
    assert!(lexical_cast::<f64>("nan").unwrap().is_nan());
    assert!(lexical_cast::<f64>("NaN").unwrap().is_nan());
}

#[cfg(not(feature = "expressions"))]
#[test]
fn non_literal_floats_fail_without_evaluator() {
    assert!(matches!(lexical_cast::<f64>("2+3"), Err(Error::Parse { .. })));
    assert!(matches!(lexical_cast::<f64>("inf"), Err(Error::Parse { .. })));
}

#[cfg(feature = "expressions")]
#[test]
fn non_literal_floats_evaluate_as_expressions() {
    assert_eq!(lexical_cast::<f64>("2+3").unwrap(), 5.0);
    assert_eq!(lexical_cast::<f64>("2*(3+1)").unwrap(), 8.0);
    assert!(matches!(
        lexical_cast::<f64>("this is not math"),
        Err(Error::Parse { .. })
    ));
}

#[test]
fn string_cast_is_identity() {
    assert_eq!(lexical_cast::<String>("  raw value ").unwrap(), "  raw value ");
}

#[test]
fn parse_error_keeps_offending_token() {
    match lexical_cast::<i32>("bogus") {
        Err(Error::Parse { token, .. }) => assert_eq!(token, "bogus"),
        other => panic!("unexpected result: {other:?}"),
    }
}
