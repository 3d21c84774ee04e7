mod common;

use common::{registry, render};
use umbra_ui::placeholder::PlaceholderRegistry;
use umbra_ui::script::{parse, tokenize, EvalError, Evaluator, FunctionRegistry, TokenKind};
use umbra_ui::Error;

#[test]
fn plain_placeholder() {
    let values = registry(&[("player.level", "42")]);
    assert_eq!(render("[player.level]", &values).unwrap(), "42");
}

#[test]
fn ternary_picks_a_branch() {
    let source = "[player.level > 10 ? 'high' : 'low']";
    let mut values = registry(&[("player.level", "42")]);
    assert_eq!(render(source, &values).unwrap(), "high");

    values.set("player.level", "5").unwrap();
    assert_eq!(render(source, &values).unwrap(), "low");
}

#[test]
fn nested_placeholder_only_on_taken_branch() {
    // `b` is not registered: evaluating it would fail.
    let values = registry(&[("a", "")]);
    assert_eq!(render("[a ? [b] : 'x']", &values).unwrap(), "x");

    let values = registry(&[("a", "1"), ("b", "inner")]);
    assert_eq!(render("[a ? [b] : 'x']", &values).unwrap(), "inner");

    let values = registry(&[("a", "1")]);
    assert!(matches!(
        render("[a ? [b] : 'x']", &values),
        Err(Error::Eval(EvalError::PlaceholderNotFound(name))) if name == "b"
    ));
}

#[test]
fn evaluation_is_idempotent() {
    let values = registry(&[("hp", "73"), ("name", "Rook")]);
    let functions = FunctionRegistry::with_builtins();
    let expr = parse(&tokenize("HP [hp | pad 4 '0'] [name | upper] [hp < 50 ? 'low']")).unwrap();
    let evaluator = Evaluator::new(&values, &functions);

    let first = evaluator.evaluate(&expr).unwrap();
    let second = evaluator.evaluate(&expr).unwrap();
    assert_eq!(first, "HP 0073 ROOK ");
    assert_eq!(first, second);
}

#[test]
fn text_without_placeholders_is_one_token() {
    for source in ["hello world", "a ? b : c", "1.2.3 | x", "unclosed [ bracket"] {
        let stream = tokenize(source);
        assert_eq!(stream.tokens.len(), 1, "{source}");
        assert_eq!(stream.tokens[0].kind, TokenKind::Text);
        assert_eq!(stream.tokens[0].text, source);
    }
}

#[test]
fn malformed_number_warns_and_continues() {
    let stream = tokenize("[1.2.3 x]");
    assert_eq!(
        stream.kinds(),
        vec![TokenKind::OpenBracket, TokenKind::Identifier, TokenKind::CloseBracket]
    );
    assert_eq!(stream.warnings.len(), 1);
    assert_eq!(stream.tokens[1].text, "x");
}

#[test]
fn unknown_placeholder_is_not_found() {
    let values = PlaceholderRegistry::new();
    assert!(!values.has("missing"));
    assert!(matches!(
        render("[missing]", &values),
        Err(Error::Eval(EvalError::PlaceholderNotFound(_)))
    ));
}

#[test]
fn empty_placeholder_is_a_parse_error() {
    let values = PlaceholderRegistry::new();
    assert!(matches!(render("a [] b", &values), Err(Error::Parse(_))));
}
