//! Recursive-descent parser from a token stream to an [`Expr`] tree.
//!
//! Precedence, loosest first: `+` concatenation, `|` pipes, `? :` ternaries,
//! `< > =` comparisons, juxtaposed function calls, primaries.

use thiserror::Error;

use super::ast::{CompareOp, Expr};
use super::token::{Token, TokenKind, TokenStream};

/// Hard parse failure. Offsets are byte offsets into the template source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected {expected}, found '{found}' at offset {offset}")]
    UnexpectedToken {
        expected: String,
        found: String,
        offset: usize,
    },

    #[error("expected {expected}, found end of template at offset {offset}")]
    UnexpectedEnd { expected: String, offset: usize },

    #[error("empty placeholder at offset {offset}")]
    EmptyPlaceholder { offset: usize },
}

impl ParseError {
    pub fn offset(&self) -> usize {
        match self {
            Self::UnexpectedToken { offset, .. }
            | Self::UnexpectedEnd { offset, .. }
            | Self::EmptyPlaceholder { offset } => *offset,
        }
    }
}

/// Parse a whole template.
pub fn parse(stream: &TokenStream) -> Result<Expr, ParseError> {
    Parser::new(stream).parse_template()
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    source_len: usize,
}

impl<'a> Parser<'a> {
    fn new(stream: &'a TokenStream) -> Self {
        Self {
            tokens: &stream.tokens,
            pos: 0,
            source_len: stream.source_len,
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn error(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: token.text.clone(),
                offset: token.start,
            },
            None => ParseError::UnexpectedEnd {
                expected: expected.to_string(),
                offset: self.source_len,
            },
        }
    }

    fn consume_one_of(&mut self, kinds: &[TokenKind], expected: &str) -> Result<&'a Token, ParseError> {
        match self.peek() {
            Some(token) if kinds.contains(&token.kind) => {
                self.pos += 1;
                Ok(token)
            }
            _ => Err(self.error(expected)),
        }
    }

    fn consume(&mut self, kind: TokenKind) -> Result<&'a Token, ParseError> {
        self.consume_one_of(&[kind], kind.as_str())
    }

    fn parse_template(&mut self) -> Result<Expr, ParseError> {
        let mut parts = Vec::new();
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Text => {
                    self.pos += 1;
                    parts.push(Expr::Text(token.text.clone()));
                }
                TokenKind::OpenBracket => parts.push(self.parse_placeholder()?),
                _ => return Err(self.error("text or placeholder")),
            }
        }
        Ok(match parts.len() {
            0 => Expr::Text(String::new()),
            1 => parts.remove(0),
            _ => Expr::Concat(parts),
        })
    }

    fn parse_placeholder(&mut self) -> Result<Expr, ParseError> {
        let open = self.consume(TokenKind::OpenBracket)?;
        if self.at(TokenKind::CloseBracket) {
            return Err(ParseError::EmptyPlaceholder { offset: open.start });
        }
        let expr = self.parse_concat()?;
        self.consume(TokenKind::CloseBracket)?;
        Ok(expr)
    }

    fn parse_concat(&mut self) -> Result<Expr, ParseError> {
        let mut parts = vec![self.parse_pipe()?];
        while self.at(TokenKind::Plus) {
            self.pos += 1;
            parts.push(self.parse_pipe()?);
        }
        Ok(if parts.len() == 1 {
            parts.remove(0)
        } else {
            Expr::Concat(parts)
        })
    }

    fn parse_pipe(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_ternary()?;
        while self.at(TokenKind::Pipe) {
            self.pos += 1;
            let name = self
                .consume_one_of(&[TokenKind::Identifier], "function name")?
                .text
                .clone();
            let args = self.parse_arguments()?;
            expr = Expr::Pipe {
                input: Box::new(expr),
                name,
                args,
            };
        }
        Ok(expr)
    }

    fn parse_ternary(&mut self) -> Result<Expr, ParseError> {
        let condition = self.parse_comparison()?;
        if !self.at(TokenKind::QuestionMark) {
            return Ok(condition);
        }
        self.pos += 1;
        let when_true = self.parse_ternary()?;
        let when_false = if self.at(TokenKind::Colon) {
            self.pos += 1;
            Some(Box::new(self.parse_ternary()?))
        } else {
            None
        };
        Ok(Expr::Ternary {
            condition: Box::new(condition),
            when_true: Box::new(when_true),
            when_false,
        })
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_call()?;
        let op = match self.peek_kind() {
            Some(TokenKind::LessThan) => CompareOp::Less,
            Some(TokenKind::GreaterThan) => CompareOp::Greater,
            Some(TokenKind::Equals) => CompareOp::Equal,
            _ => return Ok(left),
        };
        self.pos += 1;
        let right = self.parse_call()?;
        Ok(Expr::Comparison {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_call(&mut self) -> Result<Expr, ParseError> {
        let is_call = self.at(TokenKind::Identifier)
            && self
                .tokens
                .get(self.pos + 1)
                .is_some_and(|t| starts_primary(t.kind));
        if !is_call {
            return self.parse_primary();
        }
        let name = self.consume(TokenKind::Identifier)?.text.clone();
        let args = self.parse_arguments()?;
        Ok(Expr::Function { name, args })
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        while self.peek_kind().is_some_and(starts_primary) {
            args.push(self.parse_primary()?);
        }
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        if self.at(TokenKind::OpenBracket) {
            return self.parse_placeholder();
        }
        let token = self.consume_one_of(
            &[TokenKind::Text, TokenKind::Number, TokenKind::Identifier],
            "value",
        )?;
        Ok(match token.kind {
            TokenKind::Text => Expr::Text(token.text.clone()),
            TokenKind::Identifier => Expr::Identifier(token.text.clone()),
            _ => {
                let value = token.text.parse::<f64>().map_err(|_| ParseError::UnexpectedToken {
                    expected: "number".to_string(),
                    found: token.text.clone(),
                    offset: token.start,
                })?;
                Expr::Number {
                    literal: token.text.clone(),
                    value,
                }
            }
        })
    }
}

fn starts_primary(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Text | TokenKind::Number | TokenKind::Identifier | TokenKind::OpenBracket
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::tokenize;

    fn parse_str(src: &str) -> Result<Expr, ParseError> {
        parse(&tokenize(src))
    }

    fn sexpr(src: &str) -> String {
        parse_str(src).expect("template should parse").to_string()
    }

    #[test]
    fn plain_text() {
        assert_eq!(parse_str("hello").unwrap(), Expr::text("hello"));
        assert_eq!(parse_str("").unwrap(), Expr::text(""));
    }

    #[test]
    fn text_and_placeholder_concat() {
        assert_eq!(sexpr("Lv. [player.level]!"), r#"(concat "Lv. " player.level "!")"#);
    }

    #[test]
    fn ternary_with_comparison() {
        assert_eq!(
            sexpr("[player.level > 10 ? 'high' : 'low']"),
            r#"(? (> player.level 10) "high" "low")"#
        );
    }

    #[test]
    fn ternary_without_false_branch() {
        assert_eq!(sexpr("[flag ? 'on']"), r#"(? flag "on")"#);
    }

    #[test]
    fn pipe_binds_looser_than_ternary() {
        assert_eq!(
            sexpr("[a ? b : c | upper]"),
            "(| (? a b c) upper)"
        );
    }

    #[test]
    fn concat_binds_loosest() {
        assert_eq!(
            sexpr("['Lv ' + level | pad 3 '0']"),
            r#"(concat "Lv " (| level pad 3 "0"))"#
        );
    }

    #[test]
    fn function_call_by_juxtaposition() {
        assert_eq!(sexpr("[upper name]"), "(upper name)");
        assert_eq!(sexpr("[max a 3 = 3]"), "(= (max a 3) 3)");
    }

    #[test]
    fn nested_placeholder() {
        assert_eq!(sexpr("[a ? [b] : 'x']"), r#"(? a b "x")"#);
    }

    #[test]
    fn chained_pipes() {
        assert_eq!(sexpr("[name | trim | upper]"), "(| (| name trim) upper)");
    }

    #[test]
    fn empty_placeholder_is_error() {
        assert_eq!(
            parse_str("ab[]"),
            Err(ParseError::EmptyPlaceholder { offset: 2 })
        );
    }

    #[test]
    fn missing_operand_reports_offset() {
        let err = parse_str("[a > ]").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedToken {
                expected: "value".to_string(),
                found: "]".to_string(),
                offset: 5,
            }
        );
    }

    #[test]
    fn pipe_requires_function_name() {
        let err = parse_str("[a | 5]").unwrap_err();
        assert_eq!(err.offset(), 5);
        assert!(err.to_string().contains("function name"));
    }

    #[test]
    fn premature_end_of_stream() {
        let stream = TokenStream {
            tokens: vec![
                Token::new(TokenKind::OpenBracket, "[", 0, 1),
                Token::new(TokenKind::Identifier, "a", 1, 2),
            ],
            warnings: Vec::new(),
            source_len: 2,
        };
        assert_eq!(
            parse(&stream),
            Err(ParseError::UnexpectedEnd {
                expected: "']'".to_string(),
                offset: 2,
            })
        );
    }

    #[test]
    fn dangling_operator_is_error() {
        assert!(parse_str("[a ? 'x' :]").is_err());
        assert!(parse_str("[+ a]").is_err());
    }
}
