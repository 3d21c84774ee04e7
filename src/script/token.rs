//! Token types produced by the template tokenizer.

use std::fmt;

/// Kind of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Literal text: a run outside placeholders, or a quoted string inside one.
    Text,
    Identifier,
    Number,
    OpenBracket,
    CloseBracket,
    Pipe,
    QuestionMark,
    Colon,
    Plus,
    Equals,
    LessThan,
    GreaterThan,
}

impl TokenKind {
    /// Operator kind for a single character inside a placeholder.
    pub fn from_operator(c: char) -> Option<Self> {
        match c {
            '|' => Some(Self::Pipe),
            '?' => Some(Self::QuestionMark),
            ':' => Some(Self::Colon),
            '+' => Some(Self::Plus),
            '=' => Some(Self::Equals),
            '<' => Some(Self::LessThan),
            '>' => Some(Self::GreaterThan),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Identifier => "identifier",
            Self::Number => "number",
            Self::OpenBracket => "'['",
            Self::CloseBracket => "']'",
            Self::Pipe => "'|'",
            Self::QuestionMark => "'?'",
            Self::Colon => "':'",
            Self::Plus => "'+'",
            Self::Equals => "'='",
            Self::LessThan => "'<'",
            Self::GreaterThan => "'>'",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A token with its source text and byte range.
///
/// For quoted literals `text` holds the unescaped contents while
/// `start..end` still spans the quotes in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            start,
            end,
        }
    }
}

/// A recoverable anomaly found while tokenizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexWarning {
    pub message: String,
    pub offset: usize,
}

/// Tokenizer output: the tokens plus any warnings raised along the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenStream {
    pub tokens: Vec<Token>,
    pub warnings: Vec<LexWarning>,
    /// Length of the source in bytes, used as the offset for end-of-input errors.
    pub source_len: usize,
}

impl TokenStream {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn kinds(&self) -> Vec<TokenKind> {
        self.tokens.iter().map(|t| t.kind).collect()
    }
}
