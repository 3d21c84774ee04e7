//! Template tokenizer.
//!
//! Outside of placeholders everything up to the next `[` that opens a valid
//! placeholder is a single text token. Inside a placeholder the tokenizer
//! recognizes numbers, quoted literals, identifiers and single-character
//! operators. Anomalies inside a placeholder are logged, recorded on the
//! stream and skipped; tokenizing never fails.

use super::token::{LexWarning, Token, TokenKind, TokenStream};

/// Tokenize a template string.
pub fn tokenize(input: &str) -> TokenStream {
    let mut lexer = Lexer::new(input);
    lexer.run();
    TokenStream {
        tokens: lexer.tokens,
        warnings: lexer.warnings,
        source_len: input.len(),
    }
}

struct Lexer<'a> {
    src: &'a str,
    chars: Vec<(usize, char)>,
    /// For each `[`, the index of its matching `]`.
    closing: Vec<Option<usize>>,
    pos: usize,
    tokens: Vec<Token>,
    warnings: Vec<LexWarning>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        let chars: Vec<(usize, char)> = src.char_indices().collect();
        let closing = match_brackets(&chars);
        Self {
            src,
            chars,
            closing,
            pos: 0,
            tokens: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Byte offset of the char at `idx` (or the end of the source).
    fn offset(&self, idx: usize) -> usize {
        self.chars.get(idx).map(|&(o, _)| o).unwrap_or(self.src.len())
    }

    fn char_at(&self, idx: usize) -> Option<char> {
        self.chars.get(idx).map(|&(_, c)| c)
    }

    fn warn(&mut self, idx: usize, message: String) {
        let offset = self.offset(idx);
        tracing::warn!(offset, "{}", message);
        self.warnings.push(LexWarning { message, offset });
    }

    fn run(&mut self) {
        while self.pos < self.chars.len() {
            if self.char_at(self.pos) == Some('[') {
                if let Some(close) = self.find_closing(self.pos) {
                    self.lex_placeholder(close);
                    continue;
                }
            }
            self.lex_text();
        }
    }

    /// Index of the `]` matching the `[` at `open`.
    fn find_closing(&self, open: usize) -> Option<usize> {
        self.closing.get(open).copied().flatten()
    }

    fn lex_text(&mut self) {
        let start = self.pos;
        // The first char is always consumed: it may be a `[` that opens nothing.
        self.pos += 1;
        while self.pos < self.chars.len() {
            if self.char_at(self.pos) == Some('[') && self.find_closing(self.pos).is_some() {
                break;
            }
            self.pos += 1;
        }
        let (from, to) = (self.offset(start), self.offset(self.pos));
        self.tokens
            .push(Token::new(TokenKind::Text, &self.src[from..to], from, to));
    }

    fn push_single(&mut self, kind: TokenKind) {
        let (from, to) = (self.offset(self.pos), self.offset(self.pos + 1));
        self.tokens
            .push(Token::new(kind, &self.src[from..to], from, to));
        self.pos += 1;
    }

    fn lex_placeholder(&mut self, close: usize) {
        self.push_single(TokenKind::OpenBracket);

        while self.pos < close {
            let Some(c) = self.char_at(self.pos) else { break };
            if c.is_whitespace() {
                self.pos += 1;
            } else if c == '[' {
                match self.find_closing(self.pos) {
                    Some(inner) if inner < close => self.lex_placeholder(inner),
                    _ => {
                        self.warn(self.pos, "unbalanced '[' inside placeholder".to_string());
                        self.pos += 1;
                    }
                }
            } else if c == '\'' || c == '"' {
                self.lex_string(c, close);
            } else if c.is_ascii_digit() || c == '.' {
                self.lex_number();
            } else if c.is_alphabetic() || c == '_' {
                self.lex_identifier();
            } else if let Some(kind) = TokenKind::from_operator(c) {
                self.push_single(kind);
            } else {
                self.warn(self.pos, format!("unexpected character '{}' in placeholder", c));
                self.pos += 1;
            }
        }

        self.pos = close;
        self.push_single(TokenKind::CloseBracket);
    }

    fn lex_string(&mut self, quote: char, limit: usize) {
        let start = self.pos;
        self.pos += 1;
        let mut value = String::new();
        let mut closed = false;

        while self.pos < limit {
            let Some(c) = self.char_at(self.pos) else { break };
            if c == '\\' {
                match self.char_at(self.pos + 1) {
                    Some(next) if self.pos + 1 < limit && (next == quote || next == '\\') => {
                        value.push(next);
                        self.pos += 2;
                    }
                    _ => {
                        value.push(c);
                        self.pos += 1;
                    }
                }
                continue;
            }
            self.pos += 1;
            if c == quote {
                closed = true;
                break;
            }
            value.push(c);
        }

        if !closed {
            self.warn(start, "unterminated string literal".to_string());
        }
        let (from, to) = (self.offset(start), self.offset(self.pos));
        self.tokens.push(Token::new(TokenKind::Text, value, from, to));
    }

    fn lex_number(&mut self) {
        let start = self.pos;
        while matches!(self.char_at(self.pos), Some(c) if c.is_ascii_digit() || c == '.') {
            self.pos += 1;
        }
        let (from, to) = (self.offset(start), self.offset(self.pos));
        let text = &self.src[from..to];
        let dots = text.matches('.').count();
        if dots > 1 || text == "." {
            self.warn(start, format!("malformed number '{}'", text));
            return;
        }
        self.tokens.push(Token::new(TokenKind::Number, text, from, to));
    }

    fn lex_identifier(&mut self) {
        let start = self.pos;
        while matches!(self.char_at(self.pos), Some(c) if c.is_alphanumeric() || c == '_' || c == '.')
        {
            self.pos += 1;
        }
        let (from, to) = (self.offset(start), self.offset(self.pos));
        self.tokens
            .push(Token::new(TokenKind::Identifier, &self.src[from..to], from, to));
    }
}

/// Pair every `[` with its `]` in one pass. Quotes only count between
/// brackets, so apostrophes in plain text never hide a placeholder; inside an
/// open bracket a quoted literal hides brackets until its closing quote.
fn match_brackets(chars: &[(usize, char)]) -> Vec<Option<usize>> {
    let mut closing = vec![None; chars.len()];
    let mut open: Vec<usize> = Vec::new();
    let mut quote: Option<char> = None;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i].1;
        match quote {
            Some(q) => {
                if c == '\\' {
                    i += 1;
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' if !open.is_empty() => quote = Some(c),
                '[' => open.push(i),
                ']' => {
                    if let Some(start) = open.pop() {
                        closing[start] = Some(i);
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }
    closing
}
