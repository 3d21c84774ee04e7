//! Placeholder template language: tokenizer, parser and evaluator.
//!
//! Templates are plain text with bracketed expressions:
//!
//! ```text
//! Lv. [player.level]  [player.level > 10 ? 'high' : 'low' | upper]
//! ```

pub mod ast;
pub mod eval;
pub mod functions;
pub mod parser;
pub mod template;
pub mod token;
pub mod tokenizer;

pub use ast::{CompareOp, Expr};
pub use eval::{is_truthy, EvalError, Evaluator, ValueSource};
pub use functions::{FunctionRegistry, ScriptFunction};
pub use parser::{parse, ParseError};
pub use template::{Template, TemplateCache};
pub use token::{LexWarning, Token, TokenKind, TokenStream};
pub use tokenizer::tokenize;

/// Tokenize and parse a template in one step.
pub fn parse_template(source: &str) -> Result<Expr, ParseError> {
    parse(&tokenize(source))
}
