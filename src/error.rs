use thiserror::Error;

use crate::script::{EvalError, ParseError};
use crate::style::SelectorError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Template parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Template evaluation error: {0}")]
    Eval(#[from] EvalError),

    #[error("Invalid selector: {0}")]
    Selector(#[from] SelectorError),

    #[error("Placeholder already registered: {0}")]
    DuplicatePlaceholder(String),

    #[error("Node not found: {0}")]
    NodeNotFound(u64),

    #[error("Cannot attach node {child} under {parent}: would create a cycle")]
    InvalidHierarchy { parent: u64, child: u64 },

    #[error("Unknown widget kind: {0}")]
    UnknownWidgetKind(String),

    #[error("Widget not found: {0}")]
    UnknownWidget(String),

    #[error("Widget already exists: {0}")]
    DuplicateWidget(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
