//! Compiled templates and a cache keyed by source text.

use std::collections::HashMap;
use std::sync::Arc;

use super::ast::Expr;
use super::eval::Evaluator;
use super::parser::{parse, ParseError};
use super::token::LexWarning;
use super::tokenizer::tokenize;
use crate::Result;

/// A template string compiled once into an expression tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    compiled: std::result::Result<Expr, ParseError>,
    warnings: Vec<LexWarning>,
}

impl Template {
    /// Compile a template, failing on parse errors.
    pub fn compile(source: &str) -> std::result::Result<Self, ParseError> {
        let template = Self::compile_lenient(source);
        match &template.compiled {
            Ok(_) => Ok(template),
            Err(e) => Err(e.clone()),
        }
    }

    /// Compile a template, keeping a parse failure around so the template
    /// renders as its literal source instead.
    pub fn compile_lenient(source: &str) -> Self {
        let stream = tokenize(source);
        let compiled = parse(&stream);
        if let Err(e) = &compiled {
            tracing::debug!("template {:?} failed to compile: {}", source, e);
        }
        Self {
            source: source.to_string(),
            compiled,
            warnings: stream.warnings,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> Option<&Expr> {
        self.compiled.as_ref().ok()
    }

    pub fn parse_error(&self) -> Option<&ParseError> {
        self.compiled.as_ref().err()
    }

    pub fn warnings(&self) -> &[LexWarning] {
        &self.warnings
    }

    /// Placeholder names this template reads.
    pub fn dependencies(&self) -> Vec<&str> {
        self.expr().map(Expr::identifiers).unwrap_or_default()
    }

    pub fn render(&self, evaluator: &Evaluator<'_>) -> Result<String> {
        let expr = self.compiled.as_ref().map_err(|e| e.clone())?;
        Ok(evaluator.evaluate(expr)?)
    }

    /// Render for display: a template that failed to compile shows its source
    /// text, an evaluation failure shows `fallback`.
    pub fn render_or_fallback(&self, evaluator: &Evaluator<'_>, fallback: &str) -> String {
        let Ok(expr) = &self.compiled else {
            return self.source.clone();
        };
        match evaluator.evaluate(expr) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!("template {:?} failed to render: {}", self.source, e);
                fallback.to_string()
            }
        }
    }
}

/// Compiles each distinct template source once.
#[derive(Debug, Default)]
pub struct TemplateCache {
    entries: HashMap<String, Arc<Template>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compile(&mut self, source: &str) -> Arc<Template> {
        if let Some(template) = self.entries.get(source) {
            return Arc::clone(template);
        }
        let template = Arc::new(Template::compile_lenient(source));
        self.entries.insert(source.to_string(), Arc::clone(&template));
        template
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
