//! Expression tree produced by the template parser.

use std::fmt;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Less,
    Greater,
    Equal,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Less => "<",
            Self::Greater => ">",
            Self::Equal => "=",
        }
    }
}

/// A parsed template expression.
///
/// The tree owns its children exclusively and holds no references back into
/// the token stream, so it can be cached or handed to another thread.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal text, either outside a placeholder or a quoted literal.
    Text(String),
    /// Numeric literal; keeps the source spelling for rendering.
    Number { literal: String, value: f64 },
    /// Reference to a placeholder by name.
    Identifier(String),
    /// Call of a named function with argument expressions.
    Function { name: String, args: Vec<Expr> },
    Comparison {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Parts rendered in order and joined without a separator.
    Concat(Vec<Expr>),
    /// `input | name args...`: the input becomes the first argument.
    Pipe {
        input: Box<Expr>,
        name: String,
        args: Vec<Expr>,
    },
    Ternary {
        condition: Box<Expr>,
        when_true: Box<Expr>,
        when_false: Option<Box<Expr>>,
    },
}

impl Expr {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn ident(s: impl Into<String>) -> Self {
        Self::Identifier(s.into())
    }

    /// Collect the placeholder names referenced anywhere in the tree.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_identifiers(&mut out);
        out
    }

    fn collect_identifiers<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Text(_) | Self::Number { .. } => {}
            Self::Identifier(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Self::Function { args, .. } => args.iter().for_each(|a| a.collect_identifiers(out)),
            Self::Comparison { left, right, .. } => {
                left.collect_identifiers(out);
                right.collect_identifiers(out);
            }
            Self::Concat(parts) => parts.iter().for_each(|p| p.collect_identifiers(out)),
            Self::Pipe { input, args, .. } => {
                input.collect_identifiers(out);
                args.iter().for_each(|a| a.collect_identifiers(out));
            }
            Self::Ternary {
                condition,
                when_true,
                when_false,
            } => {
                condition.collect_identifiers(out);
                when_true.collect_identifiers(out);
                if let Some(f) = when_false {
                    f.collect_identifiers(out);
                }
            }
        }
    }
}

/// S-expression rendering, used by the CLI `parse` command and in tests.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{:?}", s),
            Self::Number { literal, .. } => f.write_str(literal),
            Self::Identifier(name) => f.write_str(name),
            Self::Function { name, args } => {
                write!(f, "({}", name)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                f.write_str(")")
            }
            Self::Comparison { op, left, right } => {
                write!(f, "({} {} {})", op.as_str(), left, right)
            }
            Self::Concat(parts) => {
                f.write_str("(concat")?;
                for part in parts {
                    write!(f, " {}", part)?;
                }
                f.write_str(")")
            }
            Self::Pipe { input, name, args } => {
                write!(f, "(| {} {}", input, name)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                f.write_str(")")
            }
            Self::Ternary {
                condition,
                when_true,
                when_false,
            } => {
                write!(f, "(? {} {}", condition, when_true)?;
                if let Some(when_false) = when_false {
                    write!(f, " {}", when_false)?;
                }
                f.write_str(")")
            }
        }
    }
}
