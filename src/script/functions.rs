//! Named functions callable from templates, looked up case-insensitively.

use std::collections::HashMap;
use std::fmt;

use super::eval::{bool_str, format_number, is_truthy, parse_number, EvalError};

/// A template function. Receives its evaluated arguments; for pipes the piped
/// value is the first argument.
pub type ScriptFunction = Box<dyn Fn(&[String]) -> Result<String, EvalError>>;

#[derive(Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, ScriptFunction>,
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.functions.keys().collect();
        names.sort();
        f.debug_struct("FunctionRegistry").field("functions", &names).finish()
    }
}

impl FunctionRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in functions.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        register_builtins(&mut registry);
        registry
    }

    /// Register (or replace) a function.
    pub fn register<F>(&mut self, name: &str, function: F)
    where
        F: Fn(&[String]) -> Result<String, EvalError> + 'static,
    {
        self.functions.insert(name.to_lowercase(), Box::new(function));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(&name.to_lowercase())
    }

    pub fn call(&self, name: &str, args: &[String]) -> Result<String, EvalError> {
        let function = self
            .functions
            .get(&name.to_lowercase())
            .ok_or_else(|| EvalError::FunctionNotFound(name.to_string()))?;
        function(args)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn invalid(function: &str, message: impl Into<String>) -> EvalError {
    EvalError::InvalidArgument {
        function: function.to_string(),
        message: message.into(),
    }
}

fn arg<'a>(function: &str, args: &'a [String], index: usize) -> Result<&'a str, EvalError> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| invalid(function, format!("missing argument {}", index + 1)))
}

fn num_arg(function: &str, args: &[String], index: usize) -> Result<f64, EvalError> {
    let value = arg(function, args, index)?;
    parse_number(value).ok_or_else(|| invalid(function, format!("'{}' is not a number", value)))
}

fn opt_num_arg(function: &str, args: &[String], index: usize) -> Result<Option<f64>, EvalError> {
    match args.get(index) {
        Some(_) => num_arg(function, args, index).map(Some),
        None => Ok(None),
    }
}

/// Largest width or length accepted by `pad` and `substr`.
pub const MAX_COUNT: usize = 4096;

/// Most decimal digits `round` will produce; beyond this `f64` has no
/// precision left.
pub const MAX_DIGITS: usize = 17;

fn count_arg(
    function: &str,
    args: &[String],
    index: usize,
    max: usize,
) -> Result<Option<usize>, EvalError> {
    match opt_num_arg(function, args, index)? {
        Some(n) if n < 0.0 => Err(invalid(function, "expected a non-negative count")),
        Some(n) if !n.is_finite() || n > max as f64 => {
            Err(invalid(function, format!("{} exceeds the limit of {}", n, max)))
        }
        Some(n) => Ok(Some(n as usize)),
        None => Ok(None),
    }
}

fn register_builtins(r: &mut FunctionRegistry) {
    r.register("upper", |a| Ok(arg("upper", a, 0)?.to_uppercase()));
    r.register("lower", |a| Ok(arg("lower", a, 0)?.to_lowercase()));
    r.register("trim", |a| Ok(arg("trim", a, 0)?.trim().to_string()));
    r.register("length", |a| Ok(arg("length", a, 0)?.chars().count().to_string()));
    r.register("not", |a| Ok(bool_str(!is_truthy(arg("not", a, 0)?)).to_string()));

    r.register("round", |a| {
        let value = num_arg("round", a, 0)?;
        match count_arg("round", a, 1, MAX_DIGITS)? {
            Some(digits) if digits > 0 => Ok(format!("{:.*}", digits, value)),
            _ => Ok(format_number(value.round())),
        }
    });
    r.register("floor", |a| Ok(format_number(num_arg("floor", a, 0)?.floor())));
    r.register("ceil", |a| Ok(format_number(num_arg("ceil", a, 0)?.ceil())));
    r.register("abs", |a| Ok(format_number(num_arg("abs", a, 0)?.abs())));

    r.register("max", |a| fold_numbers("max", a, f64::max));
    r.register("min", |a| fold_numbers("min", a, f64::min));

    r.register("pad", |a| {
        let value = arg("pad", a, 0)?;
        let width = count_arg("pad", a, 1, MAX_COUNT)?.ok_or_else(|| invalid("pad", "missing width"))?;
        let fill = a.get(2).and_then(|f| f.chars().next()).unwrap_or(' ');
        let len = value.chars().count();
        let mut out: String = std::iter::repeat(fill).take(width.saturating_sub(len)).collect();
        out.push_str(value);
        Ok(out)
    });

    r.register("default", |a| {
        let value = arg("default", a, 0)?;
        if value.trim().is_empty() {
            Ok(arg("default", a, 1)?.to_string())
        } else {
            Ok(value.to_string())
        }
    });

    r.register("replace", |a| {
        let value = arg("replace", a, 0)?;
        let from = arg("replace", a, 1)?;
        let to = arg("replace", a, 2)?;
        if from.is_empty() {
            return Err(invalid("replace", "pattern must not be empty"));
        }
        Ok(value.replace(from, to))
    });

    r.register("substr", |a| {
        let value = arg("substr", a, 0)?;
        let start = count_arg("substr", a, 1, MAX_COUNT)?.unwrap_or(0);
        let chars = value.chars().skip(start);
        Ok(match count_arg("substr", a, 2, MAX_COUNT)? {
            Some(len) => chars.take(len).collect(),
            None => chars.collect(),
        })
    });
}

fn fold_numbers(name: &str, args: &[String], f: fn(f64, f64) -> f64) -> Result<String, EvalError> {
    let mut acc = num_arg(name, args, 0)?;
    for index in 1..args.len() {
        acc = f(acc, num_arg(name, args, index)?);
    }
    Ok(format_number(acc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[&str]) -> Result<String, EvalError> {
        let registry = FunctionRegistry::with_builtins();
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        registry.call(name, &args)
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(call("UPPER", &["abc"]).unwrap(), "ABC");
        assert_eq!(call("Lower", &["AbC"]).unwrap(), "abc");
    }

    #[test]
    fn unknown_function() {
        assert_eq!(
            call("frobnicate", &["x"]),
            Err(EvalError::FunctionNotFound("frobnicate".to_string()))
        );
    }

    #[test]
    fn numeric_helpers() {
        assert_eq!(call("round", &["2.5"]).unwrap(), "3");
        assert_eq!(call("round", &["2.346", "2"]).unwrap(), "2.35");
        assert_eq!(call("floor", &["2.9"]).unwrap(), "2");
        assert_eq!(call("ceil", &["2.1"]).unwrap(), "3");
        assert_eq!(call("abs", &["-4"]).unwrap(), "4");
        assert_eq!(call("max", &["1", "7", "3"]).unwrap(), "7");
        assert_eq!(call("min", &["1", "-7"]).unwrap(), "-7");
    }

    #[test]
    fn string_helpers() {
        assert_eq!(call("pad", &["7", "3", "0"]).unwrap(), "007");
        assert_eq!(call("pad", &["1234", "3"]).unwrap(), "1234");
        assert_eq!(call("default", &["", "n/a"]).unwrap(), "n/a");
        assert_eq!(call("default", &["x", "n/a"]).unwrap(), "x");
        assert_eq!(call("replace", &["a-b-c", "-", "+"]).unwrap(), "a+b+c");
        assert_eq!(call("substr", &["héllo", "1", "3"]).unwrap(), "éll");
        assert_eq!(call("length", &["héllo"]).unwrap(), "5");
        assert_eq!(call("not", &["0"]).unwrap(), "true");
    }

    #[test]
    fn bad_arguments() {
        assert!(matches!(
            call("round", &["abc"]),
            Err(EvalError::InvalidArgument { .. })
        ));
        assert!(matches!(call("upper", &[]), Err(EvalError::InvalidArgument { .. })));
        assert!(matches!(
            call("pad", &["x", "-1"]),
            Err(EvalError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn oversized_counts_are_rejected() {
        for (name, args) in [
            ("pad", &["x", "99999999999999999999"][..]),
            ("pad", &["x", "4097"]),
            ("substr", &["abc", "1e300"]),
            ("substr", &["abc", "0", "5000"]),
            ("round", &["1.5", "70000"]),
            ("round", &["1.5", "18"]),
        ] {
            assert!(
                matches!(call(name, args), Err(EvalError::InvalidArgument { .. })),
                "{name} {args:?}"
            );
        }
        assert_eq!(call("pad", &["x", "4096"]).unwrap().chars().count(), 4096);
        assert_eq!(call("round", &["0.5", "17"]).unwrap(), "0.50000000000000000");
    }
}
