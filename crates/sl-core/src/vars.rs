//! `${NAME}` expansion in migration statements

use crate::error::{CoreError, CoreResult};
use regex::Regex;
use std::sync::OnceLock;

static VARIABLE_RE: OnceLock<Regex> = OnceLock::new();

fn variable_re() -> &'static Regex {
    VARIABLE_RE.get_or_init(|| Regex::new(r"\$\{([^\$\{\}]*)\}").expect("valid regex"))
}

/// Replace every `${NAME}` in `statement` with `lookup(NAME)`.
///
/// A `${` with no closing `}` and a variable that resolves to nothing or to
/// an empty string are both errors.
pub fn expand_variables<F>(statement: &str, lookup: F) -> CoreResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut expanded = String::with_capacity(statement.len());
    let mut last = 0;

    for caps in variable_re().captures_iter(statement) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };

        let value = lookup(name.as_str())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| CoreError::UndefinedVariable {
                name: name.as_str().to_string(),
            })?;

        let literal = &statement[last..whole.start()];
        check_terminated(literal, statement)?;
        expanded.push_str(literal);
        expanded.push_str(&value);
        last = whole.end();
    }

    let tail = &statement[last..];
    check_terminated(tail, statement)?;
    expanded.push_str(tail);
    Ok(expanded)
}

fn check_terminated(literal: &str, statement: &str) -> CoreResult<()> {
    if literal.contains("${") {
        return Err(CoreError::UnterminatedVariable {
            statement: statement.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "vars_test.rs"]
mod tests;
