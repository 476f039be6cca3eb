//! `${variable}` expansion for catalog values.
//!
//! Paths and command fragments in a catalog refer to settings such as
//! `${tools_dir}` or `${venv_path}` instead of hard-coding them.
//!
//! - `${name}` is replaced with the variable's value
//! - `$${name}` produces a literal `${name}`
//! - a lone `$` is kept as is, so shell snippets like `$HOME` pass through

use crate::error::{ArmoryError, Result};
use std::collections::HashMap;

/// A piece of a parsed template string.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text
    Literal(String),
    /// Variable reference: ${name}
    Variable(String),
}

/// Split a template string into literal and variable segments.
pub fn parse_interpolation(input: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        literal.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(after) = tail.strip_prefix("$${") {
            // Escaped reference: keep `${...}` verbatim.
            let end = after.find('}').map(|i| i + 1).unwrap_or(after.len());
            literal.push_str("${");
            literal.push_str(&after[..end]);
            rest = &after[end..];
        } else if let Some(after) = tail.strip_prefix("${") {
            match after.find('}') {
                Some(end) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Variable(after[..end].trim().to_string()));
                    rest = &after[end + 1..];
                }
                None => {
                    // Unterminated reference stays literal.
                    literal.push_str(tail);
                    rest = "";
                }
            }
        } else {
            literal.push('$');
            rest = &tail[1..];
        }
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

/// Variables available to catalog templates.
///
/// Lookup order: explicit variables (settings and `vars`), then builtins
/// (`home`, `armory_version`).
#[derive(Debug, Default, Clone)]
pub struct InterpolationContext {
    vars: HashMap<String, String>,
    builtins: HashMap<String, String>,
}

impl InterpolationContext {
    /// Create a context holding only the builtin variables.
    pub fn new() -> Self {
        let mut builtins = HashMap::new();
        builtins.insert(
            "armory_version".to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
        );
        if let Some(home) = dirs::home_dir() {
            builtins.insert("home".to_string(), home.display().to_string());
        }
        Self {
            vars: HashMap::new(),
            builtins,
        }
    }

    /// Set a variable, overriding any builtin of the same name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Look up a variable.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .or_else(|| self.builtins.get(name))
            .map(String::as_str)
    }
}

/// Expand every `${name}` in `input`.
///
/// # Errors
///
/// Returns `ConfigValidationError` naming the first unresolved variable.
pub fn resolve_string(input: &str, ctx: &InterpolationContext) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    for segment in parse_interpolation(input) {
        match segment {
            Segment::Literal(text) => out.push_str(&text),
            Segment::Variable(name) => {
                let value = ctx
                    .resolve(&name)
                    .ok_or_else(|| ArmoryError::ConfigValidationError {
                        message: format!("Unresolved variable: ${{{}}}", name),
                    })?;
                out.push_str(value);
            }
        }
    }
    Ok(out)
}
