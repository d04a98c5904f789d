//! Type-safe `when` conditions.
//!
//! A [`Condition`] wraps the expression string the engine evaluates at run
//! time. Constructors produce the canonical forms and combinators wrap each
//! operand in parentheses, so composed conditions never depend on operator
//! precedence.

use crate::explain::ExplainContext;
use globset::Glob;
use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

/// A `when` expression for a task or gate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Condition(String);

/// Outcome of evaluating a condition against an [`ExplainContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// The condition holds; the task would run.
    Run,
    /// The condition fails; the task would be skipped.
    Skip,
    /// The expression is outside what explain mode understands.
    Unknown,
}

impl Condition {
    /// Wrap an arbitrary expression.
    pub fn raw(expr: impl Into<String>) -> Self {
        Self(expr.into())
    }

    /// Match the current branch. Patterns containing `*` use glob matching.
    #[must_use]
    pub fn branch(pattern: &str) -> Self {
        Self::field_match("branch", pattern)
    }

    /// Match the current tag. Patterns containing `*` use glob matching.
    #[must_use]
    pub fn tag(pattern: &str) -> Self {
        Self::field_match("tag", pattern)
    }

    /// True when the build was triggered by any tag.
    #[must_use]
    pub fn has_tag() -> Self {
        Self("tag != ''".to_string())
    }

    /// Match the triggering event (e.g. `push`, `pull_request`).
    #[must_use]
    pub fn event(kind: &str) -> Self {
        Self(format!("event == '{kind}'"))
    }

    /// True when running under CI.
    #[must_use]
    pub fn in_ci() -> Self {
        Self("ci == true".to_string())
    }

    /// Logical negation.
    #[must_use]
    pub fn negate(condition: &Self) -> Self {
        Self(format!("!({})", condition.0))
    }

    /// Logical OR with another condition.
    #[must_use]
    pub fn or(&self, other: &Self) -> Self {
        Self(format!("({}) || ({})", self.0, other.0))
    }

    /// Logical AND with another condition.
    #[must_use]
    pub fn and(&self, other: &Self) -> Self {
        Self(format!("({}) && ({})", self.0, other.0))
    }

    /// The expression string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the condition and return its expression string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Evaluate a simple `<field> <op> <literal>` expression.
    ///
    /// Compound or negated expressions, unknown fields and unparsable
    /// literals all yield [`Evaluation::Unknown`].
    #[must_use]
    pub fn evaluate(&self, ctx: &ExplainContext) -> Evaluation {
        evaluate_expr(&self.0, ctx)
    }

    fn field_match(field: &str, pattern: &str) -> Self {
        if pattern.contains('*') {
            Self(format!("{field} matches '{pattern}'"))
        } else {
            Self(format!("{field} == '{pattern}'"))
        }
    }
}

fn evaluate_expr(expr: &str, ctx: &ExplainContext) -> Evaluation {
    let expr = expr.trim();
    if expr.contains("||") || expr.contains("&&") || expr.starts_with('!') || expr.starts_with('(')
    {
        return Evaluation::Unknown;
    }

    let mut parts = expr.splitn(3, char::is_whitespace);
    let (Some(field), Some(op), Some(literal)) = (parts.next(), parts.next(), parts.next()) else {
        return Evaluation::Unknown;
    };

    let actual = match field {
        "branch" => ctx.branch.as_str(),
        "tag" => ctx.tag.as_str(),
        "event" => ctx.event.as_str(),
        "ci" => {
            if ctx.ci {
                "true"
            } else {
                "false"
            }
        }
        _ => return Evaluation::Unknown,
    };

    let Some(expected) = parse_literal(field, literal.trim()) else {
        return Evaluation::Unknown;
    };

    let holds = match op {
        "==" => actual == expected,
        "!=" => actual != expected,
        "matches" => match Glob::new(expected) {
            Ok(glob) => glob.compile_matcher().is_match(actual),
            Err(_) => return Evaluation::Unknown,
        },
        _ => return Evaluation::Unknown,
    };

    if holds { Evaluation::Run } else { Evaluation::Skip }
}

fn parse_literal<'a>(field: &str, literal: &'a str) -> Option<&'a str> {
    for quote in ['\'', '"'] {
        if let Some(inner) = literal
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return Some(inner);
        }
    }
    match (field, literal) {
        ("ci", "true" | "false") => Some(literal),
        _ => None,
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Condition {
    fn from(expr: &str) -> Self {
        Self::raw(expr)
    }
}

impl From<String> for Condition {
    fn from(expr: String) -> Self {
        Self(expr)
    }
}

impl From<&Self> for Condition {
    fn from(condition: &Self) -> Self {
        condition.clone()
    }
}

impl BitOr for Condition {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self::or(&self, &rhs)
    }
}

impl BitAnd for Condition {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self::and(&self, &rhs)
    }
}

impl Not for Condition {
    type Output = Self;

    fn not(self) -> Self {
        Self::negate(&self)
    }
}
