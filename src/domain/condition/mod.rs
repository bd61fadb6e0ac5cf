//! Condition module - expressions evaluated against elements.
//!
//! Decisions and inspections are configured per domain with expressions
//! (`VeoExpression`) that read custom aspect attributes, links, parts, and
//! risks of the element being evaluated. Evaluation is pure: it needs the
//! element, its domain, and an `ElementResolver` for referenced elements.

mod expression;
mod matcher;
mod value;

pub use expression::{EvaluationContext, VeoExpression};
pub use matcher::{Condition, Matcher};
pub use value::ExpressionValue;
