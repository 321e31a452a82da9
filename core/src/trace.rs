//! Validation trace types for debugging spec behavior.
//!
//! [`validate_with_trace`](crate::validate_with_trace) runs the same chain as
//! [`validate`](crate::validate) but records every predicate it evaluated.
//! Fields after the first firing one are never evaluated, so they never show
//! up in the trace.
//!
//! # Example
//!
//! ```
//! use casewise::{validate_with_trace, ValidationSpec, Value};
//!
//! let payload = Value::object([
//!     ("name", Value::from("ada")),
//!     ("tags", Value::array(Vec::<Value>::new())),
//! ]);
//! let trace = validate_with_trace(&payload, &ValidationSpec::default());
//!
//! assert!(!trace.result);
//! assert_eq!(trace.failed_field(), Some("tags"));
//! assert_eq!(trace.steps.len(), 2);
//! ```

use std::fmt;

/// One evaluated field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldStep {
    /// The field name.
    pub field: String,
    /// Whether the field's predicate fired.
    pub fired: bool,
}

/// Result of a traced validation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationTrace {
    /// What `validate` would have returned with `return_true` as success callback.
    pub result: bool,
    /// Evaluated fields, in payload order.
    pub steps: Vec<FieldStep>,
    /// `true` when the payload failed the top-level guard and no field was evaluated.
    pub payload_rejected: bool,
}

impl ValidationTrace {
    pub(crate) fn rejected() -> Self {
        Self {
            result: false,
            steps: Vec::new(),
            payload_rejected: true,
        }
    }

    /// The field whose predicate fired, if any.
    #[must_use]
    pub fn failed_field(&self) -> Option<&str> {
        self.steps
            .last()
            .filter(|step| step.fired)
            .map(|step| step.field.as_str())
    }
}

impl fmt::Display for ValidationTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.payload_rejected {
            return write!(f, "payload rejected: not a non-empty record");
        }
        for step in &self.steps {
            let mark = if step.fired { "fired" } else { "pass" };
            writeln!(f, "  {}: {mark}", step.field)?;
        }
        write!(f, "result: {}", self.result)
    }
}
