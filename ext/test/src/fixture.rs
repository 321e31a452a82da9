//! Conformance test fixture runner
//!
//! Loads YAML fixtures and runs them against the casewise engines.
//!
//! ```yaml
//! name: default validation
//! description: every field must be valid
//! kind: validate
//! spec:                 # optional; the default spec when omitted
//!   default:
//!     predicate: invalid
//! cases:
//!   - name: complete record
//!     payload: { a: "x" }
//!     expect: true
//! ```

use casewise::prelude::*;
use casewise::{is_valid_with, FailAction, KeepAction, SpecConfig};
use serde::Deserialize;

/// A complete test fixture
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub kind: SuiteKind,
    /// Spec document for `validate`/`filter`; the default spec when absent.
    #[serde(default)]
    pub spec: Option<serde_json::Value>,
    pub cases: Vec<TestCase>,
}

/// Which engine a fixture exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuiteKind {
    /// `is_valid_with`; `expect` is a bool.
    Validity,
    /// `validate` with `return_true`; `expect` is a bool.
    Validate,
    /// `filter`; `expect` is the projected payload.
    Filter,
}

/// Test case
#[derive(Debug, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub payload: serde_json::Value,
    /// Validity only: check with `required = false`.
    #[serde(default)]
    pub lenient: bool,
    pub expect: serde_json::Value,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Runner
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of running a single test case
#[derive(Debug)]
pub struct CaseResult {
    pub case_name: String,
    pub passed: bool,
    pub expected: serde_json::Value,
    pub actual: serde_json::Value,
}

/// A fixture's spec, built once per run.
enum Engine {
    Validity,
    Validate(ValidationSpec),
    Filter(FilterSpec),
}

impl Engine {
    fn evaluate(&self, case: &TestCase) -> serde_json::Value {
        let payload = Value::from(case.payload.clone());
        match self {
            Self::Validity => is_valid_with(&payload, !case.lenient).into(),
            Self::Validate(spec) => validate(&payload, spec, || true).into(),
            Self::Filter(spec) => filter(&payload, spec).to_json(),
        }
    }
}

impl Fixture {
    /// Parse a fixture from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Parse multiple fixtures from a YAML file with `---` separators
    pub fn from_yaml_multi(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut fixtures = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            fixtures.push(Self::deserialize(doc)?);
        }
        Ok(fixtures)
    }

    fn engine(&self) -> Result<Engine, MatcherError> {
        Ok(match (self.kind, &self.spec) {
            (SuiteKind::Validity, _) => Engine::Validity,
            (SuiteKind::Validate, None) => Engine::Validate(ValidationSpec::default()),
            (SuiteKind::Validate, Some(doc)) => Engine::Validate(
                SpecConfig::<FailAction>::from_value(doc.clone())?.build_validation()?,
            ),
            (SuiteKind::Filter, None) => Engine::Filter(FilterSpec::default()),
            (SuiteKind::Filter, Some(doc)) => {
                Engine::Filter(SpecConfig::<KeepAction>::from_value(doc.clone())?.build_filter()?)
            }
        })
    }

    /// Run all test cases and return results
    ///
    /// # Errors
    ///
    /// Returns an error if the fixture's spec does not build.
    pub fn run(&self) -> Result<Vec<CaseResult>, MatcherError> {
        let engine = self.engine()?;
        Ok(self
            .cases
            .iter()
            .map(|case| {
                let actual = engine.evaluate(case);
                CaseResult {
                    case_name: case.name.clone(),
                    passed: actual == case.expect,
                    expected: case.expect.clone(),
                    actual,
                }
            })
            .collect())
    }

    /// Run all test cases and panic on first failure
    pub fn run_and_assert(&self) {
        let results = self
            .run()
            .unwrap_or_else(|e| panic!("Fixture '{}' spec failed to build: {e}", self.name));
        for result in results {
            assert!(
                result.passed,
                "Fixture '{}' case '{}' failed: expected {}, got {}",
                self.name, result.case_name, result.expected, result.actual
            );
        }
    }
}
