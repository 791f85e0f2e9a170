use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::tools::{require_f64, ParamKind, ParamSpec, Tool, ToolError, ToolSpec};

/// Adds two floating-point numbers.
#[derive(Clone, Copy, Debug, Default)]
pub struct AddNumbers;

#[async_trait]
impl Tool for AddNumbers {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "add_numbers".to_string(),
            description: "Adds two floating-point numbers and returns their sum.".to_string(),
            params: vec![
                ParamSpec::required("x", ParamKind::Number),
                ParamSpec::required("y", ParamKind::Number),
            ],
        }
    }

    async fn execute(&self, args: &serde_json::Map<String, Value>) -> Result<Value, ToolError> {
        let x = require_f64(args, "x", "add_numbers")?;
        let y = require_f64(args, "y", "add_numbers")?;
        Ok(Value::from(x + y))
    }
}

/// Multiplies two floating-point numbers.
#[derive(Clone, Copy, Debug, Default)]
pub struct MultiplyNumbers;

#[async_trait]
impl Tool for MultiplyNumbers {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "multiply_numbers".to_string(),
            description: "Multiplies two floating-point numbers and returns the product."
                .to_string(),
            params: vec![
                ParamSpec::required("x", ParamKind::Number),
                ParamSpec::required("y", ParamKind::Number),
            ],
        }
    }

    async fn execute(&self, args: &serde_json::Map<String, Value>) -> Result<Value, ToolError> {
        let x = require_f64(args, "x", "multiply_numbers")?;
        let y = require_f64(args, "y", "multiply_numbers")?;
        Ok(Value::from(x * y))
    }
}

// 21! overflows u64; anything above is a domain error rather than a wrap.
const MAX_FACTORIAL_INPUT: u64 = 20;

/// Factorial with memoized results across calls.
#[derive(Debug, Default)]
pub struct CalculateFactorial {
    memo: Mutex<HashMap<u64, u64>>,
}

impl CalculateFactorial {
    pub fn new() -> Self {
        Self::default()
    }

    fn factorial(&self, n: u64) -> u64 {
        if let Some(cached) = self.cached(n) {
            return cached;
        }

        let mut result: u64 = 1;
        for factor in 2..=n {
            result *= factor;
        }

        match self.memo.lock() {
            Ok(mut memo) => {
                memo.insert(n, result);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(n, result);
            }
        }
        result
    }

    fn cached(&self, n: u64) -> Option<u64> {
        match self.memo.lock() {
            Ok(memo) => memo.get(&n).copied(),
            Err(poisoned) => poisoned.into_inner().get(&n).copied(),
        }
    }
}

#[async_trait]
impl Tool for CalculateFactorial {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "calculate_factorial".to_string(),
            description: "Calculates the factorial of a non-negative integer.".to_string(),
            params: vec![ParamSpec::required("n", ParamKind::Integer)],
        }
    }

    async fn execute(&self, args: &serde_json::Map<String, Value>) -> Result<Value, ToolError> {
        let raw = args.get("n").ok_or_else(|| ToolError::InvalidArguments {
            tool: "calculate_factorial".to_string(),
            reason: "missing required parameter `n`".to_string(),
        })?;

        if raw.as_i64().is_some_and(|n| n < 0) {
            return Err(ToolError::Domain {
                tool: "calculate_factorial".to_string(),
                reason: "cannot calculate the factorial of a negative number".to_string(),
            });
        }

        let n = raw.as_u64().ok_or_else(|| ToolError::InvalidArguments {
            tool: "calculate_factorial".to_string(),
            reason: "parameter `n` must be an integer".to_string(),
        })?;

        if n > MAX_FACTORIAL_INPUT {
            return Err(ToolError::Domain {
                tool: "calculate_factorial".to_string(),
                reason: format!(
                    "factorial of {n} exceeds the supported range (n must be <= {MAX_FACTORIAL_INPUT})"
                ),
            });
        }

        Ok(Value::from(self.factorial(n)))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use crate::tools::{Tool, ToolError};

    use super::{AddNumbers, CalculateFactorial, MultiplyNumbers};

    fn args(value: Value) -> serde_json::Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn add_and_multiply_return_floats() {
        let sum = AddNumbers.execute(&args(json!({"x": 1.5, "y": 2.5}))).await.expect("sum");
        assert_eq!(sum, json!(4.0));

        let product =
            MultiplyNumbers.execute(&args(json!({"x": 2.0, "y": 3.0}))).await.expect("product");
        assert_eq!(product, json!(6.0));
    }

    #[tokio::test]
    async fn factorial_of_small_inputs() {
        let tool = CalculateFactorial::new();

        let zero = tool.execute(&args(json!({"n": 0}))).await.expect("0!");
        assert_eq!(zero, json!(1));

        let five = tool.execute(&args(json!({"n": 5}))).await.expect("5!");
        assert_eq!(five, json!(120));

        let twenty = tool.execute(&args(json!({"n": 20}))).await.expect("20!");
        assert_eq!(twenty, json!(2_432_902_008_176_640_000u64));
    }

    #[tokio::test]
    async fn factorial_rejects_negative_input_with_domain_error() {
        let tool = CalculateFactorial::new();
        let error = tool.execute(&args(json!({"n": -3}))).await.expect_err("negative");

        assert!(matches!(
            error,
            ToolError::Domain { ref reason, .. } if reason.contains("negative")
        ));
    }

    #[tokio::test]
    async fn factorial_rejects_oversized_input_instead_of_wrapping() {
        let tool = CalculateFactorial::new();
        let error = tool.execute(&args(json!({"n": 21}))).await.expect_err("21! overflows");

        assert!(matches!(error, ToolError::Domain { .. }));
    }

    #[tokio::test]
    async fn factorial_memoizes_repeat_calls() {
        let tool = CalculateFactorial::new();
        let first = tool.execute(&args(json!({"n": 12}))).await.expect("12!");
        assert!(tool.cached(12).is_some());

        let second = tool.execute(&args(json!({"n": 12}))).await.expect("12! again");
        assert_eq!(first, second);
    }
}
