use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub mod arithmetic;
pub mod pubmed;

pub use arithmetic::{AddNumbers, CalculateFactorial, MultiplyNumbers};
pub use pubmed::ParsePubmedQuery;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Number,
    Integer,
    String,
}

impl ParamKind {
    fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Number => value.is_number(),
            Self::Integer => value.as_i64().is_some() || value.as_u64().is_some(),
            Self::String => value.is_string(),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Integer => "integer",
            Self::String => "string",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
}

impl ParamSpec {
    pub fn required(name: &str, kind: ParamKind) -> Self {
        Self { name: name.to_string(), kind, required: true }
    }

    pub fn optional(name: &str, kind: ParamKind) -> Self {
        Self { name: name.to_string(), kind, required: false }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
}

impl ToolSpec {
    pub fn validate(&self, args: &serde_json::Map<String, Value>) -> Result<(), ToolError> {
        for param in &self.params {
            match args.get(&param.name) {
                None if param.required => {
                    return Err(ToolError::InvalidArguments {
                        tool: self.name.clone(),
                        reason: format!("missing required parameter `{}`", param.name),
                    });
                }
                Some(value) if !param.kind.matches(value) => {
                    return Err(ToolError::InvalidArguments {
                        tool: self.name.clone(),
                        reason: format!(
                            "parameter `{}` must be a {}",
                            param.name,
                            param.kind.as_str()
                        ),
                    });
                }
                _ => {}
            }
        }

        for key in args.keys() {
            if !self.params.iter().any(|param| &param.name == key) {
                return Err(ToolError::InvalidArguments {
                    tool: self.name.clone(),
                    reason: format!("unknown parameter `{key}`"),
                });
            }
        }

        Ok(())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("unknown tool `{0}`")]
    UnknownTool(String),
    #[error("invalid arguments for `{tool}`: {reason}")]
    InvalidArguments { tool: String, reason: String },
    #[error("domain error in `{tool}`: {reason}")]
    Domain { tool: String, reason: String },
    #[error("tool `{tool}` failed: {reason}")]
    Execution { tool: String, reason: String },
}

/// A named callable with a typed parameter schema. Implementations are
/// deterministic and side-effect free except where a tool is explicitly a
/// network black box.
#[async_trait]
pub trait Tool: Send + Sync {
    fn spec(&self) -> ToolSpec;

    async fn execute(&self, args: &serde_json::Map<String, Value>) -> Result<Value, ToolError>;
}

#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The deterministic built-in set: arithmetic helpers plus the PubMed
    /// query parser. Network-backed tools are registered by the caller.
    pub fn with_builtins(current_year: i32) -> Self {
        let mut registry = Self::new();
        registry.register(AddNumbers);
        registry.register(MultiplyNumbers);
        registry.register(CalculateFactorial::new());
        registry.register(ParsePubmedQuery::new(current_year));
        registry
    }

    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.insert(tool.spec().name, Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self.tools.values().map(|tool| tool.spec()).collect();
        specs.sort_by(|left, right| left.name.cmp(&right.name));
        specs
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validates the arguments against the tool's schema, then dispatches.
    pub async fn execute(
        &self,
        name: &str,
        args: &serde_json::Map<String, Value>,
    ) -> Result<Value, ToolError> {
        let tool = self.get(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.spec().validate(args)?;
        tool.execute(args).await
    }
}

pub(crate) fn require_f64(
    args: &serde_json::Map<String, Value>,
    key: &str,
    tool: &str,
) -> Result<f64, ToolError> {
    args.get(key).and_then(Value::as_f64).ok_or_else(|| ToolError::InvalidArguments {
        tool: tool.to_string(),
        reason: format!("parameter `{key}` must be a number"),
    })
}

pub(crate) fn require_str<'a>(
    args: &'a serde_json::Map<String, Value>,
    key: &str,
    tool: &str,
) -> Result<&'a str, ToolError> {
    args.get(key).and_then(Value::as_str).ok_or_else(|| ToolError::InvalidArguments {
        tool: tool.to_string(),
        reason: format!("parameter `{key}` must be a string"),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ParamKind, ParamSpec, ToolError, ToolRegistry, ToolSpec};

    fn spec_fixture() -> ToolSpec {
        ToolSpec {
            name: "add_numbers".to_string(),
            description: "Adds two numbers".to_string(),
            params: vec![
                ParamSpec::required("x", ParamKind::Number),
                ParamSpec::required("y", ParamKind::Number),
            ],
        }
    }

    #[test]
    fn validate_accepts_well_formed_arguments() {
        let args = json!({"x": 1.0, "y": 2.5}).as_object().cloned().unwrap_or_default();
        assert!(spec_fixture().validate(&args).is_ok());
    }

    #[test]
    fn validate_rejects_missing_required_parameter() {
        let args = json!({"x": 1.0}).as_object().cloned().unwrap_or_default();
        let error = spec_fixture().validate(&args).expect_err("missing y");
        assert!(matches!(error, ToolError::InvalidArguments { ref reason, .. } if reason.contains("`y`")));
    }

    #[test]
    fn validate_rejects_wrong_kind_and_unknown_keys() {
        let spec = spec_fixture();

        let wrong_kind = json!({"x": "two", "y": 3.0}).as_object().cloned().unwrap_or_default();
        assert!(spec.validate(&wrong_kind).is_err());

        let unknown = json!({"x": 1.0, "y": 2.0, "z": 3.0}).as_object().cloned().unwrap_or_default();
        let error = spec.validate(&unknown).expect_err("unknown z");
        assert!(matches!(error, ToolError::InvalidArguments { ref reason, .. } if reason.contains("`z`")));
    }

    #[tokio::test]
    async fn registry_dispatches_after_validation() {
        let registry = ToolRegistry::with_builtins(2025);
        let args = json!({"x": 2.0, "y": 3.0}).as_object().cloned().unwrap_or_default();

        let result = registry.execute("multiply_numbers", &args).await.expect("multiply");
        assert_eq!(result, json!(6.0));
    }

    #[tokio::test]
    async fn registry_rejects_unknown_tool() {
        let registry = ToolRegistry::with_builtins(2025);
        let args = serde_json::Map::new();

        let error = registry.execute("launch_rockets", &args).await.expect_err("unknown");
        assert_eq!(error, ToolError::UnknownTool("launch_rockets".to_string()));
    }

    #[test]
    fn builtin_specs_are_sorted_and_complete() {
        let registry = ToolRegistry::with_builtins(2025);
        let names: Vec<String> = registry.specs().into_iter().map(|spec| spec.name).collect();
        assert_eq!(
            names,
            vec![
                "add_numbers".to_string(),
                "calculate_factorial".to_string(),
                "multiply_numbers".to_string(),
                "parse_pubmed_query".to_string(),
            ]
        );
    }
}
