use anyhow::{Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};

use greenlight_core::config::SearchConfig;
use greenlight_core::{ParamKind, ParamSpec, Tool, ToolError, ToolSpec};

/// Web search over a Tavily-style HTTP API. The one tool with side effects
/// beyond its return value; treated as a black box returning text.
pub struct WebSearchTool {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    max_results: u32,
}

impl WebSearchTool {
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("building search http client")?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            max_results: config.max_results,
        })
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "search".to_string(),
            description: "Searches the web and returns unstructured result text.".to_string(),
            params: vec![ParamSpec::required("query", ParamKind::String)],
        }
    }

    async fn execute(&self, args: &serde_json::Map<String, Value>) -> Result<Value, ToolError> {
        let query = args.get("query").and_then(Value::as_str).ok_or_else(|| {
            ToolError::InvalidArguments {
                tool: "search".to_string(),
                reason: "parameter `query` must be a string".to_string(),
            }
        })?;

        let body = json!({
            "query": query,
            "max_results": self.max_results,
        });

        let mut request = self.http.post(&self.base_url).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request.send().await.map_err(|error| ToolError::Execution {
            tool: "search".to_string(),
            reason: error.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Execution {
                tool: "search".to_string(),
                reason: format!("search backend returned status {status}"),
            });
        }

        let payload: Value = response.json().await.map_err(|error| ToolError::Execution {
            tool: "search".to_string(),
            reason: format!("decoding search response: {error}"),
        })?;

        Ok(Value::String(render_results(&payload)))
    }
}

/// Flattens a search response into display text; falls back to the raw
/// payload when the result shape is unrecognized.
fn render_results(payload: &Value) -> String {
    let Some(results) = payload["results"].as_array() else {
        return payload.to_string();
    };

    let lines: Vec<String> = results
        .iter()
        .map(|result| {
            let title = result["title"].as_str().unwrap_or("untitled");
            let content = result["content"].as_str().unwrap_or("");
            match result["url"].as_str() {
                Some(url) => format!("{title} - {content} ({url})"),
                None => format!("{title} - {content}"),
            }
        })
        .collect();

    if lines.is_empty() {
        "no results".to_string()
    } else {
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use greenlight_core::config::SearchConfig;
    use greenlight_core::Tool;

    use super::{render_results, WebSearchTool};

    fn config() -> SearchConfig {
        SearchConfig {
            enabled: true,
            api_key: Some("tvly-test".to_string().into()),
            base_url: "https://api.tavily.com/search".to_string(),
            max_results: 1,
        }
    }

    #[test]
    fn spec_declares_a_single_required_query() {
        let tool = WebSearchTool::from_config(&config()).expect("tool");
        let spec = tool.spec();

        assert_eq!(spec.name, "search");
        assert_eq!(spec.params.len(), 1);
        assert_eq!(spec.params[0].name, "query");
        assert!(spec.params[0].required);
    }

    #[test]
    fn render_results_flattens_title_content_and_url() {
        let payload = json!({
            "results": [
                {"title": "Rust", "content": "A systems language.", "url": "https://rust-lang.org"},
                {"title": "Tokio", "content": "An async runtime."},
            ]
        });

        let text = render_results(&payload);
        assert!(text.contains("Rust - A systems language. (https://rust-lang.org)"));
        assert!(text.contains("Tokio - An async runtime."));
    }

    #[test]
    fn render_results_falls_back_to_the_raw_payload() {
        let payload = json!({"answer": "forty-two"});
        assert!(render_results(&payload).contains("forty-two"));

        let empty = json!({"results": []});
        assert_eq!(render_results(&empty), "no results");
    }
}
