use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Static workflow configuration. Entities stay opaque JSON.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct WorkflowConfiguration {
  #[serde(default)]
  pub agents: Vec<serde_json::Value>,
  #[serde(default)]
  pub tasks: Vec<serde_json::Value>,
  #[serde(default)]
  pub tools: Vec<serde_json::Value>,
  #[serde(default)]
  pub workflow: serde_json::Value,
  #[serde(default)]
  pub mcp_instances: Vec<serde_json::Value>,
  /// Filled in by tool-definition discovery, keyed by MCP instance id.
  #[serde(default, skip_serializing_if = "HashMap::is_empty")]
  pub mcp_tool_definitions: HashMap<String, Vec<ToolDefinition>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolDefinition {
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub input_schema: Option<serde_json::Value>,
}

/// Response of the tool-definition probe.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ToolDefinitions {
  pub ready: bool,
  #[serde(default)]
  pub definitions: Option<HashMap<String, Vec<ToolDefinition>>>,
}

impl ToolDefinitions {
  pub fn not_ready() -> Self {
    ToolDefinitions::default()
  }

  pub fn ready(definitions: HashMap<String, Vec<ToolDefinition>>) -> Self {
    ToolDefinitions {
      ready: true,
      definitions: Some(definitions),
    }
  }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct KickoffResponse {
  pub trace_id: crate::TraceId,
}
