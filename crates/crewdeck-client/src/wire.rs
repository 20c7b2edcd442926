use crewdeck::{ModelId, SessionMode, TraceId, WorkflowRef};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct KickoffRequest<'a> {
  pub model_endpoint: &'a str,
  pub inputs: serde_json::Value,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ModelTestRequest<'a> {
  pub message: &'a str,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ModelTestResponse {
  #[serde(default)]
  pub response: String,
}

/// Body of upload and delete responses.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct FileOperationResponse {
  #[serde(default)]
  pub success: bool,
}

/// Path segments of the session-creation endpoint for a mode. Identifiers
/// are single segments and get percent-encoded when joined.
pub fn session_segments(mode: SessionMode, workflow_ref: &WorkflowRef) -> [&str; 3] {
  let collection = match mode {
    SessionMode::Studio => "studios",
    SessionMode::Workflow => "workflows",
  };

  [collection, workflow_ref.as_str(), "sessions"]
}

pub fn model_test_segments(model_id: &ModelId) -> [&str; 3] {
  ["models", model_id.as_str(), "test"]
}

pub fn trace_events_segments(trace_id: &TraceId) -> [&str; 3] {
  ["traces", trace_id.as_str(), "events"]
}
