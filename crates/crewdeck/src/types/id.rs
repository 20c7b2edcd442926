use serde::{Deserialize, Serialize};
use std::fmt;

pub type Id = String;

/// Identifies one remote execution of a workflow.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Hash, Eq, Default)]
#[serde(transparent)]
pub struct TraceId(Id);

/// Identifies a registered model endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Hash, Eq, Default)]
#[serde(transparent)]
pub struct ModelId(Id);

/// Backend identifier of the studio or deployed workflow a context is bound to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Hash, Eq, Default)]
#[serde(transparent)]
pub struct WorkflowRef(Id);

impl TraceId {
  pub fn new(id: impl Into<String>) -> Self {
    TraceId(id.into())
  }

  pub fn inner(&self) -> Id {
    self.0.clone()
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl ModelId {
  pub fn new(id: impl Into<String>) -> Self {
    ModelId(id.into())
  }

  pub fn inner(&self) -> Id {
    self.0.clone()
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl WorkflowRef {
  pub fn new(id: impl Into<String>) -> Self {
    WorkflowRef(id.into())
  }

  pub fn inner(&self) -> Id {
    self.0.clone()
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn is_blank(&self) -> bool {
    self.0.trim().is_empty()
  }
}

impl fmt::Display for TraceId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl fmt::Display for ModelId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl fmt::Display for WorkflowRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for TraceId {
  fn from(id: &str) -> Self {
    TraceId::new(id)
  }
}

impl From<&str> for ModelId {
  fn from(id: &str) -> Self {
    ModelId::new(id)
  }
}

impl From<&str> for WorkflowRef {
  fn from(id: &str) -> Self {
    WorkflowRef::new(id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_workflow_ref() {
    assert!(WorkflowRef::new("  ").is_blank());
    assert!(WorkflowRef::default().is_blank());
    assert!(!WorkflowRef::new("studio-1").is_blank());
  }

  #[test]
  fn transparent_serde() {
    let id: TraceId = serde_json::from_str("\"trace-9\"").unwrap();
    assert_eq!(id, TraceId::new("trace-9"));
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"trace-9\"");
    assert_eq!(id.to_string(), "trace-9");
  }
}
