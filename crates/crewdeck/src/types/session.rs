use crate::{Error, Result, WorkflowRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution mode that decides how a session is created.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
  /// Interactive studio, bound to a studio id.
  #[default]
  Studio,
  /// Standalone deployed workflow, bound to a deployment id.
  Workflow,
}

impl SessionMode {
  /// Name of the identifier the mode requires, used in error messages.
  pub fn identifier_name(&self) -> &'static str {
    match self {
      SessionMode::Studio => "studio id",
      SessionMode::Workflow => "workflow deployment id",
    }
  }
}

impl fmt::Display for SessionMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SessionMode::Studio => write!(f, "studio"),
      SessionMode::Workflow => write!(f, "workflow"),
    }
  }
}

/// Backend-allocated working directory scoped to one workflow context.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSession {
  pub session_id: String,
  pub session_directory: String,
}

impl WorkflowSession {
  /// Remote path of a file inside the session directory.
  pub fn file_path(&self, file_name: &str) -> String {
    format!(
      "{}/{}",
      self.session_directory.trim_end_matches('/'),
      file_name.trim_start_matches('/')
    )
  }
}

/// Raw session-creation response; fields may be missing on a bad backend.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SessionResponse {
  #[serde(default)]
  pub session_id: Option<String>,
  #[serde(default)]
  pub session_directory: Option<String>,
}

impl SessionResponse {
  pub fn new(session_id: impl Into<String>, session_directory: impl Into<String>) -> Self {
    SessionResponse {
      session_id: Some(session_id.into()),
      session_directory: Some(session_directory.into()),
    }
  }
}

impl TryFrom<SessionResponse> for WorkflowSession {
  type Error = Error;

  fn try_from(response: SessionResponse) -> Result<Self> {
    let session_id = non_blank(response.session_id)
      .ok_or_else(|| Error::malformed_response("session response has no session id"))?;
    let session_directory = non_blank(response.session_directory)
      .ok_or_else(|| Error::malformed_response("session response has no session directory"))?;

    Ok(WorkflowSession {
      session_id,
      session_directory,
    })
  }
}

/// Scope of one workflow context: which workflow, in which mode.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkflowTarget {
  pub workflow_ref: WorkflowRef,
  pub mode: SessionMode,
  /// Model endpoint the configuration and kickoff calls go to.
  pub model_endpoint: String,
  /// Conversational workflows also surface their result as a chat message.
  #[serde(default)]
  pub conversational: bool,
}

impl WorkflowTarget {
  pub fn studio(workflow_ref: impl Into<WorkflowRef>, model_endpoint: impl Into<String>) -> Self {
    WorkflowTarget {
      workflow_ref: workflow_ref.into(),
      mode: SessionMode::Studio,
      model_endpoint: model_endpoint.into(),
      conversational: false,
    }
  }

  pub fn deployed(workflow_ref: impl Into<WorkflowRef>, model_endpoint: impl Into<String>) -> Self {
    WorkflowTarget {
      workflow_ref: workflow_ref.into(),
      mode: SessionMode::Workflow,
      model_endpoint: model_endpoint.into(),
      conversational: false,
    }
  }

  pub fn conversational(mut self, conversational: bool) -> Self {
    self.conversational = conversational;
    self
  }
}

fn non_blank(value: Option<String>) -> Option<String> {
  value.filter(|value| !value.trim().is_empty())
}
