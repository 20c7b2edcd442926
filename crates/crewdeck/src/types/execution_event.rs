use crate::TraceId;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const KICKOFF_STARTED: &str = "crew_kickoff_started";
pub const KICKOFF_COMPLETED: &str = "crew_kickoff_completed";
pub const KICKOFF_FAILED: &str = "crew_kickoff_failed";

/// Discriminator of an execution event. Unknown discriminators are kept
/// verbatim as step events.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
  KickoffStarted,
  KickoffCompleted,
  KickoffFailed,
  Other(String),
}

impl EventKind {
  pub fn as_str(&self) -> &str {
    match self {
      EventKind::KickoffStarted => KICKOFF_STARTED,
      EventKind::KickoffCompleted => KICKOFF_COMPLETED,
      EventKind::KickoffFailed => KICKOFF_FAILED,
      EventKind::Other(kind) => kind,
    }
  }

  pub fn is_terminal(&self) -> bool {
    match self {
      EventKind::KickoffCompleted | EventKind::KickoffFailed => true,
      EventKind::KickoffStarted | EventKind::Other(_) => false,
    }
  }
}

impl From<String> for EventKind {
  fn from(s: String) -> Self {
    match s.as_str() {
      KICKOFF_STARTED => EventKind::KickoffStarted,
      KICKOFF_COMPLETED => EventKind::KickoffCompleted,
      KICKOFF_FAILED => EventKind::KickoffFailed,
      _ => EventKind::Other(s),
    }
  }
}

impl From<&str> for EventKind {
  fn from(s: &str) -> Self {
    EventKind::from(s.to_string())
  }
}

impl From<EventKind> for String {
  fn from(kind: EventKind) -> Self {
    kind.as_str().to_string()
  }
}

impl fmt::Display for EventKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// One immutable record in a run's timeline.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ExecutionEvent {
  pub id: String,
  #[serde(rename = "type")]
  pub kind: EventKind,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub output: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl ExecutionEvent {
  pub fn new(id: impl Into<String>, kind: impl Into<EventKind>) -> Self {
    ExecutionEvent {
      id: id.into(),
      kind: kind.into(),
      output: None,
      error: None,
    }
  }

  pub fn with_output(mut self, output: impl Into<String>) -> Self {
    self.output = Some(output.into());
    self
  }

  pub fn with_error(mut self, error: impl Into<String>) -> Self {
    self.error = Some(error.into());
    self
  }

  pub fn completed(id: impl Into<String>, output: impl Into<String>) -> Self {
    Self::new(id, EventKind::KickoffCompleted).with_output(output)
  }

  pub fn failed(id: impl Into<String>, error: impl Into<String>) -> Self {
    Self::new(id, EventKind::KickoffFailed).with_error(error)
  }

  /// The payload a terminal event carries, or `None` for non-terminal events.
  pub fn completion_payload(&self) -> Option<String> {
    match self.kind {
      EventKind::KickoffCompleted => Some(self.output.clone().unwrap_or_default()),
      EventKind::KickoffFailed => Some(self.error.clone().unwrap_or_default()),
      EventKind::KickoffStarted | EventKind::Other(_) => None,
    }
  }
}

/// Terminal result of a run observed by the monitor.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
  pub trace_id: TraceId,
  pub final_output: String,
  pub failed: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
  User,
  Assistant,
}

/// Chat message emitted when a conversational run completes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatMessage {
  pub role: ChatRole,
  pub content: String,
  pub trace_id: TraceId,
}
