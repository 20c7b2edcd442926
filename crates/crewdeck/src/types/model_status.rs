use crate::ModelId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ModelTestStatus {
  Pending,
  Success,
  Failure,
}

impl ModelTestStatus {
  pub fn is_terminal(&self) -> bool {
    !matches!(self, ModelTestStatus::Pending)
  }
}

impl fmt::Display for ModelTestStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ModelTestStatus::Pending => write!(f, "pending"),
      ModelTestStatus::Success => write!(f, "success"),
      ModelTestStatus::Failure => write!(f, "failure"),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelStatusEvent {
  pub model_id: ModelId,
  pub status: ModelTestStatus,
  /// Attempts made so far in this sequence; 0 when entering `Pending`.
  pub attempts: usize,
}
