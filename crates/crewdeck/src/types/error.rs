#[derive(thiserror::Error, Debug, Clone)]
pub enum Error {
  #[error("Transport error: {0}")]
  Transport(String),

  #[error("Missing identifier: {0}")]
  MissingIdentifier(String),

  #[error("Malformed response: {0}")]
  MalformedResponse(String),

  #[error("Failed to upload {0}")]
  UploadFailed(String),

  #[error("Cancelled: {0}")]
  Cancelled(String),

  #[error("Timed out: {0}")]
  Timeout(String),

  #[error("Invalid configuration: {0}")]
  ConfigError(String),

  #[error("Error: {0}")]
  Error(String),
}

impl Error {
  pub fn transport<T: ToString>(message: T) -> Self {
    Self::Transport(message.to_string())
  }

  pub fn missing_identifier<T: ToString>(message: T) -> Self {
    Self::MissingIdentifier(message.to_string())
  }

  pub fn malformed_response<T: ToString>(message: T) -> Self {
    Self::MalformedResponse(message.to_string())
  }

  pub fn upload_failed<T: ToString>(file_name: T) -> Self {
    Self::UploadFailed(file_name.to_string())
  }

  pub fn cancelled<T: ToString>(message: T) -> Self {
    Self::Cancelled(message.to_string())
  }

  pub fn timeout<T: ToString>(message: T) -> Self {
    Self::Timeout(message.to_string())
  }

  pub fn config_error<T: ToString>(message: T) -> Self {
    Self::ConfigError(message.to_string())
  }

  pub fn error<T: ToString>(message: T) -> Self {
    Self::Error(message.to_string())
  }

  pub fn is_cancelled(&self) -> bool {
    matches!(self, Self::Cancelled(_))
  }
}

impl From<serde_json::Error> for Error {
  fn from(err: serde_json::Error) -> Self {
    Self::MalformedResponse(err.to_string())
  }
}

impl From<serde_yaml::Error> for Error {
  fn from(err: serde_yaml::Error) -> Self {
    Self::ConfigError(err.to_string())
  }
}

// implement Eq and PartialEq for Error so that we can compare errors in tests
impl PartialEq for Error {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Self::Transport(a), Self::Transport(b)) => a == b,
      (Self::MissingIdentifier(a), Self::MissingIdentifier(b)) => a == b,
      (Self::MalformedResponse(a), Self::MalformedResponse(b)) => a == b,
      (Self::UploadFailed(a), Self::UploadFailed(b)) => a == b,
      (Self::Cancelled(a), Self::Cancelled(b)) => a == b,
      (Self::Timeout(a), Self::Timeout(b)) => a == b,
      (Self::ConfigError(a), Self::ConfigError(b)) => a == b,
      (Self::Error(a), Self::Error(b)) => a == b,
      _ => false,
    }
  }
}
