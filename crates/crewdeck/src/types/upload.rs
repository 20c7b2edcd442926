use crate::Result;
use bytes::Bytes;

/// A local file queued for upload into the session directory.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
  pub name: String,
  pub bytes: Bytes,
}

impl UploadFile {
  pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
    UploadFile {
      name: name.into(),
      bytes: bytes.into(),
    }
  }
}

/// Per-file result of a multi-file upload.
#[derive(Debug)]
pub struct UploadResult {
  pub file_name: String,
  pub result: Result<()>,
}

impl UploadResult {
  pub fn is_success(&self) -> bool {
    self.result.is_ok()
  }
}
