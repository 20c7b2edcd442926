use crate::{
  CancelSignal, DirectoryListing, ExecutionEvent, KickoffResponse, ModelId, Result,
  SessionMode, SessionResponse, ToolDefinitions, TraceId, WorkflowConfiguration, WorkflowRef,
};
use bytes::Bytes;
use std::{sync::Arc, time::Duration};

/// # Backend
/// The remote orchestration service as the coordinator sees it.
///
/// Every call receives a `CancelSignal`. Implementations should abandon the
/// request once it fires and return `Error::Cancelled`; the coordinator also
/// discards results that arrive after cancellation, so honoring the signal
/// only saves work.
///
/// `fetch_events` must return only events not delivered by an earlier call
/// for the same trace; the monitor does not deduplicate.
///
/// ## Example
///
/// ```rust,ignore
/// struct Offline;
///
/// #[crewdeck::async_trait]
/// impl crewdeck::Backend for Offline {
///   async fn fetch_events(
///     &self,
///     _trace_id: &crewdeck::TraceId,
///     _signal: crewdeck::CancelSignal,
///   ) -> crewdeck::Result<Vec<crewdeck::ExecutionEvent>> {
///     Err(crewdeck::Error::transport("offline"))
///   }
///   // ...
/// }
/// ```
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
  async fn get_configuration(
    &self,
    model_endpoint: &str,
    signal: CancelSignal,
  ) -> Result<WorkflowConfiguration>;

  async fn get_mcp_tool_definitions(
    &self,
    model_endpoint: &str,
    signal: CancelSignal,
  ) -> Result<ToolDefinitions>;

  async fn kickoff(
    &self,
    model_endpoint: &str,
    inputs: serde_json::Value,
    signal: CancelSignal,
  ) -> Result<KickoffResponse>;

  async fn fetch_events(
    &self,
    trace_id: &TraceId,
    signal: CancelSignal,
  ) -> Result<Vec<ExecutionEvent>>;

  async fn create_session(
    &self,
    mode: SessionMode,
    workflow_ref: &WorkflowRef,
    signal: CancelSignal,
  ) -> Result<SessionResponse>;

  async fn list_directory(&self, path: &str, signal: CancelSignal) -> Result<DirectoryListing>;

  /// Returns `false` when the backend rejected the upload.
  async fn upload_file(&self, path: &str, bytes: Bytes, signal: CancelSignal) -> Result<bool>;

  async fn delete_file(&self, path: &str, signal: CancelSignal) -> Result<bool>;

  async fn test_model(
    &self,
    model_id: &ModelId,
    message: &str,
    timeout: Duration,
    signal: CancelSignal,
  ) -> Result<String>;
}

pub type SharedBackend = Arc<dyn Backend>;
