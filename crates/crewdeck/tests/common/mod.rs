#![allow(dead_code)]

use crewdeck::{
  Backend, CancelSignal, DirectoryEntry, DirectoryListing, Error, ExecutionEvent,
  KickoffResponse, ModelId, Result, SessionMode, SessionResponse, ToolDefinitions, TraceId,
  WorkflowConfiguration, WorkflowRef,
};
use crewdeck::async_trait;
use parking_lot::Mutex;
use std::{
  collections::{HashMap, VecDeque},
  sync::Arc,
  time::Duration,
};

/// In-memory backend with scripted responses and call counters.
pub struct FakeBackend {
  pub session_delay: Duration,
  pub session_response: Mutex<Result<SessionResponse>>,
  pub session_calls: Mutex<Vec<(SessionMode, WorkflowRef)>>,

  pub upload_delays: Mutex<HashMap<String, Duration>>,
  pub upload_rejections: Mutex<Vec<String>>,
  pub uploaded: Mutex<Vec<String>>,
  pub deleted: Mutex<Vec<String>>,
  pub delete_fails: bool,

  pub listings: Mutex<VecDeque<Result<DirectoryListing>>>,
  pub listing_calls: Mutex<usize>,

  pub model_responses: Mutex<VecDeque<Result<String>>>,
  pub model_delay: Duration,
  pub model_calls: Mutex<usize>,

  pub configuration: WorkflowConfiguration,
  pub tools_ready_after: Option<usize>,
  pub tool_probes: Mutex<usize>,

  pub trace_id: String,
  pub ticks: Mutex<VecDeque<Result<Vec<ExecutionEvent>>>>,
  pub fetch_calls: Mutex<usize>,
}

impl Default for FakeBackend {
  fn default() -> Self {
    FakeBackend {
      session_delay: Duration::from_millis(50),
      session_response: Mutex::new(Ok(SessionResponse::new("session-1", "/sessions/session-1"))),
      session_calls: Mutex::new(Vec::new()),
      upload_delays: Mutex::new(HashMap::new()),
      upload_rejections: Mutex::new(Vec::new()),
      uploaded: Mutex::new(Vec::new()),
      deleted: Mutex::new(Vec::new()),
      delete_fails: true,
      listings: Mutex::new(VecDeque::new()),
      listing_calls: Mutex::new(0),
      model_responses: Mutex::new(VecDeque::new()),
      model_delay: Duration::ZERO,
      model_calls: Mutex::new(0),
      configuration: WorkflowConfiguration::default(),
      tools_ready_after: None,
      tool_probes: Mutex::new(0),
      trace_id: "trace-1".to_string(),
      ticks: Mutex::new(VecDeque::new()),
      fetch_calls: Mutex::new(0),
    }
  }
}

impl FakeBackend {
  pub fn session_calls(&self) -> usize {
    self.session_calls.lock().len()
  }

  pub fn model_calls(&self) -> usize {
    *self.model_calls.lock()
  }

  pub fn listing_calls(&self) -> usize {
    *self.listing_calls.lock()
  }

  pub fn fetch_calls(&self) -> usize {
    *self.fetch_calls.lock()
  }

  pub fn uploaded(&self) -> Vec<String> {
    self.uploaded.lock().clone()
  }

  pub fn delay_upload(&self, file_name: &str, delay: Duration) {
    self
      .upload_delays
      .lock()
      .insert(file_name.to_string(), delay);
  }

  pub fn script_models(&self, responses: Vec<Result<String>>) {
    *self.model_responses.lock() = responses.into();
  }

  pub fn script_listings(&self, listings: Vec<Result<DirectoryListing>>) {
    *self.listings.lock() = listings.into();
  }

  pub fn script_ticks(&self, ticks: Vec<Result<Vec<ExecutionEvent>>>) {
    *self.ticks.lock() = ticks.into();
  }
}

pub fn listing(names: &[&str]) -> DirectoryListing {
  DirectoryListing {
    files: names.iter().map(|name| DirectoryEntry::named(*name)).collect(),
  }
}

#[async_trait]
impl Backend for FakeBackend {
  async fn get_configuration(&self, _: &str, _: CancelSignal) -> Result<WorkflowConfiguration> {
    Ok(self.configuration.clone())
  }

  async fn get_mcp_tool_definitions(&self, _: &str, _: CancelSignal) -> Result<ToolDefinitions> {
    let probes = {
      let mut probes = self.tool_probes.lock();
      *probes += 1;
      *probes
    };

    match self.tools_ready_after {
      Some(after) if probes >= after => {
        let mut definitions = HashMap::new();
        definitions.insert(
          "mcp-1".to_string(),
          vec![crewdeck::ToolDefinition {
            name: "web_search".to_string(),
            description: Some("Search the web".to_string()),
            input_schema: None,
          }],
        );
        Ok(ToolDefinitions::ready(definitions))
      }
      _ => Ok(ToolDefinitions::not_ready()),
    }
  }

  async fn kickoff(
    &self,
    _: &str,
    _: serde_json::Value,
    _: CancelSignal,
  ) -> Result<KickoffResponse> {
    Ok(KickoffResponse {
      trace_id: TraceId::new(self.trace_id.clone()),
    })
  }

  async fn fetch_events(&self, _: &TraceId, _: CancelSignal) -> Result<Vec<ExecutionEvent>> {
    *self.fetch_calls.lock() += 1;
    self.ticks.lock().pop_front().unwrap_or_else(|| Ok(vec![]))
  }

  async fn create_session(
    &self,
    mode: SessionMode,
    workflow_ref: &WorkflowRef,
    _: CancelSignal,
  ) -> Result<SessionResponse> {
    self.session_calls.lock().push((mode, workflow_ref.clone()));
    tokio::time::sleep(self.session_delay).await;

    match &*self.session_response.lock() {
      Ok(response) => Ok(response.clone()),
      Err(err) => Err(err.clone()),
    }
  }

  async fn list_directory(&self, _: &str, _: CancelSignal) -> Result<DirectoryListing> {
    *self.listing_calls.lock() += 1;
    self
      .listings
      .lock()
      .pop_front()
      .unwrap_or_else(|| Ok(DirectoryListing::default()))
  }

  async fn upload_file(
    &self,
    path: &str,
    _: bytes::Bytes,
    signal: CancelSignal,
  ) -> Result<bool> {
    let file_name = path.rsplit('/').next().unwrap_or(path).to_string();
    let delay = self
      .upload_delays
      .lock()
      .get(&file_name)
      .copied()
      .unwrap_or(Duration::from_millis(10));

    tokio::select! {
      _ = tokio::time::sleep(delay) => {}
      _ = signal.recv() => return Err(Error::cancelled(path)),
    }

    if self.upload_rejections.lock().contains(&file_name) {
      return Ok(false);
    }

    self.uploaded.lock().push(path.to_string());
    Ok(true)
  }

  async fn delete_file(&self, path: &str, _: CancelSignal) -> Result<bool> {
    self.deleted.lock().push(path.to_string());

    if self.delete_fails {
      Err(Error::transport("404 not found"))
    } else {
      Ok(true)
    }
  }

  async fn test_model(
    &self,
    _: &ModelId,
    _: &str,
    _: Duration,
    _: CancelSignal,
  ) -> Result<String> {
    *self.model_calls.lock() += 1;

    if !self.model_delay.is_zero() {
      tokio::time::sleep(self.model_delay).await;
    }

    self
      .model_responses
      .lock()
      .pop_front()
      .unwrap_or_else(|| Ok("Model Test Failed: no response scripted".to_string()))
  }
}

pub fn shared(backend: FakeBackend) -> Arc<FakeBackend> {
  Arc::new(backend)
}
