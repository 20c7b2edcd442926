use crate::wire::{
  model_test_segments, session_segments, trace_events_segments, FileOperationResponse,
  KickoffRequest, ModelTestRequest, ModelTestResponse,
};
use async_trait::async_trait;
use crewdeck::{
  Backend, CancelSignal, DirectoryListing, Error, ExecutionEvent, KickoffResponse,
  ModelId, Result, SessionMode, SessionResponse, Signal, ToolDefinitions, TraceId,
  WorkflowConfiguration, WorkflowRef,
};
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Environment variable holding the orchestration service base URL.
pub const BACKEND_URL_ENV: &str = "CREWDECK_BACKEND_URL";

/// [`Backend`] over the orchestration service's JSON/HTTP API.
#[derive(Clone, Debug)]
pub struct HttpBackend {
  client: reqwest::Client,
  base_url: String,
  root: Url,
}

impl HttpBackend {
  pub fn new(base_url: impl Into<String>) -> Result<Self> {
    let base_url = base_url.into();
    if base_url.trim().is_empty() {
      return Err(Error::config_error("Backend base url is empty"));
    }

    let base_url = base_url.trim_end_matches('/').to_string();
    let root = Url::parse(&base_url).map_err(|err| {
      Error::config_error(format!("Invalid backend base url {}: {}", base_url, err))
    })?;
    if root.cannot_be_a_base() {
      return Err(Error::config_error(format!(
        "Invalid backend base url {}",
        base_url
      )));
    }

    let client = reqwest::Client::builder()
      .connect_timeout(Duration::from_secs(15))
      .build()
      .map_err(|err| Error::config_error(format!("Failed to build http client: {}", err)))?;

    Ok(HttpBackend {
      client,
      base_url,
      root,
    })
  }

  /// Reads the base URL from `CREWDECK_BACKEND_URL`.
  pub fn from_env() -> Result<Self> {
    let base_url = std::env::var(BACKEND_URL_ENV)
      .map_err(|_| Error::config_error(format!("{} is not set", BACKEND_URL_ENV)))?;

    Self::new(base_url)
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  /// Appends `segments` to the base url, percent-encoding each one.
  fn url(&self, segments: &[&str]) -> Url {
    let mut url = self.root.clone();
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().extend(segments);
    }
    url
  }

  async fn send(
    &self,
    request: reqwest::RequestBuilder,
    signal: &CancelSignal,
  ) -> Result<reqwest::Response> {
    let request = request
      .build()
      .map_err(|err| Error::transport(format!("Invalid request: {}", err)))?;
    let target = format!("{} {}", request.method(), request.url().path());

    let response = tokio::select! {
      res = self.client.execute(request) => res
        .map_err(|err| Error::transport(format!("{}: {}", target, err)))?,
      fired = signal.recv() => return Err(interrupted(fired, &target)),
    };

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      log::debug!("{} returned {}: {}", target, status, body);
      return Err(Error::transport(format!("{} returned {}", target, status)));
    }

    Ok(response)
  }

  async fn json<T: DeserializeOwned>(
    &self,
    request: reqwest::RequestBuilder,
    signal: CancelSignal,
  ) -> Result<T> {
    let response = self.send(request, &signal).await?;
    let target = response.url().path().to_string();

    let body = tokio::select! {
      res = response.bytes() => res
        .map_err(|err| Error::transport(format!("{}: {}", target, err)))?,
      fired = signal.recv() => return Err(interrupted(fired, &target)),
    };

    serde_json::from_slice(&body)
      .map_err(|err| Error::malformed_response(format!("{}: {}", target, err)))
  }
}

fn interrupted(signal: Signal, target: &str) -> Error {
  match signal {
    Signal::Cancel => Error::cancelled(target),
    Signal::Timeout => Error::timeout(target),
  }
}

#[async_trait]
impl Backend for HttpBackend {
  async fn get_configuration(
    &self,
    model_endpoint: &str,
    signal: CancelSignal,
  ) -> Result<WorkflowConfiguration> {
    let request = self
      .client
      .get(self.url(&["configuration"]))
      .query(&[("model_endpoint", model_endpoint)]);

    self.json(request, signal).await
  }

  async fn get_mcp_tool_definitions(
    &self,
    model_endpoint: &str,
    signal: CancelSignal,
  ) -> Result<ToolDefinitions> {
    let request = self
      .client
      .get(self.url(&["mcp", "tool-definitions"]))
      .query(&[("model_endpoint", model_endpoint)]);

    self.json(request, signal).await
  }

  async fn kickoff(
    &self,
    model_endpoint: &str,
    inputs: serde_json::Value,
    signal: CancelSignal,
  ) -> Result<KickoffResponse> {
    let request = self.client.post(self.url(&["kickoff"])).json(&KickoffRequest {
      model_endpoint,
      inputs,
    });

    self.json(request, signal).await
  }

  async fn fetch_events(
    &self,
    trace_id: &TraceId,
    signal: CancelSignal,
  ) -> Result<Vec<ExecutionEvent>> {
    let request = self.client.get(self.url(&trace_events_segments(trace_id)));

    self.json(request, signal).await
  }

  async fn create_session(
    &self,
    mode: SessionMode,
    workflow_ref: &WorkflowRef,
    signal: CancelSignal,
  ) -> Result<SessionResponse> {
    let request = self
      .client
      .post(self.url(&session_segments(mode, workflow_ref)));

    self.json(request, signal).await
  }

  async fn list_directory(&self, path: &str, signal: CancelSignal) -> Result<DirectoryListing> {
    let request = self.client.get(self.url(&["files"])).query(&[("path", path)]);

    self.json(request, signal).await
  }

  async fn upload_file(
    &self,
    path: &str,
    bytes: bytes::Bytes,
    signal: CancelSignal,
  ) -> Result<bool> {
    let request = self
      .client
      .put(self.url(&["files", "content"]))
      .query(&[("path", path)])
      .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
      .body(bytes);

    let res: FileOperationResponse = self.json(request, signal).await?;
    Ok(res.success)
  }

  async fn delete_file(&self, path: &str, signal: CancelSignal) -> Result<bool> {
    let request = self.client.delete(self.url(&["files"])).query(&[("path", path)]);

    let res: FileOperationResponse = self.json(request, signal).await?;
    Ok(res.success)
  }

  async fn test_model(
    &self,
    model_id: &ModelId,
    message: &str,
    timeout: Duration,
    signal: CancelSignal,
  ) -> Result<String> {
    let request = self
      .client
      .post(self.url(&model_test_segments(model_id)))
      .timeout(timeout)
      .json(&ModelTestRequest { message });

    let res: ModelTestResponse = self.json(request, signal).await?;
    Ok(res.response)
  }
}
