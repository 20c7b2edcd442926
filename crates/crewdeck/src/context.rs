use crate::{
  discovery::discover_tool_definitions, ArtifactBrowser, ArtifactFile, CancelSignal,
  CoordinatorConfig, Error, EventStreamMonitor, MonitorState, PluginManager, Result, RunOutcome,
  RunState, SessionManager, SharedBackend, TraceId, UploadFile, UploadManager, UploadResult,
  WorkflowConfiguration, WorkflowSession, WorkflowTarget,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// Everything scoped to one workflow context: the session, the active run,
/// the artifact watcher and the uploads.
///
/// Dropping the context (or calling [`WorkflowContext::teardown`]) stops the
/// monitor and the artifact watcher and cancels in-flight uploads. Results
/// arriving afterwards are discarded. A new workflow means a new context.
pub struct WorkflowContext {
  target: WorkflowTarget,
  backend: SharedBackend,
  config: CoordinatorConfig,
  signal: CancelSignal,
  sessions: SessionManager,
  uploads: UploadManager,
  artifacts: ArtifactBrowser,
  monitor: EventStreamMonitor,
  configuration: Arc<Mutex<Option<WorkflowConfiguration>>>,
}

impl WorkflowContext {
  pub(crate) fn new(
    target: WorkflowTarget,
    backend: SharedBackend,
    config: CoordinatorConfig,
    plugins: PluginManager,
  ) -> Self {
    let signal = CancelSignal::new();
    let sessions = SessionManager::new(
      backend.clone(),
      target.mode,
      target.workflow_ref.clone(),
      signal.clone(),
    );
    let uploads = UploadManager::new(backend.clone(), sessions.clone(), plugins.clone());
    let artifacts = ArtifactBrowser::new(backend.clone(), plugins.clone(), &config);
    let monitor = EventStreamMonitor::new(backend.clone(), plugins, &config);

    WorkflowContext {
      target,
      backend,
      config,
      signal,
      sessions,
      uploads,
      artifacts,
      monitor,
      configuration: Arc::new(Mutex::new(None)),
    }
  }

  pub fn target(&self) -> &WorkflowTarget {
    &self.target
  }

  pub fn is_torn_down(&self) -> bool {
    self.signal.is_fired()
  }

  fn ensure_active(&self) -> Result<()> {
    if self.is_torn_down() {
      return Err(Error::cancelled(format!(
        "workflow context {} was torn down",
        self.target.workflow_ref
      )));
    }

    Ok(())
  }

  /// Fetches the static configuration, then waits (bounded) for the MCP tool
  /// definitions. Missing definitions leave `mcp_tool_definitions` empty.
  pub async fn load_configuration(&self) -> Result<WorkflowConfiguration> {
    self.ensure_active()?;

    let mut configuration = self
      .backend
      .get_configuration(&self.target.model_endpoint, self.signal.clone())
      .await?;

    match discover_tool_definitions(
      self.backend.clone(),
      &self.target.model_endpoint,
      &self.config,
      self.signal.clone(),
    )
    .await
    {
      Some(definitions) => configuration.mcp_tool_definitions = definitions,
      None => log::warn!(
        "Continuing without MCP tool definitions for {}",
        self.target.workflow_ref
      ),
    }

    self.ensure_active()?;
    *self.configuration.lock() = Some(configuration.clone());

    Ok(configuration)
  }

  pub fn configuration(&self) -> Option<WorkflowConfiguration> {
    self.configuration.lock().clone()
  }

  /// Kicks off a run and starts monitoring its events. A run still being
  /// monitored is replaced.
  pub async fn run(&self, inputs: serde_json::Value) -> Result<TraceId> {
    self.ensure_active()?;

    let response = self
      .backend
      .kickoff(&self.target.model_endpoint, inputs, self.signal.clone())
      .await?;

    if response.trace_id.as_str().trim().is_empty() {
      return Err(Error::malformed_response("kickoff returned an empty trace id"));
    }

    self.ensure_active()?;
    self
      .monitor
      .start(response.trace_id.clone(), self.target.conversational);

    Ok(response.trace_id)
  }

  pub fn stop_run(&self) {
    self.monitor.stop();
  }

  pub async fn wait_for_completion(&self) -> Option<RunOutcome> {
    self.monitor.wait_for_completion().await
  }

  pub fn monitor_state(&self) -> MonitorState {
    self.monitor.state()
  }

  pub fn run_state(&self) -> RunState {
    self.monitor.run_state()
  }

  pub fn set_current_event_index(&self, index: usize) -> usize {
    self
      .monitor
      .with_run_state(|state| state.set_current_event_index(index))
  }

  pub fn follow_latest(&self) {
    self.monitor.with_run_state(|state| state.follow_latest());
  }

  /// The session, created on first use. Starts the artifact watcher once a
  /// session is available.
  pub async fn ensure_session(&self) -> Result<WorkflowSession> {
    self.ensure_active()?;

    let session = self.sessions.ensure_session().await?;

    self.ensure_active()?;
    self.artifacts.watch_if_idle(session.clone());

    Ok(session)
  }

  pub fn session(&self) -> Option<WorkflowSession> {
    self.sessions.session()
  }

  pub async fn upload_file(&self, file: UploadFile) -> Result<()> {
    self.ensure_session().await?;

    self.uploads.upload_file(file).await
  }

  pub async fn upload_files(&self, files: Vec<UploadFile>) -> Result<Vec<UploadResult>> {
    self.ensure_session().await?;

    self.uploads.upload_files(files).await
  }

  pub fn cancel_upload(&self, file_name: &str) -> bool {
    self.uploads.cancel_upload(file_name)
  }

  pub fn is_uploading(&self) -> bool {
    self.uploads.is_uploading()
  }

  pub fn active_uploads(&self) -> Vec<String> {
    self.uploads.active_uploads()
  }

  pub fn artifacts(&self) -> Vec<ArtifactFile> {
    self.artifacts.artifacts()
  }

  /// Lists the session directory now instead of waiting for the next tick.
  pub async fn refresh_artifacts(&self) -> Result<Vec<ArtifactFile>> {
    let session = self.ensure_session().await?;

    self.artifacts.list_artifacts(&session.session_directory).await
  }

  /// Stops every loop of this context. Safe to call more than once.
  pub fn teardown(&self) {
    if self.signal.cancel().is_err() {
      return;
    }

    log::debug!("Tearing down workflow context {}", self.target.workflow_ref);
    self.monitor.reset();
    self.artifacts.clear();
    self.uploads.cancel_all();
  }
}

impl Drop for WorkflowContext {
  fn drop(&mut self) {
    self.teardown();
  }
}
