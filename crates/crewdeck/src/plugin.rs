use crate::{ArtifactFile, ChatMessage, ExecutionEvent, ModelStatusEvent, RunOutcome, TraceId};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
pub struct RunStartedEvent {
  pub trace_id: TraceId,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EventsAppendedEvent {
  pub trace_id: TraceId,
  pub events: Vec<ExecutionEvent>,
  /// Log length after the append.
  pub total: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArtifactsUpdatedEvent {
  pub session_directory: String,
  pub files: Vec<ArtifactFile>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadState {
  Started,
  Succeeded,
  Failed,
  Cancelled,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UploadStateEvent {
  pub file_name: String,
  pub state: UploadState,
  /// Uploads still in flight after this transition.
  pub in_flight: usize,
}

type OnRunStarted = dyn Fn(RunStartedEvent) + Send + Sync;
type OnEventsAppended = dyn Fn(EventsAppendedEvent) + Send + Sync;
type OnRunCompleted = dyn Fn(RunOutcome) + Send + Sync;
type OnChatMessage = dyn Fn(ChatMessage) + Send + Sync;
type OnModelStatus = dyn Fn(ModelStatusEvent) + Send + Sync;
type OnArtifactsUpdated = dyn Fn(ArtifactsUpdatedEvent) + Send + Sync;
type OnUploadState = dyn Fn(UploadStateEvent) + Send + Sync;

pub trait Plugin: Send + Sync {
  fn name(&self) -> &'static str;
  fn on_run_started(&self, _event: RunStartedEvent) {}
  fn on_events_appended(&self, _event: EventsAppendedEvent) {}
  fn on_run_completed(&self, _outcome: RunOutcome) {}
  fn on_chat_message(&self, _message: ChatMessage) {}
  fn on_model_status(&self, _event: ModelStatusEvent) {}
  fn on_artifacts_updated(&self, _event: ArtifactsUpdatedEvent) {}
  fn on_upload_state(&self, _event: UploadStateEvent) {}
}

pub struct PluginBuilder {
  name: &'static str,
  on_run_started: Option<Box<OnRunStarted>>,
  on_events_appended: Option<Box<OnEventsAppended>>,
  on_run_completed: Option<Box<OnRunCompleted>>,
  on_chat_message: Option<Box<OnChatMessage>>,
  on_model_status: Option<Box<OnModelStatus>>,
  on_artifacts_updated: Option<Box<OnArtifactsUpdated>>,
  on_upload_state: Option<Box<OnUploadState>>,
}

impl PluginBuilder {
  pub fn new(name: &'static str) -> Self {
    PluginBuilder {
      name,
      on_run_started: None,
      on_events_appended: None,
      on_run_completed: None,
      on_chat_message: None,
      on_model_status: None,
      on_artifacts_updated: None,
      on_upload_state: None,
    }
  }

  pub fn on_run_started<T>(mut self, on_run_started: T) -> Self
  where
    T: Fn(RunStartedEvent) + 'static + Send + Sync,
  {
    self.on_run_started = Some(Box::new(on_run_started));
    self
  }

  pub fn on_events_appended<T>(mut self, on_events_appended: T) -> Self
  where
    T: Fn(EventsAppendedEvent) + 'static + Send + Sync,
  {
    self.on_events_appended = Some(Box::new(on_events_appended));
    self
  }

  pub fn on_run_completed<T>(mut self, on_run_completed: T) -> Self
  where
    T: Fn(RunOutcome) + 'static + Send + Sync,
  {
    self.on_run_completed = Some(Box::new(on_run_completed));
    self
  }

  pub fn on_chat_message<T>(mut self, on_chat_message: T) -> Self
  where
    T: Fn(ChatMessage) + 'static + Send + Sync,
  {
    self.on_chat_message = Some(Box::new(on_chat_message));
    self
  }

  pub fn on_model_status<T>(mut self, on_model_status: T) -> Self
  where
    T: Fn(ModelStatusEvent) + 'static + Send + Sync,
  {
    self.on_model_status = Some(Box::new(on_model_status));
    self
  }

  pub fn on_artifacts_updated<T>(mut self, on_artifacts_updated: T) -> Self
  where
    T: Fn(ArtifactsUpdatedEvent) + 'static + Send + Sync,
  {
    self.on_artifacts_updated = Some(Box::new(on_artifacts_updated));
    self
  }

  pub fn on_upload_state<T>(mut self, on_upload_state: T) -> Self
  where
    T: Fn(UploadStateEvent) + 'static + Send + Sync,
  {
    self.on_upload_state = Some(Box::new(on_upload_state));
    self
  }

  pub fn build(self) -> CrewdeckPlugin {
    CrewdeckPlugin {
      name: self.name,
      on_run_started: self.on_run_started,
      on_events_appended: self.on_events_appended,
      on_run_completed: self.on_run_completed,
      on_chat_message: self.on_chat_message,
      on_model_status: self.on_model_status,
      on_artifacts_updated: self.on_artifacts_updated,
      on_upload_state: self.on_upload_state,
    }
  }
}

pub struct CrewdeckPlugin {
  name: &'static str,
  on_run_started: Option<Box<OnRunStarted>>,
  on_events_appended: Option<Box<OnEventsAppended>>,
  on_run_completed: Option<Box<OnRunCompleted>>,
  on_chat_message: Option<Box<OnChatMessage>>,
  on_model_status: Option<Box<OnModelStatus>>,
  on_artifacts_updated: Option<Box<OnArtifactsUpdated>>,
  on_upload_state: Option<Box<OnUploadState>>,
}

impl CrewdeckPlugin {
  pub fn builder(name: &'static str) -> PluginBuilder {
    PluginBuilder::new(name)
  }
}

impl Plugin for CrewdeckPlugin {
  fn name(&self) -> &'static str {
    self.name
  }

  fn on_run_started(&self, event: RunStartedEvent) {
    if let Some(on_run_started) = &self.on_run_started {
      on_run_started(event);
    }
  }

  fn on_events_appended(&self, event: EventsAppendedEvent) {
    if let Some(on_events_appended) = &self.on_events_appended {
      on_events_appended(event);
    }
  }

  fn on_run_completed(&self, outcome: RunOutcome) {
    if let Some(on_run_completed) = &self.on_run_completed {
      on_run_completed(outcome);
    }
  }

  fn on_chat_message(&self, message: ChatMessage) {
    if let Some(on_chat_message) = &self.on_chat_message {
      on_chat_message(message);
    }
  }

  fn on_model_status(&self, event: ModelStatusEvent) {
    if let Some(on_model_status) = &self.on_model_status {
      on_model_status(event);
    }
  }

  fn on_artifacts_updated(&self, event: ArtifactsUpdatedEvent) {
    if let Some(on_artifacts_updated) = &self.on_artifacts_updated {
      on_artifacts_updated(event);
    }
  }

  fn on_upload_state(&self, event: UploadStateEvent) {
    if let Some(on_upload_state) = &self.on_upload_state {
      on_upload_state(event);
    }
  }
}

/// Fan-out of coordinator notifications to registered plugins.
///
/// Hooks run synchronously on the task that produced the notification and
/// must not block.
#[derive(Clone, Default)]
pub struct PluginManager {
  pub(crate) plugins: Arc<Mutex<Vec<Arc<dyn Plugin>>>>,
}

impl PluginManager {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn size(&self) -> usize {
    self.plugins.lock().len()
  }

  pub fn register<P: Plugin + 'static>(&self, plugin: P) {
    let mut plugins = self.plugins.lock();

    plugins.retain(|p| p.name() != plugin.name());

    plugins.push(Arc::new(plugin));
  }

  pub fn unregister(&self, name: &'static str) {
    self.plugins.lock().retain(|plugin| plugin.name() != name);
  }

  // Hooks may register or unregister plugins, so they run on a snapshot.
  fn snapshot(&self) -> Vec<Arc<dyn Plugin>> {
    self.plugins.lock().clone()
  }

  pub fn on_run_started(&self, event: RunStartedEvent) {
    for plugin in self.snapshot() {
      plugin.on_run_started(event.clone());
    }
  }

  pub fn on_events_appended(&self, event: EventsAppendedEvent) {
    for plugin in self.snapshot() {
      plugin.on_events_appended(event.clone());
    }
  }

  pub fn on_run_completed(&self, outcome: RunOutcome) {
    for plugin in self.snapshot() {
      plugin.on_run_completed(outcome.clone());
    }
  }

  pub fn on_chat_message(&self, message: ChatMessage) {
    for plugin in self.snapshot() {
      plugin.on_chat_message(message.clone());
    }
  }

  pub fn on_model_status(&self, event: ModelStatusEvent) {
    for plugin in self.snapshot() {
      plugin.on_model_status(event.clone());
    }
  }

  pub fn on_artifacts_updated(&self, event: ArtifactsUpdatedEvent) {
    for plugin in self.snapshot() {
      plugin.on_artifacts_updated(event.clone());
    }
  }

  pub fn on_upload_state(&self, event: UploadStateEvent) {
    for plugin in self.snapshot() {
      plugin.on_upload_state(event.clone());
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{ModelId, ModelTestStatus};

  #[test]
  fn plugin_manager_register() {
    let plugin_manager = PluginManager::new();

    plugin_manager.register(PluginBuilder::new("test").build());
    plugin_manager.register(PluginBuilder::new("test").build());

    assert_eq!(plugin_manager.size(), 1);
  }

  #[test]
  fn plugin_manager_unregister() {
    let plugin_manager = PluginManager::new();

    plugin_manager.register(PluginBuilder::new("test").build());
    plugin_manager.unregister("test");

    assert_eq!(plugin_manager.size(), 0);
  }

  #[test]
  fn plugin_manager_on_model_status() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let plugin_manager = PluginManager::new();
    let plugin = PluginBuilder::new("test")
      .on_model_status({
        let seen = seen.clone();
        move |event| seen.lock().push(event.status)
      })
      .build();

    plugin_manager.register(plugin);
    plugin_manager.on_model_status(ModelStatusEvent {
      model_id: ModelId::new("gpt"),
      status: ModelTestStatus::Pending,
      attempts: 0,
    });

    assert_eq!(*seen.lock(), vec![ModelTestStatus::Pending]);
  }

  #[test]
  fn hook_can_unregister_itself() {
    let plugin_manager = PluginManager::new();
    let plugin = PluginBuilder::new("once")
      .on_run_started({
        let plugin_manager = plugin_manager.clone();
        move |_| plugin_manager.unregister("once")
      })
      .build();

    plugin_manager.register(plugin);
    plugin_manager.on_run_started(RunStartedEvent {
      trace_id: TraceId::new("t1"),
    });

    assert_eq!(plugin_manager.size(), 0);
  }

  #[test]
  fn test_plugin_trait() {
    struct TestPlugin;

    impl Plugin for TestPlugin {
      fn name(&self) -> &'static str {
        "test"
      }
    }

    let plugin_manager = PluginManager::new();

    plugin_manager.register(TestPlugin);
    plugin_manager.on_upload_state(UploadStateEvent {
      file_name: "a.txt".to_string(),
      state: UploadState::Started,
      in_flight: 1,
    });
  }
}
