use crate::{
  ArtifactFile, ArtifactsUpdatedEvent, CancelSignal, CoordinatorConfig, PluginManager, Result,
  SharedBackend, WorkflowSession,
};
use parking_lot::Mutex;
use std::{sync::Arc, time::Duration};

/// Cached listing of a session directory, refreshed on a timer while a
/// session is active. Each refresh replaces the cached listing wholesale.
#[derive(Clone)]
pub struct ArtifactBrowser {
  backend: SharedBackend,
  plugins: PluginManager,
  interval: Duration,
  files: Arc<Mutex<Vec<ArtifactFile>>>,
  watcher: Arc<Mutex<Option<CancelSignal>>>,
}

impl ArtifactBrowser {
  pub fn new(backend: SharedBackend, plugins: PluginManager, config: &CoordinatorConfig) -> Self {
    ArtifactBrowser {
      backend,
      plugins,
      interval: config.artifact_refresh_interval,
      files: Arc::new(Mutex::new(Vec::new())),
      watcher: Arc::new(Mutex::new(None)),
    }
  }

  /// Last successful listing.
  pub fn artifacts(&self) -> Vec<ArtifactFile> {
    self.files.lock().clone()
  }

  pub fn is_watching(&self) -> bool {
    self.watcher.lock().is_some()
  }

  /// Lists `session_directory`, drops blank names, sorts by name and
  /// replaces the cache.
  pub async fn list_artifacts(&self, session_directory: &str) -> Result<Vec<ArtifactFile>> {
    self.refresh(session_directory, &CancelSignal::new()).await
  }

  /// Lists once now, then every refresh interval until [`ArtifactBrowser::stop`].
  pub fn watch(&self, session: WorkflowSession) {
    let signal = CancelSignal::new();

    if let Some(previous) = self.watcher.lock().replace(signal.clone()) {
      let _ = previous.cancel();
    }

    self.spawn_watcher(session, signal);
  }

  /// Like [`ArtifactBrowser::watch`] but leaves a running watcher alone.
  /// Returns whether a new watcher was started.
  pub fn watch_if_idle(&self, session: WorkflowSession) -> bool {
    let signal = {
      let mut watcher = self.watcher.lock();
      if watcher.is_some() {
        return false;
      }

      let signal = CancelSignal::new();
      *watcher = Some(signal.clone());
      signal
    };

    self.spawn_watcher(session, signal);
    true
  }

  fn spawn_watcher(&self, session: WorkflowSession, signal: CancelSignal) {
    log::debug!(
      "Watching artifacts of session {} every {}",
      session.session_id,
      humantime::format_duration(self.interval)
    );

    let browser = self.clone();
    tokio::spawn(async move {
      loop {
        if let Err(err) = browser.refresh(&session.session_directory, &signal).await {
          log::warn!(
            "Failed to list artifacts in {}: {}",
            session.session_directory,
            err
          );
        }

        tokio::select! {
          _ = tokio::time::sleep(browser.interval) => {}
          _ = signal.recv() => break,
        }
      }

      log::debug!("Stopped watching artifacts of session {}", session.session_id);
    });
  }

  pub fn stop(&self) {
    if let Some(signal) = self.watcher.lock().take() {
      let _ = signal.cancel();
    }
  }

  /// Stops watching and forgets the cached listing.
  pub fn clear(&self) {
    self.stop();
    self.files.lock().clear();
  }

  async fn refresh(&self, session_directory: &str, signal: &CancelSignal) -> Result<Vec<ArtifactFile>> {
    if signal.is_fired() {
      return Ok(self.artifacts());
    }

    let listing = self
      .backend
      .list_directory(session_directory, signal.clone())
      .await?;
    let files = listing.into_artifacts(session_directory);

    {
      let mut cached = self.files.lock();
      // results of a listing that outlived its watcher are dropped
      if signal.is_fired() {
        return Ok(cached.clone());
      }
      *cached = files.clone();
    }

    self.plugins.on_artifacts_updated(ArtifactsUpdatedEvent {
      session_directory: session_directory.to_string(),
      files: files.clone(),
    });

    Ok(files)
  }
}
