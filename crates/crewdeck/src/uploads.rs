use crate::{
  CancelSignal, Error, PluginManager, Result, SessionManager, SharedBackend, UploadFile,
  UploadResult, UploadState, UploadStateEvent, WorkflowSession,
};
use bytes::Bytes;
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};
use uuid::Uuid;

/// An in-flight upload. Present in the tracker exactly while in flight.
#[derive(Debug, Clone)]
pub struct UploadTask {
  pub id: Uuid,
  pub file_name: String,
  signal: CancelSignal,
}

/// Uploads files into the session directory and tracks each transfer so it
/// can be cancelled on its own.
#[derive(Clone)]
pub struct UploadManager {
  backend: SharedBackend,
  sessions: SessionManager,
  plugins: PluginManager,
  active: Arc<Mutex<HashMap<Uuid, UploadTask>>>,
}

impl UploadManager {
  pub fn new(backend: SharedBackend, sessions: SessionManager, plugins: PluginManager) -> Self {
    UploadManager {
      backend,
      sessions,
      plugins,
      active: Arc::new(Mutex::new(HashMap::new())),
    }
  }

  /// True while at least one upload is in flight.
  pub fn is_uploading(&self) -> bool {
    !self.active.lock().is_empty()
  }

  pub fn in_flight(&self) -> usize {
    self.active.lock().len()
  }

  pub fn active_uploads(&self) -> Vec<String> {
    let mut names: Vec<String> = self
      .active
      .lock()
      .values()
      .map(|task| task.file_name.clone())
      .collect();
    names.sort();
    names
  }

  pub async fn upload_file(&self, file: UploadFile) -> Result<()> {
    let session = self.sessions.ensure_session().await?;

    self.upload_into(&session, file).await
  }

  /// Creates the session once, then uploads every file concurrently.
  pub async fn upload_files(&self, files: Vec<UploadFile>) -> Result<Vec<UploadResult>> {
    let session = self.sessions.ensure_session().await?;

    let uploads = files.into_iter().map(|file| {
      let session = &session;
      async move {
        let file_name = file.name.clone();
        let result = self.upload_into(session, file).await;
        UploadResult { file_name, result }
      }
    });

    Ok(futures::future::join_all(uploads).await)
  }

  /// Aborts every in-flight upload of `file_name`. Returns whether one was found.
  pub fn cancel_upload(&self, file_name: &str) -> bool {
    let (cancelled, in_flight) = {
      let mut active = self.active.lock();
      let ids: Vec<Uuid> = active
        .values()
        .filter(|task| task.file_name == file_name)
        .map(|task| task.id)
        .collect();

      let cancelled: Vec<UploadTask> = ids.iter().filter_map(|id| active.remove(id)).collect();
      (cancelled, active.len())
    };

    for task in &cancelled {
      let _ = task.signal.cancel();
      log::info!("Cancelled upload of {}", task.file_name);
      self.plugins.on_upload_state(UploadStateEvent {
        file_name: task.file_name.clone(),
        state: UploadState::Cancelled,
        in_flight,
      });
    }

    !cancelled.is_empty()
  }

  /// Aborts every in-flight upload.
  pub fn cancel_all(&self) {
    let tasks: Vec<UploadTask> = self.active.lock().drain().map(|(_, task)| task).collect();

    for task in tasks {
      let _ = task.signal.cancel();
      self.plugins.on_upload_state(UploadStateEvent {
        file_name: task.file_name,
        state: UploadState::Cancelled,
        in_flight: 0,
      });
    }
  }

  async fn upload_into(&self, session: &WorkflowSession, file: UploadFile) -> Result<()> {
    let task = self.track(&file.name);
    let path = session.file_path(&file.name);

    let res = tokio::select! {
      res = self.transfer(&path, &file.name, file.bytes, task.signal.clone()) => res,
      _ = task.signal.recv() => Err(Error::cancelled(format!("upload of {}", file.name))),
    };

    let res = if task.signal.is_cancelled() {
      Err(Error::cancelled(format!("upload of {}", file.name)))
    } else {
      res
    };

    self.untrack(&task, &res);

    res
  }

  async fn transfer(
    &self,
    path: &str,
    file_name: &str,
    bytes: Bytes,
    signal: CancelSignal,
  ) -> Result<()> {
    // A previous file may or may not exist; either way is fine.
    match self.backend.delete_file(path, signal.clone()).await {
      Ok(true) => log::debug!("Replaced existing {}", path),
      Ok(false) => {}
      Err(err) => log::debug!("Ignoring delete failure for {}: {}", path, err),
    }

    match self.backend.upload_file(path, bytes, signal).await {
      Ok(true) => {
        log::info!("Uploaded {} to {}", file_name, path);
        Ok(())
      }
      Ok(false) => {
        log::error!("Backend rejected upload of {}", file_name);
        Err(Error::upload_failed(file_name))
      }
      Err(err) => {
        log::error!("Upload of {} failed: {}", file_name, err);
        Err(err)
      }
    }
  }

  fn track(&self, file_name: &str) -> UploadTask {
    let task = UploadTask {
      id: Uuid::new_v4(),
      file_name: file_name.to_string(),
      signal: CancelSignal::new(),
    };

    let in_flight = {
      let mut active = self.active.lock();
      active.insert(task.id, task.clone());
      active.len()
    };

    self.plugins.on_upload_state(UploadStateEvent {
      file_name: task.file_name.clone(),
      state: UploadState::Started,
      in_flight,
    });

    task
  }

  fn untrack(&self, task: &UploadTask, res: &Result<()>) {
    let (removed, in_flight) = {
      let mut active = self.active.lock();
      let removed = active.remove(&task.id).is_some();
      (removed, active.len())
    };

    // cancel_upload already removed and reported it
    if !removed {
      return;
    }

    let state = match res {
      Ok(()) => UploadState::Succeeded,
      Err(err) if err.is_cancelled() => UploadState::Cancelled,
      Err(_) => UploadState::Failed,
    };

    self.plugins.on_upload_state(UploadStateEvent {
      file_name: task.file_name.clone(),
      state,
      in_flight,
    });
  }
}
