use crate::{
  config::MODEL_TEST_FAILED_PREFIX, CancelSignal, CoordinatorConfig, ModelId, ModelStatusEvent,
  ModelTestStatus, PluginManager, SharedBackend,
};
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc, time::Duration};

#[derive(Debug, Clone)]
struct StatusEntry {
  status: ModelTestStatus,
  sequence: u64,
}

/// Validates model endpoints with a bounded number of `test_model` attempts.
///
/// Each `validate` call starts a new attempt sequence that moves the model to
/// `Pending`, then to `Success` at the first passing attempt or to `Failure`
/// once every attempt failed. Starting a new sequence for a model supersedes
/// the one in progress; the older sequence stops and never writes a status.
#[derive(Clone)]
pub struct ModelValidator {
  backend: SharedBackend,
  plugins: PluginManager,
  attempts: usize,
  delay: Duration,
  call_timeout: Duration,
  probe_message: String,
  statuses: Arc<Mutex<HashMap<ModelId, StatusEntry>>>,
  next_sequence: Arc<Mutex<u64>>,
}

impl ModelValidator {
  pub fn new(backend: SharedBackend, plugins: PluginManager, config: &CoordinatorConfig) -> Self {
    ModelValidator {
      backend,
      plugins,
      attempts: config.validation_attempts.max(1),
      delay: config.validation_delay,
      call_timeout: config.validation_call_timeout,
      probe_message: config.probe_message.clone(),
      statuses: Arc::new(Mutex::new(HashMap::new())),
      next_sequence: Arc::new(Mutex::new(0)),
    }
  }

  pub fn status(&self, model_id: &ModelId) -> Option<ModelTestStatus> {
    self.statuses.lock().get(model_id).map(|entry| entry.status)
  }

  pub fn statuses(&self) -> HashMap<ModelId, ModelTestStatus> {
    self
      .statuses
      .lock()
      .iter()
      .map(|(model_id, entry)| (model_id.clone(), entry.status))
      .collect()
  }

  /// Forgets a model, e.g. when it is unregistered. A running sequence stops.
  pub fn forget(&self, model_id: &ModelId) {
    self.statuses.lock().remove(model_id);
  }

  /// Starts validation in the background and returns immediately; the status
  /// is already `Pending` when this returns.
  pub fn spawn_validate(&self, model_id: ModelId) -> tokio::task::JoinHandle<ModelTestStatus> {
    let sequence = self.begin(&model_id);
    let validator = self.clone();

    tokio::spawn(async move { validator.run_sequence(model_id, sequence).await })
  }

  /// Runs one attempt sequence to its terminal status.
  pub async fn validate(&self, model_id: ModelId) -> ModelTestStatus {
    let sequence = self.begin(&model_id);
    self.run_sequence(model_id, sequence).await
  }

  fn begin(&self, model_id: &ModelId) -> u64 {
    let sequence = {
      let mut next = self.next_sequence.lock();
      *next += 1;
      *next
    };

    self.statuses.lock().insert(
      model_id.clone(),
      StatusEntry {
        status: ModelTestStatus::Pending,
        sequence,
      },
    );

    self.plugins.on_model_status(ModelStatusEvent {
      model_id: model_id.clone(),
      status: ModelTestStatus::Pending,
      attempts: 0,
    });

    sequence
  }

  fn is_current(&self, model_id: &ModelId, sequence: u64) -> bool {
    self
      .statuses
      .lock()
      .get(model_id)
      .map_or(false, |entry| entry.sequence == sequence)
  }

  async fn run_sequence(&self, model_id: ModelId, sequence: u64) -> ModelTestStatus {
    let mut passed = false;
    let mut attempts = 0;

    for attempt in 1..=self.attempts {
      if attempt > 1 {
        tokio::time::sleep(self.delay).await;
      }

      if !self.is_current(&model_id, sequence) {
        log::debug!("Validation of {} superseded", model_id);
        return self.status(&model_id).unwrap_or(ModelTestStatus::Pending);
      }

      attempts = attempt;
      if self.attempt(&model_id, attempt).await {
        passed = true;
        break;
      }
    }

    let status = if passed {
      ModelTestStatus::Success
    } else {
      ModelTestStatus::Failure
    };

    {
      let mut statuses = self.statuses.lock();
      match statuses.get_mut(&model_id) {
        Some(entry) if entry.sequence == sequence => entry.status = status,
        _ => {
          log::debug!("Dropping stale {} status of {}", status, model_id);
          return statuses
            .get(&model_id)
            .map_or(ModelTestStatus::Pending, |entry| entry.status);
        }
      }
    }

    log::info!(
      "Model {} validation finished: {} after {} attempts",
      model_id,
      status,
      attempts
    );

    self.plugins.on_model_status(ModelStatusEvent {
      model_id,
      status,
      attempts,
    });

    status
  }

  async fn attempt(&self, model_id: &ModelId, attempt: usize) -> bool {
    let signal = CancelSignal::new();
    let call = self.backend.test_model(
      model_id,
      &self.probe_message,
      self.call_timeout,
      signal.clone(),
    );

    match tokio::time::timeout(self.call_timeout, call).await {
      Ok(Ok(response)) if !response.starts_with(MODEL_TEST_FAILED_PREFIX) => true,
      Ok(Ok(response)) => {
        log::warn!(
          "Model {} attempt {}/{} failed: {}",
          model_id,
          attempt,
          self.attempts,
          response
        );
        false
      }
      Ok(Err(err)) => {
        log::warn!(
          "Model {} attempt {}/{} errored: {}",
          model_id,
          attempt,
          self.attempts,
          err
        );
        false
      }
      Err(_) => {
        let _ = signal.timeout();
        log::warn!(
          "Model {} attempt {}/{} timed out after {}",
          model_id,
          attempt,
          self.attempts,
          humantime::format_duration(self.call_timeout)
        );
        false
      }
    }
  }
}
