use crate::{
  CancelSignal, Error, Result, SessionMode, SharedBackend, WorkflowRef, WorkflowSession,
};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::sync::Arc;

type PendingSession = Shared<BoxFuture<'static, Result<WorkflowSession>>>;

#[derive(Default)]
struct SessionSlot {
  session: Option<WorkflowSession>,
  attempt: u64,
  pending: Option<PendingSession>,
}

/// Lazily created, memoized execution session of one workflow context.
///
/// Concurrent `ensure_session` calls share a single in-flight creation and
/// all of them observe its outcome, success or error. A failed creation is
/// not cached: the next call after the failure starts a new attempt.
#[derive(Clone)]
pub struct SessionManager {
  backend: SharedBackend,
  mode: SessionMode,
  workflow_ref: WorkflowRef,
  slot: Arc<Mutex<SessionSlot>>,
  signal: CancelSignal,
}

impl SessionManager {
  pub fn new(
    backend: SharedBackend,
    mode: SessionMode,
    workflow_ref: WorkflowRef,
    signal: CancelSignal,
  ) -> Self {
    SessionManager {
      backend,
      mode,
      workflow_ref,
      slot: Arc::new(Mutex::new(SessionSlot::default())),
      signal,
    }
  }

  pub fn mode(&self) -> SessionMode {
    self.mode
  }

  /// The cached session, if one was created.
  pub fn session(&self) -> Option<WorkflowSession> {
    self.slot.lock().session.clone()
  }

  pub async fn ensure_session(&self) -> Result<WorkflowSession> {
    let (attempt, pending) = {
      let mut slot = self.slot.lock();
      if let Some(session) = &slot.session {
        return Ok(session.clone());
      }

      match &slot.pending {
        Some(pending) => (slot.attempt, pending.clone()),
        None => {
          let pending = create_session(
            self.backend.clone(),
            self.mode,
            self.workflow_ref.clone(),
            self.signal.clone(),
          )
          .boxed()
          .shared();

          slot.attempt += 1;
          slot.pending = Some(pending.clone());
          (slot.attempt, pending)
        }
      }
    };

    let res = pending.await;

    let mut slot = self.slot.lock();
    // the first waiter to wake settles the attempt for everyone
    if slot.attempt == attempt && slot.pending.is_some() {
      slot.pending = None;
      if let Ok(session) = &res {
        slot.session = Some(session.clone());
      }
    }

    res
  }
}

async fn create_session(
  backend: SharedBackend,
  mode: SessionMode,
  workflow_ref: WorkflowRef,
  signal: CancelSignal,
) -> Result<WorkflowSession> {
  if signal.is_fired() {
    return Err(Error::cancelled("workflow context was torn down"));
  }

  if workflow_ref.is_blank() {
    return Err(Error::missing_identifier(format!(
      "{} session requires a {}",
      mode,
      mode.identifier_name()
    )));
  }

  log::info!("Creating {} session for {}", mode, workflow_ref);

  // The binding picks the creation endpoint from the mode.
  let response = backend
    .create_session(mode, &workflow_ref, signal)
    .await?;

  let session = WorkflowSession::try_from(response).map_err(|err| {
    log::error!("Session creation for {} failed: {}", workflow_ref, err);
    err
  })?;

  log::info!(
    "Session {} ready at {}",
    session.session_id,
    session.session_directory
  );

  Ok(session)
}
