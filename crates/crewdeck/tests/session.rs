mod common;

use common::{shared, FakeBackend};
use crewdeck::{
  CancelSignal, Error, SessionManager, SessionMode, SessionResponse, SharedBackend, WorkflowRef,
};
use std::sync::Arc;

fn manager(backend: Arc<FakeBackend>, mode: SessionMode, workflow_ref: &str) -> SessionManager {
  let backend: SharedBackend = backend;
  SessionManager::new(
    backend,
    mode,
    WorkflowRef::new(workflow_ref),
    CancelSignal::new(),
  )
}

#[crewdeck_test::test(paused)]
async fn test_concurrent_callers_share_one_session() {
  let backend = shared(FakeBackend::default());
  let sessions = manager(backend.clone(), SessionMode::Studio, "studio-1");

  let calls = (0..10).map(|_| sessions.ensure_session());
  let results = futures::future::join_all(calls).await;

  assert_eq!(backend.session_calls(), 1);

  let mut sessions_seen = results.into_iter().map(|res| res.unwrap());
  let first = sessions_seen.next().unwrap();
  assert_eq!(first.session_id, "session-1");
  assert_eq!(first.session_directory, "/sessions/session-1");
  for session in sessions_seen {
    assert_eq!(session, first);
  }

  // cached afterwards
  let again = sessions.ensure_session().await.unwrap();
  assert_eq!(again, first);
  assert_eq!(backend.session_calls(), 1);
  assert_eq!(sessions.session(), Some(first));
}

#[crewdeck_test::test(paused)]
async fn test_mode_and_reference_are_forwarded() {
  let backend = shared(FakeBackend::default());
  let sessions = manager(backend.clone(), SessionMode::Workflow, "wf-42");

  sessions.ensure_session().await.unwrap();

  let calls = backend.session_calls.lock().clone();
  assert_eq!(
    calls,
    vec![(SessionMode::Workflow, WorkflowRef::new("wf-42"))]
  );
}

#[crewdeck_test::test(paused)]
async fn test_missing_identifier_makes_no_request() {
  let backend = shared(FakeBackend::default());

  let studio = manager(backend.clone(), SessionMode::Studio, "  ");
  let err = studio.ensure_session().await.unwrap_err();
  assert_eq!(
    err,
    Error::missing_identifier("studio session requires a studio id")
  );

  let workflow = manager(backend.clone(), SessionMode::Workflow, "");
  let err = workflow.ensure_session().await.unwrap_err();
  assert!(matches!(err, Error::MissingIdentifier(_)));

  assert_eq!(backend.session_calls(), 0);
  assert_eq!(studio.session(), None);
}

#[crewdeck_test::test(paused)]
async fn test_malformed_response_is_not_cached() {
  let backend = shared(FakeBackend::default());
  *backend.session_response.lock() = Ok(SessionResponse {
    session_id: Some("session-1".to_string()),
    session_directory: None,
  });
  let sessions = manager(backend.clone(), SessionMode::Studio, "studio-1");

  let err = sessions.ensure_session().await.unwrap_err();
  assert_eq!(
    err,
    Error::malformed_response("session response has no session directory")
  );
  assert_eq!(sessions.session(), None);

  *backend.session_response.lock() = Ok(SessionResponse::new("session-2", "/sessions/session-2"));

  let session = sessions.ensure_session().await.unwrap();
  assert_eq!(session.session_id, "session-2");
  assert_eq!(backend.session_calls(), 2);
}

#[crewdeck_test::test(paused)]
async fn test_blank_session_id_is_malformed() {
  let backend = shared(FakeBackend::default());
  *backend.session_response.lock() = Ok(SessionResponse::new("", "/sessions/x"));
  let sessions = manager(backend.clone(), SessionMode::Studio, "studio-1");

  let err = sessions.ensure_session().await.unwrap_err();
  assert_eq!(
    err,
    Error::malformed_response("session response has no session id")
  );
}

#[crewdeck_test::test(paused)]
async fn test_concurrent_callers_share_one_failure() {
  let backend = shared(FakeBackend::default());
  *backend.session_response.lock() = Err(Error::transport("503 service unavailable"));
  let sessions = manager(backend.clone(), SessionMode::Studio, "studio-1");

  let calls = (0..10).map(|_| sessions.ensure_session());
  let results = futures::future::join_all(calls).await;

  assert_eq!(backend.session_calls(), 1);
  for res in results {
    assert_eq!(
      res.unwrap_err(),
      Error::transport("503 service unavailable")
    );
  }
  assert_eq!(sessions.session(), None);

  // only a later call starts a new attempt
  *backend.session_response.lock() = Ok(SessionResponse::new("session-2", "/sessions/session-2"));
  let session = sessions.ensure_session().await.unwrap();
  assert_eq!(session.session_id, "session-2");
  assert_eq!(backend.session_calls(), 2);
}

#[crewdeck_test::test(paused)]
async fn test_transport_error_propagates() {
  let backend = shared(FakeBackend::default());
  *backend.session_response.lock() = Err(Error::transport("503 service unavailable"));
  let sessions = manager(backend.clone(), SessionMode::Studio, "studio-1");

  let err = sessions.ensure_session().await.unwrap_err();
  assert!(matches!(err, Error::Transport(_)));
}

#[crewdeck_test::test(paused)]
async fn test_torn_down_context_creates_nothing() {
  let backend = shared(FakeBackend::default());
  let signal = CancelSignal::new();
  let shared_backend: SharedBackend = backend.clone();
  let sessions = SessionManager::new(
    shared_backend,
    SessionMode::Studio,
    WorkflowRef::new("studio-1"),
    signal.clone(),
  );

  signal.cancel().unwrap();

  let err = sessions.ensure_session().await.unwrap_err();
  assert!(err.is_cancelled());
  assert_eq!(backend.session_calls(), 0);
}
