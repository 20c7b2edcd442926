mod common;

use common::{shared, FakeBackend};
use crewdeck::{
  CoordinatorConfig, CrewdeckPlugin, Error, ModelId, ModelTestStatus, ModelValidator,
  PluginManager,
};
use parking_lot::Mutex;
use std::{sync::Arc, time::Duration};
use tokio::time::Instant;

fn validator(backend: Arc<FakeBackend>, plugins: PluginManager) -> ModelValidator {
  ModelValidator::new(backend, plugins, &CoordinatorConfig::default())
}

fn assert_elapsed(started: Instant, secs: u64) {
  let elapsed = started.elapsed();
  assert!(
    elapsed >= Duration::from_secs(secs) && elapsed < Duration::from_secs(secs + 1),
    "elapsed {:?}",
    elapsed
  );
}

#[crewdeck_test::test(paused)]
async fn test_succeeds_on_fourth_attempt() {
  let backend = shared(FakeBackend::default());
  backend.script_models(vec![
    Ok("Model Test Failed: rate limited".to_string()),
    Err(Error::transport("connection reset")),
    Ok("Model Test Failed: rate limited".to_string()),
    Ok("Hello! How can I help?".to_string()),
  ]);
  let validator = validator(backend.clone(), PluginManager::new());
  let model_id = ModelId::new("model-1");

  let started = Instant::now();
  let status = validator.validate(model_id.clone()).await;

  assert_eq!(status, ModelTestStatus::Success);
  assert_eq!(validator.status(&model_id), Some(ModelTestStatus::Success));
  assert_eq!(backend.model_calls(), 4);
  assert_elapsed(started, 9);
}

#[crewdeck_test::test(paused)]
async fn test_fails_after_five_attempts() {
  let backend = shared(FakeBackend::default());
  let validator = validator(backend.clone(), PluginManager::new());
  let model_id = ModelId::new("model-1");

  let started = Instant::now();
  let status = validator.validate(model_id.clone()).await;

  assert_eq!(status, ModelTestStatus::Failure);
  assert_eq!(validator.status(&model_id), Some(ModelTestStatus::Failure));
  assert_eq!(backend.model_calls(), 5);
  assert_elapsed(started, 12);
}

#[crewdeck_test::test(paused)]
async fn test_hanging_calls_count_as_failures() {
  let backend = shared(FakeBackend {
    model_delay: Duration::from_secs(60),
    ..Default::default()
  });
  backend.script_models((0..5).map(|_| Ok("hi".to_string())).collect());
  let validator = validator(backend.clone(), PluginManager::new());

  let started = Instant::now();
  let status = validator.validate(ModelId::new("model-1")).await;

  assert_eq!(status, ModelTestStatus::Failure);
  assert_eq!(backend.model_calls(), 5);
  // five 1s call timeouts and four 3s delays
  assert_elapsed(started, 17);
}

#[crewdeck_test::test(paused)]
async fn test_spawned_validation_is_pending_first() {
  let backend = shared(FakeBackend::default());
  backend.script_models(vec![Ok("pong".to_string())]);

  let seen = Arc::new(Mutex::new(Vec::new()));
  let plugins = PluginManager::new();
  let recorder = seen.clone();
  plugins.register(
    CrewdeckPlugin::builder("recorder")
      .on_model_status(move |event| recorder.lock().push((event.status, event.attempts)))
      .build(),
  );

  let validator = validator(backend.clone(), plugins);
  let model_id = ModelId::new("model-1");

  let handle = validator.spawn_validate(model_id.clone());
  assert_eq!(validator.status(&model_id), Some(ModelTestStatus::Pending));

  assert_eq!(handle.await.unwrap(), ModelTestStatus::Success);
  assert_eq!(
    seen.lock().clone(),
    vec![(ModelTestStatus::Pending, 0), (ModelTestStatus::Success, 1)]
  );
}

#[crewdeck_test::test(paused)]
async fn test_newer_sequence_supersedes_older() {
  let backend = shared(FakeBackend::default());
  backend.script_models(vec![
    Ok("Model Test Failed: cold start".to_string()),
    Ok("pong".to_string()),
  ]);
  let validator = validator(backend.clone(), PluginManager::new());
  let model_id = ModelId::new("model-1");

  let first = validator.spawn_validate(model_id.clone());
  tokio::time::sleep(Duration::from_secs(1)).await;

  let second = validator.validate(model_id.clone()).await;
  assert_eq!(second, ModelTestStatus::Success);

  // the first sequence notices on its next attempt and stops
  assert_eq!(first.await.unwrap(), ModelTestStatus::Success);
  assert_eq!(backend.model_calls(), 2);
  assert_eq!(validator.status(&model_id), Some(ModelTestStatus::Success));
}

#[crewdeck_test::test(paused)]
async fn test_models_are_validated_independently() {
  let backend = shared(FakeBackend::default());
  backend.script_models(vec![Ok("pong".to_string())]);
  let validator = validator(backend.clone(), PluginManager::new());

  let passing = ModelId::new("model-1");
  let failing = ModelId::new("model-2");

  assert_eq!(
    validator.validate(passing.clone()).await,
    ModelTestStatus::Success
  );
  assert_eq!(
    validator.validate(failing.clone()).await,
    ModelTestStatus::Failure
  );

  let statuses = validator.statuses();
  assert_eq!(statuses.get(&passing), Some(&ModelTestStatus::Success));
  assert_eq!(statuses.get(&failing), Some(&ModelTestStatus::Failure));

  validator.forget(&failing);
  assert_eq!(validator.status(&failing), None);
}
