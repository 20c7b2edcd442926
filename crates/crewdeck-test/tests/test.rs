use std::time::Duration;

#[crewdeck_test::test]
fn sync_test() -> Result<(), ()> {
  log::info!("Hello, world!");
  log::debug!("Hello, world!");

  Ok(())
}

#[crewdeck_test::test]
async fn async_test() -> Result<(), ()> {
  log::warn!("Hello, world!");
  log::trace!("Hello, world!");

  Ok(())
}

#[crewdeck_test::test(paused)]
async fn paused_clock_advances_virtually() {
  let started = tokio::time::Instant::now();

  tokio::time::sleep(Duration::from_secs(3600)).await;

  assert!(started.elapsed() >= Duration::from_secs(3600));
}
