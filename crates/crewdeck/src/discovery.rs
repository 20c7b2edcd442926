use crate::{
  CancelSignal, CoordinatorConfig, Result, SharedBackend, ToolDefinition, ToolDefinitions,
};
use std::{collections::HashMap, future::Future, time::Duration};
use tokio::time::Instant;

pub type McpToolDefinitions = HashMap<String, Vec<ToolDefinition>>;

/// Bounded poller waiting for the backend to finish computing MCP tool
/// definitions.
///
/// Gives up with `None` when the wall-clock budget runs out, when a probe
/// fails at the transport level, or when the context signal fires. A probe
/// still in flight at the deadline receives `Signal::Timeout` and its result
/// is dropped.
#[derive(Debug, Clone)]
pub struct DiscoveryPoller {
  interval: Duration,
  budget: Duration,
}

impl DiscoveryPoller {
  pub fn new(interval: Duration, budget: Duration) -> Self {
    DiscoveryPoller { interval, budget }
  }

  pub fn from_config(config: &CoordinatorConfig) -> Self {
    Self::new(config.discovery_interval, config.discovery_budget)
  }

  pub async fn poll<F, Fut>(&self, mut probe: F, signal: CancelSignal) -> Option<McpToolDefinitions>
  where
    F: FnMut(CancelSignal) -> Fut,
    Fut: Future<Output = Result<ToolDefinitions>>,
  {
    let deadline = Instant::now() + self.budget;
    let mut attempts = 0usize;

    loop {
      if signal.is_fired() {
        log::debug!("Tool definition discovery stopped after {} probes", attempts);
        return None;
      }

      attempts += 1;
      let probe_signal = CancelSignal::new();

      let outcome = tokio::select! {
        res = tokio::time::timeout_at(deadline, probe(probe_signal.clone())) => res,
        _ = signal.recv() => {
          let _ = probe_signal.cancel();
          log::debug!("Tool definition discovery stopped during probe {}", attempts);
          return None;
        }
      };

      match outcome {
        Err(_) => {
          let _ = probe_signal.timeout();
          log::warn!(
            "Tool definitions not ready after {} probes in {}",
            attempts,
            humantime::format_duration(self.budget)
          );
          return None;
        }
        Ok(Err(err)) => {
          log::warn!("Tool definition probe failed, giving up: {}", err);
          return None;
        }
        Ok(Ok(response)) if response.ready => {
          log::info!("Tool definitions ready after {} probes", attempts);
          return Some(response.definitions.unwrap_or_default());
        }
        Ok(Ok(_)) => {
          log::trace!("Tool definitions not ready (probe {})", attempts);
        }
      }

      let now = Instant::now();
      if now >= deadline {
        log::warn!(
          "Tool definitions not ready after {} probes in {}",
          attempts,
          humantime::format_duration(self.budget)
        );
        return None;
      }

      let wake_at = std::cmp::min(now + self.interval, deadline);
      tokio::select! {
        _ = tokio::time::sleep_until(wake_at) => {}
        _ = signal.recv() => {}
      }
    }
  }
}

/// Polls `get_mcp_tool_definitions` for `model_endpoint` until ready.
pub async fn discover_tool_definitions(
  backend: SharedBackend,
  model_endpoint: &str,
  config: &CoordinatorConfig,
  signal: CancelSignal,
) -> Option<McpToolDefinitions> {
  let poller = DiscoveryPoller::from_config(config);

  poller
    .poll(
      |probe_signal| {
        let backend = backend.clone();
        let model_endpoint = model_endpoint.to_string();
        async move {
          backend
            .get_mcp_tool_definitions(&model_endpoint, probe_signal)
            .await
        }
      },
      signal,
    )
    .await
}
