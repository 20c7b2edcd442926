use crate::{
  CancelSignal, ChatMessage, ChatRole, CoordinatorConfig, EventsAppendedEvent, ExecutionEvent,
  PluginManager, RunOutcome, RunStartedEvent, RunState, SharedBackend, TraceId,
};
use parking_lot::Mutex;
use std::{sync::Arc, time::Duration};
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq)]
pub enum MonitorState {
  Idle,
  Polling { trace_id: TraceId },
}

#[derive(Debug, Clone, PartialEq)]
enum RunPhase {
  Polling,
  Completed(RunOutcome),
  Stopped,
}

struct ActiveRun {
  trace_id: TraceId,
  signal: CancelSignal,
  phase: watch::Receiver<RunPhase>,
}

/// Polls the execution events of the active run into its [`RunState`] until
/// a kickoff completion or failure event arrives.
///
/// Ticks are sequential: a fetch is only issued once the previous tick's
/// events have been appended. Failed ticks are logged and the next tick runs
/// on schedule. [`EventStreamMonitor::stop`] ends polling without a
/// completion; results of a fetch in flight at that moment are dropped.
#[derive(Clone)]
pub struct EventStreamMonitor {
  backend: SharedBackend,
  plugins: PluginManager,
  interval: Duration,
  state: Arc<Mutex<RunState>>,
  active: Arc<Mutex<Option<ActiveRun>>>,
}

struct PollContext {
  backend: SharedBackend,
  plugins: PluginManager,
  interval: Duration,
  state: Arc<Mutex<RunState>>,
  trace_id: TraceId,
  conversational: bool,
  signal: CancelSignal,
  phase: watch::Sender<RunPhase>,
}

impl EventStreamMonitor {
  pub fn new(backend: SharedBackend, plugins: PluginManager, config: &CoordinatorConfig) -> Self {
    EventStreamMonitor {
      backend,
      plugins,
      interval: config.monitor_interval,
      state: Arc::new(Mutex::new(RunState::new())),
      active: Arc::new(Mutex::new(None)),
    }
  }

  /// Idle → Polling. A run already being polled is stopped first.
  pub fn start(&self, trace_id: TraceId, conversational: bool) {
    self.stop();

    let signal = CancelSignal::new();
    let (phase_tx, phase_rx) = watch::channel(RunPhase::Polling);

    self.state.lock().launch(trace_id.clone());
    *self.active.lock() = Some(ActiveRun {
      trace_id: trace_id.clone(),
      signal: signal.clone(),
      phase: phase_rx,
    });

    log::info!("Monitoring run {}", trace_id);
    self.plugins.on_run_started(RunStartedEvent {
      trace_id: trace_id.clone(),
    });

    let ctx = PollContext {
      backend: self.backend.clone(),
      plugins: self.plugins.clone(),
      interval: self.interval,
      state: self.state.clone(),
      trace_id,
      conversational,
      signal,
      phase: phase_tx,
    };

    tokio::spawn(poll_events(ctx));
  }

  /// Stops polling without a completion. `is_running` is left to the caller.
  pub fn stop(&self) {
    let active = self.active.lock().take();

    if let Some(active) = active {
      if active.signal.cancel().is_ok() {
        log::info!("Stopped monitoring run {}", active.trace_id);
      }
    }
  }

  pub fn state(&self) -> MonitorState {
    match self.active.lock().as_ref() {
      Some(active) if *active.phase.borrow() == RunPhase::Polling => MonitorState::Polling {
        trace_id: active.trace_id.clone(),
      },
      _ => MonitorState::Idle,
    }
  }

  pub fn is_polling(&self) -> bool {
    matches!(self.state(), MonitorState::Polling { .. })
  }

  /// Waits for the active run's outcome; `None` if there is no run or it was stopped.
  pub async fn wait_for_completion(&self) -> Option<RunOutcome> {
    let mut phase = self.active.lock().as_ref()?.phase.clone();

    loop {
      match &*phase.borrow_and_update() {
        RunPhase::Completed(outcome) => return Some(outcome.clone()),
        RunPhase::Stopped => return None,
        RunPhase::Polling => {}
      }

      if phase.changed().await.is_err() {
        return match &*phase.borrow() {
          RunPhase::Completed(outcome) => Some(outcome.clone()),
          _ => None,
        };
      }
    }
  }

  pub fn run_state(&self) -> RunState {
    self.state.lock().clone()
  }

  /// Runs `f` against the live run state, e.g. to move the playback pointer.
  pub fn with_run_state<T>(&self, f: impl FnOnce(&mut RunState) -> T) -> T {
    f(&mut self.state.lock())
  }

  /// Stops polling and clears the run state.
  pub fn reset(&self) {
    self.stop();
    self.state.lock().reset();
  }
}

async fn poll_events(ctx: PollContext) {
  let mut ticks = 0usize;

  loop {
    tokio::select! {
      _ = tokio::time::sleep(ctx.interval) => {}
      _ = ctx.signal.recv() => break,
    }

    ticks += 1;
    let res = ctx
      .backend
      .fetch_events(&ctx.trace_id, ctx.signal.clone())
      .await;

    if ctx.signal.is_fired() {
      log::debug!(
        "Discarding tick {} of run {}: monitor stopped",
        ticks,
        ctx.trace_id
      );
      break;
    }

    let events = match res {
      Ok(events) => events,
      Err(err) => {
        log::warn!(
          "Failed to fetch events of run {} (tick {}): {}",
          ctx.trace_id,
          ticks,
          err
        );
        continue;
      }
    };

    if events.is_empty() {
      continue;
    }

    if let Some(outcome) = apply_tick(&ctx, events) {
      log::info!(
        "Run {} {} after {} ticks",
        ctx.trace_id,
        if outcome.failed { "failed" } else { "completed" },
        ticks
      );

      if ctx.conversational {
        ctx.plugins.on_chat_message(ChatMessage {
          role: ChatRole::Assistant,
          content: outcome.final_output.clone(),
          trace_id: ctx.trace_id.clone(),
        });
      }

      ctx.plugins.on_run_completed(outcome.clone());
      let _ = ctx.phase.send(RunPhase::Completed(outcome));
      return;
    }
  }

  let _ = ctx.phase.send(RunPhase::Stopped);
}

/// Appends one tick's events and scans only those for a terminal event.
fn apply_tick(ctx: &PollContext, events: Vec<ExecutionEvent>) -> Option<RunOutcome> {
  let (appended, total, outcome) = {
    let mut state = ctx.state.lock();

    // stop() may have fired after the fetch returned
    if ctx.signal.is_fired() {
      return None;
    }

    let start = state.append(events);
    let appended = state.log().since(start).to_vec();

    let outcome = appended.iter().find_map(|event| {
      event.completion_payload().map(|final_output| RunOutcome {
        trace_id: ctx.trace_id.clone(),
        final_output,
        failed: !matches!(event.kind, crate::EventKind::KickoffCompleted),
      })
    });

    if let Some(outcome) = &outcome {
      state.complete(outcome.final_output.clone(), outcome.failed);
    }

    (appended, state.log().len(), outcome)
  };

  ctx.plugins.on_events_appended(EventsAppendedEvent {
    trace_id: ctx.trace_id.clone(),
    events: appended,
    total,
  });

  outcome
}
