use crate::{ExecutionEvent, TraceId};

/// Append-only, order-preserving log of one run's execution events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
  events: Vec<ExecutionEvent>,
}

impl EventLog {
  pub fn new() -> Self {
    Self::default()
  }

  /// Appends in arrival order and returns the index of the first new event.
  pub fn append(&mut self, events: impl IntoIterator<Item = ExecutionEvent>) -> usize {
    let start = self.events.len();
    self.events.extend(events);
    start
  }

  pub fn len(&self) -> usize {
    self.events.len()
  }

  pub fn is_empty(&self) -> bool {
    self.events.is_empty()
  }

  pub fn get(&self, index: usize) -> Option<&ExecutionEvent> {
    self.events.get(index)
  }

  pub fn events(&self) -> &[ExecutionEvent] {
    &self.events
  }

  /// Events appended at or after `start`.
  pub fn since(&self, start: usize) -> &[ExecutionEvent] {
    self.events.get(start..).unwrap_or(&[])
  }

  fn clear(&mut self) {
    self.events.clear();
  }
}

/// Playback position over an [`EventLog`].
///
/// Follows the newest event until the user scrubs; a scrub pins the position
/// until [`Playback::follow_latest`] is called.
#[derive(Debug, Clone, PartialEq)]
pub struct Playback {
  index: usize,
  following: bool,
}

impl Default for Playback {
  fn default() -> Self {
    Playback {
      index: 0,
      following: true,
    }
  }
}

impl Playback {
  pub fn clamp_index(len: usize) -> usize {
    len.saturating_sub(1)
  }

  pub fn index(&self) -> usize {
    self.index
  }

  pub fn is_following(&self) -> bool {
    self.following
  }

  /// Reacts to a log length change.
  pub fn on_len_changed(&mut self, len: usize) {
    if self.following {
      self.index = Self::clamp_index(len);
    } else {
      self.index = self.index.min(Self::clamp_index(len));
    }
  }

  /// User scrub; pins the position.
  pub fn set(&mut self, index: usize, len: usize) -> usize {
    self.following = false;
    self.index = index.min(Self::clamp_index(len));
    self.index
  }

  pub fn follow_latest(&mut self, len: usize) {
    self.following = true;
    self.index = Self::clamp_index(len);
  }

  fn reset(&mut self) {
    *self = Playback::default();
  }
}

/// Mutable state of the run active in a workflow context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunState {
  pub is_running: bool,
  pub trace_id: Option<TraceId>,
  pub final_output: Option<String>,
  pub failed: bool,
  log: EventLog,
  playback: Playback,
}

impl RunState {
  pub fn new() -> Self {
    Self::default()
  }

  /// Clears log, playback and completion in one step.
  pub fn reset(&mut self) {
    self.is_running = false;
    self.trace_id = None;
    self.final_output = None;
    self.failed = false;
    self.log.clear();
    self.playback.reset();
  }

  pub(crate) fn launch(&mut self, trace_id: TraceId) {
    self.reset();
    self.trace_id = Some(trace_id);
    self.is_running = true;
  }

  /// Appends and returns the first index of the appended slice.
  pub fn append(&mut self, events: Vec<ExecutionEvent>) -> usize {
    let start = self.log.append(events);
    self.playback.on_len_changed(self.log.len());
    start
  }

  pub(crate) fn complete(&mut self, final_output: String, failed: bool) {
    if self.final_output.is_none() {
      self.final_output = Some(final_output);
      self.failed = failed;
    }
    self.is_running = false;
  }

  pub fn log(&self) -> &EventLog {
    &self.log
  }

  pub fn events(&self) -> &[ExecutionEvent] {
    self.log.events()
  }

  pub fn current_event_index(&self) -> usize {
    self.playback.index()
  }

  pub fn current_event(&self) -> Option<&ExecutionEvent> {
    self.log.get(self.playback.index())
  }

  pub fn is_following(&self) -> bool {
    self.playback.is_following()
  }

  pub fn set_current_event_index(&mut self, index: usize) -> usize {
    self.playback.set(index, self.log.len())
  }

  pub fn step_forward(&mut self) -> usize {
    let next = self.playback.index().saturating_add(1);
    self.set_current_event_index(next)
  }

  pub fn step_back(&mut self) -> usize {
    let previous = self.playback.index().saturating_sub(1);
    self.set_current_event_index(previous)
  }

  pub fn follow_latest(&mut self) {
    self.playback.follow_latest(self.log.len());
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn events(ids: &[&str]) -> Vec<ExecutionEvent> {
    ids
      .iter()
      .map(|id| ExecutionEvent::new(*id, "step"))
      .collect()
  }

  #[test]
  fn clamp_index() {
    assert_eq!(Playback::clamp_index(0), 0);
    assert_eq!(Playback::clamp_index(1), 0);
    assert_eq!(Playback::clamp_index(7), 6);
  }

  #[test]
  fn append_preserves_order() {
    let mut log = EventLog::new();

    assert_eq!(log.append(events(&["a", "b"])), 0);
    assert_eq!(log.append(events(&["c"])), 2);
    // duplicates are kept; the producer deduplicates
    log.append(events(&["a"]));

    let ids: Vec<&str> = log.events().iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c", "a"]);
    assert_eq!(log.since(2).len(), 2);
    assert!(log.since(10).is_empty());
  }

  #[test]
  fn playback_follows_latest() {
    let mut state = RunState::new();
    assert_eq!(state.current_event_index(), 0);
    assert!(state.current_event().is_none());

    for batch in [vec!["a"], vec!["b", "c"], vec![], vec!["d", "e", "f"]] {
      state.append(events(&batch));
      assert_eq!(
        state.current_event_index(),
        Playback::clamp_index(state.events().len())
      );
    }

    assert_eq!(state.current_event().unwrap().id, "f");
  }

  #[test]
  fn user_scrub_is_kept_across_appends() {
    let mut state = RunState::new();
    state.append(events(&["a", "b", "c"]));

    assert_eq!(state.set_current_event_index(1), 1);
    state.append(events(&["d"]));
    assert_eq!(state.current_event_index(), 1);
    assert!(!state.is_following());

    state.follow_latest();
    assert_eq!(state.current_event_index(), 3);
    state.append(events(&["e"]));
    assert_eq!(state.current_event_index(), 4);
  }

  #[test]
  fn scrub_is_clamped() {
    let mut state = RunState::new();
    assert_eq!(state.set_current_event_index(5), 0);

    state.append(events(&["a", "b"]));
    assert_eq!(state.set_current_event_index(99), 1);
    assert_eq!(state.step_forward(), 1);
    assert_eq!(state.step_back(), 0);
    assert_eq!(state.step_back(), 0);
  }

  #[test]
  fn reset_clears_log_and_index() {
    let mut state = RunState::new();
    state.launch(TraceId::new("t1"));
    state.append(events(&["a", "b"]));
    state.set_current_event_index(0);
    state.complete("done".to_string(), false);

    state.reset();

    assert!(state.events().is_empty());
    assert_eq!(state.current_event_index(), 0);
    assert!(state.is_following());
    assert_eq!(state.final_output, None);
    assert_eq!(state.trace_id, None);
  }

  #[test]
  fn final_output_set_once() {
    let mut state = RunState::new();
    state.launch(TraceId::new("t1"));

    state.complete("first".to_string(), false);
    state.complete("second".to_string(), true);

    assert_eq!(state.final_output.as_deref(), Some("first"));
    assert!(!state.failed);
    assert!(!state.is_running);
  }
}
