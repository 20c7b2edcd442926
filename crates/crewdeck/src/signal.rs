use crate::{Error, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{
  collections::HashMap,
  future::Future,
  pin::Pin,
  sync::Arc,
  task::{Context, Poll, Waker},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
  Cancel,
  Timeout,
}

#[derive(Debug, Default)]
struct SignalState {
  signal: Option<Signal>,
  next_key: u64,
  // keyed by receiver so a dropped receiver removes only its own waker
  wakers: HashMap<u64, Waker>,
}

/// Cancellation handle passed into every backend call. Clones share state;
/// the first `cancel`/`timeout` wins and wakes every pending receiver.
#[derive(Clone, Debug, Default)]
pub struct CancelSignal {
  state: Arc<Mutex<SignalState>>,
}

pub struct Receiver<'a> {
  signal: &'a CancelSignal,
  is_notified: bool,
  key: Option<u64>,
}

impl CancelSignal {
  pub fn new() -> Self {
    Self::default()
  }

  /// Resolves once the signal fires. Each receiver yields the signal once.
  pub fn recv(&self) -> Receiver {
    Receiver {
      signal: self,
      is_notified: false,
      key: None,
    }
  }

  pub fn cancel(&self) -> Result<()> {
    self.fire(Signal::Cancel)
  }

  pub fn timeout(&self) -> Result<()> {
    self.fire(Signal::Timeout)
  }

  pub fn signal(&self) -> Option<Signal> {
    self.state.lock().signal
  }

  pub fn is_cancelled(&self) -> bool {
    self.signal() == Some(Signal::Cancel)
  }

  pub fn is_timeout(&self) -> bool {
    self.signal() == Some(Signal::Timeout)
  }

  pub fn is_fired(&self) -> bool {
    self.signal().is_some()
  }

  /// Same signal instance, not merely an equal state.
  pub fn same_as(&self, other: &CancelSignal) -> bool {
    Arc::ptr_eq(&self.state, &other.state)
  }

  fn fire(&self, signal: Signal) -> Result<()> {
    let wakers = {
      let mut state = self.state.lock();
      if state.signal.is_some() {
        return Err(Error::error("Signal has been cancelled or timeout."));
      }

      state.signal = Some(signal);
      std::mem::take(&mut state.wakers)
    };

    for (_, waker) in wakers {
      waker.wake();
    }

    Ok(())
  }
}

impl<'a> Future for Receiver<'a> {
  type Output = Signal;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let this = self.get_mut();
    if this.is_notified {
      return Poll::Pending;
    }

    let mut state = this.signal.state.lock();
    if let Some(signal) = state.signal {
      drop(state);
      this.is_notified = true;
      this.key = None;

      return Poll::Ready(signal);
    }

    let key = match this.key {
      Some(key) => key,
      None => {
        let key = state.next_key;
        state.next_key += 1;
        this.key = Some(key);
        key
      }
    };

    match state.wakers.get_mut(&key) {
      Some(waker) if waker.will_wake(cx.waker()) => {}
      Some(waker) => *waker = cx.waker().clone(),
      None => {
        state.wakers.insert(key, cx.waker().clone());
      }
    }

    Poll::Pending
  }
}

impl<'a> Drop for Receiver<'a> {
  fn drop(&mut self) {
    if let Some(key) = self.key.take() {
      self.signal.state.lock().wakers.remove(&key);
    }
  }
}

impl std::fmt::Display for Signal {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Signal::Cancel => write!(f, "cancel"),
      Signal::Timeout => write!(f, "timeout"),
    }
  }
}
