//! The per-subscription lifecycle controller.
//!
//! A [`Subscriber`] is created for every fresh subscription and handed to the
//! subscribe-procedure. It owns the subscription's cancellation token and a
//! stack of teardowns, and fans events out to the attached sinks (more than
//! one only for shared observables).
//!
//! A subscriber is either active or closed, and closing is final. It closes
//! on `error`, on `complete`, when the consumer's token fires, or when the
//! context's liveness hook reports the context gone. Closing:
//!
//! 1. marks the subscriber inactive;
//! 2. fires its own token with the closing reason;
//! 3. runs every teardown once, last registered first.

use std::{
  any::Any,
  cell::RefCell,
  fmt, mem,
  panic::{self, AssertUnwindSafe},
  rc::{Rc, Weak},
};

use smallvec::SmallVec;

use crate::{
  cancellation::{CancellationToken, ListenerId},
  context::{Context, Uncaught},
  error::{Error, StreamError},
  observable::SubscribeOptions,
  observer::Sink,
  registry::Registry,
};

type Teardown = Box<dyn FnOnce()>;
type Sinks<T, E> = SmallVec<[Rc<Sink<T, E>>; 2]>;

struct SubscriberState<T, E> {
  active: bool,
  token: CancellationToken<E>,
  teardowns: SmallVec<[Teardown; 2]>,
  sinks: Registry<Rc<Sink<T, E>>>,
  bindings: SmallVec<[(CancellationToken<E>, ListenerId); 1]>,
  release: Option<Teardown>,
  context: Context,
}

/// Handle to the lifecycle controller of one subscription.
///
/// Cloning yields another handle to the same controller.
pub struct Subscriber<T, E = Error>(Rc<RefCell<SubscriberState<T, E>>>);

pub(crate) struct WeakSubscriber<T, E>(Weak<RefCell<SubscriberState<T, E>>>);

impl<T, E> Clone for Subscriber<T, E> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T, E> fmt::Debug for Subscriber<T, E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = self.0.borrow();
    f.debug_struct("Subscriber")
      .field("active", &state.active)
      .field("sinks", &state.sinks.len())
      .field("teardowns", &state.teardowns.len())
      .finish()
  }
}

impl<T: Clone + 'static, E: StreamError> Subscriber<T, E> {
  pub(crate) fn new(context: Context) -> Self {
    Self(Rc::new(RefCell::new(SubscriberState {
      active: true,
      token: CancellationToken::new(),
      teardowns: SmallVec::new(),
      sinks: Registry::new(),
      bindings: SmallVec::new(),
      release: None,
      context,
    })))
  }

  /// Deliver a value to every attached sink, in attachment order.
  ///
  /// Does nothing once the subscriber is closed.
  pub fn next(&self, value: T) {
    let (sinks, context) = {
      let state = self.0.borrow();
      if !state.active {
        return;
      }
      let sinks: Sinks<T, E> = state.sinks.iter().cloned().collect();
      (sinks, state.context.clone())
    };
    if !context.is_active() {
      self.close(Some(Error::ContextInactive.into()));
      return;
    }

    let mut sinks = sinks.into_iter().peekable();
    while let Some(sink) = sinks.next() {
      if sinks.peek().is_some() {
        sink.next(value.clone());
      } else {
        sink.next(value);
        break;
      }
    }
  }

  /// Close with `err` as the reason, then deliver it to every sink.
  ///
  /// An error arriving after the subscriber closed goes to the context's
  /// uncaught reporter.
  pub fn error(&self, err: E) {
    let (active, context) = {
      let state = self.0.borrow();
      (state.active, state.context.clone())
    };
    if !active {
      context.report(Uncaught::Error(&err));
      return;
    }
    if !context.is_active() {
      self.close(Some(Error::ContextInactive.into()));
      return;
    }

    for sink in self.close(Some(err.clone())) {
      if let Err(err) = sink.error(err.clone()) {
        context.report(Uncaught::Error(&err));
      }
    }
  }

  /// Close, then notify every sink of completion.
  pub fn complete(&self) {
    let (active, context) = {
      let state = self.0.borrow();
      (state.active, state.context.clone())
    };
    if !active {
      return;
    }
    if !context.is_active() {
      self.close(Some(Error::ContextInactive.into()));
      return;
    }

    for sink in self.close(None) {
      sink.complete();
    }
  }

  /// Register cleanup to run when the subscriber closes. On a closed
  /// subscriber `teardown` runs right away.
  pub fn add_teardown(&self, teardown: impl FnOnce() + 'static) {
    let mut state = self.0.borrow_mut();
    if state.active {
      state.teardowns.push(Box::new(teardown));
    } else {
      drop(state);
      teardown();
    }
  }

  pub fn is_active(&self) -> bool { self.0.borrow().active }

  /// The subscription's own token. It fires when the subscriber closes, so
  /// producers can listen to it to stop work.
  pub fn token(&self) -> CancellationToken<E> { self.0.borrow().token.clone() }

  pub fn context(&self) -> Context { self.0.borrow().context.clone() }

  /// Options for a subscription that must end when this one ends.
  pub fn options(&self) -> SubscribeOptions<E> {
    SubscribeOptions::new()
      .with_token(self.token())
      .with_context(self.context())
  }

  pub(crate) fn attach(&self, sink: Sink<T, E>) -> usize {
    self.0.borrow_mut().sinks.add(Rc::new(sink))
  }

  /// Detach sink `id` when `token` fires, closing the subscriber if it was
  /// the last one.
  pub(crate) fn bind(&self, id: usize, token: &CancellationToken<E>) {
    let this = self.clone();
    let listener = token.on_cancel(move |reason| this.detach(id, reason.clone()));
    if let Some(listener) = listener {
      self.0.borrow_mut().bindings.push((token.clone(), listener));
    }
  }

  #[cfg(test)]
  pub(crate) fn bound_tokens(&self) -> Vec<CancellationToken<E>> {
    self.0.borrow().bindings.iter().map(|(token, _)| token.clone()).collect()
  }

  fn detach(&self, id: usize, reason: E) {
    let remaining = {
      let mut state = self.0.borrow_mut();
      if !state.active {
        return;
      }
      state.sinks.remove(id);
      state.sinks.len()
    };
    tracing::trace!(remaining, "sink detached");
    if remaining == 0 {
      self.close(Some(reason));
    }
  }

  /// Run once the subscriber closed and its teardowns ran.
  pub(crate) fn on_release(&self, release: impl FnOnce() + 'static) {
    self.0.borrow_mut().release = Some(Box::new(release));
  }

  /// Close the subscriber and hand back the sinks that were attached.
  pub(crate) fn close(&self, reason: Option<E>) -> Sinks<T, E> {
    let (token, teardowns, bindings, release, sinks, context) = {
      let mut state = self.0.borrow_mut();
      if !state.active {
        return SmallVec::new();
      }
      state.active = false;
      (
        state.token.clone(),
        mem::take(&mut state.teardowns),
        mem::take(&mut state.bindings),
        state.release.take(),
        state.sinks.take_all(),
        state.context.clone(),
      )
    };
    tracing::trace!(teardowns = teardowns.len(), "subscriber closing");

    for (external, listener) in bindings {
      external.remove_listener(listener);
    }
    token.cancel_with(reason.unwrap_or_else(|| Error::Aborted.into()));
    for teardown in teardowns.into_iter().rev() {
      if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(teardown)) {
        context.report(Uncaught::TeardownPanic(panic_message(payload.as_ref())));
      }
    }
    if let Some(release) = release {
      release();
    }
    sinks
  }

  #[cfg(test)]
  pub(crate) fn sink_count(&self) -> usize { self.0.borrow().sinks.len() }

  pub(crate) fn downgrade(&self) -> WeakSubscriber<T, E> { WeakSubscriber(Rc::downgrade(&self.0)) }
}

impl<T, E> WeakSubscriber<T, E> {
  pub(crate) fn upgrade(&self) -> Option<Subscriber<T, E>> { self.0.upgrade().map(Subscriber) }

  pub(crate) fn ptr_eq(&self, other: &Self) -> bool { self.0.ptr_eq(&other.0) }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(msg) = payload.downcast_ref::<&str>() {
    (*msg).to_string()
  } else if let Some(msg) = payload.downcast_ref::<String>() {
    msg.clone()
  } else {
    "non-string panic payload".to_string()
  }
}
