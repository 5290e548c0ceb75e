//! The lazily started producer.
//!
//! An [`Observable`] wraps a subscribe-procedure and nothing else: no work
//! happens until someone subscribes, and every fresh subscription runs the
//! procedure again with its own [`Subscriber`].
//!
//! ```rust
//! use std::{cell::RefCell, rc::Rc};
//!
//! use lazy_observable::prelude::*;
//!
//! let numbers = Observable::<i32>::new(|subscriber| {
//!   subscriber.next(1);
//!   subscriber.next(2);
//!   subscriber.complete();
//! });
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let seen2 = seen.clone();
//! numbers.subscribe(move |v| seen2.borrow_mut().push(v));
//! assert_eq!(*seen.borrow(), vec![1, 2]);
//! ```
//!
//! Observables created with [`Observable::new_shared`] (or [`share`]) keep a
//! weak handle to their live subscriber: while it is active, further
//! subscriptions attach to it instead of running the procedure again.
//!
//! [`share`]: Observable::share

use std::{
  cell::RefCell,
  fmt,
  rc::{Rc, Weak},
};

use crate::{
  cancellation::CancellationToken,
  context::Context,
  error::{Error, StreamError},
  observer::{IntoSink, Sink},
  subscriber::{Subscriber, WeakSubscriber},
};

mod from;
mod trivial;

pub use from::ObservableInput;

type Procedure<T, E> = dyn Fn(Subscriber<T, E>) -> Result<(), E>;

struct Inner<T, E> {
  procedure: Box<Procedure<T, E>>,
  shared: Option<RefCell<Option<WeakSubscriber<T, E>>>>,
}

/// A push-based stream of `T` that fails with `E`.
pub struct Observable<T, E = Error> {
  inner: Rc<Inner<T, E>>,
}

impl<T, E> Clone for Observable<T, E> {
  fn clone(&self) -> Self { Self { inner: self.inner.clone() } }
}

impl<T, E> fmt::Debug for Observable<T, E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Observable")
      .field("shared", &self.inner.shared.is_some())
      .finish()
  }
}

/// Per-subscription options: a token to cancel with and a context to run
/// under.
pub struct SubscribeOptions<E = Error> {
  pub token: Option<CancellationToken<E>>,
  pub context: Option<Context>,
}

impl<E> Default for SubscribeOptions<E> {
  fn default() -> Self { Self { token: None, context: None } }
}

impl<E> Clone for SubscribeOptions<E> {
  fn clone(&self) -> Self { Self { token: self.token.clone(), context: self.context.clone() } }
}

impl<E: fmt::Debug> fmt::Debug for SubscribeOptions<E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SubscribeOptions")
      .field("token", &self.token)
      .field("context", &self.context)
      .finish()
  }
}

impl<E> SubscribeOptions<E> {
  pub fn new() -> Self { Self::default() }

  #[must_use]
  pub fn with_token(mut self, token: CancellationToken<E>) -> Self {
    self.token = Some(token);
    self
  }

  #[must_use]
  pub fn with_context(mut self, context: Context) -> Self {
    self.context = Some(context);
    self
  }
}

impl<E> From<CancellationToken<E>> for SubscribeOptions<E> {
  fn from(token: CancellationToken<E>) -> Self { Self { token: Some(token), context: None } }
}

impl<E> From<Context> for SubscribeOptions<E> {
  fn from(context: Context) -> Self { Self { token: None, context: Some(context) } }
}

impl<T: Clone + 'static, E: StreamError> Observable<T, E> {
  /// An observable running `procedure` for every fresh subscription.
  pub fn new(procedure: impl Fn(Subscriber<T, E>) + 'static) -> Self {
    Self::try_new(move |subscriber| {
      procedure(subscriber);
      Ok(())
    })
  }

  /// Like [`new`](Self::new), but an `Err` returned by `procedure` fails the
  /// subscription.
  pub fn try_new(procedure: impl Fn(Subscriber<T, E>) -> Result<(), E> + 'static) -> Self {
    Self { inner: Rc::new(Inner { procedure: Box::new(procedure), shared: None }) }
  }

  /// An observable whose concurrent subscribers share one run of
  /// `procedure`.
  ///
  /// The shared subscriber closes when its last consumer cancels, or on a
  /// terminal event; the next subscription after that starts a fresh run.
  pub fn new_shared(procedure: impl Fn(Subscriber<T, E>) + 'static) -> Self {
    let procedure = move |subscriber| {
      procedure(subscriber);
      Ok(())
    };
    Self {
      inner: Rc::new(Inner { procedure: Box::new(procedure), shared: Some(RefCell::new(None)) }),
    }
  }

  pub fn is_shared(&self) -> bool { self.inner.shared.is_some() }

  /// Subscribe with default options.
  pub fn subscribe(&self, sink: impl IntoSink<T, E>) {
    self.subscribe_with(sink, SubscribeOptions::default())
  }

  /// Subscribe with a cancellation token and/or a context.
  ///
  /// A token that already fired prevents the subscribe-procedure from
  /// running. A token that fires later closes the subscription (or, on a
  /// shared observable, detaches this consumer).
  pub fn subscribe_with(&self, sink: impl IntoSink<T, E>, options: SubscribeOptions<E>) {
    subscribe_to(&self.inner, sink.into_sink(), options)
  }
}

fn subscribe_to<T: Clone + 'static, E: StreamError>(
  inner: &Rc<Inner<T, E>>, sink: Sink<T, E>, options: SubscribeOptions<E>,
) {
  let SubscribeOptions { token, context } = options;
  let context = context.unwrap_or_default();
  if !context.is_active() {
    return;
  }

  if let Some(slot) = &inner.shared {
    let live = slot
      .borrow()
      .as_ref()
      .and_then(WeakSubscriber::upgrade)
      .filter(Subscriber::is_active);
    if let Some(subscriber) = live {
      if token.as_ref().is_some_and(CancellationToken::is_cancelled) {
        return;
      }
      let id = subscriber.attach(sink);
      tracing::trace!("attached to shared subscription");
      if let Some(token) = &token {
        subscriber.bind(id, token);
      }
      return;
    }
  }

  let subscriber = Subscriber::new(context);
  let id = subscriber.attach(sink);
  if let Some(slot) = &inner.shared {
    let weak = subscriber.downgrade();
    *slot.borrow_mut() = Some(subscriber.downgrade());
    let owner: Weak<Inner<T, E>> = Rc::downgrade(inner);
    subscriber.on_release(move || {
      if let Some(owner) = owner.upgrade() {
        owner.clear_shared(&weak);
      }
    });
  }
  if let Some(token) = &token {
    if let Some(reason) = token.reason() {
      subscriber.close(Some(reason));
      return;
    }
    subscriber.bind(id, token);
  }

  tracing::trace!(shared = inner.shared.is_some(), "running subscribe procedure");
  if let Err(err) = (inner.procedure)(subscriber.clone()) {
    subscriber.error(err);
  }
}

impl<T, E> Inner<T, E> {
  fn clear_shared(&self, closed: &WeakSubscriber<T, E>) {
    if let Some(slot) = &self.shared {
      let mut slot = slot.borrow_mut();
      if slot.as_ref().is_some_and(|current| current.ptr_eq(closed)) {
        *slot = None;
      }
    }
  }

  #[cfg(test)]
  fn has_live_shared(&self) -> bool {
    self
      .shared
      .as_ref()
      .is_some_and(|slot| slot.borrow().is_some())
  }
}
