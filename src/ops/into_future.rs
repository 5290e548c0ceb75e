//! Bridge from a push stream to a single-resolution future.
//!
//! Every terminal consumer (`to_array`, `for_each`, `every`, `some`,
//! `first`, `last`, `find`, `reduce`) subscribes immediately and hands back
//! an [`ObservableFuture`]. The future settles exactly once; whatever
//! settles it first wins.
//!
//! The subscription runs under an internal token joined with the caller's
//! token (if any). Whenever that joined token fires the future rejects with
//! its reason, and consumers that know their answer early (`first`, `every`
//! ...) fire the internal token to unsubscribe from the source.

use std::{
  cell::RefCell,
  future::Future,
  pin::Pin,
  rc::Rc,
  task::{Context as TaskContext, Poll, Waker},
};

use crate::{
  cancellation::CancellationToken,
  error::{Error, StreamError},
  observable::{Observable, SubscribeOptions},
  observer::Sink,
};

struct SharedState<V, E> {
  outcome: Option<Result<V, E>>,
  settled: bool,
  waker: Option<Waker>,
}

/// A future resolving with the outcome of a terminal consumer.
///
/// Works for synchronous and asynchronous sources alike: a synchronous
/// source has usually settled the future before it is first polled.
#[must_use = "futures do nothing unless polled, but the subscription already runs"]
pub struct ObservableFuture<V, E = Error> {
  shared: Rc<RefCell<SharedState<V, E>>>,
}

impl<V, E> Future for ObservableFuture<V, E> {
  type Output = Result<V, E>;

  fn poll(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
    let mut shared = self.shared.borrow_mut();
    if let Some(outcome) = shared.outcome.take() {
      return Poll::Ready(outcome);
    }
    if shared.settled {
      panic!("ObservableFuture polled after completion");
    }
    shared.waker = Some(cx.waker().clone());
    Poll::Pending
  }
}

impl<V, E> ObservableFuture<V, E> {
  fn pending() -> (Self, Settle<V, E>) {
    let shared = Rc::new(RefCell::new(SharedState { outcome: None, settled: false, waker: None }));
    (Self { shared: shared.clone() }, Settle { shared })
  }

  /// Whether the outcome is already known.
  pub fn is_settled(&self) -> bool { self.shared.borrow().settled }
}

/// The writing half of an [`ObservableFuture`].
pub(crate) struct Settle<V, E> {
  shared: Rc<RefCell<SharedState<V, E>>>,
}

impl<V, E> Clone for Settle<V, E> {
  fn clone(&self) -> Self { Self { shared: self.shared.clone() } }
}

impl<V, E> Settle<V, E> {
  fn settle(&self, outcome: Result<V, E>) {
    let waker = {
      let mut shared = self.shared.borrow_mut();
      if shared.settled {
        return;
      }
      shared.settled = true;
      shared.outcome = Some(outcome);
      shared.waker.take()
    };
    if let Some(waker) = waker {
      waker.wake();
    }
  }

  pub(crate) fn resolve(&self, value: V) { self.settle(Ok(value)) }

  pub(crate) fn reject(&self, err: E) { self.settle(Err(err)) }
}

/// What a terminal consumer's sink needs to settle its future.
pub(crate) struct Terminal<V, E> {
  pub(crate) settle: Settle<V, E>,
  controller: CancellationToken<E>,
}

impl<V, E> Clone for Terminal<V, E> {
  fn clone(&self) -> Self { Self { settle: self.settle.clone(), controller: self.controller.clone() } }
}

impl<V, E: StreamError> Terminal<V, E> {
  /// Resolve and unsubscribe from the source.
  pub(crate) fn finish(&self, value: V) {
    self.settle.resolve(value);
    self.controller.cancel();
  }

  /// Reject with `err` and unsubscribe from the source with it as reason.
  pub(crate) fn abort(&self, err: E) {
    self.settle.reject(err.clone());
    self.controller.cancel_with(err);
  }
}

/// Subscribe `source` with the sink `build` makes for the new future.
pub(crate) fn terminal<T, E, V>(
  source: &Observable<T, E>, options: SubscribeOptions<E>,
  build: impl FnOnce(Terminal<V, E>) -> Sink<T, E>,
) -> ObservableFuture<V, E>
where
  T: Clone + 'static,
  E: StreamError,
  V: 'static,
{
  let (future, settle) = ObservableFuture::pending();
  let SubscribeOptions { token: external, context } = options;
  let controller = CancellationToken::new();
  let token = match external {
    Some(external) => CancellationToken::any([controller.clone(), external]),
    None => controller.clone(),
  };
  if let Some(reason) = token.reason() {
    settle.reject(reason);
    return future;
  }
  let on_cancel = settle.clone();
  token.on_cancel(move |reason| on_cancel.reject(reason.clone()));

  let sink = build(Terminal { settle, controller });
  let mut options = SubscribeOptions::new().with_token(token);
  options.context = context;
  source.subscribe_with(sink, options);
  future
}
