//! Conversion of foreign sources into observables.
//!
//! [`ObservableInput`] names every source shape an observable can be built
//! from. Operators that accept "something observable" (the notifier of
//! `take_until`, the results of `flat_map`, `switch_map` and `catch`) take
//! `impl Into<ObservableInput<T, E>>`.
//!
//! Synchronous iterables are re-iterated for every subscription and pushed
//! in a loop. Streams and futures are pulled by a task spawned on the
//! context's scheduler; cancelling the subscription aborts that task and
//! drops the source.

use std::{cell::RefCell, future::Future, rc::Rc};

use futures::{
  future::{AbortHandle, Abortable, LocalBoxFuture, Shared},
  stream::LocalBoxStream,
  FutureExt, Stream, StreamExt,
};

use super::Observable;
use crate::{
  error::{Error, StreamError},
  scheduler,
  subscriber::Subscriber,
};

/// Produces a fresh iterator for every subscription.
pub type IterFactory<T, E> = Rc<dyn Fn() -> Box<dyn Iterator<Item = Result<T, E>>>>;

/// A stream that can be consumed by one subscription only.
pub type OnceStream<T, E> = Rc<RefCell<Option<LocalBoxStream<'static, Result<T, E>>>>>;

/// A future whose outcome every subscription observes.
pub type SharedFuture<T, E> = Shared<LocalBoxFuture<'static, Result<T, E>>>;

/// The source shapes an [`Observable`] can be built from.
pub enum ObservableInput<T, E = Error> {
  Observable(Observable<T, E>),
  Stream(OnceStream<T, E>),
  Iter(IterFactory<T, E>),
  Future(SharedFuture<T, E>),
}

impl<T: Clone + 'static, E: StreamError> ObservableInput<T, E> {
  pub fn iter<I>(iter: I) -> Self
  where
    I: IntoIterator<Item = T> + Clone + 'static,
    I::IntoIter: 'static,
  {
    Self::Iter(Rc::new(move || {
      Box::new(iter.clone().into_iter().map(Ok)) as Box<dyn Iterator<Item = Result<T, E>>>
    }))
  }

  /// An iterable whose `Err` items fail the subscription.
  pub fn try_iter<I>(iter: I) -> Self
  where
    I: IntoIterator<Item = Result<T, E>> + Clone + 'static,
    I::IntoIter: 'static,
  {
    Self::Iter(Rc::new(move || {
      Box::new(iter.clone().into_iter()) as Box<dyn Iterator<Item = Result<T, E>>>
    }))
  }

  pub fn stream(stream: impl Stream<Item = T> + 'static) -> Self {
    Self::Stream(Rc::new(RefCell::new(Some(stream.map(Ok).boxed_local()))))
  }

  /// A stream whose `Err` items fail the subscription.
  pub fn try_stream(stream: impl Stream<Item = Result<T, E>> + 'static) -> Self {
    Self::Stream(Rc::new(RefCell::new(Some(stream.boxed_local()))))
  }

  pub fn future(future: impl Future<Output = T> + 'static) -> Self {
    Self::Future(future.map(Ok).boxed_local().shared())
  }

  /// A future whose `Err` outcome fails the subscription.
  pub fn try_future(future: impl Future<Output = Result<T, E>> + 'static) -> Self {
    Self::Future(future.boxed_local().shared())
  }

  pub fn into_observable(self) -> Observable<T, E> {
    match self {
      Self::Observable(observable) => observable,
      Self::Iter(factory) => Observable::new(move |subscriber| {
        if subscriber.token().is_cancelled() {
          return;
        }
        push_iter(&subscriber, factory())
      }),
      Self::Stream(slot) => Observable::new(move |subscriber| pull_stream(&subscriber, &slot)),
      Self::Future(future) => {
        Observable::new(move |subscriber| await_future(&subscriber, future.clone()))
      }
    }
  }
}

impl<T, E> From<Observable<T, E>> for ObservableInput<T, E> {
  fn from(observable: Observable<T, E>) -> Self { Self::Observable(observable) }
}

impl<T: Clone + 'static, E: StreamError> From<Vec<T>> for ObservableInput<T, E> {
  fn from(values: Vec<T>) -> Self { Self::iter(values) }
}

impl<T: Clone + 'static, E: StreamError, const N: usize> From<[T; N]> for ObservableInput<T, E> {
  fn from(values: [T; N]) -> Self { Self::iter(values) }
}

impl<T: Clone + 'static, E: StreamError> From<Option<T>> for ObservableInput<T, E> {
  fn from(value: Option<T>) -> Self { Self::iter(value) }
}

fn push_iter<T: Clone + 'static, E: StreamError>(
  subscriber: &Subscriber<T, E>, iter: Box<dyn Iterator<Item = Result<T, E>>>,
) {
  let token = subscriber.token();
  for item in iter {
    match item {
      Ok(value) => subscriber.next(value),
      Err(err) => {
        subscriber.error(err);
        return;
      }
    }
    if token.is_cancelled() {
      return;
    }
  }
  subscriber.complete();
}

fn pull_stream<T: Clone + 'static, E: StreamError>(
  subscriber: &Subscriber<T, E>, slot: &OnceStream<T, E>,
) {
  if subscriber.token().is_cancelled() {
    return;
  }
  let Some(mut stream) = slot.borrow_mut().take() else {
    // consumed by an earlier subscription
    subscriber.complete();
    return;
  };
  let downstream = subscriber.clone();
  spawn_driver(subscriber, async move {
    while let Some(item) = stream.next().await {
      match item {
        Ok(value) => downstream.next(value),
        Err(err) => {
          downstream.error(err);
          return;
        }
      }
      if !downstream.is_active() {
        return;
      }
    }
    downstream.complete();
  });
}

fn await_future<T: Clone + 'static, E: StreamError>(
  subscriber: &Subscriber<T, E>, future: SharedFuture<T, E>,
) {
  if subscriber.token().is_cancelled() {
    return;
  }
  let downstream = subscriber.clone();
  spawn_driver(subscriber, async move {
    match future.await {
      Ok(value) => {
        downstream.next(value);
        downstream.complete();
      }
      Err(err) => downstream.error(err),
    }
  });
}

fn spawn_driver<T: Clone + 'static, E: StreamError>(
  subscriber: &Subscriber<T, E>, task: impl Future<Output = ()> + 'static,
) {
  let context = subscriber.context();
  let Some(spawner) = context.scheduler() else {
    subscriber.error(Error::NoScheduler.into());
    return;
  };

  let (handle, registration) = AbortHandle::new_pair();
  subscriber.add_teardown(move || {
    tracing::debug!("aborting asynchronous source");
    handle.abort();
  });
  let task = Abortable::new(task, registration).map(|_| ()).boxed_local();
  match scheduler::spawn(spawner, task) {
    Ok(()) => tracing::debug!("asynchronous source spawned"),
    Err(err) => subscriber.error(err.into()),
  }
}

impl<T: Clone + 'static, E: StreamError> Observable<T, E> {
  /// Convert any supported source shape into an observable.
  pub fn from_input(input: impl Into<ObservableInput<T, E>>) -> Self {
    input.into().into_observable()
  }

  /// Push the items of `iter`, re-iterating it for every subscription.
  #[allow(clippy::should_implement_trait)]
  pub fn from_iter<I>(iter: I) -> Self
  where
    I: IntoIterator<Item = T> + Clone + 'static,
    I::IntoIter: 'static,
  {
    ObservableInput::iter(iter).into_observable()
  }

  pub fn try_from_iter<I>(iter: I) -> Self
  where
    I: IntoIterator<Item = Result<T, E>> + Clone + 'static,
    I::IntoIter: 'static,
  {
    ObservableInput::try_iter(iter).into_observable()
  }

  /// Pull `stream` on the context's scheduler. Only the first subscription
  /// sees its items.
  pub fn from_stream(stream: impl Stream<Item = T> + 'static) -> Self {
    ObservableInput::stream(stream).into_observable()
  }

  pub fn try_from_stream(stream: impl Stream<Item = Result<T, E>> + 'static) -> Self {
    ObservableInput::try_stream(stream).into_observable()
  }

  /// Emit the output of `future` then complete.
  pub fn from_future(future: impl Future<Output = T> + 'static) -> Self {
    ObservableInput::future(future).into_observable()
  }

  pub fn try_from_future(future: impl Future<Output = Result<T, E>> + 'static) -> Self {
    ObservableInput::try_future(future).into_observable()
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use futures::{channel::oneshot, executor::LocalPool, stream};

  use super::*;
  use crate::{
    cancellation::CancellationToken, context::Context, observable::SubscribeOptions,
    observer::Sink,
  };

  type Log = Rc<RefCell<Vec<String>>>;

  fn recorder(log: &Log) -> Sink<i32, Error> {
    let (l1, l2, l3) = (log.clone(), log.clone(), log.clone());
    Sink::new()
      .on_next(move |v| l1.borrow_mut().push(format!("next {v}")))
      .on_error(move |e| l2.borrow_mut().push(format!("error {e}")))
      .on_complete(move || l3.borrow_mut().push("complete".into()))
  }

  fn scheduled(pool: &LocalPool) -> SubscribeOptions<Error> {
    Context::builder().scheduler(pool.spawner()).build().into()
  }

  #[test]
  fn iter_replays_per_subscription() {
    let obs = Observable::<i32>::from_iter(vec![1, 2]);
    let log = Log::default();
    obs.subscribe(recorder(&log));
    obs.subscribe(recorder(&log));
    assert_eq!(log.borrow().len(), 6);
  }

  #[test]
  fn iter_stops_when_cancelled_mid_loop() {
    let pulled = Rc::new(RefCell::new(0));
    let pulled2 = pulled.clone();
    let token = CancellationToken::new();
    let token2 = token.clone();
    let obs = Observable::<i32>::from_iter(0..10).map(move |v, _| {
      *pulled2.borrow_mut() += 1;
      v
    });
    obs.subscribe_with(
      move |v: i32| {
        if v == 2 {
          token2.cancel()
        }
      },
      token.into(),
    );
    assert_eq!(*pulled.borrow(), 3);
  }

  #[test]
  fn iter_error_item_fails() {
    let obs = Observable::<i32>::try_from_iter(vec![Ok(1), Err(Error::msg("bad")), Ok(3)]);
    let log = Log::default();
    obs.subscribe(recorder(&log));
    assert_eq!(*log.borrow(), vec!["next 1".to_string(), "error bad".to_string()]);
  }

  #[test]
  fn from_input_keeps_observables() {
    let obs = Observable::<i32>::of(4);
    let converted = Observable::from_input(obs.clone());
    assert!(Rc::ptr_eq(&obs.inner, &converted.inner));
  }

  #[test]
  fn stream_is_pulled_on_scheduler() {
    let mut pool = LocalPool::new();
    let obs = Observable::<i32>::from_stream(stream::iter(vec![1, 2, 3]));
    let log = Log::default();
    obs.subscribe_with(recorder(&log), scheduled(&pool));
    assert!(log.borrow().is_empty());

    pool.run();
    assert_eq!(
      *log.borrow(),
      vec!["next 1".to_string(), "next 2".into(), "next 3".into(), "complete".into()]
    );

    // the stream is spent
    let again = Log::default();
    obs.subscribe_with(recorder(&again), scheduled(&pool));
    assert_eq!(*again.borrow(), vec!["complete".to_string()]);
  }

  #[test]
  fn cancelled_stream_is_dropped() {
    struct DropFlag(Rc<RefCell<bool>>);
    impl Drop for DropFlag {
      fn drop(&mut self) { *self.0.borrow_mut() = true; }
    }

    let mut pool = LocalPool::new();
    let dropped = Rc::new(RefCell::new(false));
    let flag = DropFlag(dropped.clone());
    let pending = stream::pending::<i32>().map(move |v| {
      let _keep = &flag;
      v
    });
    let obs = Observable::<i32>::from_stream(pending);
    let token = CancellationToken::new();
    obs.subscribe_with(|_: i32| {}, scheduled(&pool).with_token(token.clone()));
    pool.run_until_stalled();
    assert!(!*dropped.borrow());

    token.cancel();
    pool.run_until_stalled();
    assert!(*dropped.borrow());
  }

  #[test]
  fn future_outcomes() {
    let mut pool = LocalPool::new();
    let (tx, rx) = oneshot::channel::<i32>();
    let obs = Observable::<i32>::from_future(async move { rx.await.unwrap_or(-1) });
    let log = Log::default();
    obs.subscribe_with(recorder(&log), scheduled(&pool));
    obs.subscribe_with(recorder(&log), scheduled(&pool));
    pool.run_until_stalled();
    assert!(log.borrow().is_empty());

    tx.send(9).unwrap();
    pool.run();
    assert_eq!(
      *log.borrow(),
      vec!["next 9".to_string(), "complete".into(), "next 9".into(), "complete".into()]
    );

    let failed = Observable::<i32>::try_from_future(async { Err(Error::msg("nope")) });
    let log = Log::default();
    failed.subscribe_with(recorder(&log), scheduled(&pool));
    pool.run();
    assert_eq!(*log.borrow(), vec!["error nope".to_string()]);
  }

  #[test]
  fn async_source_without_scheduler_fails() {
    let obs = Observable::<i32>::from_future(async { 1 });
    let log = Log::default();
    obs.subscribe(recorder(&log));
    assert_eq!(*log.borrow(), vec![format!("error {}", Error::NoScheduler)]);
  }
}
