//! Folding a stream into a single value.
//!
//! Without a seed the first value becomes the accumulator and the reducer
//! first runs for the second value (index 1). With a seed the reducer runs
//! for every value starting at index 0.

use std::{
  cell::{Cell, RefCell},
  rc::Rc,
};

use super::into_future::{terminal, ObservableFuture};
use crate::{
  error::{Error, StreamError},
  observable::{Observable, SubscribeOptions},
  observer::Sink,
};

impl<T: Clone + 'static, E: StreamError> Observable<T, E> {
  /// Fold without a seed.
  ///
  /// Rejects with [`Error::NoSeed`] when the stream completes empty.
  ///
  /// ```
  /// use futures::executor::block_on;
  /// use lazy_observable::prelude::*;
  ///
  /// let sum = Observable::<i32>::from_iter([1, 2, 3]).reduce(|acc, v, _| acc + v);
  /// assert_eq!(block_on(sum), Ok(6));
  /// ```
  pub fn reduce(&self, f: impl Fn(T, T, usize) -> T + 'static) -> ObservableFuture<T, E> {
    self.reduce_with(f, SubscribeOptions::new())
  }

  pub fn reduce_with(
    &self, f: impl Fn(T, T, usize) -> T + 'static, options: SubscribeOptions<E>,
  ) -> ObservableFuture<T, E> {
    self.try_reduce_with(move |acc, v, i| Ok(f(acc, v, i)), options)
  }

  /// Fold starting from `seed`; an empty stream resolves with the seed.
  pub fn reduce_initial<A: 'static>(
    &self, seed: A, f: impl Fn(A, T, usize) -> A + 'static,
  ) -> ObservableFuture<A, E> {
    self.reduce_initial_with(seed, f, SubscribeOptions::new())
  }

  pub fn reduce_initial_with<A: 'static>(
    &self, seed: A, f: impl Fn(A, T, usize) -> A + 'static, options: SubscribeOptions<E>,
  ) -> ObservableFuture<A, E> {
    self.try_reduce_initial_with(seed, move |acc, v, i| Ok(f(acc, v, i)), options)
  }

  /// Fold without a seed; a failing reducer rejects the future and
  /// unsubscribes from the source.
  pub fn try_reduce(&self, f: impl Fn(T, T, usize) -> Result<T, E> + 'static) -> ObservableFuture<T, E> {
    self.try_reduce_with(f, SubscribeOptions::new())
  }

  pub fn try_reduce_with(
    &self, f: impl Fn(T, T, usize) -> Result<T, E> + 'static, options: SubscribeOptions<E>,
  ) -> ObservableFuture<T, E> {
    fold(self, None, Some(std::convert::identity as fn(T) -> T), f, options)
  }

  pub fn try_reduce_initial<A: 'static>(
    &self, seed: A, f: impl Fn(A, T, usize) -> Result<A, E> + 'static,
  ) -> ObservableFuture<A, E> {
    self.try_reduce_initial_with(seed, f, SubscribeOptions::new())
  }

  pub fn try_reduce_initial_with<A: 'static>(
    &self, seed: A, f: impl Fn(A, T, usize) -> Result<A, E> + 'static, options: SubscribeOptions<E>,
  ) -> ObservableFuture<A, E> {
    fold(self, Some(seed), None, f, options)
  }
}

/// `lift` turns the first value into the accumulator when there is no seed.
fn fold<T, E, A>(
  source: &Observable<T, E>, seed: Option<A>, lift: Option<fn(T) -> A>,
  f: impl Fn(A, T, usize) -> Result<A, E> + 'static, options: SubscribeOptions<E>,
) -> ObservableFuture<A, E>
where
  T: Clone + 'static,
  E: StreamError,
  A: 'static,
{
  terminal(source, options, move |t| {
    let acc = Rc::new(RefCell::new(seed));
    let index = Cell::new(0);
    let (step, abort, fail) = (acc.clone(), t.clone(), t.clone());
    Sink::new()
      .on_next(move |v| {
        let i = index.get();
        index.set(i + 1);
        let current = step.borrow_mut().take();
        let updated = match (current, lift) {
          (Some(held), _) => f(held, v, i),
          (None, Some(lift)) => Ok(lift(v)),
          (None, None) => return,
        };
        match updated {
          Ok(updated) => *step.borrow_mut() = Some(updated),
          Err(err) => abort.abort(err),
        }
      })
      .on_error(move |e| fail.settle.reject(e))
      .on_complete(move || match acc.take() {
        Some(acc) => t.settle.resolve(acc),
        None => t.settle.reject(Error::NoSeed.into()),
      })
  })
}
