//! `every` and `some`: short-circuiting predicates over a whole stream,
//! with fallible `try_` variants.

use std::cell::Cell;

use super::into_future::{terminal, ObservableFuture, Terminal};
use crate::{
  error::StreamError,
  observable::{Observable, SubscribeOptions},
  observer::Sink,
};

impl<T: Clone + 'static, E: StreamError> Observable<T, E> {
  /// Resolve `true` if every value satisfies `predicate`.
  ///
  /// The first failing value resolves `false` and unsubscribes from the
  /// source. An empty stream resolves `true`.
  pub fn every(&self, predicate: impl Fn(&T, usize) -> bool + 'static) -> ObservableFuture<bool, E> {
    self.every_with(predicate, SubscribeOptions::new())
  }

  pub fn every_with(
    &self, predicate: impl Fn(&T, usize) -> bool + 'static, options: SubscribeOptions<E>,
  ) -> ObservableFuture<bool, E> {
    self.try_every_with(move |v, i| Ok(predicate(v, i)), options)
  }

  /// Like [`every`](Self::every), but an `Err` from `predicate` rejects the
  /// future with it and unsubscribes from the source.
  pub fn try_every(
    &self, predicate: impl Fn(&T, usize) -> Result<bool, E> + 'static,
  ) -> ObservableFuture<bool, E> {
    self.try_every_with(predicate, SubscribeOptions::new())
  }

  pub fn try_every_with(
    &self, predicate: impl Fn(&T, usize) -> Result<bool, E> + 'static, options: SubscribeOptions<E>,
  ) -> ObservableFuture<bool, E> {
    terminal(self, options, |t| short_circuit(t, move |v, i| predicate(v, i).map(|pass| !pass), false))
  }

  /// Resolve `true` as soon as a value satisfies `predicate`.
  ///
  /// An empty stream resolves `false`.
  pub fn some(&self, predicate: impl Fn(&T, usize) -> bool + 'static) -> ObservableFuture<bool, E> {
    self.some_with(predicate, SubscribeOptions::new())
  }

  pub fn some_with(
    &self, predicate: impl Fn(&T, usize) -> bool + 'static, options: SubscribeOptions<E>,
  ) -> ObservableFuture<bool, E> {
    self.try_some_with(move |v, i| Ok(predicate(v, i)), options)
  }

  pub fn try_some(
    &self, predicate: impl Fn(&T, usize) -> Result<bool, E> + 'static,
  ) -> ObservableFuture<bool, E> {
    self.try_some_with(predicate, SubscribeOptions::new())
  }

  pub fn try_some_with(
    &self, predicate: impl Fn(&T, usize) -> Result<bool, E> + 'static, options: SubscribeOptions<E>,
  ) -> ObservableFuture<bool, E> {
    terminal(self, options, |t| short_circuit(t, predicate, true))
  }
}

/// Resolve `hit` on the first value `stop` accepts, `!hit` on completion.
/// An `Err` from `stop` rejects and unsubscribes.
fn short_circuit<T, E: StreamError>(
  t: Terminal<bool, E>, stop: impl Fn(&T, usize) -> Result<bool, E> + 'static, hit: bool,
) -> Sink<T, E> {
  let index = Cell::new(0);
  let (found, fail) = (t.clone(), t.clone());
  Sink::new()
    .on_next(move |v| {
      let i = index.get();
      index.set(i + 1);
      match stop(&v, i) {
        Ok(true) => found.finish(hit),
        Ok(false) => {}
        Err(err) => found.abort(err),
      }
    })
    .on_error(move |e| fail.settle.reject(e))
    .on_complete(move || t.settle.resolve(!hit))
}
