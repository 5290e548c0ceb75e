use std::cell::Cell;

use super::into_future::{terminal, ObservableFuture};
use crate::{
  error::StreamError,
  observable::{Observable, SubscribeOptions},
  observer::Sink,
};

impl<T: Clone + 'static, E: StreamError> Observable<T, E> {
  /// Resolve with the first value matching `predicate`, or `None` if the
  /// stream completes without one.
  pub fn find(&self, predicate: impl Fn(&T, usize) -> bool + 'static) -> ObservableFuture<Option<T>, E> {
    self.find_with(predicate, SubscribeOptions::new())
  }

  pub fn find_with(
    &self, predicate: impl Fn(&T, usize) -> bool + 'static, options: SubscribeOptions<E>,
  ) -> ObservableFuture<Option<T>, E> {
    self.try_find_with(move |v, i| Ok(predicate(v, i)), options)
  }

  /// Like [`find`](Self::find), but an `Err` from `predicate` rejects the
  /// future with it and unsubscribes from the source.
  pub fn try_find(
    &self, predicate: impl Fn(&T, usize) -> Result<bool, E> + 'static,
  ) -> ObservableFuture<Option<T>, E> {
    self.try_find_with(predicate, SubscribeOptions::new())
  }

  pub fn try_find_with(
    &self, predicate: impl Fn(&T, usize) -> Result<bool, E> + 'static, options: SubscribeOptions<E>,
  ) -> ObservableFuture<Option<T>, E> {
    terminal(self, options, move |t| {
      let index = Cell::new(0);
      let (found, fail) = (t.clone(), t.clone());
      Sink::new()
        .on_next(move |v| {
          let i = index.get();
          index.set(i + 1);
          match predicate(&v, i) {
            Ok(true) => found.finish(Some(v)),
            Ok(false) => {}
            Err(err) => found.abort(err),
          }
        })
        .on_error(move |e| fail.settle.reject(e))
        .on_complete(move || t.settle.resolve(None))
    })
  }
}
