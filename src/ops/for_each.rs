use std::cell::Cell;

use super::into_future::{terminal, ObservableFuture};
use crate::{
  error::StreamError,
  observable::{Observable, SubscribeOptions},
  observer::Sink,
};

impl<T: Clone + 'static, E: StreamError> Observable<T, E> {
  /// Call `f` for every value; resolve once the stream completes.
  pub fn for_each(&self, f: impl Fn(T, usize) + 'static) -> ObservableFuture<(), E> {
    self.for_each_with(f, SubscribeOptions::new())
  }

  pub fn for_each_with(
    &self, f: impl Fn(T, usize) + 'static, options: SubscribeOptions<E>,
  ) -> ObservableFuture<(), E> {
    self.try_for_each_with(
      move |v, i| {
        f(v, i);
        Ok(())
      },
      options,
    )
  }

  /// Like [`for_each`](Observable::for_each), but a failing callback rejects
  /// the future and unsubscribes from the source.
  pub fn try_for_each(&self, f: impl Fn(T, usize) -> Result<(), E> + 'static) -> ObservableFuture<(), E> {
    self.try_for_each_with(f, SubscribeOptions::new())
  }

  pub fn try_for_each_with(
    &self, f: impl Fn(T, usize) -> Result<(), E> + 'static, options: SubscribeOptions<E>,
  ) -> ObservableFuture<(), E> {
    terminal(self, options, move |t| {
      let index = Cell::new(0);
      let (abort, fail) = (t.clone(), t.clone());
      Sink::new()
        .on_next(move |v| {
          let i = index.get();
          index.set(i + 1);
          if let Err(err) = f(v, i) {
            abort.abort(err);
          }
        })
        .on_error(move |e| fail.settle.reject(e))
        .on_complete(move || t.settle.resolve(()))
    })
  }
}
