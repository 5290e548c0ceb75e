use std::{cell::RefCell, rc::Rc};

use super::into_future::{terminal, ObservableFuture};
use crate::{
  error::{Error, StreamError},
  observable::{Observable, SubscribeOptions},
  observer::Sink,
};

impl<T: Clone + 'static, E: StreamError> Observable<T, E> {
  /// Resolve with the final value once the stream completes.
  ///
  /// Rejects with [`Error::EmptySequence`] if there was no value.
  pub fn last(&self) -> ObservableFuture<T, E> { self.last_with(SubscribeOptions::new()) }

  pub fn last_with(&self, options: SubscribeOptions<E>) -> ObservableFuture<T, E> {
    terminal(self, options, |t| {
      let latest = Rc::new(RefCell::new(None));
      let (store, fail) = (latest.clone(), t.clone());
      Sink::new()
        .on_next(move |v| *store.borrow_mut() = Some(v))
        .on_error(move |e| fail.settle.reject(e))
        .on_complete(move || match latest.take() {
          Some(v) => t.settle.resolve(v),
          None => t.settle.reject(Error::EmptySequence.into()),
        })
    })
  }
}
