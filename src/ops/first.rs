use super::into_future::{terminal, ObservableFuture};
use crate::{
  error::{Error, StreamError},
  observable::{Observable, SubscribeOptions},
  observer::Sink,
};

impl<T: Clone + 'static, E: StreamError> Observable<T, E> {
  /// Resolve with the first value and unsubscribe right away.
  ///
  /// Rejects with [`Error::EmptySequence`] if the stream completes without
  /// a value.
  ///
  /// # Examples
  ///
  /// ```
  /// use futures::executor::block_on;
  /// use lazy_observable::prelude::*;
  ///
  /// assert_eq!(block_on(Observable::<i32>::from_iter([7, 8]).first()), Ok(7));
  /// assert_eq!(block_on(Observable::<i32>::empty().first()), Err(Error::EmptySequence));
  /// ```
  pub fn first(&self) -> ObservableFuture<T, E> { self.first_with(SubscribeOptions::new()) }

  pub fn first_with(&self, options: SubscribeOptions<E>) -> ObservableFuture<T, E> {
    terminal(self, options, |t| {
      let (found, fail) = (t.clone(), t.clone());
      Sink::new()
        .on_next(move |v| found.finish(v))
        .on_error(move |e| fail.settle.reject(e))
        .on_complete(move || t.settle.reject(Error::EmptySequence.into()))
    })
  }
}

#[cfg(test)]
mod tests {
  use futures::executor::block_on;

  use crate::{prelude::*, test_util::*};

  #[test]
  fn takes_first_and_unsubscribes() {
    let source = Manual::<i32>::new();
    let first = source.observable.first();
    source.next(7);
    source.next(8);
    assert_eq!(source.active(), 0);
    assert_eq!(block_on(first), Ok(7));
  }

  #[test]
  fn empty_is_rejected() {
    assert_eq!(block_on(Observable::<i32>::empty().first()), Err(Error::EmptySequence));
  }

  #[test]
  fn external_cancel_before_value() {
    let token = CancellationToken::new();
    let first = Observable::<i32>::never().first_with(token.clone().into());
    token.cancel();
    assert_eq!(block_on(first), Err(Error::Aborted));
  }
}
