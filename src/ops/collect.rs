//! `to_array`: gather every value into a `Vec`.

use std::{cell::RefCell, rc::Rc};

use super::into_future::{terminal, ObservableFuture};
use crate::{
  error::StreamError,
  observable::{Observable, SubscribeOptions},
  observer::Sink,
};

impl<T: Clone + 'static, E: StreamError> Observable<T, E> {
  /// Subscribe and resolve with all values once the stream completes.
  ///
  /// # Examples
  ///
  /// ```
  /// use futures::executor::block_on;
  /// use lazy_observable::prelude::*;
  ///
  /// let values = block_on(Observable::<i32>::from_iter([1, 2, 3]).to_array());
  /// assert_eq!(values, Ok(vec![1, 2, 3]));
  /// ```
  pub fn to_array(&self) -> ObservableFuture<Vec<T>, E> { self.to_array_with(SubscribeOptions::new()) }

  pub fn to_array_with(&self, options: SubscribeOptions<E>) -> ObservableFuture<Vec<T>, E> {
    terminal(self, options, |t| {
      let values = Rc::new(RefCell::new(Vec::new()));
      let (push, fail) = (values.clone(), t.clone());
      Sink::new()
        .on_next(move |v| push.borrow_mut().push(v))
        .on_error(move |e| fail.settle.reject(e))
        .on_complete(move || t.settle.resolve(values.take()))
    })
  }
}
