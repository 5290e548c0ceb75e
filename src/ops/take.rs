use std::cell::Cell;

use crate::{error::StreamError, observable::Observable, observer::Sink};

impl<T: Clone + 'static, E: StreamError> Observable<T, E> {
  /// Emit only the first `count` values, then complete.
  ///
  /// Completing closes the downstream subscriber, whose token unsubscribes
  /// the source. `take(0)` completes without subscribing to the source.
  ///
  /// # Examples
  ///
  /// ```
  /// use futures::executor::block_on;
  /// use lazy_observable::prelude::*;
  ///
  /// let firsts = block_on(Observable::<i32>::from_iter(1..).take(3).to_array());
  /// assert_eq!(firsts, Ok(vec![1, 2, 3]));
  /// ```
  pub fn take(&self, count: usize) -> Observable<T, E> {
    let source = self.clone();
    Observable::new(move |downstream| {
      if count == 0 {
        downstream.complete();
        return;
      }
      let remaining = Cell::new(count);
      let next = downstream.clone();
      let sink = Sink::new()
        .on_next(move |v| {
          let left = remaining.get();
          if left == 0 {
            return;
          }
          remaining.set(left - 1);
          next.next(v);
          if left == 1 {
            next.complete();
          }
        })
        .terminals_to(&downstream);
      source.subscribe_with(sink, downstream.options());
    })
  }
}
