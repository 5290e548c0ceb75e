use std::cell::Cell;

use crate::{error::StreamError, observable::Observable, observer::Sink};

impl<T: Clone + 'static, E: StreamError> Observable<T, E> {
  /// Skip the first `count` values and forward the rest.
  pub fn drop(&self, count: usize) -> Observable<T, E> {
    let source = self.clone();
    Observable::new(move |downstream| {
      let to_skip = Cell::new(count);
      let next = downstream.clone();
      let sink = Sink::new()
        .on_next(move |v| match to_skip.get() {
          0 => next.next(v),
          left => to_skip.set(left - 1),
        })
        .terminals_to(&downstream);
      source.subscribe_with(sink, downstream.options());
    })
  }
}
