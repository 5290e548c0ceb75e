use std::{cell::Cell, rc::Rc};

use crate::{error::StreamError, observable::Observable, observer::Sink};

impl<T: Clone + 'static, E: StreamError> Observable<T, E> {
  /// Forward only the values for which `predicate(&value, index)` holds.
  /// `index` counts every value seen, forwarded or not.
  pub fn filter<F>(&self, predicate: F) -> Observable<T, E>
  where
    F: Fn(&T, usize) -> bool + 'static,
  {
    self.try_filter(move |v, i| Ok(predicate(v, i)))
  }

  /// Like [`filter`](Self::filter); an `Err` from `predicate` fails the
  /// downstream.
  pub fn try_filter<F>(&self, predicate: F) -> Observable<T, E>
  where
    F: Fn(&T, usize) -> Result<bool, E> + 'static,
  {
    let source = self.clone();
    let predicate = Rc::new(predicate);
    Observable::new(move |downstream| {
      let index = Cell::new(0);
      let predicate = predicate.clone();
      let next = downstream.clone();
      let sink = Sink::new()
        .on_next(move |v| {
          let i = index.get();
          match predicate(&v, i) {
            Ok(keep) => {
              index.set(i + 1);
              if keep {
                next.next(v);
              }
            }
            Err(err) => next.error(err),
          }
        })
        .terminals_to(&downstream);
      source.subscribe_with(sink, downstream.options());
    })
  }
}
