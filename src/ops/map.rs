use std::{cell::Cell, rc::Rc};

use crate::{error::StreamError, observable::Observable, observer::Sink};

impl<T: Clone + 'static, E: StreamError> Observable<T, E> {
  /// Transform every value with `f(value, index)`, where `index` counts the
  /// values seen by this subscription.
  ///
  /// ```rust
  /// use lazy_observable::prelude::*;
  ///
  /// let doubled = Observable::<i32>::from_iter([1, 2, 3]).map(|v, _| v * 2);
  /// doubled.subscribe(|v| println!("{v}"));
  /// ```
  pub fn map<U, F>(&self, f: F) -> Observable<U, E>
  where
    U: Clone + 'static,
    F: Fn(T, usize) -> U + 'static,
  {
    self.try_map(move |v, i| Ok(f(v, i)))
  }

  /// Like [`map`](Self::map); an `Err` from `f` fails the downstream.
  pub fn try_map<U, F>(&self, f: F) -> Observable<U, E>
  where
    U: Clone + 'static,
    F: Fn(T, usize) -> Result<U, E> + 'static,
  {
    let source = self.clone();
    let f = Rc::new(f);
    Observable::new(move |downstream| {
      let index = Cell::new(0);
      let f = f.clone();
      let next = downstream.clone();
      let sink = Sink::new()
        .on_next(move |v| {
          let i = index.get();
          match f(v, i) {
            Ok(mapped) => {
              index.set(i + 1);
              next.next(mapped);
            }
            Err(err) => next.error(err),
          }
        })
        .terminals_to(&downstream);
      source.subscribe_with(sink, downstream.options());
    })
  }
}

#[cfg(test)]
mod tests {
  use crate::{prelude::*, test_util::*};

  #[test]
  fn maps_with_index() {
    let log = log();
    Observable::<i32>::from_iter([10, 20, 30])
      .map(|v, i| format!("{i}:{v}"))
      .subscribe(recorder(&log));
    assert_eq!(lines(&log), vec!["next 0:10", "next 1:20", "next 2:30", "complete"]);
  }

  #[test]
  fn index_is_per_subscription() {
    let source = Observable::<i32>::from_iter([1, 2]).map(|_, i| i as i32);
    let (a, b) = (log(), log());
    source.subscribe(recorder(&a));
    source.subscribe(recorder(&b));
    assert_eq!(lines(&a), lines(&b));
    assert_eq!(lines(&a), vec!["next 0", "next 1", "complete"]);
  }

  #[test]
  fn failing_mapper_errors_and_unsubscribes_upstream() {
    let source = Manual::<i32>::new();
    let log = log();
    source
      .observable
      .try_map(|v, _| if v == 2 { Err(Error::msg("two")) } else { Ok(v) })
      .subscribe(recorder(&log));

    source.next(1);
    source.next(2);
    source.next(3);

    assert_eq!(lines(&log), vec!["next 1", "error two"]);
    assert_eq!(source.active(), 0);
  }

  #[test]
  fn errors_and_completion_pass_through() {
    let log = log();
    Observable::<i32>::throw(Error::msg("up"))
      .map(|v, _| v + 1)
      .subscribe(recorder(&log));
    assert_eq!(lines(&log), vec!["error up"]);
  }
}
