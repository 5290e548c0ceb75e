use std::rc::Rc;

use crate::{
  error::StreamError,
  observable::{Observable, ObservableInput},
  observer::Sink,
};

impl<T: Clone + 'static, E: StreamError> Observable<T, E> {
  /// Replace a failure of the source with the stream `recover(err)`.
  ///
  /// Values and completion pass through. A failure of the recovery stream
  /// fails the downstream.
  ///
  /// # Examples
  ///
  /// ```
  /// use futures::executor::block_on;
  /// use lazy_observable::prelude::*;
  ///
  /// let recovered = Observable::<i32>::throw(Error::msg("boom"))
  ///   .catch(|_| vec![0])
  ///   .to_array();
  /// assert_eq!(block_on(recovered), Ok(vec![0]));
  /// ```
  pub fn catch<F, I>(&self, recover: F) -> Observable<T, E>
  where
    F: Fn(E) -> I + 'static,
    I: Into<ObservableInput<T, E>>,
  {
    let source = self.clone();
    let recover = Rc::new(recover);
    Observable::new(move |downstream| {
      let recover = recover.clone();
      let (next, complete, fallback) = (downstream.clone(), downstream.clone(), downstream.clone());
      let sink = Sink::new()
        .on_next(move |v| next.next(v))
        .on_complete(move || complete.complete())
        .on_error(move |err| {
          let replacement = Observable::from_input(recover(err));
          replacement.subscribe_with(Sink::forward_to(&fallback), fallback.options());
        });
      source.subscribe_with(sink, downstream.options());
    })
  }
}

#[cfg(test)]
mod tests {
  use crate::{prelude::*, test_util::*};

  #[test]
  fn switches_to_recovery_stream() {
    let log = log();
    Observable::<i32>::try_from_iter(vec![Ok(1), Err(Error::msg("broken"))])
      .catch(|_| vec![8, 9])
      .subscribe(recorder(&log));
    assert_eq!(lines(&log), vec!["next 1", "next 8", "next 9", "complete"]);
  }

  #[test]
  fn recovery_sees_the_error() {
    let log = log();
    Observable::<String>::throw(Error::msg("why"))
      .catch(|e| Observable::of(format!("caught {e}")))
      .subscribe(recorder(&log));
    assert_eq!(lines(&log), vec!["next caught why", "complete"]);
  }

  #[test]
  fn failing_recovery_fails_downstream() {
    let log = log();
    Observable::<i32>::throw(Error::msg("first"))
      .catch(|_| Observable::throw(Error::msg("second")))
      .subscribe(recorder(&log));
    assert_eq!(lines(&log), vec!["error second"]);
  }

  #[test]
  fn untouched_without_error() {
    let log = log();
    Observable::<i32>::from_iter([1, 2])
      .catch(|_| Observable::never())
      .subscribe(recorder(&log));
    assert_eq!(lines(&log), vec!["next 1", "next 2", "complete"]);
  }
}
