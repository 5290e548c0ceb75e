use std::rc::Rc;

use crate::{error::StreamError, observable::Observable, observer::Sink};

impl<T: Clone + 'static, E: StreamError> Observable<T, E> {
  /// Run `f` once the subscription ends, whether it completed, failed or
  /// was cancelled.
  pub fn finally(&self, f: impl Fn() + 'static) -> Observable<T, E> {
    let source = self.clone();
    let f = Rc::new(f);
    Observable::new(move |downstream| {
      let f = f.clone();
      downstream.add_teardown(move || f());
      source.subscribe_with(Sink::forward_to(&downstream), downstream.options());
    })
  }
}
