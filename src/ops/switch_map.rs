use std::{cell::RefCell, rc::Rc};

use crate::{
  cancellation::CancellationToken,
  error::StreamError,
  observable::{Observable, ObservableInput, SubscribeOptions},
  observer::Sink,
  subscriber::Subscriber,
};

struct SwitchState<E> {
  index: usize,
  outer_done: bool,
  active: Option<CancellationToken<E>>,
}

impl<T: Clone + 'static, E: StreamError> Observable<T, E> {
  /// Map every value to a stream, keeping only the most recent one alive.
  ///
  /// A new outer value cancels the running inner subscription before the
  /// next one is subscribed. The result completes once the outer stream and
  /// the last inner stream have both completed.
  ///
  /// # Examples
  ///
  /// ```
  /// use futures::executor::block_on;
  /// use lazy_observable::prelude::*;
  ///
  /// let latest = Observable::<i32>::from_iter([1, 2])
  ///   .switch_map(|v, _| match v {
  ///     1 => Observable::<i32>::never(),
  ///     _ => Observable::<i32>::of(v * 10),
  ///   })
  ///   .to_array();
  /// assert_eq!(block_on(latest), Ok(vec![20]));
  /// ```
  pub fn switch_map<U, I, F>(&self, mapper: F) -> Observable<U, E>
  where
    U: Clone + 'static,
    I: Into<ObservableInput<U, E>>,
    F: Fn(T, usize) -> I + 'static,
  {
    let source = self.clone();
    let mapper = Rc::new(mapper);
    Observable::new(move |downstream: Subscriber<U, E>| {
      let state = Rc::new(RefCell::new(SwitchState { index: 0, outer_done: false, active: None }));

      let mapper = mapper.clone();
      let (switch_state, switch_down) = (state.clone(), downstream.clone());
      let on_next = move |value: T| {
        let (index, previous) = {
          let mut state = switch_state.borrow_mut();
          let index = state.index;
          state.index += 1;
          (index, state.active.take())
        };
        if let Some(previous) = previous {
          previous.cancel();
        }

        let inner_token = CancellationToken::new();
        switch_state.borrow_mut().active = Some(inner_token.clone());
        let inner = Observable::from_input(mapper(value, index));

        let (next, fail, done, done_state) = (
          switch_down.clone(),
          switch_down.clone(),
          switch_down.clone(),
          switch_state.clone(),
        );
        let token = CancellationToken::any([inner_token.clone(), switch_down.token()]);
        let sink = Sink::new()
          .on_next(move |v| next.next(v))
          .on_error(move |e| fail.error(e))
          .on_complete(move || {
            let outer_done = {
              let mut state = done_state.borrow_mut();
              if state.active.as_ref().is_some_and(|t| t.ptr_eq(&inner_token)) {
                state.active = None;
              }
              state.outer_done
            };
            if outer_done {
              done.complete();
            }
          });
        inner.subscribe_with(
          sink,
          SubscribeOptions::new()
            .with_token(token)
            .with_context(switch_down.context()),
        );
      };

      let (fail, done) = (downstream.clone(), downstream.clone());
      let sink = Sink::new()
        .on_next(on_next)
        .on_error(move |e| fail.error(e))
        .on_complete(move || {
          let idle = {
            let mut state = state.borrow_mut();
            state.outer_done = true;
            state.active.is_none()
          };
          if idle {
            done.complete();
          }
        });
      source.subscribe_with(sink, downstream.options());
    })
  }
}
