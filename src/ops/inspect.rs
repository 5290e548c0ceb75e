//! Side-channel observation of a stream.
//!
//! [`Observable::inspect`] runs user hooks around every event without
//! changing what flows downstream. A hook returning `Err` fails the
//! downstream with that error instead.

use std::{cell::Cell, rc::Rc};

use crate::{
  context::Uncaught,
  error::{Error, StreamError},
  observable::Observable,
  observer::Sink,
};

type Hook<E> = Rc<dyn Fn() -> Result<(), E>>;
type ValueHook<T, E> = Rc<dyn Fn(&T) -> Result<(), E>>;

/// Hooks run by [`Observable::inspect`].
pub struct Inspector<T, E = Error> {
  subscribe: Option<Hook<E>>,
  next: Option<ValueHook<T, E>>,
  error: Option<ValueHook<E, E>>,
  complete: Option<Hook<E>>,
  abort: Option<ValueHook<E, E>>,
}

impl<T, E> Default for Inspector<T, E> {
  fn default() -> Self {
    Self { subscribe: None, next: None, error: None, complete: None, abort: None }
  }
}

impl<T, E> Clone for Inspector<T, E> {
  fn clone(&self) -> Self {
    Self {
      subscribe: self.subscribe.clone(),
      next: self.next.clone(),
      error: self.error.clone(),
      complete: self.complete.clone(),
      abort: self.abort.clone(),
    }
  }
}

impl<T, E> Inspector<T, E> {
  pub fn new() -> Self { Self::default() }

  /// Runs before the source is subscribed.
  #[must_use]
  pub fn on_subscribe(mut self, f: impl Fn() -> Result<(), E> + 'static) -> Self {
    self.subscribe = Some(Rc::new(f));
    self
  }

  #[must_use]
  pub fn on_next(mut self, f: impl Fn(&T) -> Result<(), E> + 'static) -> Self {
    self.next = Some(Rc::new(f));
    self
  }

  #[must_use]
  pub fn on_error(mut self, f: impl Fn(&E) -> Result<(), E> + 'static) -> Self {
    self.error = Some(Rc::new(f));
    self
  }

  #[must_use]
  pub fn on_complete(mut self, f: impl Fn() -> Result<(), E> + 'static) -> Self {
    self.complete = Some(Rc::new(f));
    self
  }

  /// Runs with the cancellation reason when the subscription is cancelled
  /// before reaching a terminal event. Its errors are reported, not
  /// delivered.
  #[must_use]
  pub fn on_abort(mut self, f: impl Fn(&E) -> Result<(), E> + 'static) -> Self {
    self.abort = Some(Rc::new(f));
    self
  }
}

impl<T: Clone + 'static, E: StreamError> Observable<T, E> {
  pub fn inspect(&self, inspector: Inspector<T, E>) -> Observable<T, E> {
    let source = self.clone();
    Observable::new(move |downstream| {
      let Inspector { subscribe, next, error, complete, abort } = inspector.clone();
      if let Some(hook) = subscribe {
        if let Err(err) = hook() {
          downstream.error(err);
          return;
        }
      }

      let token = downstream.token();
      let abort_listener = Rc::new(Cell::new(None));
      if let Some(hook) = abort {
        let context = downstream.context();
        abort_listener.set(token.on_cancel(move |reason| {
          if let Err(err) = hook(reason) {
            context.report(Uncaught::Error(&err));
          }
        }));
      }
      let stop_abort: Rc<dyn Fn()> = Rc::new(move || {
        if let Some(id) = abort_listener.take() {
          token.remove_listener(id);
        }
      });

      let (on_next, on_error, on_complete) =
        (downstream.clone(), downstream.clone(), downstream.clone());
      let (stop_next, stop_error, stop_complete) =
        (stop_abort.clone(), stop_abort.clone(), stop_abort);
      let sink = Sink::new()
        .on_next(move |v| {
          if let Some(hook) = &next {
            if let Err(err) = hook(&v) {
              stop_next();
              on_next.error(err);
              return;
            }
          }
          on_next.next(v);
        })
        .on_error(move |err| {
          stop_error();
          if let Some(hook) = error {
            if let Err(hook_err) = hook(&err) {
              on_error.error(hook_err);
              return;
            }
          }
          on_error.error(err);
        })
        .on_complete(move || {
          stop_complete();
          if let Some(hook) = complete {
            if let Err(err) = hook() {
              on_complete.error(err);
              return;
            }
          }
          on_complete.complete();
        });
      source.subscribe_with(sink, downstream.options());
    })
  }
}
