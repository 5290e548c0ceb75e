//! Consumers of a stream.
//!
//! Every consumer handed to [`Observable::subscribe`] is normalized into a
//! [`Sink`]: a record of up to three optional callbacks. The accepted shapes
//! are resolved at compile time by [`IntoSink`]:
//!
//! - a closure `Fn(T)` becomes the `next` callback;
//! - a [`Sink`] built with any subset of `on_next`, `on_error` and
//!   `on_complete` is used as-is.
//!
//! [`Observable::subscribe`]: crate::observable::Observable::subscribe

use std::{cell::RefCell, fmt};

use crate::{
  error::{Error, StreamError},
  subscriber::Subscriber,
};

/// The canonical consumer: optional `next`, `error` and `complete`
/// callbacks.
///
/// A missing callback is a no-op, except a missing error callback, in which
/// case the error is handed to the context's uncaught reporter.
///
/// `next` callbacks are `Fn` so that a sink stays usable when a callback
/// re-enters the stream that feeds it. Closures that keep state do so through
/// `Cell` or `RefCell` captures.
pub struct Sink<T, E = Error> {
  next: Option<Box<dyn Fn(T)>>,
  error: RefCell<Option<Box<dyn FnOnce(E)>>>,
  complete: RefCell<Option<Box<dyn FnOnce()>>>,
  handles_error: bool,
}

impl<T, E> Default for Sink<T, E> {
  fn default() -> Self {
    Self {
      next: None,
      error: RefCell::new(None),
      complete: RefCell::new(None),
      handles_error: false,
    }
  }
}

impl<T, E> fmt::Debug for Sink<T, E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Sink")
      .field("next", &self.next.is_some())
      .field("error", &self.handles_error)
      .field("complete", &self.complete.borrow().is_some())
      .finish()
  }
}

impl<T, E> Sink<T, E> {
  /// A sink that ignores everything and reports errors.
  pub fn new() -> Self { Self::default() }

  #[must_use]
  pub fn on_next(mut self, f: impl Fn(T) + 'static) -> Self {
    self.next = Some(Box::new(f));
    self
  }

  #[must_use]
  pub fn on_error(mut self, f: impl FnOnce(E) + 'static) -> Self {
    self.error = RefCell::new(Some(Box::new(f)));
    self.handles_error = true;
    self
  }

  #[must_use]
  pub fn on_complete(mut self, f: impl FnOnce() + 'static) -> Self {
    self.complete = RefCell::new(Some(Box::new(f)));
    self
  }

  pub(crate) fn next(&self, value: T) {
    if let Some(next) = &self.next {
      next(value)
    }
  }

  /// Hands the error back when the sink has no error callback.
  pub(crate) fn error(&self, err: E) -> Result<(), E> {
    if !self.handles_error {
      return Err(err);
    }
    let callback = self.error.borrow_mut().take();
    if let Some(callback) = callback {
      callback(err);
    }
    Ok(())
  }

  pub(crate) fn complete(&self) {
    let callback = self.complete.borrow_mut().take();
    if let Some(callback) = callback {
      callback();
    }
  }
}

impl<T: Clone + 'static, E: StreamError> Sink<T, E> {
  /// Forward every event unchanged to `downstream`.
  pub(crate) fn forward_to(downstream: &Subscriber<T, E>) -> Self {
    let next = downstream.clone();
    Sink::new()
      .on_next(move |v| next.next(v))
      .terminals_to(downstream)
  }
}

impl<T, E: StreamError> Sink<T, E> {
  /// Forward error and completion to `downstream`, keeping the `next`
  /// callback.
  pub(crate) fn terminals_to<U: Clone + 'static>(self, downstream: &Subscriber<U, E>) -> Self {
    let error = downstream.clone();
    let complete = downstream.clone();
    self
      .on_error(move |e| error.error(e))
      .on_complete(move || complete.complete())
  }
}

/// Conversion of the accepted consumer shapes into a [`Sink`].
pub trait IntoSink<T, E> {
  fn into_sink(self) -> Sink<T, E>;
}

impl<T, E> IntoSink<T, E> for Sink<T, E> {
  #[inline]
  fn into_sink(self) -> Sink<T, E> { self }
}

impl<T, E, F> IntoSink<T, E> for F
where
  F: Fn(T) + 'static,
{
  #[inline]
  fn into_sink(self) -> Sink<T, E> { Sink::new().on_next(self) }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use super::*;

  #[test]
  fn missing_callbacks_are_noops() {
    let sink = Sink::<i32, Error>::new();
    sink.next(1);
    sink.complete();
    assert_eq!(sink.error(Error::Aborted), Err(Error::Aborted));
  }

  #[test]
  fn terminal_callbacks_run_once() {
    let hits = Rc::new(RefCell::new(Vec::new()));
    let (h1, h2) = (hits.clone(), hits.clone());
    let sink = Sink::<i32, Error>::new()
      .on_error(move |e| h1.borrow_mut().push(format!("{e}")))
      .on_complete(move || h2.borrow_mut().push("done".to_string()));

    assert_eq!(sink.error(Error::msg("x")), Ok(()));
    assert_eq!(sink.error(Error::msg("y")), Ok(()));
    sink.complete();
    sink.complete();
    assert_eq!(*hits.borrow(), vec!["x".to_string(), "done".to_string()]);
  }

  #[test]
  fn closure_becomes_next() {
    let seen = Rc::new(RefCell::new(0));
    let seen2 = seen.clone();
    let sink: Sink<i32, Error> = (move |v: i32| *seen2.borrow_mut() += v).into_sink();
    sink.next(2);
    sink.next(3);
    assert_eq!(*seen.borrow(), 5);
  }

  #[test]
  fn closure_consumer_survives_reentrant_emission() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let slot: Rc<RefCell<Option<Subscriber<i32>>>> = Rc::new(RefCell::new(None));
    let slot2 = slot.clone();
    let obs = crate::observable::Observable::<i32>::new(move |s| *slot2.borrow_mut() = Some(s));

    let (seen2, slot3) = (seen.clone(), slot.clone());
    obs.subscribe(move |v: i32| {
      seen2.borrow_mut().push(v);
      if v < 3 {
        let subscriber = slot3.borrow().clone();
        if let Some(s) = subscriber {
          s.next(v + 1);
        }
      }
    });
    let subscriber = slot.borrow().clone().unwrap();
    subscriber.next(1);
    assert_eq!(*seen.borrow(), vec![1, 2, 3]);
  }
}
