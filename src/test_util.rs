use std::{cell::RefCell, fmt::Display, rc::Rc};

use crate::prelude::*;

pub(crate) type Log = Rc<RefCell<Vec<String>>>;

pub(crate) fn log() -> Log { Rc::new(RefCell::new(Vec::new())) }

/// A sink writing `next v`, `error e` and `complete` lines into `log`.
pub(crate) fn recorder<T: Display + 'static>(log: &Log) -> Sink<T, Error> {
  let (l1, l2, l3) = (log.clone(), log.clone(), log.clone());
  Sink::new()
    .on_next(move |v: T| l1.borrow_mut().push(format!("next {v}")))
    .on_error(move |e: Error| l2.borrow_mut().push(format!("error {e}")))
    .on_complete(move || l3.borrow_mut().push("complete".to_string()))
}

pub(crate) fn lines(log: &Log) -> Vec<String> { log.borrow().clone() }

/// An observable driven by hand: every subscription is kept and events are
/// pushed to all of them.
pub(crate) struct Manual<T> {
  subscribers: Rc<RefCell<Vec<Subscriber<T>>>>,
  pub(crate) observable: Observable<T>,
}

impl<T: Clone + 'static> Manual<T> {
  pub(crate) fn new() -> Self {
    let subscribers: Rc<RefCell<Vec<Subscriber<T>>>> = Rc::new(RefCell::new(Vec::new()));
    let keep = subscribers.clone();
    let observable = Observable::new(move |s| keep.borrow_mut().push(s));
    Self { subscribers, observable }
  }

  fn snapshot(&self) -> Vec<Subscriber<T>> { self.subscribers.borrow().clone() }

  pub(crate) fn next(&self, value: T) {
    for s in self.snapshot() {
      s.next(value.clone());
    }
  }

  pub(crate) fn error(&self, err: Error) {
    for s in self.snapshot() {
      s.error(err.clone());
    }
  }

  pub(crate) fn complete(&self) {
    for s in self.snapshot() {
      s.complete();
    }
  }

  /// How many times the subscribe-procedure ran.
  pub(crate) fn subscriptions(&self) -> usize { self.subscribers.borrow().len() }

  /// How many of those subscriptions are still open.
  pub(crate) fn active(&self) -> usize {
    self
      .subscribers
      .borrow()
      .iter()
      .filter(|s| s.is_active())
      .count()
  }
}
