//! Sequential flattening.
//!
//! `flat_map` runs at most one inner subscription at a time. Outer values
//! that arrive while an inner stream is running wait in a FIFO queue.
//!
//! The queue is drained by a loop rather than by recursion: an inner stream
//! that completes while it is still being subscribed only records the fact,
//! and the loop that subscribed it moves on to the next queued value.

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use crate::{
  error::StreamError,
  observable::{Observable, ObservableInput},
  observer::Sink,
  subscriber::Subscriber,
};

struct FlatMapState<T> {
  index: usize,
  outer_done: bool,
  inner_active: bool,
  queue: VecDeque<T>,
  subscribing: bool,
  settled_inline: bool,
}

struct FlatMap<T, U, E, F> {
  state: RefCell<FlatMapState<T>>,
  mapper: Rc<F>,
  downstream: Subscriber<U, E>,
}

impl<T: Clone + 'static, E: StreamError> Observable<T, E> {
  /// Map every value to a stream and concatenate those streams in order.
  ///
  /// ```rust
  /// use std::{cell::RefCell, rc::Rc};
  ///
  /// use lazy_observable::prelude::*;
  ///
  /// let out = Rc::new(RefCell::new(Vec::new()));
  /// let out2 = out.clone();
  /// Observable::<i32>::from_iter([1, 2])
  ///   .flat_map(|v, _| vec![v, v])
  ///   .subscribe(move |v| out2.borrow_mut().push(v));
  /// assert_eq!(*out.borrow(), vec![1, 1, 2, 2]);
  /// ```
  pub fn flat_map<U, I, F>(&self, mapper: F) -> Observable<U, E>
  where
    U: Clone + 'static,
    I: Into<ObservableInput<U, E>>,
    F: Fn(T, usize) -> I + 'static,
  {
    let source = self.clone();
    let mapper = Rc::new(mapper);
    Observable::new(move |downstream: Subscriber<U, E>| {
      let op = Rc::new(FlatMap {
        state: RefCell::new(FlatMapState {
          index: 0,
          outer_done: false,
          inner_active: false,
          queue: VecDeque::new(),
          subscribing: false,
          settled_inline: false,
        }),
        mapper: mapper.clone(),
        downstream: downstream.clone(),
      });
      let (on_next, on_complete, fail) = (op.clone(), op, downstream.clone());
      let sink = Sink::new()
        .on_next(move |v| outer_next(&on_next, v))
        .on_error(move |e| fail.error(e))
        .on_complete(move || outer_complete(&on_complete));
      source.subscribe_with(sink, downstream.options());
    })
  }
}

fn outer_next<T, U, E, I, F>(op: &Rc<FlatMap<T, U, E, F>>, value: T)
where
  T: Clone + 'static,
  U: Clone + 'static,
  E: StreamError,
  I: Into<ObservableInput<U, E>>,
  F: Fn(T, usize) -> I + 'static,
{
  {
    let mut state = op.state.borrow_mut();
    if state.inner_active {
      state.queue.push_back(value);
      return;
    }
    state.inner_active = true;
  }
  drain(op, value);
}

fn drain<T, U, E, I, F>(op: &Rc<FlatMap<T, U, E, F>>, mut value: T)
where
  T: Clone + 'static,
  U: Clone + 'static,
  E: StreamError,
  I: Into<ObservableInput<U, E>>,
  F: Fn(T, usize) -> I + 'static,
{
  loop {
    if !op.downstream.is_active() {
      return;
    }
    let index = {
      let mut state = op.state.borrow_mut();
      let index = state.index;
      state.index += 1;
      state.subscribing = true;
      state.settled_inline = false;
      index
    };

    let inner = Observable::from_input((op.mapper)(value, index));
    let (next, fail, done) = (op.downstream.clone(), op.downstream.clone(), op.clone());
    let sink = Sink::new()
      .on_next(move |v| next.next(v))
      .on_error(move |e| fail.error(e))
      .on_complete(move || inner_complete(&done));
    inner.subscribe_with(sink, op.downstream.options());

    let queued = {
      let mut state = op.state.borrow_mut();
      state.subscribing = false;
      if !state.settled_inline {
        // still running, its completion resumes the queue
        return;
      }
      state.queue.pop_front()
    };
    match queued {
      Some(queued) => value = queued,
      None => {
        finish_inner(op);
        return;
      }
    }
  }
}

fn inner_complete<T, U, E, I, F>(op: &Rc<FlatMap<T, U, E, F>>)
where
  T: Clone + 'static,
  U: Clone + 'static,
  E: StreamError,
  I: Into<ObservableInput<U, E>>,
  F: Fn(T, usize) -> I + 'static,
{
  let queued = {
    let mut state = op.state.borrow_mut();
    if state.subscribing {
      state.settled_inline = true;
      return;
    }
    state.queue.pop_front()
  };
  match queued {
    Some(value) => drain(op, value),
    None => finish_inner(op),
  }
}

fn finish_inner<T, U: Clone + 'static, E: StreamError, F>(op: &FlatMap<T, U, E, F>) {
  let outer_done = {
    let mut state = op.state.borrow_mut();
    state.inner_active = false;
    state.outer_done
  };
  if outer_done {
    op.downstream.complete();
  }
}

fn outer_complete<T, U: Clone + 'static, E: StreamError, F>(op: &FlatMap<T, U, E, F>) {
  let idle = {
    let mut state = op.state.borrow_mut();
    state.outer_done = true;
    !state.inner_active && state.queue.is_empty()
  };
  if idle {
    op.downstream.complete();
  }
}
