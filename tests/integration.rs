//! Integration tests for lazy-observable
//!
//! Exercise operator chains, cancellation and terminal consumers through the
//! public API only.

use std::{
  cell::{Cell, RefCell},
  rc::Rc,
};

use futures::executor::{block_on, LocalPool};
use lazy_observable::prelude::*;

type Log = Rc<RefCell<Vec<String>>>;

fn log() -> Log { Rc::new(RefCell::new(Vec::new())) }

fn push(log: &Log, line: impl Into<String>) { log.borrow_mut().push(line.into()) }

/// An observable that keeps every subscriber it is handed.
fn captured<T: Clone + 'static>() -> (Observable<T>, Rc<RefCell<Vec<Subscriber<T>>>>) {
  let subscribers: Rc<RefCell<Vec<Subscriber<T>>>> = Rc::new(RefCell::new(Vec::new()));
  let keep = subscribers.clone();
  (Observable::new(move |s| keep.borrow_mut().push(s)), subscribers)
}

#[test]
fn test_basic_chain_integration() {
  let result = Observable::<i32>::from_iter(1..=10)
    .map(|x, _| x * 2)
    .filter(|x, _| *x > 10)
    .take(3)
    .to_array();
  assert_eq!(block_on(result), Ok(vec![12, 14, 16]));
}

#[test]
fn test_procedure_runs_once_per_subscription() {
  let calls = Rc::new(Cell::new(0));
  let calls2 = calls.clone();
  let obs = Observable::<i32>::new(move |s| {
    calls2.set(calls2.get() + 1);
    s.complete();
  });
  assert_eq!(calls.get(), 0);
  obs.subscribe(|_: i32| {});
  obs.subscribe(|_: i32| {});
  assert_eq!(calls.get(), 2);

  obs.subscribe_with(|_: i32| {}, CancellationToken::cancelled(Error::Aborted).into());
  assert_eq!(calls.get(), 2);
}

#[test]
fn test_teardowns_run_in_reverse_once_even_when_one_panics() {
  let order = log();
  let reported = log();
  let reported2 = reported.clone();
  let ctx = Context::builder()
    .reporter(move |uncaught| {
      if let Uncaught::TeardownPanic(msg) = uncaught {
        push(&reported2, msg);
      }
    })
    .build();

  let token = CancellationToken::new();
  let order2 = order.clone();
  Observable::<i32>::new(move |s| {
    for name in ["t1", "t2", "t3"] {
      let order = order2.clone();
      s.add_teardown(move || {
        push(&order, name);
        if name == "t2" {
          panic!("t2 failed");
        }
      });
    }
  })
  .subscribe_with(|_: i32| {}, SubscribeOptions::new().with_token(token.clone()).with_context(ctx));

  token.cancel();
  token.cancel();
  assert_eq!(*order.borrow(), vec!["t3", "t2", "t1"]);
  assert_eq!(*reported.borrow(), vec!["t2 failed"]);
}

#[test]
fn test_take_zero_and_take_three() {
  let subscribed = Rc::new(Cell::new(false));
  let subscribed2 = subscribed.clone();
  let source = Observable::<i32>::new(move |s| {
    subscribed2.set(true);
    s.next(1);
  });
  assert_eq!(block_on(source.take(0).to_array()), Ok(vec![]));
  assert!(!subscribed.get());

  let first_three = Observable::<i32>::from_iter(1..=5).take(3).to_array();
  assert_eq!(block_on(first_three), Ok(vec![1, 2, 3]));
}

#[test]
fn test_reduce() {
  let empty = Observable::<i32>::empty().reduce(|acc, v, _| acc + v);
  assert_eq!(block_on(empty), Err(Error::NoSeed));
  let sum = Observable::<i32>::from_iter([1, 2, 3]).reduce(|acc, v, _| acc + v);
  assert_eq!(block_on(sum), Ok(6));
}

#[test]
fn test_first_cancels_upstream() {
  assert_eq!(block_on(Observable::<i32>::empty().first()), Err(Error::EmptySequence));

  let torn_down = Rc::new(Cell::new(false));
  let torn_down2 = torn_down.clone();
  let (source, subscribers) = captured::<i32>();
  let first = source.finally(move || torn_down2.set(true)).first();
  let upstream = subscribers.borrow()[0].clone();
  upstream.next(5);
  upstream.next(6);
  assert!(torn_down.get());
  assert!(!upstream.is_active());
  assert_eq!(block_on(first), Ok(5));
}

#[test]
fn test_flat_map_concatenates() {
  let result = Observable::<i32>::from_iter([1, 2])
    .flat_map(|v, _| vec![v, v])
    .to_array();
  assert_eq!(block_on(result), Ok(vec![1, 1, 2, 2]));
}

#[test]
fn test_switch_map_cancels_previous_before_next() {
  let trace = log();
  let (outer, outer_subs) = captured::<usize>();
  let trace2 = trace.clone();
  outer
    .switch_map(move |v, _| {
      let (t1, t2) = (trace2.clone(), trace2.clone());
      Observable::<usize>::new(move |s| {
        push(&t1, format!("subscribe {v}"));
        let t2 = t2.clone();
        s.add_teardown(move || push(&t2, format!("cancel {v}")));
      })
    })
    .subscribe(|_: usize| {});

  let upstream = outer_subs.borrow()[0].clone();
  upstream.next(0);
  upstream.next(1);
  assert_eq!(*trace.borrow(), vec!["subscribe 0", "cancel 0", "subscribe 1"]);
}

#[test]
fn test_multicast_shares_one_procedure_call() {
  let calls = Rc::new(Cell::new(0));
  let calls2 = calls.clone();
  let (source, subscribers) = captured::<i32>();
  let shared = Observable::<i32>::new_shared(move |s| {
    calls2.set(calls2.get() + 1);
    let options = s.options();
    let next = s.clone();
    source.subscribe_with(
      Sink::new()
        .on_next(move |v| next.next(v))
        .on_complete(move || s.complete()),
      options,
    );
  });

  let (a, b) = (shared.to_array(), shared.to_array());
  let upstream = subscribers.borrow()[0].clone();
  upstream.next(1);
  upstream.next(2);
  upstream.complete();

  assert_eq!(calls.get(), 1);
  assert_eq!(block_on(a), Ok(vec![1, 2]));
  assert_eq!(block_on(b), Ok(vec![1, 2]));
}

#[test]
fn test_catch_and_finally() {
  let events = log();
  let events2 = events.clone();
  let recovered = Observable::<i32>::new(|s| {
    s.next(1);
    s.error(Error::msg("boom"));
  })
  .catch(|_| Observable::<i32>::of(99))
  .finally(move || push(&events2, "finally"))
  .to_array();
  assert_eq!(block_on(recovered), Ok(vec![1, 99]));
  assert_eq!(*events.borrow(), vec!["finally"]);
}

#[test]
fn test_take_until_stops_source() {
  let (notifier, notifier_subs) = captured::<()>();
  let (source, source_subs) = captured::<i32>();
  let collected = source.take_until(notifier).to_array();
  let (upstream, signal) = (source_subs.borrow()[0].clone(), notifier_subs.borrow()[0].clone());
  upstream.next(1);
  signal.next(());
  upstream.next(2);
  assert!(!upstream.is_active());
  assert_eq!(block_on(collected), Ok(vec![1]));
}

#[test]
fn test_inactive_context_suppresses_delivery() {
  let alive = Rc::new(Cell::new(true));
  let alive2 = alive.clone();
  let ctx = Context::builder().liveness(move || alive2.get()).build();
  let (source, subscribers) = captured::<i32>();
  let seen = Rc::new(RefCell::new(Vec::new()));
  let seen2 = seen.clone();
  source.subscribe_with(move |v: i32| seen2.borrow_mut().push(v), ctx.into());

  let upstream = subscribers.borrow()[0].clone();
  upstream.next(1);
  alive.set(false);
  upstream.next(2);
  assert_eq!(*seen.borrow(), vec![1]);
  assert!(!upstream.is_active());
}

#[test]
fn test_async_stream_through_operators() {
  let mut pool = LocalPool::new();
  let ctx = Context::builder().scheduler(pool.spawner()).build();
  let result = Observable::<i32>::from_stream(futures::stream::iter(1..=4))
    .map(|v, _| v * 10)
    .drop(1)
    .to_array_with(ctx.into());
  assert_eq!(pool.run_until(result), Ok(vec![20, 30, 40]));
}

#[test]
fn test_async_source_without_scheduler_fails() {
  let result = Observable::<i32>::from_future(async { 1 }).first();
  assert_eq!(block_on(result), Err(Error::NoScheduler));
}

#[test]
fn test_caller_cancellation_rejects_terminal_future() {
  let token = CancellationToken::new();
  let pending = Observable::<i32>::never().to_array_with(token.clone().into());
  token.cancel_with(Error::msg("shutdown"));
  assert_eq!(block_on(pending), Err(Error::msg("shutdown")));
}

#[cfg(feature = "tokio-scheduler")]
#[tokio::test]
async fn test_tokio_scheduler_drives_streams() {
  let local = tokio::task::LocalSet::new();
  let result = local
    .run_until(async {
      let ctx = Context::builder().scheduler(TokioScheduler).build();
      Observable::<i32>::from_stream(futures::stream::iter(vec![1, 2, 3]))
        .reduce_with(|acc, v, _| acc + v, ctx.into())
        .await
    })
    .await;
  assert_eq!(result, Ok(6));
}
