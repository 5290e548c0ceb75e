//! # lazy-observable: push-based, lazily started, cancelable streams
//!
//! An [`Observable`] describes how to produce values; nothing runs until it is
//! subscribed. Every subscription gets its own [`Subscriber`], which delivers
//! `next`, `error` and `complete` events to a [`Sink`] and runs teardowns
//! exactly once when the subscription ends. Cancellation is cooperative and
//! flows through [`CancellationToken`]s.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::{cell::RefCell, rc::Rc};
//!
//! use lazy_observable::prelude::*;
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let seen2 = seen.clone();
//! Observable::<i32>::from_iter(0..10)
//!   .filter(|v, _| v % 2 == 0)
//!   .map(|v, _| v * 2)
//!   .subscribe(move |v| seen2.borrow_mut().push(v));
//! assert_eq!(*seen.borrow(), vec![0, 4, 8, 12, 16]);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] | Lazy, cloneable description of a stream |
//! | [`Subscriber`] | Per-subscription controller handed to producers |
//! | [`Sink`] | Consumer callbacks for `next`, `error` and `complete` |
//! | [`CancellationToken`] | One-shot signal that ends subscriptions |
//! | [`Context`] | Liveness, error reporting and scheduling hooks |
//! | [`ObservableFuture`] | Result of a terminal consumer such as `to_array` |
//!
//! ## Feature Flags
//!
//! - **`tokio-scheduler`**: [`TokioScheduler`], spawning asynchronous sources
//!   with `tokio::task::spawn_local`.
//!
//! [`Observable`]: observable::Observable
//! [`Subscriber`]: subscriber::Subscriber
//! [`Sink`]: observer::Sink
//! [`CancellationToken`]: cancellation::CancellationToken
//! [`Context`]: context::Context
//! [`ObservableFuture`]: ops::ObservableFuture
//! [`TokioScheduler`]: scheduler::TokioScheduler

pub mod cancellation;
pub mod context;
pub mod error;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
mod registry;
pub mod scheduler;
pub mod subscriber;

#[cfg(test)]
mod test_util;

pub use prelude::*;
