//! Error taxonomy shared by every stream.
//!
//! A stream carries an error type `E` of the user's choosing. The crate only
//! asks that `E` can absorb the handful of failures the engine itself raises
//! (see [`Error`]), which is what the [`StreamError`] bound expresses.

use std::fmt::Debug;

/// Failures raised by the engine itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
  /// A cancellation token fired without an explicit reason.
  #[error("the operation was aborted")]
  Aborted,

  /// `first` or `last` saw a completion before any value.
  #[error("no values in observable")]
  EmptySequence,

  /// `reduce` without a seed saw a completion before any value.
  #[error("no initial value provided and no values emitted")]
  NoSeed,

  /// The liveness hook reported the execution context as gone.
  #[error("the execution context is no longer active")]
  ContextInactive,

  /// An asynchronous source was subscribed without a scheduler to drive it.
  #[error("no scheduler configured to drive an asynchronous source")]
  NoScheduler,

  /// The scheduler refused the pulling task.
  #[error("failed to spawn an asynchronous source: {0}")]
  Spawn(String),

  /// Free-form failure, handy for tests and adapters.
  #[error("{0}")]
  Message(String),
}

impl Error {
  /// Shortcut for [`Error::Message`].
  pub fn msg(message: impl Into<String>) -> Self { Error::Message(message.into()) }
}

/// Bound for the error channel of a stream.
///
/// Errors are cloned when fanned out to several sinks and when they become a
/// cancellation reason, and engine failures are injected through `From<Error>`.
pub trait StreamError: Clone + Debug + From<Error> + 'static {}

impl<E> StreamError for E where E: Clone + Debug + From<Error> + 'static {}
