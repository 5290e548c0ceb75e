//! Prelude module for convenient imports

#[cfg(feature = "tokio-scheduler")]
pub use crate::scheduler::TokioScheduler;
pub use crate::{
  cancellation::{CancellationToken, ListenerId},
  context::{Context, ContextBuilder, Uncaught},
  error::{Error, StreamError},
  observable::{Observable, ObservableInput, SubscribeOptions},
  observer::{IntoSink, Sink},
  ops::{Inspector, ObservableFuture},
  subscriber::Subscriber,
};
