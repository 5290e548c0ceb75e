//! Execution context of a subscription.
//!
//! A [`Context`] bundles the hooks the engine consults but does not own:
//!
//! - a liveness check, asked before every delivery and before a
//!   subscribe-procedure runs;
//! - a reporter for failures nobody is listening to;
//! - the scheduler that drives asynchronous sources.
//!
//! Contexts are cheap to clone and are inherited by every nested
//! subscription an operator makes.

use std::{fmt, rc::Rc};

use futures::task::LocalSpawn;

/// A failure that reached no handler.
#[derive(Debug)]
pub enum Uncaught<'a> {
  /// An error delivered to a closed subscriber, or to a sink without an
  /// error callback.
  Error(&'a dyn fmt::Debug),
  /// A teardown panicked while its subscriber was closing.
  TeardownPanic(String),
}

type Liveness = Box<dyn Fn() -> bool>;
type Reporter = Box<dyn Fn(Uncaught<'_>)>;

#[derive(Default)]
struct Hooks {
  liveness: Option<Liveness>,
  reporter: Option<Reporter>,
  scheduler: Option<Rc<dyn LocalSpawn>>,
}

/// Hooks and scheduler a subscription runs with.
#[derive(Clone)]
pub struct Context(Rc<Hooks>);

thread_local! {
  static DEFAULT_CONTEXT: Context = Context(Rc::new(Hooks::default()));
}

impl Default for Context {
  /// Always live, reports through `tracing`, no scheduler.
  fn default() -> Self { DEFAULT_CONTEXT.with(Clone::clone) }
}

impl fmt::Debug for Context {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Context")
      .field("liveness", &self.0.liveness.is_some())
      .field("reporter", &self.0.reporter.is_some())
      .field("scheduler", &self.0.scheduler.is_some())
      .finish()
  }
}

impl Context {
  pub fn builder() -> ContextBuilder { ContextBuilder::default() }

  pub fn is_active(&self) -> bool { self.0.liveness.as_ref().map_or(true, |alive| alive()) }

  pub fn report(&self, uncaught: Uncaught<'_>) {
    match &self.0.reporter {
      Some(reporter) => reporter(uncaught),
      None => report_with_tracing(uncaught),
    }
  }

  pub fn scheduler(&self) -> Option<&dyn LocalSpawn> { self.0.scheduler.as_deref() }
}

fn report_with_tracing(uncaught: Uncaught<'_>) {
  match uncaught {
    Uncaught::Error(err) => tracing::error!(error = ?err, "uncaught observable error"),
    Uncaught::TeardownPanic(msg) => tracing::error!(panic = %msg, "teardown panicked"),
  }
}

/// Builder for [`Context`]. Unset hooks keep their defaults.
#[derive(Default)]
pub struct ContextBuilder {
  hooks: Hooks,
}

impl ContextBuilder {
  #[must_use]
  pub fn liveness(mut self, alive: impl Fn() -> bool + 'static) -> Self {
    self.hooks.liveness = Some(Box::new(alive));
    self
  }

  #[must_use]
  pub fn reporter(mut self, reporter: impl Fn(Uncaught<'_>) + 'static) -> Self {
    self.hooks.reporter = Some(Box::new(reporter));
    self
  }

  #[must_use]
  pub fn scheduler(mut self, scheduler: impl LocalSpawn + 'static) -> Self {
    self.hooks.scheduler = Some(Rc::new(scheduler));
    self
  }

  pub fn build(self) -> Context { Context(Rc::new(self.hooks)) }
}
