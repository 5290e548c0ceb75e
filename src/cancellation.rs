//! One-shot cancellation tokens.
//!
//! A [`CancellationToken`] starts live and fires at most once, carrying a
//! reason. Listeners registered before it fires run synchronously, in
//! registration order, when it fires. Listeners registered afterwards run
//! immediately.
//!
//! ```rust
//! use lazy_observable::prelude::*;
//!
//! let parent = CancellationToken::<Error>::new();
//! let child = CancellationToken::new();
//! let either = CancellationToken::any([parent.clone(), child.clone()]);
//!
//! parent.cancel_with(Error::msg("shutdown"));
//! assert_eq!(either.reason(), Some(Error::msg("shutdown")));
//! assert!(!child.is_cancelled());
//! ```

use std::{
  cell::RefCell,
  fmt, mem,
  rc::{Rc, Weak},
};

use smallvec::SmallVec;

use crate::{
  error::{Error, StreamError},
  registry::Registry,
};

type Listener<E> = Box<dyn FnOnce(&E)>;

type Upstream<E> = SmallVec<[(CancellationToken<E>, ListenerId); 2]>;

struct TokenState<E> {
  reason: Option<E>,
  listeners: Registry<Listener<E>>,
  /// Forwarding listeners this token holds on the tokens it was joined from.
  upstream: Upstream<E>,
}

impl<E> TokenState<E> {
  fn with_reason(reason: Option<E>) -> Self {
    Self { reason, listeners: Registry::new(), upstream: SmallVec::new() }
  }
}

impl<E> Drop for TokenState<E> {
  fn drop(&mut self) { release(mem::take(&mut self.upstream)) }
}

fn release<E>(upstream: Upstream<E>) {
  for (source, id) in upstream {
    source.remove_listener(id);
  }
}

/// Handle of a listener registered with [`CancellationToken::on_cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

/// A shared, single-threaded abort signal carrying a reason of type `E`.
///
/// Cloning yields another handle to the same signal.
pub struct CancellationToken<E = Error>(Rc<RefCell<TokenState<E>>>);

impl<E> Clone for CancellationToken<E> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<E: StreamError> Default for CancellationToken<E> {
  fn default() -> Self { Self::new() }
}

impl<E: fmt::Debug> fmt::Debug for CancellationToken<E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = self.0.borrow();
    f.debug_struct("CancellationToken")
      .field("reason", &state.reason)
      .field("listeners", &state.listeners.len())
      .finish()
  }
}

impl<E: StreamError> CancellationToken<E> {
  /// A live token.
  pub fn new() -> Self { Self(Rc::new(RefCell::new(TokenState::with_reason(None)))) }

  /// A token that has already fired with `reason`.
  pub fn cancelled(reason: E) -> Self {
    Self(Rc::new(RefCell::new(TokenState::with_reason(Some(reason)))))
  }

  pub fn is_cancelled(&self) -> bool { self.0.borrow().reason.is_some() }

  /// The reason the token fired with, if it has.
  pub fn reason(&self) -> Option<E> { self.0.borrow().reason.clone() }

  /// Fire with [`Error::Aborted`].
  pub fn cancel(&self) { self.cancel_with(Error::Aborted.into()) }

  /// Fire with `reason`. Firing an already fired token does nothing.
  pub fn cancel_with(&self, reason: E) {
    let (listeners, upstream) = {
      let mut state = self.0.borrow_mut();
      if state.reason.is_some() {
        return;
      }
      state.reason = Some(reason.clone());
      (state.listeners.take_all(), mem::take(&mut state.upstream))
    };
    for listener in listeners {
      listener(&reason);
    }
    release(upstream);
  }

  /// Run `f` when the token fires.
  ///
  /// Returns `None` when the token had already fired, in which case `f` ran
  /// before this call returned.
  pub fn on_cancel(&self, f: impl FnOnce(&E) + 'static) -> Option<ListenerId> {
    let mut state = self.0.borrow_mut();
    if let Some(reason) = state.reason.clone() {
      drop(state);
      f(&reason);
      return None;
    }
    Some(ListenerId(state.listeners.add(Box::new(f))))
  }

  /// A token that fires as soon as any of `tokens` fires, with that reason.
  ///
  /// The returned token only holds weak interest in its sources. Once it
  /// fires or its last handle is dropped, its forwarding listeners are
  /// removed from every source.
  pub fn any(tokens: impl IntoIterator<Item = CancellationToken<E>>) -> Self {
    let sources: SmallVec<[CancellationToken<E>; 2]> = tokens.into_iter().collect();
    if let Some(reason) = sources.iter().find_map(|t| t.reason()) {
      return Self::cancelled(reason);
    }

    let dependent = Self::new();
    let mut upstream = Upstream::new();
    for source in sources {
      let weak: Weak<RefCell<TokenState<E>>> = Rc::downgrade(&dependent.0);
      let id = source.on_cancel(move |reason| {
        if let Some(state) = weak.upgrade() {
          CancellationToken(state).cancel_with(reason.clone());
        }
      });
      if let Some(id) = id {
        upstream.push((source, id));
      }
    }
    dependent.0.borrow_mut().upstream = upstream;
    dependent
  }
}

impl<E> CancellationToken<E> {
  /// Deregister a listener. Returns `false` if it already ran or was removed.
  pub fn remove_listener(&self, id: ListenerId) -> bool {
    let removed = self.0.borrow_mut().listeners.remove(id.0);
    removed.is_some()
  }

  /// Whether both handles point at the same signal.
  pub fn ptr_eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.0, &other.0) }

  #[cfg(test)]
  pub(crate) fn listener_count(&self) -> usize { self.0.borrow().listeners.len() }
}
