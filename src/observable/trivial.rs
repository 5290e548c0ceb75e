use super::Observable;
use crate::error::StreamError;

impl<T: Clone + 'static, E: StreamError> Observable<T, E> {
  /// Emit `value`, then complete.
  pub fn of(value: T) -> Self {
    Observable::new(move |subscriber| {
      subscriber.next(value.clone());
      subscriber.complete();
    })
  }

  /// Complete immediately without emitting.
  pub fn empty() -> Self { Observable::new(|subscriber| subscriber.complete()) }

  /// Never emit and never terminate. Only cancellation ends it.
  pub fn never() -> Self { Observable::new(|_| {}) }

  /// Fail immediately with `err`.
  pub fn throw(err: E) -> Self { Observable::new(move |subscriber| subscriber.error(err.clone())) }
}
