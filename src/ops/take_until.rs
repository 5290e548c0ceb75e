use crate::{
  error::StreamError,
  observable::{Observable, ObservableInput},
  observer::Sink,
};

impl<T: Clone + 'static, E: StreamError> Observable<T, E> {
  /// Forward the source until `notifier` emits or fails, then complete.
  ///
  /// The notifier is subscribed first; if it fires during its own
  /// subscription the source is never subscribed. Completion of the notifier
  /// is ignored.
  pub fn take_until<U: Clone + 'static>(
    &self, notifier: impl Into<ObservableInput<U, E>>,
  ) -> Observable<T, E> {
    let source = self.clone();
    let notifier = Observable::from_input(notifier);
    Observable::new(move |downstream| {
      let (stop_next, stop_error) = (downstream.clone(), downstream.clone());
      let trigger = Sink::new()
        .on_next(move |_: U| stop_next.complete())
        .on_error(move |_| stop_error.complete());
      notifier.subscribe_with(trigger, downstream.options());
      if !downstream.is_active() {
        return;
      }
      source.subscribe_with(Sink::forward_to(&downstream), downstream.options());
    })
  }
}
