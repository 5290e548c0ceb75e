use crate::{error::StreamError, observable::Observable, observer::Sink};

impl<T: Clone + 'static, E: StreamError> Observable<T, E> {
  /// Share one subscription to the source among concurrent subscribers.
  ///
  /// The source is subscribed when the first consumer arrives and
  /// unsubscribed when the last one cancels or the source terminates.
  pub fn share(&self) -> Observable<T, E> {
    let source = self.clone();
    Observable::new_shared(move |shared| {
      source.subscribe_with(Sink::forward_to(&shared), shared.options())
    })
  }
}
