use smallvec::SmallVec;

/// A container of items keyed by a monotonically increasing id.
///
/// Used for the sinks attached to a subscriber and for the listeners of a
/// cancellation token: both need insertion order, removal by id and cheap
/// storage for the common case of one or two entries.
pub(crate) struct Registry<U> {
  next_id: usize,
  items: SmallVec<[(usize, U); 2]>,
}

impl<U> Default for Registry<U> {
  fn default() -> Self { Self { next_id: 0, items: SmallVec::new() } }
}

impl<U> Registry<U> {
  #[inline]
  pub(crate) fn new() -> Self { Self::default() }

  /// Add an item and return its id.
  #[inline]
  pub(crate) fn add(&mut self, item: U) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    self.items.push((id, item));
    id
  }

  pub(crate) fn remove(&mut self, id: usize) -> Option<U> {
    self
      .items
      .iter()
      .position(|(i, _)| *i == id)
      .map(|pos| self.items.remove(pos).1)
  }

  #[inline]
  pub(crate) fn len(&self) -> usize { self.items.len() }

  #[cfg(test)]
  #[inline]
  pub(crate) fn is_empty(&self) -> bool { self.items.is_empty() }

  /// Move every item out, in insertion order, leaving the ids running.
  pub(crate) fn take_all(&mut self) -> SmallVec<[U; 2]> {
    self.items.drain(..).map(|(_, item)| item).collect()
  }

  #[inline]
  pub(crate) fn iter(&self) -> impl Iterator<Item = &U> { self.items.iter().map(|(_, item)| item) }
}
