/// Outcome of offering a key to a component.
///
/// Views chain components with `or_else`: the first one that does not
/// return `NotHandled` wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Consumed with nothing to report
  Handled,
  /// Consumed, and the owner should act on this event
  Event(T),
  /// Not consumed; try the next handler
  NotHandled,
}
